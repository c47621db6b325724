// [apps/orchestrator/tests/ingest_pipeline.rs]
//! End-to-end exercise of `Orchestrator::process` (§4.J) against an
//! in-memory database and a mocked webhook endpoint: a clean CNAB-400 file
//! commits and notifies, a byte-identical resubmission short-circuits as a
//! duplicate, and a webhook-disabled run still completes the ingest.

use cnab_domain::IngestOptions;
use cnab_orchestrator::Orchestrator;
use cnab_persistence::{PersistenceClient, Persister};
use cnab_webhook::{SkipReason, WebhookClient, WebhookConfig};
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn blank(width: usize) -> String {
    " ".repeat(width)
}

fn zpad(s: &str, width: usize) -> String {
    assert!(s.len() <= width);
    format!("{}{}", "0".repeat(width - s.len()), s)
}

fn header_line() -> String {
    let mut s = blank(400);
    s.replace_range(0..3, "341");
    s
}

fn detail_line(valor_centavos: i64) -> String {
    let mut s = blank(400);
    s.replace_range(0..3, "341");
    s.replace_range(90..103, &zpad(&valor_centavos.to_string(), 13));
    s
}

fn trailer_line(total_registros: i64, valor_centavos: i64) -> String {
    let mut s = blank(400);
    s.replace_range(1..7, &zpad(&total_registros.to_string(), 6));
    s.replace_range(7..20, &zpad(&valor_centavos.to_string(), 13));
    s
}

fn sample_cnab400(valor_centavos: i64) -> Vec<u8> {
    let lines = vec![header_line(), detail_line(valor_centavos), trailer_line(1, valor_centavos)];
    lines.join("\n").into_bytes()
}

async fn orchestrator_with_webhook(webhook: WebhookConfig) -> Orchestrator {
    let client = PersistenceClient::connect(":memory:", None).await.unwrap();
    let persister = Persister::new(client);
    Orchestrator::new(persister, WebhookClient::new(webhook))
}

#[tokio::test]
async fn well_formed_file_commits_and_notifies_the_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"received": true})))
        .mount(&server)
        .await;

    let orchestrator = orchestrator_with_webhook(WebhookConfig {
        enabled: true,
        url: Some(server.uri()),
        retry_attempts: 3,
        retry_delay: Duration::from_millis(1),
        request_timeout: Duration::from_secs(5),
        ..WebhookConfig::default()
    })
    .await;

    let bytes = sample_cnab400(10_050);
    let report = orchestrator.process(&bytes, "remessa.txt", IngestOptions::default()).await.unwrap();

    assert!(report.duplicate_of.is_none());
    assert_eq!(report.barcodes.len(), 0); // no codigo_barras on this synthetic record
    assert!(report.webhook.as_ref().unwrap().delivered);
}

#[tokio::test]
async fn resubmitting_the_same_bytes_short_circuits_as_a_duplicate() {
    let orchestrator = orchestrator_with_webhook(WebhookConfig { enabled: false, ..WebhookConfig::default() }).await;

    let bytes = sample_cnab400(5_000);
    let first = orchestrator.process(&bytes, "remessa.txt", IngestOptions::default()).await.unwrap();
    assert!(first.duplicate_of.is_none());

    let second = orchestrator.process(&bytes, "remessa.txt", IngestOptions::default()).await.unwrap();
    assert_eq!(second.duplicate_of, Some(first.file_id));
}

#[tokio::test]
async fn force_reprocess_bypasses_the_duplicate_short_circuit() {
    let orchestrator = orchestrator_with_webhook(WebhookConfig { enabled: false, ..WebhookConfig::default() }).await;

    let bytes = sample_cnab400(7_500);
    let first = orchestrator.process(&bytes, "remessa.txt", IngestOptions::default()).await.unwrap();
    assert!(first.duplicate_of.is_none());

    let opts = IngestOptions { force_reprocess: true, ..IngestOptions::default() };
    let second = orchestrator.process(&bytes, "remessa.txt", opts).await.unwrap();
    assert!(second.duplicate_of.is_none());
    assert_ne!(second.file_id, first.file_id);
}

#[tokio::test]
async fn disabled_webhook_still_completes_the_ingest() {
    let orchestrator = orchestrator_with_webhook(WebhookConfig { enabled: false, ..WebhookConfig::default() }).await;

    let bytes = sample_cnab400(1_000);
    let report = orchestrator.process(&bytes, "remessa.txt", IngestOptions::default()).await.unwrap();

    let webhook = report.webhook.unwrap();
    assert!(!webhook.delivered);
    assert_eq!(webhook.skip_reason, Some(SkipReason::Disabled));
}

#[tokio::test]
async fn a_file_too_short_to_hold_a_header_and_trailer_fails_the_ingest() {
    let orchestrator = orchestrator_with_webhook(WebhookConfig { enabled: false, ..WebhookConfig::default() }).await;

    let bytes = header_line().into_bytes();
    let err = orchestrator.process(&bytes, "vazio.txt", IngestOptions::default()).await.unwrap_err();
    assert_eq!(err.codigo(), "CABECALHO_AUSENTE");
}
