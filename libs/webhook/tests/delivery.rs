// [libs/webhook/tests/delivery.rs]
use cnab_webhook::{WebhookClient, WebhookConfig};
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{header, header_exists, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(url: String) -> WebhookConfig {
    WebhookConfig {
        enabled: true,
        url: Some(url),
        retry_attempts: 3,
        retry_delay: Duration::from_millis(1),
        request_timeout: Duration::from_secs(5),
        source: "cnab-ingest-core".into(),
        version: "test".into(),
    }
}

#[tokio::test]
async fn disabled_client_never_makes_a_network_call() {
    let client = WebhookClient::new(WebhookConfig { enabled: false, ..Default::default() });
    let report = client.send(&json!({"ok": true}), Uuid::new_v4(), None).await;
    assert!(!report.delivered);
    assert_eq!(report.attempts, 0);
    assert_eq!(report.skip_reason, Some(cnab_webhook::SkipReason::Disabled));
}

#[tokio::test]
async fn missing_url_is_reported_distinctly_from_disabled() {
    let client = WebhookClient::new(WebhookConfig { enabled: true, url: None, ..Default::default() });
    let report = client.send(&json!({"ok": true}), Uuid::new_v4(), None).await;
    assert_eq!(report.skip_reason, Some(cnab_webhook::SkipReason::NoUrlConfigured));
}

#[tokio::test]
async fn per_call_url_override_replaces_the_configured_default() {
    let configured = MockServer::start().await;
    let overridden = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true}))).mount(&overridden).await;

    let client = WebhookClient::new(config(configured.uri()));
    let report = client.send(&json!({"operation": "cnab400"}), Uuid::new_v4(), Some(&overridden.uri())).await;
    assert!(report.delivered);
    assert_eq!(configured.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn sends_the_attempt_header_and_user_agent_spec_names() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("X-Tentativa", "1"))
        .and(header("User-Agent", "cnab-ingest-core/test"))
        .and(header_exists("X-Webhook-Source"))
        .and(header_exists("X-Webhook-Version"))
        .and(header_exists("X-Operation-Id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"received": true})))
        .mount(&server)
        .await;

    let client = WebhookClient::new(config(server.uri()));
    let report = client.send(&json!({"metadados": {"fonte": "cnab-ingest-core"}}), Uuid::new_v4(), None).await;
    assert!(report.delivered);
}

#[tokio::test]
async fn succeeds_on_first_attempt_when_upstream_is_healthy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"received": true})))
        .mount(&server)
        .await;

    let client = WebhookClient::new(config(server.uri()));
    let report = client.send(&json!({"operation": "cnab400"}), Uuid::new_v4(), None).await;
    assert!(report.delivered);
    assert_eq!(report.attempts, 1);
}

#[tokio::test]
async fn retries_with_progressive_backoff_then_surfaces_the_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(503)).mount(&server).await;

    let client = WebhookClient::new(config(server.uri()));
    let report = client.send(&json!({"operation": "cnab400"}), Uuid::new_v4(), None).await;
    assert!(!report.delivered);
    assert_eq!(report.attempts, 3);
    assert_eq!(report.error.unwrap().kind, cnab_webhook::WebhookErrorKind::Upstream);
}
