// [libs/settlement-client/tests/check_and_pay_boleto.rs]
//! Exercises `SettlementClient` against a `wiremock` fixture: token
//! acquisition, `checkBoleto`/`payBoleto` happy paths, and the circuit
//! breaker tripping after repeated 5xx responses.

use cnab_settlement_client::{SettlementClient, SettlementClientConfig, SettlementError};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(base_url: String, token_url: String) -> SettlementClientConfig {
    SettlementClientConfig {
        base_url,
        token_url,
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        api_key: "api-key".into(),
        failure_threshold: 2,
        cooldown: Duration::from_millis(10),
        request_timeout: Duration::from_secs(5),
        payment_window: Default::default(),
    }
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-abc",
            "expires_in": 3600,
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn check_boleto_rejects_malformed_barcode_before_any_network_call() {
    let server = MockServer::start().await;
    let client = SettlementClient::new(config(server.uri(), format!("{}/oauth/token", server.uri())));

    let result = client.check_boleto("123").await;
    assert!(matches!(result, Err(SettlementError::InvalidFormat)));
    // no mocks were registered at all, so any network attempt would have
    // produced a connection error distinct from `InvalidFormat` -- the
    // assertion above already proves the validation ran first.
}

#[tokio::test]
async fn check_boleto_returns_enriched_result_on_success() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let barcode = "3".repeat(48);
    Mock::given(method("POST"))
        .and(path("/ledger/payments/boletos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "boleto-1",
            "due_date": "2999-01-01",
            "amount": 15025,
        })))
        .mount(&server)
        .await;

    let client = SettlementClient::new(config(server.uri(), format!("{}/oauth/token", server.uri())));
    let checked = client.check_boleto(&barcode).await.unwrap();
    assert_eq!(checked.id.as_deref(), Some("boleto-1"));
    assert!(checked.can_pay_today);
    assert_eq!(checked.amount.to_string(), "150.25");
}

#[tokio::test]
async fn pay_boleto_follows_check_then_pay() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let barcode = "4".repeat(47);
    Mock::given(method("POST"))
        .and(path("/ledger/payments/boletos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "boleto-2",
            "due_date": "2999-01-01",
            "amount": 9990,
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ledger/payments/boletos/boleto-2/pay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payment_id": "pay-1",
            "status": "confirmed",
        })))
        .mount(&server)
        .await;

    let client = SettlementClient::new(config(server.uri(), format!("{}/oauth/token", server.uri())));
    let result = client.pay_boleto(&barcode, None).await.unwrap();
    assert_eq!(result.payment_id, "pay-1");
    assert_eq!(result.status, "confirmed");
}

#[tokio::test]
async fn repeated_upstream_failures_trip_the_circuit_breaker() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let barcode = "5".repeat(48);
    Mock::given(method("POST"))
        .and(path("/ledger/payments/boletos"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = SettlementClient::new(config(server.uri(), format!("{}/oauth/token", server.uri())));

    for _ in 0..2 {
        let result = client.check_boleto(&barcode).await;
        assert!(matches!(result, Err(SettlementError::Upstream(503))));
    }

    let result = client.check_boleto(&barcode).await;
    assert!(matches!(result, Err(SettlementError::CircuitOpen)));
}
