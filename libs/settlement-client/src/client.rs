// [libs/settlement-client/src/client.rs]
//! `SettlementClient`: the boleto settlement API boundary (§4.H). Wraps
//! token acquisition, the circuit breaker, and the two domain operations
//! (`check_boleto`, `pay_boleto`) the orchestrator calls.

use crate::circuit_breaker::{Admission, CircuitBreaker};
use crate::errors::SettlementError;
use crate::token_cache::TokenCache;
use chrono::{Local, NaiveDate, NaiveTime};
use reqwest::{Client, Method, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{instrument, warn};

/// Local HH:MM window within which a boleto may be paid today (§4.H,
/// e.g. 07:00-23:00).
#[derive(Debug, Clone, Copy)]
pub struct PaymentWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for PaymentWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(7, 0, 0).expect("valid time"),
            end: NaiveTime::from_hms_opt(23, 0, 0).expect("valid time"),
        }
    }
}

impl PaymentWindow {
    fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time <= self.end
    }
}

#[derive(Debug)]
pub struct SettlementClientConfig {
    pub base_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub api_key: String,
    pub failure_threshold: u32,
    pub cooldown: Duration,
    pub request_timeout: Duration,
    pub payment_window: PaymentWindow,
}

pub struct SettlementClient {
    http: Client,
    base_url: String,
    api_key: String,
    tokens: TokenCache,
    circuit: CircuitBreaker,
    payment_window: PaymentWindow,
}

#[derive(Debug, Deserialize)]
struct CheckBoletoResponse {
    #[serde(default)]
    id: Option<String>,
    due_date: NaiveDate,
    /// Wire amount is integer cents (§6); never deserialized as a float.
    amount: i64,
}

/// Result of `check_boleto`, enriched with the two derived flags §4.H
/// requires beyond the raw upstream payload. `amount` is carried both as
/// the upstream's integer cents (round-tripped verbatim into `pay_boleto`)
/// and as the rendered exact decimal (§9: "sums use integer cents
/// internally and only render as decimal at the boundary").
#[derive(Debug, Clone, Serialize)]
pub struct BoletoCheck {
    pub id: Option<String>,
    pub due_date: NaiveDate,
    pub amount_cents: i64,
    pub amount: Decimal,
    pub can_pay_today: bool,
    pub is_in_payment_window: bool,
}

#[derive(Debug, Serialize)]
struct PayBoletoRequest<'a> {
    amount: i64,
    document: Option<&'a str>,
    account_id: &'a str,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentResult {
    pub payment_id: String,
    pub status: String,
}

impl SettlementClient {
    pub fn new(config: SettlementClientConfig) -> Self {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("settlement HTTP client must build with a static configuration");
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            tokens: TokenCache::new(config.token_url, config.client_id, config.client_secret),
            circuit: CircuitBreaker::new(config.failure_threshold, config.cooldown),
            payment_window: config.payment_window,
        }
    }

    /// §4.H: digits only, length 47 or 48 — checked before any network call.
    fn validate_barcode_format(barcode: &str) -> Result<(), SettlementError> {
        let all_digits = !barcode.is_empty() && barcode.chars().all(|c| c.is_ascii_digit());
        if all_digits && matches!(barcode.len(), 47 | 48) {
            Ok(())
        } else {
            Err(SettlementError::InvalidFormat)
        }
    }

    #[instrument(skip(self))]
    pub async fn check_boleto(&self, barcode: &str) -> Result<BoletoCheck, SettlementError> {
        Self::validate_barcode_format(barcode)?;
        let body = serde_json::json!({ "barcode": barcode });
        let response: CheckBoletoResponse = self
            .authenticated_request(Method::POST, "/ledger/payments/boletos", Some(body))
            .await?;

        let today = Local::now().date_naive();
        let now_time = Local::now().time();
        Ok(BoletoCheck {
            id: response.id,
            due_date: response.due_date,
            amount_cents: response.amount,
            amount: Decimal::new(response.amount, 2),
            can_pay_today: response.due_date >= today,
            is_in_payment_window: self.payment_window.contains(now_time),
        })
    }

    #[instrument(skip(self, document))]
    pub async fn pay_boleto(&self, barcode: &str, document: Option<&str>) -> Result<PaymentResult, SettlementError> {
        let checked = self.check_boleto(barcode).await?;
        let id = checked.id.ok_or(SettlementError::MissingPaymentId)?;

        let path = format!("/ledger/payments/boletos/{id}/pay");
        let body = PayBoletoRequest { amount: checked.amount_cents, document, account_id: &id };
        self.authenticated_request(Method::POST, &path, Some(serde_json::to_value(body).expect("request body serializes")))
            .await
    }

    /// `authenticatedRequest` (§4.H): attaches the bearer token and api-key
    /// header; on 401, invalidates the cache and retries exactly once.
    /// Every attempt passes through the circuit breaker first.
    async fn authenticated_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, SettlementError> {
        match self.try_request(method.clone(), path, body.clone(), false).await {
            Ok(value) => Ok(value),
            Err(SettlementError::Authentication(_)) => {
                self.tokens.invalidate().await;
                self.try_request(method, path, body, false).await
            }
            Err(err) => Err(err),
        }
    }

    async fn try_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        _retry: bool,
    ) -> Result<T, SettlementError> {
        let admission = self.circuit.admit();
        if admission == Admission::Deny {
            return Err(SettlementError::CircuitOpen);
        }
        let was_probe = admission == Admission::AllowAsProbe;

        let result = self.send(method, path, body).await;
        match &result {
            Ok(_) => self.circuit.record_success(was_probe),
            Err(SettlementError::Upstream(_)) | Err(SettlementError::Request(_)) => self.circuit.record_failure(was_probe),
            Err(_) => {
                if was_probe {
                    self.circuit.record_failure(was_probe);
                }
            }
        }
        result
    }

    async fn send<T: for<'de> Deserialize<'de>>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, SettlementError> {
        let token = self.tokens.get_access_token(&self.http).await?;
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(token)
            .header("api-key", self.api_key.as_str());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(SettlementError::Authentication("401 from upstream".to_string()));
        }
        if status.is_server_error() {
            warn!(%status, "cnab-settlement-client: upstream server error");
            return Err(SettlementError::Upstream(status.as_u16()));
        }
        if !status.is_success() {
            return Err(SettlementError::ClientError(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(SettlementError::EmptyResponse);
        }
        serde_json::from_slice(&bytes).map_err(SettlementError::Deserialization)
    }
}
