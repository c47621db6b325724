// [libs/webhook/src/client.rs]
//! `send(payload, url) -> {delivered, attempts, response?, error?}` (§4.I):
//! up to `retry_attempts` POSTs with progressive linear backoff
//! (`retry_delay * k` between attempt `k` and `k+1`), headers identifying
//! the product (`User-Agent`), the source, version, attempt number
//! (`X-Tentativa`) and operation id.

use crate::errors::{WebhookError, WebhookErrorKind};
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub source: String,
    pub version: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(10),
            source: "cnab-ingest-core".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Why delivery was never attempted — §12's "graceful webhook
/// disablement surfacing": `disabled` and `no URL configured` are distinct
/// operator-facing conditions, not collapsed into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    NoUrlConfigured,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Disabled => "disabled",
            SkipReason::NoUrlConfigured => "no_url_configured",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub delivered: bool,
    pub attempts: u32,
    pub response: Option<Value>,
    pub error: Option<WebhookError>,
    pub skip_reason: Option<SkipReason>,
}

impl DeliveryReport {
    fn skipped(reason: SkipReason) -> Self {
        Self { delivered: false, attempts: 0, response: None, error: None, skip_reason: Some(reason) }
    }
}

pub struct WebhookClient {
    http: Client,
    config: WebhookConfig,
}

impl WebhookClient {
    pub fn new(config: WebhookConfig) -> Self {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("webhook HTTP client must build with a static configuration");
        Self { http, config }
    }

    /// `url_override` is the per-ingest `webhookUrl` option (§6): when set,
    /// it replaces the configured default destination for this call only.
    #[instrument(skip(self, payload))]
    pub async fn send<T: Serialize>(&self, payload: &T, operation_id: Uuid, url_override: Option<&str>) -> DeliveryReport {
        if !self.config.enabled {
            return DeliveryReport::skipped(SkipReason::Disabled);
        }
        let Some(url) = url_override.or(self.config.url.as_deref()) else {
            return DeliveryReport::skipped(SkipReason::NoUrlConfigured);
        };

        let body = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                return DeliveryReport {
                    delivered: false,
                    attempts: 0,
                    response: None,
                    error: Some(WebhookError::new(WebhookErrorKind::Other, e.to_string())),
                    skip_reason: None,
                }
            }
        };

        let started = Instant::now();
        let mut last_error = None;

        for attempt in 1..=self.config.retry_attempts.max(1) {
            let attempt_body = with_attempt_metadata(body.clone(), attempt);
            match self.attempt(url, &attempt_body, attempt, operation_id).await {
                Ok(response) => {
                    info!(%operation_id, attempt, elapsed_ms = started.elapsed().as_millis() as u64, "cnab-webhook: delivered");
                    return DeliveryReport { delivered: true, attempts: attempt, response: Some(response), error: None, skip_reason: None };
                }
                Err(error) => {
                    warn!(%operation_id, attempt, kind = error.kind.as_str(), "cnab-webhook: attempt failed");
                    last_error = Some(error);
                    if attempt < self.config.retry_attempts {
                        tokio::time::sleep(self.config.retry_delay * attempt).await;
                    }
                }
            }
        }

        DeliveryReport {
            delivered: false,
            attempts: self.config.retry_attempts.max(1),
            response: None,
            error: last_error,
            skip_reason: None,
        }
    }

    async fn attempt(&self, url: &str, body: &Value, attempt: u32, operation_id: Uuid) -> Result<Value, WebhookError> {
        let response = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .header("User-Agent", format!("{}/{}", self.config.source, self.config.version))
            .header("X-Webhook-Source", self.config.source.as_str())
            .header("X-Webhook-Version", self.config.version.as_str())
            .header("X-Tentativa", attempt.to_string())
            .header("X-Operation-Id", operation_id.to_string())
            .json(body)
            .send()
            .await
            .map_err(|e| WebhookError::new(WebhookErrorKind::from_transport_error(&e), e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(WebhookError::new(WebhookErrorKind::Auth, format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(WebhookError::new(WebhookErrorKind::from_status(status), format!("HTTP {status}")));
        }

        response
            .json::<Value>()
            .await
            .or_else(|_| Ok(Value::Null))
    }
}

/// Stamps `metadados.webhook: {tentativaEnvio, timestamp}` (§6's outgoing
/// request contract) onto `body` for one specific attempt, creating
/// `metadados` if the caller's payload didn't already have one. Done per
/// attempt rather than once so a retried delivery's body always reflects
/// the attempt it is actually carried on.
fn with_attempt_metadata(mut body: Value, attempt: u32) -> Value {
    if let Some(root) = body.as_object_mut() {
        let metadados = root.entry("metadados").or_insert_with(|| json!({}));
        if let Some(metadados) = metadados.as_object_mut() {
            metadados.insert(
                "webhook".to_string(),
                json!({
                    "tentativaEnvio": attempt,
                    "timestamp": Utc::now().to_rfc3339(),
                }),
            );
        }
    }
    body
}
