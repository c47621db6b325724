// [apps/orchestrator/src/config.rs]
//! `OrchestratorConfig` loads the environment inputs §6 enumerates
//! (`WEBHOOK_*`, `SWAP_*`, `COMPANY_CNPJ`, the database DSN) once, at
//! startup, via `std::env` — no global mutable state (§9's "no global
//! module state" redesign flag). The CLI loads `.env` with `dotenvy`
//! before constructing this; the library itself never touches `.env`.

use cnab_settlement_client::{PaymentWindow, SettlementClientConfig};
use cnab_webhook::WebhookConfig;
use std::env::{self, VarError};
use std::time::Duration;
use thiserror::Error;

const SWAP_STAGING_BASE_URL: &str = "https://api-stg.swap.com.br";
const SWAP_PRODUCTION_BASE_URL: &str = "https://api.swap.com.br";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG_VARIAVEL_AUSENTE: {0}")]
    Missing(&'static str),

    #[error("CONFIG_VALOR_INVALIDO: {var} = {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug)]
pub struct OrchestratorConfig {
    pub database_dsn: String,
    pub database_auth_token: Option<String>,
    pub company_cnpj: Option<String>,
    pub webhook: WebhookConfig,
    pub settlement: SettlementClientConfig,
    /// TTL for the orchestrator's barcode-verification cache (§5).
    pub barcode_cache_ttl: Duration,
}

impl OrchestratorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_dsn = require_var("DATABASE_URL")?;
        let database_auth_token = optional_var("TURSO_AUTH_TOKEN");
        let company_cnpj = optional_var("COMPANY_CNPJ");

        let webhook_enabled = optional_var("WEBHOOK_ENABLED").map(|v| is_truthy(&v)).unwrap_or(false);
        let webhook_url = optional_var("WEBHOOK_URL").or_else(|| optional_var("WEBHOOK_CNAB_URL"));
        let webhook_retry_attempts = parse_or_default("WEBHOOK_RETRY_ATTEMPTS", 3)?;
        let webhook_retry_delay_ms = parse_or_default("WEBHOOK_RETRY_DELAY", 500)?;
        let webhook_timeout_secs = parse_or_default("WEBHOOK_TIMEOUT", 10)?;

        let webhook = WebhookConfig {
            enabled: webhook_enabled,
            url: webhook_url,
            retry_attempts: webhook_retry_attempts,
            retry_delay: Duration::from_millis(webhook_retry_delay_ms),
            request_timeout: Duration::from_secs(webhook_timeout_secs),
            ..WebhookConfig::default()
        };

        let environment = optional_var("SWAP_ENVIRONMENT").unwrap_or_else(|| "staging".to_string());
        let base_url = match environment.as_str() {
            "production" => SWAP_PRODUCTION_BASE_URL,
            _ => SWAP_STAGING_BASE_URL,
        }
        .to_string();
        let token_url = format!("{base_url}/oauth/token");

        let settlement = SettlementClientConfig {
            base_url,
            token_url,
            client_id: require_var("SWAP_CLIENT_ID")?,
            client_secret: require_var("SWAP_CLIENT_SECRET")?,
            api_key: require_var("SWAP_API_KEY")?,
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
            request_timeout: Duration::from_secs(15),
            payment_window: PaymentWindow::default(),
        };

        let barcode_cache_ttl = Duration::from_secs(parse_or_default("BARCODE_CACHE_TTL_SECONDS", 300)?);

        Ok(Self { database_dsn, database_auth_token, company_cnpj, webhook, settlement, barcode_cache_ttl })
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn optional_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Some(value),
        Ok(_) | Err(VarError::NotPresent) => None,
        Err(VarError::NotUnicode(_)) => None,
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_or_default<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(name) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { var: name, value: raw }),
        None => Ok(default),
    }
}
