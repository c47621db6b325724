// [libs/settlement-client/src/token_cache.rs]
//! `getAccessToken()` (§4.H): returns the cached token while it is still
//! valid, otherwise refreshes. The whole "check, maybe refresh" critical
//! section runs under a single `tokio::sync::Mutex`, so concurrent callers
//! racing a refresh coalesce onto the same round trip instead of each
//! firing their own — the later callers simply block until the first
//! finishes and then observe the fresh token already cached (single-flight
//! refresh, §11's ambient stack note on async boundaries).

use crate::errors::SettlementError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, instrument};

/// Seconds subtracted from `expires_in` so a token is treated as expired
/// slightly before the upstream actually invalidates it, absorbing clock
/// skew and in-flight request latency.
const EXPIRY_SKEW_SECONDS: i64 = 30;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClientCredentialsRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshTokenRequest<'a> {
    grant_type: &'a str,
    refresh_token: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

pub struct TokenCache {
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(token_url: String, client_id: String, client_secret: String) -> Self {
        Self { token_url, client_id, client_secret, cached: Mutex::new(None) }
    }

    #[instrument(skip(self, http))]
    pub async fn get_access_token(&self, http: &Client) -> Result<String, SettlementError> {
        let mut guard = self.cached.lock().await;

        if let Some(token) = guard.as_ref() {
            if token.is_valid() {
                return Ok(token.access_token.clone());
            }
        }

        let refresh_token = guard.as_ref().and_then(|t| t.refresh_token.clone());
        let refreshed = match refresh_token {
            Some(refresh_token) => match self.refresh(http, &refresh_token).await {
                Ok(token) => token,
                Err(_) => self.authenticate(http).await?,
            },
            None => self.authenticate(http).await?,
        };

        let access_token = refreshed.access_token.clone();
        *guard = Some(refreshed);
        Ok(access_token)
    }

    /// Invalidates the cache unconditionally — called after a 401 so the
    /// retried request is forced to re-authenticate (§4.H's "invalidates
    /// the cache and retries exactly once").
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn authenticate(&self, http: &Client) -> Result<CachedToken, SettlementError> {
        info!("cnab-settlement-client: authenticating via client_credentials");
        let body = ClientCredentialsRequest {
            grant_type: "client_credentials",
            client_id: &self.client_id,
            client_secret: &self.client_secret,
        };
        let response = http.post(&self.token_url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(SettlementError::Authentication(format!("HTTP {}", response.status())));
        }
        let parsed: TokenResponse = response.json().await?;
        Ok(Self::to_cached(parsed))
    }

    async fn refresh(&self, http: &Client, refresh_token: &str) -> Result<CachedToken, SettlementError> {
        let body = RefreshTokenRequest {
            grant_type: "refresh_token",
            refresh_token,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
        };
        let response = http.post(&self.token_url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(SettlementError::Authentication(format!("HTTP {}", response.status())));
        }
        let parsed: TokenResponse = response.json().await?;
        Ok(Self::to_cached(parsed))
    }

    fn to_cached(response: TokenResponse) -> CachedToken {
        CachedToken {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now() + ChronoDuration::seconds((response.expires_in - EXPIRY_SKEW_SECONDS).max(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_token_expires_before_its_nominal_lifetime() {
        let token = CachedToken {
            access_token: "tok".into(),
            refresh_token: None,
            expires_at: Utc::now() + ChronoDuration::seconds(5),
        };
        assert!(token.is_valid());
        let expired = CachedToken {
            access_token: "tok".into(),
            refresh_token: None,
            expires_at: Utc::now() - ChronoDuration::seconds(1),
        };
        assert!(!expired.is_valid());
    }
}
