// [apps/orchestrator/src/barcode_cache.rs]
//! §5's "Barcode verification cache in the orchestrator (if enabled)":
//! keyed by barcode, entries expire per TTL, a miss triggers exactly one
//! upstream `checkBoleto` even when several callers ask for the same
//! barcode concurrently (single-flight, same shape as the settlement
//! client's own token cache in `cnab_settlement_client::token_cache`, but
//! keyed per barcode instead of holding a single slot).

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use cnab_settlement_client::{BoletoCheck, SettlementClient, SettlementError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

#[derive(Clone)]
struct CachedCheck {
    check: BoletoCheck,
    expires_at: DateTime<Utc>,
}

impl CachedCheck {
    fn is_fresh(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

type Slot = Arc<Mutex<Option<CachedCheck>>>;

pub struct BarcodeVerificationCache {
    ttl: ChronoDuration,
    slots: Mutex<HashMap<String, Slot>>,
}

impl BarcodeVerificationCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self { ttl: ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::seconds(300)), slots: Mutex::new(HashMap::new()) }
    }

    /// Returns the cached result for `barcode` while it is still fresh,
    /// otherwise calls `checkBoleto` exactly once and caches the result.
    /// Holding the per-barcode slot's own lock (rather than the outer map
    /// lock) across the upstream call lets unrelated barcodes proceed
    /// concurrently while concurrent callers of the *same* barcode
    /// coalesce onto one request.
    #[instrument(skip(self, settlement))]
    pub async fn get_or_check(&self, barcode: &str, settlement: &SettlementClient) -> Result<BoletoCheck, SettlementError> {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(barcode.to_string()).or_insert_with(|| Arc::new(Mutex::new(None))).clone()
        };

        let mut guard = slot.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.check.clone());
            }
        }

        let check = settlement.check_boleto(barcode).await?;
        *guard = Some(CachedCheck { check: check.clone(), expires_at: Utc::now() + self.ttl });
        Ok(check)
    }
}
