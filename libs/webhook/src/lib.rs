// [libs/webhook/src/lib.rs]
//! Outbound webhook dispatcher (§4.I): disabled/no-URL short-circuit,
//! progressive linear backoff retries, and error classification.

pub mod client;
pub mod errors;

pub use client::{DeliveryReport, SkipReason, WebhookClient, WebhookConfig};
pub use errors::{WebhookError, WebhookErrorKind};
