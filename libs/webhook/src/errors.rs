// [libs/webhook/src/errors.rs]
use thiserror::Error;

/// §4.I's error classification: timeout, network, auth, upstream, other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookErrorKind {
    Timeout,
    Network,
    Auth,
    Upstream,
    Other,
}

impl WebhookErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookErrorKind::Timeout => "timeout",
            WebhookErrorKind::Network => "network",
            WebhookErrorKind::Auth => "auth",
            WebhookErrorKind::Upstream => "upstream",
            WebhookErrorKind::Other => "other",
        }
    }

    /// Classifies a terminal `reqwest::Error` (§4.I: `ECONNABORTED` ->
    /// timeout, `ENOTFOUND`/`ECONNREFUSED` -> network, everything else
    /// that never reached a response -> network as the closest fit).
    pub fn from_transport_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            WebhookErrorKind::Timeout
        } else if error.is_connect() {
            WebhookErrorKind::Network
        } else {
            WebhookErrorKind::Other
        }
    }

    /// Classifies a received HTTP status (401 -> auth, >=500 -> upstream,
    /// >=400 -> other).
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        if status.as_u16() == 401 {
            WebhookErrorKind::Auth
        } else if status.is_server_error() {
            WebhookErrorKind::Upstream
        } else {
            WebhookErrorKind::Other
        }
    }
}

#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct WebhookError {
    pub kind: WebhookErrorKind,
    pub message: String,
}

impl WebhookError {
    pub fn new(kind: WebhookErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}
