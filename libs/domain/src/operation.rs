//! The `Operation` aggregate: one row per ingest, tracked start-to-finish.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    Cnab400,
    Cnab240,
    Auto,
    Validation,
    Webhook,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Cnab400 => "cnab400",
            OperationType::Cnab240 => "cnab240",
            OperationType::Auto => "auto",
            OperationType::Validation => "validation",
            OperationType::Webhook => "webhook",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    Started,
    Processing,
    Success,
    Error,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Started => "started",
            OperationStatus::Processing => "processing",
            OperationStatus::Success => "success",
            OperationStatus::Error => "error",
        }
    }
}

/// Lifecycle: `started` -> `processing` -> (`success` | `error`). Terminal
/// once `success` or `error` is reached; no further transition is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub operation_id: Uuid,
    pub operation_type: OperationType,
    pub status: OperationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processing_time_ms: Option<i64>,
    pub request_data: Value,
    pub response_data: Option<Value>,
    pub error_details: Option<Value>,
}

impl Operation {
    pub fn start(operation_type: OperationType, request_data: Value) -> Self {
        let now = Utc::now();
        Self {
            operation_id: Uuid::new_v4(),
            operation_type,
            status: OperationStatus::Started,
            created_at: now,
            updated_at: now,
            processing_time_ms: None,
            request_data,
            response_data: None,
            error_details: None,
        }
    }

    pub fn mark_processing(&mut self) {
        self.status = OperationStatus::Processing;
        self.updated_at = Utc::now();
    }

    pub fn mark_success(&mut self, response_data: Value) {
        let elapsed = Utc::now() - self.created_at;
        self.status = OperationStatus::Success;
        self.response_data = Some(response_data);
        self.processing_time_ms = Some(elapsed.num_milliseconds().max(0));
        self.updated_at = Utc::now();
    }

    pub fn mark_error(&mut self, error_details: Value) {
        let elapsed = Utc::now() - self.created_at;
        self.status = OperationStatus::Error;
        self.error_details = Some(error_details);
        self.processing_time_ms = Some(elapsed.num_milliseconds().max(0));
        self.updated_at = Utc::now();
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, OperationStatus::Success | OperationStatus::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lifecycle_transitions_set_terminal_fields() {
        let mut op = Operation::start(OperationType::Auto, json!({"fileName": "remessa.txt"}));
        assert_eq!(op.status, OperationStatus::Started);
        assert!(!op.is_terminal());

        op.mark_processing();
        assert_eq!(op.status, OperationStatus::Processing);

        op.mark_success(json!({"totalRegistros": 2}));
        assert_eq!(op.status, OperationStatus::Success);
        assert!(op.is_terminal());
        assert!(op.processing_time_ms.is_some());
    }
}
