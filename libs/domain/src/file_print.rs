//! `FilePrint`: the content-addressed identity of an ingested file.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Cnab400,
    Cnab240,
    Unknown,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Cnab400 => "cnab400",
            FileType::Cnab240 => "cnab240",
            FileType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    Valid,
    Invalid,
    Warning,
    Pending,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::Invalid => "invalid",
            ValidationStatus::Warning => "warning",
            ValidationStatus::Pending => "pending",
        }
    }
}

/// Invariant: `file_hash` is globally unique. Enforced by a unique index in
/// `cnab-persistence`, not by this type — this is the in-memory shape only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePrint {
    pub file_hash: String,
    pub operation_id: Uuid,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: FileType,
    pub content_preview: String,
    pub validation_status: ValidationStatus,
    pub validation_details: Option<Value>,
}

/// Builds the `content_preview` field: the first `max_lines` normalized
/// lines, joined with `\n`, truncated — never the raw bytes.
pub fn content_preview(normalized_lines: &[String], max_lines: usize) -> String {
    normalized_lines
        .iter()
        .take(max_lines)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}
