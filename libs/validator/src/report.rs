//! The validator's output contract (§4.E): `{valid, errors, warnings,
//! statistics}` plus a `[0, 100]` score.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueCategory {
    Structural,
    Field,
    Integrity,
    Business,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub category: IssueCategory,
    pub code: String,
    pub message: String,
    pub line: Option<usize>,
    pub field: Option<String>,
}

impl ValidationIssue {
    pub fn new(category: IssueCategory, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category,
            code: code.into(),
            message: message.into(),
            line: None,
            field: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn at_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationStatistics {
    pub total_records: i64,
    pub total_batches: Option<i64>,
    pub computed_valor_total: Decimal,
    pub declared_valor_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub statistics: ValidationStatistics,
    /// `100 - (100 * errors / max(1, total_records))`, clamped to `[0, 100]`.
    pub score: u8,
}

impl ValidationReport {
    pub fn build(mut errors: Vec<ValidationIssue>, mut warnings: Vec<ValidationIssue>, statistics: ValidationStatistics) -> Self {
        errors.sort_by(|a, b| a.line.cmp(&b.line));
        warnings.sort_by(|a, b| a.line.cmp(&b.line));
        let total_records = statistics.total_records.max(1);
        let raw_score = 100 - (100 * errors.len() as i64 / total_records);
        let score = raw_score.clamp(0, 100) as u8;
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
            statistics,
            score,
        }
    }
}
