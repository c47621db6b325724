//! Ingest-time configuration passed into the orchestrator.
//!
//! `spec.md` §9 calls out the source's string-keyed option bag
//! (`opcoes.forceReprocess`, ...) as a pattern to retire; `IngestOptions` is
//! the enumerated replacement with the recognized keys from §6.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    Cnab240,
    Cnab400,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Cnab240 => "CNAB_240",
            Dialect::Cnab400 => "CNAB_400",
        }
    }

    pub fn line_width(&self) -> usize {
        match self {
            Dialect::Cnab240 => 240,
            Dialect::Cnab400 => 400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Bypass hash-based dedup and reprocess even if the file was seen before.
    pub force_reprocess: bool,
    /// `true` (default): auto-detect the dialect. `false`: skip the
    /// detector and parse as `formato`, which must then be `Some`.
    pub detectar_formato: bool,
    /// Explicit dialect, required when `detectar_formato` is `false`.
    pub formato: Option<Dialect>,
    /// Overrides the configured default webhook destination for this ingest.
    pub webhook_url: Option<String>,
    /// Whether to run the validator and include its report in the response.
    pub include_validation: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            force_reprocess: false,
            detectar_formato: true,
            formato: None,
            webhook_url: None,
            include_validation: true,
        }
    }
}
