//! Payable items extracted from a parsed tree (§3, §4.F).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeTipo {
    Titulo,
    Tributo,
    Outro,
}

impl BarcodeTipo {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeTipo::Titulo => "titulo",
            BarcodeTipo::Tributo => "tributo",
            BarcodeTipo::Outro => "outro",
        }
    }

    /// The digit-only length a valid barcode of this kind must have
    /// (§3: 44 for títulos, 48 for tributos). `Outro` has no fixed length.
    pub fn expected_digit_length(&self) -> Option<usize> {
        match self {
            BarcodeTipo::Titulo => Some(44),
            BarcodeTipo::Tributo => Some(48),
            BarcodeTipo::Outro => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeSegmento {
    J,
    O,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeStatus {
    Extracted,
    Validated,
    Processed,
    Sent,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barcode {
    pub codigo_barras: String,
    pub tipo: BarcodeTipo,
    pub segmento: BarcodeSegmento,
    pub favorecido: Option<String>,
    pub pagador: Option<String>,
    pub valor: Decimal,
    pub data_vencimento: Option<NaiveDate>,
    pub data_pagamento: Option<NaiveDate>,
    pub status: BarcodeStatus,
    /// The 1-digit check digit already embedded in a título barcode
    /// (position 4, 0-based), extracted but never independently verified
    /// (see SPEC_FULL.md §12).
    pub check_digit: Option<char>,
    pub observacao: Option<String>,
}

impl Barcode {
    /// Counts only ASCII digits, ignoring any separators a raw source field
    /// might still carry (line digitável formatting dots/spaces).
    pub fn digit_count(raw: &str) -> usize {
        raw.chars().filter(|c| c.is_ascii_digit()).count()
    }

    pub fn digits_only(raw: &str) -> String {
        raw.chars().filter(|c| c.is_ascii_digit()).collect()
    }
}
