// [libs/detector/src/lib.rs]
//! Line-width heuristic dialect detector (§4.B).
//!
//! Classification never inspects field content — only the distribution of
//! line lengths once newlines are normalized. This keeps detection correct
//! even for files whose bank-specific segment layouts the parser doesn't
//! yet recognize.

pub mod errors;

pub use errors::DetectionError;

use cnab_domain::Dialect;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionReport {
    pub format: Dialect,
    /// `0..=100`.
    pub confidence: u8,
    /// Line length -> occurrence count.
    pub histogram: BTreeMap<usize, usize>,
    pub total_lines: usize,
    pub low_confidence: bool,
}

const CONFIDENCE_LOW_WATERMARK: u8 = 80;

/// Splits on `\n`, normalizing `\r\n` and bare `\r` first, then drops empty
/// lines. `spec.md` §9 calls out that the source tests emptiness before and
/// after normalization inconsistently between dialects; this function
/// always normalizes first, then filters.
pub fn normalize_lines(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    normalized
        .split('\n')
        .map(|line| line.to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

pub fn detect(bytes: &[u8]) -> Result<DetectionReport, DetectionError> {
    let lines = normalize_lines(bytes);
    if lines.is_empty() {
        return Err(DetectionError::EmptyContent);
    }

    let mut histogram: BTreeMap<usize, usize> = BTreeMap::new();
    for line in &lines {
        *histogram.entry(line.len()).or_insert(0) += 1;
    }

    let total_lines = lines.len();
    let modal_length = pick_modal_length(&histogram);

    let format = match modal_length {
        240 => Dialect::Cnab240,
        400 => Dialect::Cnab400,
        other => return Err(DetectionError::UnknownFormat { modal_length: other }),
    };

    let modal_count = histogram[&modal_length];
    let distinct_lengths = histogram.len();
    let base_confidence = (100 * modal_count / total_lines) as i32;
    let penalty = 5 * distinct_lengths.saturating_sub(2) as i32;
    let confidence = (base_confidence - penalty).clamp(0, 100) as u8;

    Ok(DetectionReport {
        format,
        confidence,
        low_confidence: confidence < CONFIDENCE_LOW_WATERMARK,
        histogram,
        total_lines,
    })
}

/// Picks the length with the highest occurrence count. Ties are broken in
/// favor of a supported dialect width, and between the two supported
/// widths, in favor of 240 (§4.B: "240 is the modern standard").
fn pick_modal_length(histogram: &BTreeMap<usize, usize>) -> usize {
    let max_count = *histogram.values().max().expect("histogram is non-empty");
    let tied: Vec<usize> = histogram
        .iter()
        .filter(|(_, count)| **count == max_count)
        .map(|(len, _)| *len)
        .collect();

    if tied.len() == 1 {
        return tied[0];
    }
    if tied.contains(&240) {
        return 240;
    }
    if tied.contains(&400) {
        return 400;
    }
    tied[0]
}
