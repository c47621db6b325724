// [libs/codec/src/lib.rs]
//! Pure, total field extraction over fixed-width CNAB lines.
//!
//! Every function here maps `(line, start, end)` to a typed value or a
//! [`CodecError`]; none of them panic and none of them touch I/O. Money
//! never goes through a binary float: `money` divides the extracted
//! integer by `10^scale` using [`rust_decimal::Decimal`], matching §9's
//! "exact decimal everywhere" redesign flag.

pub mod errors;

pub use errors::CodecError;

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Clamps `[start, end)` to the line's byte length. CNAB content is ASCII
/// in practice (§6), so byte offsets double as character offsets.
fn slice(line: &str, start: usize, end: usize) -> Result<&str, CodecError> {
    let len = line.len();
    if start > len || end > len || start > end {
        return Err(CodecError::OutOfRange {
            start,
            end,
            line_len: len,
        });
    }
    Ok(&line[start..end])
}

/// Trims trailing (and leading) ASCII spaces. Never errors: an empty or
/// out-of-range slice simply yields an empty string.
pub fn string(line: &str, start: usize, end: usize) -> String {
    slice(line, start, end).unwrap_or("").trim().to_string()
}

/// Leading zeros are permitted; an empty or all-space field is `0`;
/// anything containing a non-digit is `CodecError::NotNumeric`.
pub fn int(line: &str, start: usize, end: usize) -> Result<i64, CodecError> {
    let raw = slice(line, start, end)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::NotNumeric(raw.to_string()));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| CodecError::NotNumeric(raw.to_string()))
}

/// `integer_value / 10^scale`, built from the parsed integer cents — never
/// `str::parse::<f64>()`.
pub fn money(line: &str, start: usize, end: usize, scale: u32) -> Result<Decimal, CodecError> {
    let cents = int(line, start, end)?;
    Ok(cents_to_decimal(cents, scale))
}

/// Shared by the codec and the extractor/persister so every money value in
/// the pipeline goes through the same conversion.
pub fn cents_to_decimal(integer_value: i64, scale: u32) -> Decimal {
    Decimal::new(integer_value, scale)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateField {
    pub value: Option<NaiveDate>,
    /// Set when the slice was numeric but not a calendar date, or non-numeric.
    pub warning: Option<&'static str>,
}

impl DateField {
    fn null() -> Self {
        Self {
            value: None,
            warning: None,
        }
    }

    fn invalid() -> Self {
        Self {
            value: None,
            warning: Some("CAMPO_DATA_INVALIDO"),
        }
    }
}

/// `DDMMYY`, CNAB-400 era. `century_pivot` (default 50 per `spec.md` §4.A):
/// years `<= pivot` map to `2000 + yy`, else `1900 + yy`. `000000` is the
/// dialect's "unset" marker and maps to `None` with no warning.
pub fn date6(line: &str, start: usize, end: usize, century_pivot: u32) -> DateField {
    let raw = match slice(line, start, end) {
        Ok(s) => s,
        Err(_) => return DateField::invalid(),
    };
    if raw.trim().is_empty() || raw.bytes().all(|b| b == b'0') {
        return DateField::null();
    }
    if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return DateField::invalid();
    }
    let day: u32 = raw[0..2].parse().unwrap_or(0);
    let month: u32 = raw[2..4].parse().unwrap_or(0);
    let yy: u32 = raw[4..6].parse().unwrap_or(0);
    let year = if yy <= century_pivot { 2000 + yy } else { 1900 + yy };
    match NaiveDate::from_ymd_opt(year as i32, month, day) {
        Some(date) => DateField {
            value: Some(date),
            warning: None,
        },
        None => DateField::invalid(),
    }
}

/// `DDMMYYYY`, CNAB-240 era. `00000000` maps to `None`, no warning.
pub fn date8(line: &str, start: usize, end: usize) -> DateField {
    let raw = match slice(line, start, end) {
        Ok(s) => s,
        Err(_) => return DateField::invalid(),
    };
    if raw.trim().is_empty() || raw.bytes().all(|b| b == b'0') {
        return DateField::null();
    }
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return DateField::invalid();
    }
    let day: u32 = raw[0..2].parse().unwrap_or(0);
    let month: u32 = raw[2..4].parse().unwrap_or(0);
    let year: u32 = raw[4..8].parse().unwrap_or(0);
    match NaiveDate::from_ymd_opt(year as i32, month, day) {
        Some(date) => DateField {
            value: Some(date),
            warning: None,
        },
        None => DateField::invalid(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_trims_trailing_spaces() {
        assert_eq!(string("JOAO DA SILVA   ", 0, 16), "JOAO DA SILVA");
    }

    #[test]
    fn int_allows_leading_zeros_and_blank() {
        assert_eq!(int("00042", 0, 5), Ok(42));
        assert_eq!(int("     ", 0, 5), Ok(0));
    }

    #[test]
    fn int_rejects_non_digit() {
        assert!(matches!(int("12A45", 0, 5), Err(CodecError::NotNumeric(_))));
    }

    #[test]
    fn money_never_floats_and_divides_by_scale() {
        let v = money("0000000010050", 0, 13, 2).unwrap();
        assert_eq!(v, Decimal::new(10050, 2));
        assert_eq!(v.to_string(), "100.50");
    }

    #[test]
    fn date6_unset_is_null_without_warning() {
        let d = date6("000000", 0, 6, 50);
        assert_eq!(d.value, None);
        assert_eq!(d.warning, None);
    }

    #[test]
    fn date6_pivot_splits_century() {
        let recent = date6("010124", 0, 6, 50); // 2024
        assert_eq!(recent.value, NaiveDate::from_ymd_opt(2024, 1, 1));
        let legacy = date6("010199", 0, 6, 50); // 1999
        assert_eq!(legacy.value, NaiveDate::from_ymd_opt(1999, 1, 1));
    }

    #[test]
    fn date6_invalid_calendar_date_is_null_with_warning() {
        let d = date6("321399", 0, 6, 50);
        assert_eq!(d.value, None);
        assert!(d.warning.is_some());
    }

    #[test]
    fn date8_unset_is_null_without_warning() {
        let d = date8("00000000", 0, 8);
        assert_eq!(d.value, None);
        assert_eq!(d.warning, None);
    }

    #[test]
    fn date8_valid() {
        let d = date8("25122026", 0, 8);
        assert_eq!(d.value, NaiveDate::from_ymd_opt(2026, 12, 25));
    }

    #[test]
    fn out_of_range_slice_is_reported_not_panicked() {
        assert!(int("123", 0, 10).is_err());
        assert_eq!(string("123", 0, 10), "");
    }
}
