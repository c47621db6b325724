//! CNAB-400 parser: the flat header -> details -> trailer tree (§3, §4.D).
//!
//! Unlike CNAB-240, there is no record-type state machine to drive: a
//! well-formed file is exactly "line 1 is the header, the last line is the
//! trailer, everything between is a detail" (§4.D). A file with fewer than
//! two lines can't hold both, so that case is the one structurally
//! unparseable error this crate returns; every other irregularity —
//! including a line whose width doesn't match the dialect's 400 bytes —
//! becomes a diagnostic and parsing continues.

pub mod errors;
pub mod layout;
pub mod records;

pub use errors::Cnab400ParseError;
pub use layout::BankLayoutRegistry400;

use cnab_codec::string;
use cnab_domain::{Cnab400File, Diagnostic, ParseOutcome};
use records::{decode_header, decode_record, decode_trailer};

const EXPECTED_WIDTH: usize = 400;

pub fn parse(bytes: &[u8]) -> Result<ParseOutcome<Cnab400File>, Cnab400ParseError> {
    parse_with_registry(bytes, &BankLayoutRegistry400::with_default_banks())
}

#[tracing::instrument(skip(bytes, registry))]
pub fn parse_with_registry(bytes: &[u8], registry: &BankLayoutRegistry400) -> Result<ParseOutcome<Cnab400File>, Cnab400ParseError> {
    let lines = cnab_detector::normalize_lines(bytes);
    if lines.is_empty() {
        return Err(Cnab400ParseError::EmptyInput);
    }
    if lines.len() < 2 {
        return Err(Cnab400ParseError::NoFileHeader);
    }

    let mut diagnostics = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.len() != EXPECTED_WIDTH {
            diagnostics.push(
                Diagnostic::warning(
                    "LINHA_LARGURA_DIVERGENTE",
                    format!("expected {EXPECTED_WIDTH}-byte lines, got {}", line.len()),
                )
                .at_line(idx + 1),
            );
        }
    }

    let header = decode_header(&lines[0], &mut diagnostics);
    let bank_code = string(&lines[0], 0, 3);

    let trailer_idx = lines.len() - 1;
    let mut records = Vec::with_capacity(trailer_idx.saturating_sub(1));
    for (idx, line) in lines[1..trailer_idx].iter().enumerate() {
        let line_number = idx + 2;
        records.push(decode_record(line, line_number, &bank_code, registry, &mut diagnostics));
    }
    let trailer = decode_trailer(&lines[trailer_idx], &mut diagnostics);

    if trailer.total_registros != records.len() as i64 {
        diagnostics.push(Diagnostic::warning(
            "TOTAL_REGISTROS_DIVERGENTE",
            format!("trailer declares {} records but {} were parsed", trailer.total_registros, records.len()),
        ));
    }

    let file = Cnab400File { header, records, trailer };
    let computed = file.computed_valor_total();
    if computed != file.trailer.valor_total {
        diagnostics.push(Diagnostic::warning(
            "VALOR_TOTAL_DIVERGENTE",
            format!("trailer declares {} but computed total is {computed}", file.trailer.valor_total),
        ));
    }

    Ok(ParseOutcome::new(file, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: usize) -> String {
        " ".repeat(width)
    }

    fn zpad(s: &str, width: usize) -> String {
        assert!(s.len() <= width);
        format!("{}{}", "0".repeat(width - s.len()), s)
    }

    fn header_line() -> String {
        let mut s = blank(400);
        s.replace_range(0..3, "341");
        s
    }

    fn detail_line(valor_centavos: i64) -> String {
        let mut s = blank(400);
        s.replace_range(0..3, "341");
        s.replace_range(90..103, &zpad(&valor_centavos.to_string(), 13));
        s
    }

    fn trailer_line(total_registros: i64, valor_centavos: i64) -> String {
        let mut s = blank(400);
        s.replace_range(1..7, &zpad(&total_registros.to_string(), 6));
        s.replace_range(7..20, &zpad(&valor_centavos.to_string(), 13));
        s
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(parse(b"").unwrap_err(), Cnab400ParseError::EmptyInput);
    }

    #[test]
    fn single_line_cannot_hold_header_and_trailer() {
        assert_eq!(parse(header_line().as_bytes()).unwrap_err(), Cnab400ParseError::NoFileHeader);
    }

    #[test]
    fn two_records_matching_the_spec_scenario_sum_correctly() {
        let lines = vec![header_line(), detail_line(10_050), detail_line(10_050), trailer_line(2, 20_100)];
        let content = lines.join("\n");
        let outcome = parse(content.as_bytes()).expect("well-formed input parses");
        assert!(!outcome.has_errors());
        assert_eq!(outcome.tree.records.len(), 2);
        assert_eq!(outcome.tree.computed_valor_total().to_string(), "201.00");
    }

    #[test]
    fn mismatched_record_count_is_a_diagnostic() {
        let lines = vec![header_line(), detail_line(10_050), trailer_line(2, 10_050)];
        let content = lines.join("\n");
        let outcome = parse(content.as_bytes()).expect("still parses");
        assert!(outcome.diagnostics.iter().any(|d| d.code == "TOTAL_REGISTROS_DIVERGENTE"));
    }

    #[test]
    fn unknown_bank_warns_but_still_decodes() {
        let mut lines = vec![header_line(), detail_line(5_000), trailer_line(1, 5_000)];
        lines[0].replace_range(0..3, "999");
        lines[1].replace_range(0..3, "999");
        let content = lines.join("\n");
        let outcome = parse(content.as_bytes()).expect("still parses");
        assert!(outcome.diagnostics.iter().any(|d| d.code == "BANK_UNKNOWN"));
    }
}
