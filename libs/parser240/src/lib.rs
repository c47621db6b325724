//! CNAB-240 parser: assembles the fixed-width line stream into the
//! file -> batch -> segment tree (§3, §4.C).
//!
//! The formal state table in §4.C keys transitions on the record-type digit
//! at byte 7. This implementation dispatches the same way: each record type
//! has one handler, and ordering violations (a detail before any batch
//! header, a second file header, …) are recorded as diagnostics on the
//! current line rather than aborting the scan. Only the two cases §7 calls
//! structurally unparseable — no content at all, and content that never
//! contains a file header — come back as `Err`.

pub mod errors;
pub mod layout;
pub mod records;
pub mod segments;

pub use errors::Cnab240ParseError;
pub use layout::BankLayoutRegistry;

use cnab_codec::string;
use cnab_domain::{Batch, Cnab240BatchHeader, Cnab240File, Cnab240FileHeader, Detail, Diagnostic, ParseOutcome, SegmentPayload};
use records::{decode_batch_header, decode_batch_trailer, decode_file_header, decode_file_trailer};
use segments::{decode_raw, decode_segment_a, decode_segment_b, decode_segment_j, decode_segment_o};

/// Byte offset of the record-type digit (`0`/`1`/`3`/`5`/`9`) shared by all
/// CNAB-240 line kinds.
const RECORD_TYPE_POS: (usize, usize) = (7, 8);
/// Byte offset of the segment letter within a detail (`3`) record.
const SEGMENT_LETTER_POS: (usize, usize) = (13, 14);

pub fn parse(bytes: &[u8]) -> Result<ParseOutcome<Cnab240File>, Cnab240ParseError> {
    parse_with_registry(bytes, &BankLayoutRegistry::with_default_banks())
}

#[tracing::instrument(skip(bytes, registry))]
pub fn parse_with_registry(bytes: &[u8], registry: &BankLayoutRegistry) -> Result<ParseOutcome<Cnab240File>, Cnab240ParseError> {
    let lines = cnab_detector::normalize_lines(bytes);
    if lines.is_empty() {
        return Err(Cnab240ParseError::EmptyInput);
    }

    let mut assembler = Assembler::new();
    for (idx, line) in lines.iter().enumerate() {
        assembler.accept_line(line, idx + 1, registry);
    }
    assembler.finish()
}

/// Holds the in-progress tree and the currently-open batch, if any, across
/// the single left-to-right pass over the input lines.
struct Assembler {
    diagnostics: Vec<Diagnostic>,
    file_header: Option<Cnab240FileHeader>,
    file_trailer_declared: Option<(i64, i64)>,
    batches: Vec<Batch>,
    open_batch: Option<OpenBatch>,
    trailer_seen: bool,
}

struct OpenBatch {
    header: Cnab240BatchHeader,
    details: Vec<Detail>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            file_header: None,
            file_trailer_declared: None,
            batches: Vec::new(),
            open_batch: None,
            trailer_seen: false,
        }
    }

    fn accept_line(&mut self, line: &str, line_number: usize, registry: &BankLayoutRegistry) {
        if line.len() < SEGMENT_LETTER_POS.1 {
            self.diagnostics.push(
                Diagnostic::error("LINHA_CURTA", format!("line has {} bytes, expected 240", line.len())).at_line(line_number),
            );
            return;
        }

        if self.trailer_seen {
            self.diagnostics
                .push(Diagnostic::warning("LINHA_APOS_TRAILER", "content found after the file trailer; ignored").at_line(line_number));
            return;
        }

        let record_type = string(line, RECORD_TYPE_POS.0, RECORD_TYPE_POS.1);
        match record_type.as_str() {
            "0" => self.handle_file_header(line, line_number),
            "1" => self.handle_batch_header(line, line_number),
            "3" => self.handle_detail(line, line_number, registry),
            "5" => self.handle_batch_trailer(line, line_number),
            "9" => self.handle_file_trailer(line, line_number),
            other => self
                .diagnostics
                .push(Diagnostic::warning("TIPO_REGISTRO_DESCONHECIDO", format!("unrecognized record type {other:?}")).at_line(line_number)),
        }
    }

    fn handle_file_header(&mut self, line: &str, line_number: usize) {
        if line_number != 1 {
            self.diagnostics
                .push(Diagnostic::warning("HEADER_OUT_OF_PLACE", "file header ('0') seen outside the first line").at_line(line_number));
        }
        if self.file_header.is_some() {
            self.diagnostics
                .push(Diagnostic::warning("HEADER_DUPLICADO", "a second file header was found; keeping the first").at_line(line_number));
            return;
        }
        self.file_header = Some(decode_file_header(line, &mut self.diagnostics));
    }

    fn handle_batch_header(&mut self, line: &str, line_number: usize) {
        if self.open_batch.is_some() {
            self.diagnostics.push(
                Diagnostic::error("BATCH_NESTED", "a batch header appeared before the previous batch's trailer").at_line(line_number),
            );
            self.close_open_batch_forced(line_number);
        }
        let header = decode_batch_header(line, &mut self.diagnostics);
        self.open_batch = Some(OpenBatch { header, details: Vec::new() });
    }

    fn handle_detail(&mut self, line: &str, line_number: usize, registry: &BankLayoutRegistry) {
        let Some(open) = self.open_batch.as_mut() else {
            self.diagnostics
                .push(Diagnostic::error("DETAIL_ORPHAN", "detail record with no open batch; dropped").at_line(line_number));
            return;
        };

        let letra = line[SEGMENT_LETTER_POS.0..SEGMENT_LETTER_POS.1].chars().next().unwrap_or(' ');
        let bank_code = open_batch_bank_code(line);

        let (payload, mut diags) = match letra {
            'J' => decode_segment_j(line, &bank_code, registry),
            'O' => decode_segment_o(line, &bank_code, registry),
            'A' => (decode_segment_a(line), Vec::new()),
            'B' => (decode_segment_b(line), Vec::new()),
            other => (decode_raw(line, other), Vec::new()),
        };
        for d in diags.drain(..) {
            self.diagnostics.push(d.at_line(line_number));
        }

        let detail = Detail {
            line_number,
            payload,
            endereco_favorecido: None,
            raw: line.to_string(),
        };

        if let SegmentPayload::B(ref segment_b) = detail.payload {
            if let Some(previous) = open.details.last_mut() {
                if previous.is_payable_segment() || matches!(previous.payload, SegmentPayload::A(_)) {
                    previous.endereco_favorecido = Some(segment_b.clone());
                } else {
                    self.diagnostics.push(
                        Diagnostic::warning("SEGMENT_B_ORPHAN", "segment B does not follow an A/J/O segment in this batch")
                            .at_line(line_number),
                    );
                }
            } else {
                self.diagnostics
                    .push(Diagnostic::warning("SEGMENT_B_ORPHAN", "segment B is the first detail in its batch").at_line(line_number));
            }
        }

        open.details.push(detail);
    }

    fn handle_batch_trailer(&mut self, line: &str, line_number: usize) {
        let Some(open) = self.open_batch.take() else {
            self.diagnostics
                .push(Diagnostic::error("TRAILER_SEM_LOTE", "batch trailer with no open batch; ignored").at_line(line_number));
            return;
        };
        let trailer = decode_batch_trailer(line, &mut self.diagnostics);
        self.close_batch(open, trailer, line_number);
    }

    fn handle_file_trailer(&mut self, line: &str, line_number: usize) {
        if self.open_batch.is_some() {
            self.diagnostics
                .push(Diagnostic::warning("LOTE_NAO_FECHADO", "file trailer reached with a batch still open; closing it").at_line(line_number));
            self.close_open_batch_forced(line_number);
        }
        let trailer = decode_file_trailer(line, &mut self.diagnostics);
        self.file_trailer_declared = Some((trailer.total_lotes, trailer.total_registros));
        self.trailer_seen = true;
    }

    /// Closes a batch left open by a structural irregularity, synthesizing a
    /// trailer from what was actually parsed so the tree stays complete.
    fn close_open_batch_forced(&mut self, line_number: usize) {
        if let Some(open) = self.open_batch.take() {
            let trailer = cnab_domain::Cnab240BatchTrailer {
                total_registros: open.details.len() as i64,
                valor_total: rust_decimal::Decimal::ZERO,
            };
            self.close_batch(open, trailer, line_number);
        }
    }

    fn close_batch(&mut self, open: OpenBatch, trailer: cnab_domain::Cnab240BatchTrailer, line_number: usize) {
        let batch = Batch {
            header: open.header,
            details: open.details,
            trailer,
        };
        let computed = batch.computed_valor_total();
        if computed != batch.trailer.valor_total {
            self.diagnostics.push(
                Diagnostic::warning(
                    "LOTE_VALOR_DIVERGENTE",
                    format!("batch trailer declares {} but computed total is {computed}", batch.trailer.valor_total),
                )
                .at_line(line_number),
            );
        }
        self.batches.push(batch);
    }

    fn finish(self) -> Result<ParseOutcome<Cnab240File>, Cnab240ParseError> {
        let Some(header) = self.file_header else {
            return Err(Cnab240ParseError::NoFileHeader);
        };

        let mut diagnostics = self.diagnostics;
        let trailer = match self.file_trailer_declared {
            Some((total_lotes, total_registros)) => cnab_domain::Cnab240FileTrailer { total_lotes, total_registros },
            None => {
                diagnostics.push(Diagnostic::warning("TRAILER_AUSENTE", "no file trailer ('9' record) was found; totals synthesized"));
                cnab_domain::Cnab240FileTrailer {
                    total_lotes: self.batches.len() as i64,
                    total_registros: self.batches.iter().map(|b| b.details.len() as i64).sum(),
                }
            }
        };

        let file = Cnab240File {
            header,
            batches: self.batches,
            trailer,
        };

        if file.trailer.total_lotes != file.computed_total_lotes() {
            diagnostics.push(Diagnostic::warning(
                "TOTAL_LOTES_DIVERGENTE",
                format!("file trailer declares {} batches but {} were parsed", file.trailer.total_lotes, file.computed_total_lotes()),
            ));
        }

        Ok(ParseOutcome::new(file, diagnostics))
    }
}

fn open_batch_bank_code(line: &str) -> String {
    string(line, 0, 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Right-aligns `s` within `width`, left-padding with `'0'` the way every
    /// numeric CNAB field is filled.
    fn zpad(s: &str, width: usize) -> String {
        assert!(s.len() <= width);
        format!("{}{}", "0".repeat(width - s.len()), s)
    }

    fn blank(width: usize) -> String {
        " ".repeat(width)
    }

    fn file_header_line() -> String {
        let mut s = blank(240);
        s.replace_range(0..3, "341");
        s.replace_range(7..8, "0");
        s
    }

    fn batch_header_line(lote: &str) -> String {
        let mut s = blank(240);
        s.replace_range(0..3, "341");
        s.replace_range(3..7, &zpad(lote, 4));
        s.replace_range(7..8, "1");
        s
    }

    fn segment_j_line(lote: &str, valor_centavos: i64) -> String {
        let mut s = blank(240);
        s.replace_range(0..3, "341");
        s.replace_range(3..7, &zpad(lote, 4));
        s.replace_range(7..8, "3");
        s.replace_range(13..14, "J");
        s.replace_range(99..114, &zpad(&valor_centavos.to_string(), 15));
        s
    }

    fn batch_trailer_line(lote: &str, total_registros: i64, valor_centavos: i64) -> String {
        let mut s = blank(240);
        s.replace_range(0..3, "341");
        s.replace_range(3..7, &zpad(lote, 4));
        s.replace_range(7..8, "5");
        s.replace_range(17..23, &zpad(&total_registros.to_string(), 6));
        s.replace_range(23..41, &zpad(&valor_centavos.to_string(), 18));
        s
    }

    fn file_trailer_line(total_lotes: i64, total_registros: i64) -> String {
        let mut s = blank(240);
        s.replace_range(7..8, "9");
        s.replace_range(17..23, &zpad(&total_lotes.to_string(), 6));
        s.replace_range(23..29, &zpad(&total_registros.to_string(), 6));
        s
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(parse(b"").unwrap_err(), Cnab240ParseError::EmptyInput);
    }

    #[test]
    fn missing_header_is_rejected() {
        let body = batch_header_line("1");
        assert_eq!(parse(body.as_bytes()).unwrap_err(), Cnab240ParseError::NoFileHeader);
    }

    #[test]
    fn balanced_batch_with_two_titulos_parses_cleanly() {
        let lines = vec![
            file_header_line(),
            batch_header_line("1"),
            segment_j_line("1", 12_000),  // R$ 120.00
            segment_j_line("1", 15_000),  // R$ 150.00
            batch_trailer_line("1", 3, 27_000), // R$ 270.00
            file_trailer_line(1, 5),
        ];
        let content = lines.join("\n");
        let outcome = parse(content.as_bytes()).expect("well-formed input parses");
        assert!(!outcome.has_errors());
        assert_eq!(outcome.tree.batches.len(), 1);
        assert_eq!(outcome.tree.batches[0].details.len(), 2);
        assert_eq!(outcome.tree.computed_valor_total().to_string(), "270.00");
    }

    #[test]
    fn mismatched_trailer_total_is_a_diagnostic_not_an_error() {
        let lines = vec![
            file_header_line(),
            batch_header_line("1"),
            segment_j_line("1", 12_000),
            segment_j_line("1", 15_000),
            batch_trailer_line("1", 3, 27_100), // declares 271.00, computed is 270.00
            file_trailer_line(1, 5),
        ];
        let content = lines.join("\n");
        let outcome = parse(content.as_bytes()).expect("still parses");
        assert!(outcome.diagnostics.iter().any(|d| d.code == "LOTE_VALOR_DIVERGENTE"));
    }

    #[test]
    fn detail_with_no_open_batch_is_orphaned() {
        let lines = vec![file_header_line(), segment_j_line("1", 12_000), file_trailer_line(0, 0)];
        let content = lines.join("\n");
        let outcome = parse(content.as_bytes()).expect("still parses");
        assert!(outcome.diagnostics.iter().any(|d| d.code == "DETAIL_ORPHAN"));
        assert!(outcome.tree.batches.is_empty());
    }

    #[test]
    fn nested_batch_header_closes_the_previous_one() {
        let lines = vec![
            file_header_line(),
            batch_header_line("1"),
            segment_j_line("1", 10_000),
            batch_header_line("2"), // never closed the first batch
            segment_j_line("2", 20_000),
            batch_trailer_line("2", 1, 20_000),
            file_trailer_line(2, 2),
        ];
        let content = lines.join("\n");
        let outcome = parse(content.as_bytes()).expect("still parses");
        assert!(outcome.diagnostics.iter().any(|d| d.code == "BATCH_NESTED"));
        assert_eq!(outcome.tree.batches.len(), 2);
    }
}
