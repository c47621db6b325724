//! Fixed-position decoders for the four record kinds whose layout does not
//! vary by bank in this implementation: file header/trailer and batch
//! header/trailer (record types `0`, `9`, `1`, `5`). Only the segment
//! decoders in `segments.rs` consult the bank layout registry.

use cnab_codec::{date8, int, money, string};
use cnab_domain::{Cnab240BatchHeader, Cnab240BatchTrailer, Cnab240FileHeader, Cnab240FileTrailer, Diagnostic};

pub fn decode_file_header(line: &str, diagnostics: &mut Vec<Diagnostic>) -> Cnab240FileHeader {
    let banco = string(line, 0, 3);
    let empresa = string(line, 48, 78);
    let data_geracao_field = date8(line, 30, 38);
    if let Some(w) = data_geracao_field.warning {
        diagnostics.push(Diagnostic::warning(w, "invalid data_geracao").at_field("data_geracao"));
    }
    let hora_geracao = parse_hhmmss(line, 38, 44);
    let arquivo_sequencia = int(line, 78, 84).unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_field("arquivo_sequencia"));
        0
    });
    let versao_layout = string(line, 84, 87);

    Cnab240FileHeader {
        banco,
        empresa,
        data_geracao: data_geracao_field.value,
        hora_geracao,
        arquivo_sequencia,
        versao_layout,
    }
}

pub fn decode_file_trailer(line: &str, diagnostics: &mut Vec<Diagnostic>) -> Cnab240FileTrailer {
    let total_lotes = int(line, 17, 23).unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_field("total_lotes"));
        0
    });
    let total_registros = int(line, 23, 29).unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_field("total_registros"));
        0
    });
    Cnab240FileTrailer { total_lotes, total_registros }
}

pub fn decode_batch_header(line: &str, diagnostics: &mut Vec<Diagnostic>) -> Cnab240BatchHeader {
    let lote_sequencia = int(line, 3, 7).unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_field("lote_sequencia"));
        0
    });
    let tipo_servico = string(line, 9, 11);
    let forma_pagamento = string(line, 11, 13);
    Cnab240BatchHeader {
        lote_sequencia,
        tipo_servico,
        forma_pagamento,
    }
}

pub fn decode_batch_trailer(line: &str, diagnostics: &mut Vec<Diagnostic>) -> Cnab240BatchTrailer {
    let total_registros = int(line, 17, 23).unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_field("total_registros"));
        0
    });
    let valor_total = money(line, 23, 41, 2).unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_field("valor_total"));
        rust_decimal::Decimal::ZERO
    });
    Cnab240BatchTrailer { total_registros, valor_total }
}

fn parse_hhmmss(line: &str, start: usize, end: usize) -> Option<chrono::NaiveTime> {
    let raw = string(line, start, end);
    if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let h: u32 = raw[0..2].parse().ok()?;
    let m: u32 = raw[2..4].parse().ok()?;
    let s: u32 = raw[4..6].parse().ok()?;
    chrono::NaiveTime::from_hms_opt(h, m, s)
}
