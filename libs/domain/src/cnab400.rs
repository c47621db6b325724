//! The flat CNAB-400 tree: one header, zero-or-more records, one trailer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cnab400Header {
    pub banco_codigo: String,
    pub banco_nome: String,
    pub empresa_codigo: String,
    pub empresa_nome: String,
    pub arquivo_sequencia: i64,
    pub data_arquivo: Option<NaiveDate>,
    pub versao_layout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cnab400Record {
    pub line_number: usize,
    pub nosso_numero: String,
    pub seu_numero: String,
    pub codigo_barras: String,
    pub linha_digitavel: String,
    pub valor_titulo: Decimal,
    pub valor_pago: Decimal,
    pub data_vencimento: Option<NaiveDate>,
    pub data_pagamento: Option<NaiveDate>,
    pub pagador_nome: String,
    pub pagador_documento: String,
    pub codigo_ocorrencia: String,
    pub codigo_banco: String,
    pub agencia: String,
    pub conta: String,
    /// Opaque copy of the full 400-byte line, for fallback extraction and audit.
    pub dados_completos: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cnab400Trailer {
    pub total_registros: i64,
    pub valor_total: Decimal,
    pub sequencial: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cnab400File {
    pub header: Cnab400Header,
    pub records: Vec<Cnab400Record>,
    pub trailer: Cnab400Trailer,
}

impl Cnab400File {
    /// Arithmetic sum of `valor_pago` across every record, falling back to
    /// `valor_titulo` for records that were never paid — the same
    /// precedence the extractor uses (§4.F rule 1).
    pub fn computed_valor_total(&self) -> Decimal {
        self.records
            .iter()
            .map(|r| if r.valor_pago > Decimal::ZERO { r.valor_pago } else { r.valor_titulo })
            .sum()
    }
}
