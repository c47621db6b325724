//! The hierarchical CNAB-240 tree: file header, one-or-more batches (each
//! with a header, an ordered detail list, and a trailer), file trailer.
//!
//! §9 replaces the source's runtime `segmento: 'J' | 'O' | 'B'` string tags
//! with the `SegmentPayload` sum type below: each variant owns its typed
//! fields, so callers match on the enum instead of guarding on a string.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cnab240FileHeader {
    pub banco: String,
    pub empresa: String,
    pub data_geracao: Option<NaiveDate>,
    pub hora_geracao: Option<NaiveTime>,
    pub arquivo_sequencia: i64,
    pub versao_layout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cnab240FileTrailer {
    pub total_lotes: i64,
    pub total_registros: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cnab240BatchHeader {
    pub lote_sequencia: i64,
    pub tipo_servico: String,
    pub forma_pagamento: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cnab240BatchTrailer {
    pub total_registros: i64,
    pub valor_total: Decimal,
}

/// Segment A: credit instruction detail (payment order), no barcode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentA {
    pub numero_documento: String,
    pub favorecido_nome: String,
    pub valor_pagamento: Decimal,
    pub data_pagamento: Option<NaiveDate>,
}

/// Segment B: address/PIX addressee information, attached to the nearest
/// preceding A/J/O segment in the same batch (§3 invariant).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentB {
    pub endereco: String,
    pub bairro: String,
    pub cidade: String,
    pub cep: String,
    pub uf: String,
    pub chave_pix: Option<String>,
}

/// Segment J: título (boleto) payable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentJ {
    pub codigo_barras: String,
    pub nome_cedente: String,
    pub nosso_numero: String,
    pub data_vencimento: Option<NaiveDate>,
    pub valor_titulo: Decimal,
    pub data_pagamento: Option<NaiveDate>,
    pub valor_pago: Decimal,
}

/// Segment O: tributo/concessionária (tax/utility) payable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentO {
    pub codigo_barras: String,
    pub nome_concessionaria: String,
    pub data_vencimento: Option<NaiveDate>,
    pub valor_documento: Decimal,
    pub data_pagamento: Option<NaiveDate>,
    pub valor_pago: Decimal,
}

/// Any segment letter the base/bank layout has no typed decoder for.
/// `conteudo` retains the full positions-13.. payload so the extractor's
/// fallback rule (§4.F rule 3) can still re-slice it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSegment {
    pub letra: char,
    pub conteudo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SegmentPayload {
    A(SegmentA),
    B(SegmentB),
    J(SegmentJ),
    O(SegmentO),
    Other(RawSegment),
}

impl SegmentPayload {
    pub fn letra(&self) -> char {
        match self {
            SegmentPayload::A(_) => 'A',
            SegmentPayload::B(_) => 'B',
            SegmentPayload::J(_) => 'J',
            SegmentPayload::O(_) => 'O',
            SegmentPayload::Other(raw) => raw.letra,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detail {
    pub line_number: usize,
    pub payload: SegmentPayload,
    /// The segment B, if any, that attached to this detail (§3 invariant).
    pub endereco_favorecido: Option<SegmentB>,
    pub raw: String,
}

impl Detail {
    /// `true` for detail kinds the extractor treats as payables (J or O).
    pub fn is_payable_segment(&self) -> bool {
        matches!(self.payload, SegmentPayload::J(_) | SegmentPayload::O(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub header: Cnab240BatchHeader,
    pub details: Vec<Detail>,
    pub trailer: Cnab240BatchTrailer,
}

impl Batch {
    pub fn computed_valor_total(&self) -> Decimal {
        self.details
            .iter()
            .map(|d| match &d.payload {
                SegmentPayload::J(j) => {
                    if j.valor_pago > Decimal::ZERO { j.valor_pago } else { j.valor_titulo }
                }
                SegmentPayload::O(o) => {
                    if o.valor_pago > Decimal::ZERO { o.valor_pago } else { o.valor_documento }
                }
                SegmentPayload::A(a) => a.valor_pagamento,
                _ => Decimal::ZERO,
            })
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cnab240File {
    pub header: Cnab240FileHeader,
    pub batches: Vec<Batch>,
    pub trailer: Cnab240FileTrailer,
}

impl Cnab240File {
    pub fn computed_valor_total(&self) -> Decimal {
        self.batches.iter().map(Batch::computed_valor_total).sum()
    }

    pub fn computed_total_lotes(&self) -> i64 {
        self.batches.len() as i64
    }
}
