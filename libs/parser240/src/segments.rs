//! Segment decoders: one function per segment letter, each a table of
//! `(name, start, end, codec)` extractions over the layout resolved for the
//! detail's bank (§4.C).

use crate::layout::{BankLayoutRegistry, FixedSegmentLayout, SegmentLayout, BASE_SEGMENT_A, BASE_SEGMENT_B};
#[allow(unused_imports)]
use crate::layout::SegmentBLayout;
use cnab_codec::{date8, money, string};
use cnab_domain::{Diagnostic, RawSegment, SegmentA, SegmentB, SegmentJ, SegmentO, SegmentPayload};

pub fn decode_segment_j(line: &str, bank_code: &str, registry: &BankLayoutRegistry) -> (SegmentPayload, Vec<Diagnostic>) {
    let (layout, unknown_bank) = registry.resolve_segment_j(bank_code);
    let mut diagnostics = Vec::new();
    if unknown_bank {
        diagnostics.push(Diagnostic::warning(
            "BANK_UNKNOWN",
            format!("no segment J layout registered for bank {bank_code:?}; using base FEBRABAN layout"),
        ));
    }

    let segment = decode_payable(line, &layout, &mut diagnostics);
    (
        SegmentPayload::J(SegmentJ {
            codigo_barras: segment.codigo_barras,
            nome_cedente: segment.nome,
            nosso_numero: segment.nosso_numero,
            data_vencimento: segment.data_vencimento,
            valor_titulo: segment.valor_principal,
            data_pagamento: segment.data_pagamento,
            valor_pago: segment.valor_pago,
        }),
        diagnostics,
    )
}

pub fn decode_segment_o(line: &str, bank_code: &str, registry: &BankLayoutRegistry) -> (SegmentPayload, Vec<Diagnostic>) {
    let (layout, unknown_bank) = registry.resolve_segment_o(bank_code);
    let mut diagnostics = Vec::new();
    if unknown_bank {
        diagnostics.push(Diagnostic::warning(
            "BANK_UNKNOWN",
            format!("no segment O layout registered for bank {bank_code:?}; using base FEBRABAN layout"),
        ));
    }

    let segment = decode_payable(line, &layout, &mut diagnostics);
    (
        SegmentPayload::O(SegmentO {
            codigo_barras: segment.codigo_barras,
            nome_concessionaria: segment.nome,
            data_vencimento: segment.data_vencimento,
            valor_documento: segment.valor_principal,
            data_pagamento: segment.data_pagamento,
            valor_pago: segment.valor_pago,
        }),
        diagnostics,
    )
}

struct DecodedPayable {
    codigo_barras: String,
    nome: String,
    nosso_numero: String,
    data_vencimento: Option<chrono::NaiveDate>,
    valor_principal: rust_decimal::Decimal,
    data_pagamento: Option<chrono::NaiveDate>,
    valor_pago: rust_decimal::Decimal,
}

fn decode_payable(line: &str, layout: &SegmentLayout, diagnostics: &mut Vec<Diagnostic>) -> DecodedPayable {
    let codigo_barras = string(line, layout.codigo_barras.0, layout.codigo_barras.1);
    let nome = string(line, layout.nome.0, layout.nome.1);
    let nosso_numero = if layout.nosso_numero.1 > layout.nosso_numero.0 {
        string(line, layout.nosso_numero.0, layout.nosso_numero.1)
    } else {
        String::new()
    };

    let vencimento = date8(line, layout.data_vencimento.0, layout.data_vencimento.1);
    if let Some(w) = vencimento.warning {
        diagnostics.push(Diagnostic::warning(w, "invalid data_vencimento").at_field("data_vencimento"));
    }
    let pagamento = date8(line, layout.data_pagamento.0, layout.data_pagamento.1);
    if let Some(w) = pagamento.warning {
        diagnostics.push(Diagnostic::warning(w, "invalid data_pagamento").at_field("data_pagamento"));
    }

    let valor_principal = money(line, layout.valor_principal.0, layout.valor_principal.1, 2).unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_field("valor_principal"));
        rust_decimal::Decimal::ZERO
    });
    let valor_pago = money(line, layout.valor_pago.0, layout.valor_pago.1, 2).unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_field("valor_pago"));
        rust_decimal::Decimal::ZERO
    });

    DecodedPayable {
        codigo_barras,
        nome,
        nosso_numero,
        data_vencimento: vencimento.value,
        valor_principal,
        data_pagamento: pagamento.value,
        valor_pago,
    }
}

pub fn decode_segment_a(line: &str) -> SegmentPayload {
    decode_fixed_a(line, &BASE_SEGMENT_A)
}

fn decode_fixed_a(line: &str, layout: &FixedSegmentLayout) -> SegmentPayload {
    let numero_documento = string(line, layout.field_a.0, layout.field_a.1);
    let favorecido_nome = string(line, layout.field_b.0, layout.field_b.1);
    let valor_pagamento = money(line, layout.field_c.0, layout.field_c.1, 2).unwrap_or(rust_decimal::Decimal::ZERO);
    let data_pagamento = date8(line, layout.field_d.0, layout.field_d.1).value;

    SegmentPayload::A(SegmentA {
        numero_documento,
        favorecido_nome,
        valor_pagamento,
        data_pagamento,
    })
}

pub fn decode_segment_b(line: &str) -> SegmentPayload {
    let layout = &BASE_SEGMENT_B;
    let endereco = string(line, layout.endereco.0, layout.endereco.1);
    let bairro = string(line, layout.bairro.0, layout.bairro.1);
    let cidade = string(line, layout.cidade.0, layout.cidade.1);
    let cep = string(line, layout.cep.0, layout.cep.1);
    let uf = string(line, layout.uf.0, layout.uf.1);
    let chave_pix_raw = string(line, layout.chave_pix.0, layout.chave_pix.1);

    SegmentPayload::B(SegmentB {
        endereco,
        bairro,
        cidade,
        cep,
        uf,
        chave_pix: if chave_pix_raw.is_empty() { None } else { Some(chave_pix_raw) },
    })
}

/// Any segment letter not otherwise decoded keeps the raw payload so the
/// extractor's fallback rule can still inspect it (§4.F rule 3).
pub fn decode_raw(line: &str, letra: char) -> SegmentPayload {
    let conteudo = if line.len() > 13 { line[13..].to_string() } else { String::new() };
    SegmentPayload::Other(RawSegment { letra, conteudo })
}
