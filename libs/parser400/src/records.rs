//! Decoders for the three line kinds in a flat CNAB-400 file (§4.D): the
//! header, a detail, and the trailer. Detail decoding is the only one that
//! consults the bank layout registry.

use crate::layout::{BankLayoutRegistry400, RecordLayout};
use cnab_codec::{date6, int, money, string};
use cnab_domain::{Cnab400Header, Cnab400Record, Cnab400Trailer, Diagnostic};

const CENTURY_PIVOT: u32 = 50;

pub fn decode_header(line: &str, diagnostics: &mut Vec<Diagnostic>) -> Cnab400Header {
    let banco_codigo = string(line, 0, 3);
    let banco_nome = string(line, 3, 18);
    let empresa_codigo = string(line, 18, 32);
    let empresa_nome = string(line, 32, 72);
    let arquivo_sequencia = int(line, 390, 394).unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_field("arquivo_sequencia"));
        0
    });
    let data_arquivo_field = date6(line, 94, 100, CENTURY_PIVOT);
    if let Some(w) = data_arquivo_field.warning {
        diagnostics.push(Diagnostic::warning(w, "invalid data_arquivo").at_field("data_arquivo"));
    }
    let versao_layout = string(line, 100, 103);

    Cnab400Header {
        banco_codigo,
        banco_nome,
        empresa_codigo,
        empresa_nome,
        arquivo_sequencia,
        data_arquivo: data_arquivo_field.value,
        versao_layout,
    }
}

pub fn decode_trailer(line: &str, diagnostics: &mut Vec<Diagnostic>) -> Cnab400Trailer {
    let total_registros = int(line, 1, 7).unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_field("total_registros"));
        0
    });
    let valor_total = money(line, 7, 20, 2).unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_field("valor_total"));
        rust_decimal::Decimal::ZERO
    });
    let sequencial = int(line, 394, 400).unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_field("sequencial"));
        0
    });
    Cnab400Trailer {
        total_registros,
        valor_total,
        sequencial,
    }
}

pub fn decode_record(
    line: &str,
    line_number: usize,
    bank_code: &str,
    registry: &BankLayoutRegistry400,
    diagnostics: &mut Vec<Diagnostic>,
) -> Cnab400Record {
    let (layout, unknown_bank) = registry.resolve(bank_code);
    if unknown_bank {
        diagnostics.push(
            Diagnostic::warning("BANK_UNKNOWN", format!("no CNAB-400 layout registered for bank {bank_code:?}; using base FEBRABAN layout"))
                .at_line(line_number),
        );
    }
    decode_with_layout(line, line_number, &layout, diagnostics)
}

fn decode_with_layout(line: &str, line_number: usize, layout: &RecordLayout, diagnostics: &mut Vec<Diagnostic>) -> Cnab400Record {
    let field = |range: (usize, usize)| string(line, range.0, range.1);

    let codigo_banco = field(layout.codigo_banco);
    let agencia = field(layout.agencia);
    let conta = field(layout.conta);
    let codigo_ocorrencia = field(layout.codigo_ocorrencia);
    let nosso_numero = field(layout.nosso_numero);
    let seu_numero = field(layout.seu_numero);
    let codigo_barras = field(layout.codigo_barras);
    let pagador_documento = field(layout.pagador_documento);
    let pagador_nome = field(layout.pagador_nome);
    let linha_digitavel = field(layout.linha_digitavel);

    let vencimento = date6(line, layout.data_vencimento.0, layout.data_vencimento.1, CENTURY_PIVOT);
    if let Some(w) = vencimento.warning {
        diagnostics.push(Diagnostic::warning(w, "invalid data_vencimento").at_line(line_number).at_field("data_vencimento"));
    }
    let pagamento = date6(line, layout.data_pagamento.0, layout.data_pagamento.1, CENTURY_PIVOT);
    if let Some(w) = pagamento.warning {
        diagnostics.push(Diagnostic::warning(w, "invalid data_pagamento").at_line(line_number).at_field("data_pagamento"));
    }

    let valor_titulo = money(line, layout.valor_titulo.0, layout.valor_titulo.1, 2).unwrap_or_else(|e| {
        diagnostics
            .push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_line(line_number).at_field("valor_titulo"));
        rust_decimal::Decimal::ZERO
    });
    let valor_pago = money(line, layout.valor_pago.0, layout.valor_pago.1, 2).unwrap_or_else(|e| {
        diagnostics
            .push(Diagnostic::warning("CAMPO_NAO_NUMERICO", e.to_string()).at_line(line_number).at_field("valor_pago"));
        rust_decimal::Decimal::ZERO
    });

    Cnab400Record {
        line_number,
        nosso_numero,
        seu_numero,
        codigo_barras,
        linha_digitavel,
        valor_titulo,
        valor_pago,
        data_vencimento: vencimento.value,
        data_pagamento: pagamento.value,
        pagador_nome,
        pagador_documento,
        codigo_ocorrencia,
        codigo_banco,
        agencia,
        conta,
        dados_completos: line.to_string(),
    }
}
