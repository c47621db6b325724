//! Enumerates payable barcodes from a parsed tree (§3, §4.F).
//!
//! `extract` is a pure function: it never touches I/O, never mutates its
//! input, and produces the same `Vec<Barcode>` — same order, same content
//! — for the same tree every time it is called (§8 property 5). The three
//! rules in §4.F are applied in order, first match wins, across every
//! detail in the tree.

use chrono::NaiveDate;
use cnab_domain::{Barcode, BarcodeSegmento, BarcodeStatus, BarcodeTipo, Cnab240File, Cnab400File, ParsedTree, SegmentPayload};
use rust_decimal::Decimal;

/// Byte range of "dados complementares" within a segment's opaque payload
/// (`RawSegment::conteudo`, itself `line[13..]`) that the base FEBRABAN
/// layout reserves for a barcode on segment kinds this workspace has no
/// typed decoder for. Chosen to line up with `BASE_SEGMENT_J.codigo_barras`
/// (absolute line positions 17..65) so the fallback rule reads the same
/// bytes a J/O decoder would, minus the 13-byte offset `conteudo` already
/// carries (see SPEC_FULL.md §13, resolving the "fallback position" open
/// question rather than guessing at it).
const FALLBACK_BARCODE_RANGE: (usize, usize) = (4, 52);

pub fn extract(tree: &ParsedTree) -> Vec<Barcode> {
    match tree {
        ParsedTree::Cnab240(file) => extract_240(file),
        ParsedTree::Cnab400(file) => extract_400(file),
    }
}

fn extract_240(file: &Cnab240File) -> Vec<Barcode> {
    let mut out = Vec::new();
    for batch in &file.batches {
        for detail in &batch.details {
            match &detail.payload {
                SegmentPayload::J(j) if !j.codigo_barras.trim().is_empty() => {
                    let valor = preferred_valor(j.valor_pago, j.valor_titulo);
                    out.push(build_barcode(
                        j.codigo_barras.clone(),
                        BarcodeTipo::Titulo,
                        BarcodeSegmento::J,
                        Some(j.nome_cedente.clone()),
                        None,
                        valor,
                        j.data_vencimento,
                        j.data_pagamento,
                        None,
                    ));
                }
                SegmentPayload::O(o) if !o.codigo_barras.trim().is_empty() => {
                    let valor = preferred_valor(o.valor_pago, o.valor_documento);
                    out.push(build_barcode(
                        o.codigo_barras.clone(),
                        BarcodeTipo::Tributo,
                        BarcodeSegmento::O,
                        Some(o.nome_concessionaria.clone()),
                        None,
                        valor,
                        o.data_vencimento,
                        o.data_pagamento,
                        None,
                    ));
                }
                SegmentPayload::Other(raw) => {
                    if let Some(barcode) = fallback_from_raw(&raw.conteudo) {
                        out.push(barcode);
                    }
                }
                _ => {}
            }
        }
    }
    out
}

fn extract_400(file: &Cnab400File) -> Vec<Barcode> {
    file.records
        .iter()
        .filter(|r| !r.codigo_barras.trim().is_empty())
        .map(|r| {
            let valor = preferred_valor(r.valor_pago, r.valor_titulo);
            build_barcode(
                r.codigo_barras.clone(),
                BarcodeTipo::Titulo,
                BarcodeSegmento::Other,
                None,
                Some(r.pagador_nome.clone()),
                valor,
                r.data_vencimento,
                r.data_pagamento,
                None,
            )
        })
        .collect()
}

/// §4.F rule precedence: `valor_pago` when present (paid), falling back to
/// the original title/document value otherwise.
fn preferred_valor(valor_pago: Decimal, valor_original: Decimal) -> Decimal {
    if valor_pago > Decimal::ZERO {
        valor_pago
    } else {
        valor_original
    }
}

/// §4.F rule 3: any detail kind with no typed decoder is re-sliced at the
/// schema position the base layout reserves for a barcode. A slice that
/// isn't 44 or 48 digits once filtered is not guessed at further — no
/// barcode is emitted for it at all, rather than emitting one with a
/// fabricated type.
fn fallback_from_raw(conteudo: &str) -> Option<Barcode> {
    let (start, end) = FALLBACK_BARCODE_RANGE;
    if conteudo.len() < end {
        return None;
    }
    let slice = &conteudo[start..end];
    let digits = Barcode::digits_only(slice);
    let tipo = match digits.len() {
        44 => BarcodeTipo::Titulo,
        48 => BarcodeTipo::Tributo,
        _ => return None,
    };
    Some(build_barcode(
        slice.to_string(),
        tipo,
        BarcodeSegmento::Other,
        None,
        None,
        Decimal::ZERO,
        None,
        None,
        Some("fallback".to_string()),
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_barcode(
    codigo_barras: String,
    tipo: BarcodeTipo,
    segmento: BarcodeSegmento,
    favorecido: Option<String>,
    pagador: Option<String>,
    valor: Decimal,
    data_vencimento: Option<NaiveDate>,
    data_pagamento: Option<NaiveDate>,
    observacao: Option<String>,
) -> Barcode {
    let digits = Barcode::digits_only(&codigo_barras);
    let check_digit = digits.chars().nth(4);
    Barcode {
        codigo_barras,
        tipo,
        segmento,
        favorecido,
        pagador,
        valor,
        data_vencimento,
        data_pagamento,
        status: BarcodeStatus::Extracted,
        check_digit,
        observacao,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnab_domain::{
        Batch, Cnab240BatchHeader, Cnab240BatchTrailer, Cnab240FileHeader, Cnab240FileTrailer, Cnab400Header, Cnab400Record,
        Cnab400Trailer, Detail, RawSegment, SegmentJ, SegmentO,
    };
    use rust_decimal_macros::dec;

    fn cnab400_with_two_titulos() -> Cnab400File {
        let record = |n: usize| Cnab400Record {
            line_number: n,
            nosso_numero: String::new(),
            seu_numero: String::new(),
            codigo_barras: "34191790010104351004791020150008291070026000".to_string(),
            linha_digitavel: String::new(),
            valor_titulo: dec!(100.50),
            valor_pago: Decimal::ZERO,
            data_vencimento: None,
            data_pagamento: None,
            pagador_nome: "FULANO DE TAL".to_string(),
            pagador_documento: String::new(),
            codigo_ocorrencia: String::new(),
            codigo_banco: String::new(),
            agencia: String::new(),
            conta: String::new(),
            dados_completos: String::new(),
        };
        Cnab400File {
            header: Cnab400Header {
                banco_codigo: "341".into(),
                banco_nome: String::new(),
                empresa_codigo: String::new(),
                empresa_nome: String::new(),
                arquivo_sequencia: 1,
                data_arquivo: None,
                versao_layout: String::new(),
            },
            records: vec![record(2), record(3)],
            trailer: Cnab400Trailer {
                total_registros: 2,
                valor_total: dec!(201.00),
                sequencial: 1,
            },
        }
    }

    #[test]
    fn s1_cnab400_two_titulos_extracted_as_titulo() {
        let file = cnab400_with_two_titulos();
        let barcodes = extract(&ParsedTree::Cnab400(file));
        assert_eq!(barcodes.len(), 2);
        assert!(barcodes.iter().all(|b| b.tipo == BarcodeTipo::Titulo));
        assert!(barcodes.iter().all(|b| b.digit_count_matches()));
    }

    #[test]
    fn idempotent_extraction_yields_identical_lists() {
        let tree = ParsedTree::Cnab400(cnab400_with_two_titulos());
        let first = extract(&tree);
        let second = extract(&tree);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.codigo_barras, b.codigo_barras);
            assert_eq!(a.tipo, b.tipo);
            assert_eq!(a.valor, b.valor);
        }
    }

    #[test]
    fn s3_two_j_segments_extracted_as_titulo_with_segment_j() {
        let batch = Batch {
            header: Cnab240BatchHeader {
                lote_sequencia: 1,
                tipo_servico: "20".into(),
                forma_pagamento: "30".into(),
            },
            details: vec![
                Detail {
                    line_number: 3,
                    payload: SegmentPayload::J(SegmentJ {
                        codigo_barras: "1".repeat(44),
                        valor_titulo: dec!(120.00),
                        ..Default::default()
                    }),
                    endereco_favorecido: None,
                    raw: String::new(),
                },
                Detail {
                    line_number: 4,
                    payload: SegmentPayload::J(SegmentJ {
                        codigo_barras: "2".repeat(44),
                        valor_titulo: dec!(150.00),
                        ..Default::default()
                    }),
                    endereco_favorecido: None,
                    raw: String::new(),
                },
            ],
            trailer: Cnab240BatchTrailer {
                total_registros: 2,
                valor_total: dec!(270.00),
            },
        };
        let file = Cnab240File {
            header: Cnab240FileHeader {
                banco: "341".into(),
                empresa: String::new(),
                data_geracao: None,
                hora_geracao: None,
                arquivo_sequencia: 1,
                versao_layout: String::new(),
            },
            batches: vec![batch],
            trailer: Cnab240FileTrailer {
                total_lotes: 1,
                total_registros: 4,
            },
        };
        let barcodes = extract(&ParsedTree::Cnab240(file));
        assert_eq!(barcodes.len(), 2);
        assert!(barcodes.iter().all(|b| b.tipo == BarcodeTipo::Titulo && b.segmento == BarcodeSegmento::J));
        assert_eq!(barcodes.iter().map(|b| b.valor).sum::<Decimal>(), dec!(270.00));
    }

    #[test]
    fn segment_o_extracted_as_tributo() {
        let detail = Detail {
            line_number: 3,
            payload: SegmentPayload::O(SegmentO {
                codigo_barras: "8".repeat(48),
                valor_documento: dec!(50.00),
                ..Default::default()
            }),
            endereco_favorecido: None,
            raw: String::new(),
        };
        let batch = Batch {
            header: Cnab240BatchHeader {
                lote_sequencia: 1,
                tipo_servico: String::new(),
                forma_pagamento: String::new(),
            },
            details: vec![detail],
            trailer: Cnab240BatchTrailer {
                total_registros: 1,
                valor_total: dec!(50.00),
            },
        };
        let file = Cnab240File {
            header: Cnab240FileHeader {
                banco: String::new(),
                empresa: String::new(),
                data_geracao: None,
                hora_geracao: None,
                arquivo_sequencia: 1,
                versao_layout: String::new(),
            },
            batches: vec![batch],
            trailer: Cnab240FileTrailer {
                total_lotes: 1,
                total_registros: 3,
            },
        };
        let barcodes = extract(&ParsedTree::Cnab240(file));
        assert_eq!(barcodes.len(), 1);
        assert_eq!(barcodes[0].tipo, BarcodeTipo::Tributo);
        assert_eq!(barcodes[0].segmento, BarcodeSegmento::O);
    }

    #[test]
    fn raw_segment_fallback_extracts_only_when_digit_count_matches() {
        // 4-byte pad + 44 digits + 4-byte pad: the fallback window (48 bytes
        // wide) holds exactly a 44-digit título once non-digits are filtered.
        let mut conteudo = " ".repeat(4);
        conteudo.push_str(&"5".repeat(44));
        conteudo.push_str(&"Z".repeat(4));
        let detail = Detail {
            line_number: 3,
            payload: SegmentPayload::Other(RawSegment { letra: 'C', conteudo }),
            endereco_favorecido: None,
            raw: String::new(),
        };
        let batch = Batch {
            header: Cnab240BatchHeader {
                lote_sequencia: 1,
                tipo_servico: String::new(),
                forma_pagamento: String::new(),
            },
            details: vec![detail],
            trailer: Cnab240BatchTrailer {
                total_registros: 1,
                valor_total: Decimal::ZERO,
            },
        };
        let file = Cnab240File {
            header: Cnab240FileHeader {
                banco: String::new(),
                empresa: String::new(),
                data_geracao: None,
                hora_geracao: None,
                arquivo_sequencia: 1,
                versao_layout: String::new(),
            },
            batches: vec![batch],
            trailer: Cnab240FileTrailer {
                total_lotes: 1,
                total_registros: 3,
            },
        };
        let barcodes = extract(&ParsedTree::Cnab240(file));
        assert_eq!(barcodes.len(), 1);
        assert_eq!(barcodes[0].observacao.as_deref(), Some("fallback"));
    }

    #[test]
    fn raw_segment_with_unmatched_fallback_length_extracts_nothing() {
        // 4-byte pad + 30 digits + 18 letters in the fallback window: neither
        // 44 nor 48 digits once filtered, so no barcode is guessed at.
        let conteudo = format!("{}{}{}", " ".repeat(4), "9".repeat(30), "A".repeat(18));
        let detail = Detail {
            line_number: 3,
            payload: SegmentPayload::Other(RawSegment { letra: 'C', conteudo }),
            endereco_favorecido: None,
            raw: String::new(),
        };
        let batch = Batch {
            header: Cnab240BatchHeader {
                lote_sequencia: 1,
                tipo_servico: String::new(),
                forma_pagamento: String::new(),
            },
            details: vec![detail],
            trailer: Cnab240BatchTrailer {
                total_registros: 1,
                valor_total: Decimal::ZERO,
            },
        };
        let file = Cnab240File {
            header: Cnab240FileHeader {
                banco: String::new(),
                empresa: String::new(),
                data_geracao: None,
                hora_geracao: None,
                arquivo_sequencia: 1,
                versao_layout: String::new(),
            },
            batches: vec![batch],
            trailer: Cnab240FileTrailer {
                total_lotes: 1,
                total_registros: 3,
            },
        };
        let barcodes = extract(&ParsedTree::Cnab240(file));
        assert!(barcodes.is_empty());
    }

    trait DigitCountMatches {
        fn digit_count_matches(&self) -> bool;
    }

    impl DigitCountMatches for Barcode {
        fn digit_count_matches(&self) -> bool {
            let len = Barcode::digit_count(&self.codigo_barras);
            matches!(len, 44 | 48)
        }
    }
}
