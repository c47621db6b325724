// [libs/persistence/src/tree.rs]
//! Writes a parsed tree's header, detail rows, and barcodes inside the
//! caller's open transaction, in the order §4.G requires: header first,
//! then details in tree order (so every FK they might need is already
//! durable), with each detail's barcode (if any) written immediately after
//! it rather than batched at the end.
//!
//! Barcode values themselves are never recomputed here — `cnab_extractor`
//! is the single source of truth for which details are payable and what
//! their barcode looks like (§4.F); this module only decides where each
//! extracted barcode's row lands relative to its owning detail row.

use crate::errors::PersistenceError;
use cnab_domain::{Barcode, Cnab240File, Cnab400File, ParsedTree, SegmentPayload};
use libsql::{params, Transaction};
use tracing::instrument;
use uuid::Uuid;

#[instrument(skip(tx, file, operation_id))]
pub async fn persist_cnab400(
    tx: &Transaction,
    file_id: Uuid,
    operation_id: Uuid,
    file: &Cnab400File,
) -> Result<Vec<Barcode>, PersistenceError> {
    let header_id = Uuid::new_v4();
    tx.execute(
        r#"INSERT INTO cnab_headers (
            id, file_id, banco_codigo, banco_nome, empresa_codigo, empresa_nome,
            data_arquivo, arquivo_sequencia, versao_layout, total_registros, valor_total
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
        params![
            header_id.to_string(),
            file_id.to_string(),
            file.header.banco_codigo.clone(),
            file.header.banco_nome.clone(),
            file.header.empresa_codigo.clone(),
            file.header.empresa_nome.clone(),
            file.header.data_arquivo.map(|d| d.to_string()),
            file.header.arquivo_sequencia,
            file.header.versao_layout.clone(),
            file.trailer.total_registros,
            file.trailer.valor_total.to_string(),
        ],
    )
    .await?;

    let mut extracted = cnab_extractor::extract(&ParsedTree::Cnab400(file.clone())).into_iter();
    let mut barcodes = Vec::new();

    for record in &file.records {
        tx.execute(
            r#"INSERT INTO cnab_records (
                id, file_id, operation_id, header_id, sequencia, tipo,
                nosso_numero, seu_numero, codigo_barras, valor_titulo, valor_pago,
                data_vencimento, data_pagamento, pagador_nome, pagador_documento, codigo_ocorrencia
            ) VALUES (?1, ?2, ?3, ?4, ?5, 'detalhe', ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"#,
            params![
                Uuid::new_v4().to_string(),
                file_id.to_string(),
                operation_id.to_string(),
                header_id.to_string(),
                record.line_number as i64,
                record.nosso_numero.clone(),
                record.seu_numero.clone(),
                record.codigo_barras.clone(),
                record.valor_titulo.to_string(),
                record.valor_pago.to_string(),
                record.data_vencimento.map(|d| d.to_string()),
                record.data_pagamento.map(|d| d.to_string()),
                record.pagador_nome.clone(),
                record.pagador_documento.clone(),
                record.codigo_ocorrencia.clone(),
            ],
        )
        .await?;

        if !record.codigo_barras.trim().is_empty() {
            if let Some(barcode) = extracted.next() {
                persist_barcode(tx, file_id, operation_id, &barcode).await?;
                barcodes.push(barcode);
            }
        }
    }

    Ok(barcodes)
}

#[instrument(skip(tx, file, operation_id))]
pub async fn persist_cnab240(
    tx: &Transaction,
    file_id: Uuid,
    operation_id: Uuid,
    file: &Cnab240File,
) -> Result<Vec<Barcode>, PersistenceError> {
    let summary_id = Uuid::new_v4();
    tx.execute(
        r#"INSERT INTO cnab240_files (
            id, file_id, banco_codigo, empresa, data_geracao, hora_geracao,
            arquivo_sequencia, versao_layout, total_lotes, total_registros, valor_total
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
        params![
            summary_id.to_string(),
            file_id.to_string(),
            file.header.banco.clone(),
            file.header.empresa.clone(),
            file.header.data_geracao.map(|d| d.to_string()),
            file.header.hora_geracao.map(|t| t.to_string()),
            file.header.arquivo_sequencia,
            file.header.versao_layout.clone(),
            file.trailer.total_lotes,
            file.trailer.total_registros,
            file.computed_valor_total().to_string(),
        ],
    )
    .await?;

    let mut barcodes = Vec::new();
    let mut sequencia = 0i64;

    for batch in &file.batches {
        for detail in &batch.details {
            sequencia += 1;
            persist_detail_record(tx, file_id, operation_id, &summary_id.to_string(), sequencia, detail).await?;

            if let Some(barcode) = extract_single_detail(&file.header, batch, detail) {
                persist_barcode(tx, file_id, operation_id, &barcode).await?;
                barcodes.push(barcode);
            }
        }
    }

    Ok(barcodes)
}

/// Runs the extractor over a one-batch, one-detail slice of the tree so
/// persistence never re-implements the §4.F emission rules (incl. the
/// bounded fallback's digit-count check) — it just asks the extractor
/// whether this specific detail produced a barcode.
fn extract_single_detail(header: &cnab_domain::Cnab240FileHeader, batch: &cnab_domain::Batch, detail: &cnab_domain::Detail) -> Option<Barcode> {
    let slice = Cnab240File {
        header: header.clone(),
        batches: vec![cnab_domain::Batch {
            header: batch.header.clone(),
            details: vec![detail.clone()],
            trailer: batch.trailer.clone(),
        }],
        trailer: cnab_domain::Cnab240FileTrailer {
            total_lotes: 1,
            total_registros: 3,
        },
    };
    cnab_extractor::extract(&ParsedTree::Cnab240(slice)).into_iter().next()
}

async fn persist_detail_record(
    tx: &Transaction,
    file_id: Uuid,
    operation_id: Uuid,
    header_id: &str,
    sequencia: i64,
    detail: &cnab_domain::Detail,
) -> Result<(), PersistenceError> {
    let (tipo, codigo_barras, valor_titulo, valor_pago, data_vencimento, data_pagamento, nosso_numero) = match &detail.payload {
        SegmentPayload::J(j) => (
            "J".to_string(),
            Some(j.codigo_barras.clone()),
            Some(j.valor_titulo.to_string()),
            Some(j.valor_pago.to_string()),
            j.data_vencimento.map(|d| d.to_string()),
            j.data_pagamento.map(|d| d.to_string()),
            Some(j.nosso_numero.clone()),
        ),
        SegmentPayload::O(o) => (
            "O".to_string(),
            Some(o.codigo_barras.clone()),
            Some(o.valor_documento.to_string()),
            Some(o.valor_pago.to_string()),
            o.data_vencimento.map(|d| d.to_string()),
            o.data_pagamento.map(|d| d.to_string()),
            None,
        ),
        SegmentPayload::A(a) => (
            "A".to_string(),
            None,
            Some(a.valor_pagamento.to_string()),
            None,
            None,
            a.data_pagamento.map(|d| d.to_string()),
            Some(a.numero_documento.clone()),
        ),
        SegmentPayload::B(_) => ("B".to_string(), None, None, None, None, None, None),
        SegmentPayload::Other(raw) => (raw.letra.to_string(), None, None, None, None, None, None),
    };

    tx.execute(
        r#"INSERT INTO cnab_records (
            id, file_id, operation_id, header_id, sequencia, tipo,
            nosso_numero, seu_numero, codigo_barras, valor_titulo, valor_pago,
            data_vencimento, data_pagamento, pagador_nome, pagador_documento, codigo_ocorrencia
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, ?9, ?10, ?11, ?12, NULL, NULL, NULL)"#,
        params![
            Uuid::new_v4().to_string(),
            file_id.to_string(),
            operation_id.to_string(),
            header_id.to_string(),
            sequencia,
            tipo,
            nosso_numero,
            codigo_barras,
            valor_titulo,
            valor_pago,
            data_vencimento,
            data_pagamento,
        ],
    )
    .await?;
    Ok(())
}

async fn persist_barcode(tx: &Transaction, file_id: Uuid, operation_id: Uuid, barcode: &Barcode) -> Result<(), PersistenceError> {
    tx.execute(
        r#"INSERT INTO barcodes (
            id, file_id, operation_id, codigo_barras, tipo, segmento,
            favorecido, valor, data_vencimento, status_pagamento
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
        params![
            Uuid::new_v4().to_string(),
            file_id.to_string(),
            operation_id.to_string(),
            barcode.codigo_barras.clone(),
            barcode.tipo.as_str().to_string(),
            format!("{:?}", barcode.segmento),
            barcode.favorecido.clone().or_else(|| barcode.pagador.clone()),
            barcode.valor.to_string(),
            barcode.data_vencimento.map(|d| d.to_string()),
            format!("{:?}", barcode.status),
        ],
    )
    .await?;
    Ok(())
}
