// [libs/persistence/src/schema.rs]
//! DDL for the tables enumerated in `spec.md` §6. Every statement is
//! `CREATE TABLE IF NOT EXISTS`/`CREATE ... IF NOT EXISTS`, so applying the
//! schema against an already-initialized database is a no-op.

use crate::errors::PersistenceError;
use libsql::Connection;
use tracing::instrument;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS operations (
        operation_id TEXT PRIMARY KEY,
        operation_type TEXT NOT NULL,
        status TEXT NOT NULL,
        request_data TEXT,
        response_data TEXT,
        error_details TEXT,
        processing_time_ms INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS files (
        id TEXT PRIMARY KEY,
        operation_id TEXT NOT NULL REFERENCES operations(operation_id),
        file_hash TEXT NOT NULL,
        file_name TEXT NOT NULL,
        file_size INTEGER NOT NULL,
        file_type TEXT NOT NULL,
        content_preview TEXT NOT NULL,
        validation_status TEXT NOT NULL,
        validation_details TEXT,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_files_file_hash ON files(file_hash);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cnab_headers (
        id TEXT PRIMARY KEY,
        file_id TEXT NOT NULL REFERENCES files(id),
        banco_codigo TEXT,
        banco_nome TEXT,
        empresa_codigo TEXT,
        empresa_nome TEXT,
        data_arquivo TEXT,
        arquivo_sequencia INTEGER,
        versao_layout TEXT,
        total_registros INTEGER,
        valor_total TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cnab240_files (
        id TEXT PRIMARY KEY,
        file_id TEXT NOT NULL REFERENCES files(id),
        banco_codigo TEXT,
        empresa TEXT,
        data_geracao TEXT,
        hora_geracao TEXT,
        arquivo_sequencia INTEGER,
        versao_layout TEXT,
        total_lotes INTEGER,
        total_registros INTEGER,
        valor_total TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cnab_records (
        id TEXT PRIMARY KEY,
        file_id TEXT NOT NULL REFERENCES files(id),
        operation_id TEXT NOT NULL REFERENCES operations(operation_id),
        header_id TEXT,
        sequencia INTEGER NOT NULL,
        tipo TEXT NOT NULL,
        nosso_numero TEXT,
        seu_numero TEXT,
        codigo_barras TEXT,
        valor_titulo TEXT,
        valor_pago TEXT,
        data_vencimento TEXT,
        data_pagamento TEXT,
        pagador_nome TEXT,
        pagador_documento TEXT,
        codigo_ocorrencia TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS barcodes (
        id TEXT PRIMARY KEY,
        file_id TEXT NOT NULL REFERENCES files(id),
        operation_id TEXT NOT NULL REFERENCES operations(operation_id),
        codigo_barras TEXT NOT NULL,
        tipo TEXT NOT NULL,
        segmento TEXT NOT NULL,
        favorecido TEXT,
        valor TEXT NOT NULL,
        data_vencimento TEXT,
        status_pagamento TEXT NOT NULL
    );
    "#,
];

#[instrument(skip(connection))]
pub async fn apply_schema(connection: &Connection) -> Result<(), PersistenceError> {
    for statement in STATEMENTS {
        connection
            .execute(statement, ())
            .await
            .map_err(|e| PersistenceError::Schema(e.to_string()))?;
    }
    Ok(())
}
