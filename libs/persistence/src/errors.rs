// [libs/persistence/src/errors.rs]
use thiserror::Error;

/// Persistence-scope failures (§7: "True database errors trigger rollback
/// and `markError`"). Note what is deliberately absent: hash collision is
/// not an error kind here — `record_file` reports it as
/// [`crate::FileRecordResult::Duplicate`], a value, not an error (§9's
/// "result types, not exceptions" redesign flag).
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("CONEXAO_BANCO_FALHOU: {0}")]
    Connection(String),

    #[error("ESQUEMA_FALHOU: {0}")]
    Schema(String),

    #[error("TRANSACAO_FALHOU: {0}")]
    Transaction(String),

    #[error("CONSULTA_FALHOU: {0}")]
    Query(#[from] libsql::Error),

    #[error("MAPEAMENTO_FALHOU: {0}")]
    Mapping(String),

    #[error("OPERACAO_NAO_ENCONTRADA: {0}")]
    OperationNotFound(String),
}

/// True when `err` is SQLite's unique-constraint violation on
/// `idx_files_file_hash` specifically, as opposed to any other query
/// failure. `record_file` uses this to tell a concurrent duplicate-hash
/// race (§5: "the loser receives a uniqueness violation which is
/// translated into DUPLICATE") apart from a real database error, which
/// must still propagate.
pub fn is_file_hash_constraint_violation(err: &libsql::Error) -> bool {
    let message = err.to_string();
    message.contains("UNIQUE constraint failed") && message.contains("file_hash")
}
