// [libs/persistence/src/lib.rs]
//! Content-addressed, transactional persistence for the ingest pipeline
//! (§3, §4.G, §6). [`Persister`] is the crate's only public entry point:
//! it owns a [`PersistenceClient`] and composes the repositories in
//! `operations`/`files`/`tree` behind the four calls an orchestrator needs
//! — `record_ingest`, `record_file`, `mark_success`, `mark_error`.

pub mod client;
pub mod errors;
pub mod files;
pub mod operations;
pub mod schema;
pub mod tree;

pub use client::PersistenceClient;
pub use errors::PersistenceError;
pub use operations::OperationSummary;

use cnab_domain::{Barcode, FilePrint, Operation, ParsedTree};
use libsql::params;
use operations::OperationsRepository;
use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Result of [`Persister::record_file`]: either the file and its parsed
/// tree were written, or an identical `file_hash` already exists and
/// nothing new was written (§5, §9 — a value, not an exception).
pub enum FileRecordResult {
    Inserted { barcodes: Vec<Barcode> },
    Duplicate { existing_file_id: Uuid },
}

pub struct Persister {
    client: PersistenceClient,
}

impl Persister {
    pub fn new(client: PersistenceClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, request_data))]
    pub async fn record_ingest(&self, operation: &Operation, request_data: Value) -> Result<(), PersistenceError> {
        let _ = request_data;
        let connection = self.client.connection()?;
        OperationsRepository::new(&connection).insert(operation).await?;
        info!(operation_id = %operation.operation_id, "cnab-persistence: operation recorded");
        Ok(())
    }

    /// Writes the `files` row, the parsed tree, and every extracted
    /// barcode in a single transaction (§4.G). Short-circuits to
    /// `Duplicate` before any tree write if `print.file_hash` already
    /// exists and `force_reprocess` is `false` — the duplicate check and
    /// the insert happen inside the same transaction so a concurrent
    /// writer's race still resolves through the unique index rather than a
    /// lost check-then-act window. When `force_reprocess` is `true` and a
    /// prior row for the same hash exists, that row and everything it owns
    /// are deleted first so the hash's uniqueness invariant (§3) survives
    /// the reprocess — the caller's `file_id` becomes the new canonical id.
    ///
    /// Two concurrent callers can both pass the pre-insert `find_by_hash_in_tx`
    /// check before either commits (§5: "two concurrent `recordFile` calls
    /// for the same hash must not both succeed"). SQLite still serializes
    /// the two writers, so the loser's `insert_file_in_tx` blocks behind the
    /// winner's commit and then fails on `idx_files_file_hash`; that failure
    /// is caught here and turned into `Duplicate` rather than propagated.
    #[instrument(skip(self, print, tree))]
    pub async fn record_file(
        &self,
        file_id: Uuid,
        print: &FilePrint,
        tree: &ParsedTree,
        force_reprocess: bool,
    ) -> Result<FileRecordResult, PersistenceError> {
        let connection = self.client.connection()?;
        let tx = connection
            .transaction()
            .await
            .map_err(|e| PersistenceError::Transaction(e.to_string()))?;

        if let Some(existing) = find_by_hash_in_tx(&tx, &print.file_hash).await? {
            if !force_reprocess {
                tx.rollback().await.map_err(|e| PersistenceError::Transaction(e.to_string()))?;
                warn!(file_hash = %print.file_hash, %existing, "cnab-persistence: duplicate file, skipping tree write");
                return Ok(FileRecordResult::Duplicate { existing_file_id: existing });
            }
            info!(file_hash = %print.file_hash, %existing, "cnab-persistence: forceReprocess set, replacing prior file");
            delete_file_tree_in_tx(&tx, existing).await?;
        }

        if let Err(err) = insert_file_in_tx(&tx, file_id, print).await {
            let PersistenceError::Query(sqlite_err) = &err else { return Err(err) };
            if !errors::is_file_hash_constraint_violation(sqlite_err) {
                return Err(err);
            }
            tx.rollback().await.map_err(|e| PersistenceError::Transaction(e.to_string()))?;
            let existing = find_by_hash(&connection, &print.file_hash)
                .await?
                .ok_or(err)?;
            warn!(file_hash = %print.file_hash, %existing, "cnab-persistence: lost concurrent duplicate-hash race, deferring to winner");
            return Ok(FileRecordResult::Duplicate { existing_file_id: existing });
        }

        let barcodes = match tree {
            ParsedTree::Cnab240(file) => tree::persist_cnab240(&tx, file_id, print.operation_id, file).await?,
            ParsedTree::Cnab400(file) => tree::persist_cnab400(&tx, file_id, print.operation_id, file).await?,
        };

        tx.commit().await.map_err(|e| PersistenceError::Transaction(e.to_string()))?;
        info!(%file_id, barcode_count = barcodes.len(), "cnab-persistence: file and tree recorded");
        Ok(FileRecordResult::Inserted { barcodes })
    }

    #[instrument(skip(self, operation))]
    pub async fn mark_success(&self, operation: &Operation) -> Result<(), PersistenceError> {
        let connection = self.client.connection()?;
        OperationsRepository::new(&connection).update_status(operation).await
    }

    #[instrument(skip(self, operation))]
    pub async fn mark_error(&self, operation: &Operation) -> Result<(), PersistenceError> {
        let connection = self.client.connection()?;
        OperationsRepository::new(&connection).update_status(operation).await
    }

    #[instrument(skip(self))]
    pub async fn find_operation(&self, operation_id: Uuid) -> Result<OperationSummary, PersistenceError> {
        let connection = self.client.connection()?;
        OperationsRepository::new(&connection)
            .find_by_id(operation_id)
            .await?
            .ok_or_else(|| PersistenceError::OperationNotFound(operation_id.to_string()))
    }
}

/// Looks up a `file_hash` against the open transaction directly: the dedup
/// check and the insert that follows must observe the same uncommitted
/// view, which a lookup against a separately-borrowed `Connection` could
/// not guarantee.
async fn find_by_hash_in_tx(tx: &libsql::Transaction, file_hash: &str) -> Result<Option<Uuid>, PersistenceError> {
    let mut rows = tx
        .query("SELECT id FROM files WHERE file_hash = ?1", params![file_hash.to_string()])
        .await?;
    match rows.next().await? {
        Some(row) => {
            let id: String = row.get(0)?;
            Ok(Some(Uuid::parse_str(&id).map_err(|e| PersistenceError::Mapping(e.to_string()))?))
        }
        None => Ok(None),
    }
}

/// Same lookup as [`find_by_hash_in_tx`], against a plain `Connection`
/// instead of an open transaction — used once the losing side of a
/// concurrent duplicate-hash race has rolled back and needs to read the
/// winner's now-committed row.
async fn find_by_hash(connection: &libsql::Connection, file_hash: &str) -> Result<Option<Uuid>, PersistenceError> {
    let mut rows = connection
        .query("SELECT id FROM files WHERE file_hash = ?1", params![file_hash.to_string()])
        .await?;
    match rows.next().await? {
        Some(row) => {
            let id: String = row.get(0)?;
            Ok(Some(Uuid::parse_str(&id).map_err(|e| PersistenceError::Mapping(e.to_string()))?))
        }
        None => Ok(None),
    }
}

/// Deletes every row a prior ingest of `file_id` wrote — headers, detail
/// records, barcodes, and the `files` row itself — so a `forceReprocess`
/// re-insert starts from a clean slate without ever having two rows share
/// one `file_hash` (§3's uniqueness invariant).
async fn delete_file_tree_in_tx(tx: &libsql::Transaction, file_id: Uuid) -> Result<(), PersistenceError> {
    let id = file_id.to_string();
    for table in ["barcodes", "cnab_records", "cnab240_files", "cnab_headers"] {
        tx.execute(&format!("DELETE FROM {table} WHERE file_id = ?1"), params![id.clone()]).await?;
    }
    tx.execute("DELETE FROM files WHERE id = ?1", params![id]).await?;
    Ok(())
}

/// Inserts the `files` row against the open transaction (see
/// [`find_by_hash_in_tx`]).
async fn insert_file_in_tx(tx: &libsql::Transaction, file_id: Uuid, print: &FilePrint) -> Result<(), PersistenceError> {
    tx.execute(
        r#"INSERT INTO files (
            id, operation_id, file_hash, file_name, file_size,
            file_type, content_preview, validation_status,
            validation_details, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
        params![
            file_id.to_string(),
            print.operation_id.to_string(),
            print.file_hash.clone(),
            print.file_name.clone(),
            print.file_size as i64,
            print.file_type.as_str().to_string(),
            print.content_preview.clone(),
            print.validation_status.as_str().to_string(),
            print.validation_details.as_ref().map(|v| v.to_string()),
            chrono::Utc::now().to_rfc3339(),
        ],
    )
    .await?;
    Ok(())
}
