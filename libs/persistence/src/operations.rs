// [libs/persistence/src/operations.rs]
//! `operations` row lifecycle (§3, §4.G): `recordIngest`, `markSuccess`,
//! `markError`, plus the minimal read path (`find_by_id`) the CLI status
//! report and the `DUPLICATE` short-circuit need (SPEC_FULL.md §12).

use crate::errors::PersistenceError;
use cnab_domain::{Operation, OperationStatus, OperationType};
use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

pub struct OperationsRepository<'a> {
    connection: &'a Connection,
}

impl<'a> OperationsRepository<'a> {
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self, operation))]
    pub async fn insert(&self, operation: &Operation) -> Result<(), PersistenceError> {
        self.connection
            .execute(
                r#"INSERT INTO operations (
                    operation_id, operation_type, status, request_data,
                    response_data, error_details, processing_time_ms,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
                params![
                    operation.operation_id.to_string(),
                    operation.operation_type.as_str().to_string(),
                    operation.status.as_str().to_string(),
                    operation.request_data.to_string(),
                    operation.response_data.as_ref().map(|v| v.to_string()),
                    operation.error_details.as_ref().map(|v| v.to_string()),
                    operation.processing_time_ms,
                    operation.created_at.to_rfc3339(),
                    operation.updated_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn update_status(&self, operation: &Operation) -> Result<(), PersistenceError> {
        self.connection
            .execute(
                r#"UPDATE operations SET
                    status = ?2, response_data = ?3, error_details = ?4,
                    processing_time_ms = ?5, updated_at = ?6
                WHERE operation_id = ?1"#,
                params![
                    operation.operation_id.to_string(),
                    operation.status.as_str().to_string(),
                    operation.response_data.as_ref().map(|v| v.to_string()),
                    operation.error_details.as_ref().map(|v| v.to_string()),
                    operation.processing_time_ms,
                    operation.updated_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, operation_id: Uuid) -> Result<Option<OperationSummary>, PersistenceError> {
        let mut rows = self
            .connection
            .query(
                "SELECT operation_id, operation_type, status, created_at, updated_at, processing_time_ms FROM operations WHERE operation_id = ?1",
                params![operation_id.to_string()],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let operation_type: String = row.get(1)?;
        let status: String = row.get(2)?;
        Ok(Some(OperationSummary {
            operation_id,
            operation_type: parse_operation_type(&operation_type),
            status: parse_operation_status(&status),
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
            processing_time_ms: row.get(5)?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct OperationSummary {
    pub operation_id: Uuid,
    pub operation_type: OperationType,
    pub status: OperationStatus,
    pub created_at: String,
    pub updated_at: String,
    pub processing_time_ms: Option<i64>,
}

fn parse_operation_type(raw: &str) -> OperationType {
    match raw {
        "cnab400" => OperationType::Cnab400,
        "cnab240" => OperationType::Cnab240,
        "validation" => OperationType::Validation,
        "webhook" => OperationType::Webhook,
        _ => OperationType::Auto,
    }
}

fn parse_operation_status(raw: &str) -> OperationStatus {
    match raw {
        "processing" => OperationStatus::Processing,
        "success" => OperationStatus::Success,
        "error" => OperationStatus::Error,
        _ => OperationStatus::Started,
    }
}
