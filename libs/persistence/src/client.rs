// [libs/persistence/src/client.rs]
//! Database connection lifecycle, modeled on the teacher's `TursoClient`:
//! a `libsql::Database` is opened once, the schema is applied against a
//! bootstrap connection, and callers borrow a fresh [`Connection`] per
//! transaction (§5: "orchestrators borrow a connection for the lifetime of
//! their transaction and return it on commit/rollback").

use crate::errors::PersistenceError;
use crate::schema::apply_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct PersistenceClient {
    database: Arc<Database>,
    /// For `:memory:` DSNs, libsql hands every `connect()` call an
    /// independent empty database unless one connection is kept open to
    /// anchor the in-memory page cache. Unused for file-backed/remote DSNs.
    _memory_anchor: Option<Arc<Connection>>,
}

impl PersistenceClient {
    /// `dsn` is either a local file path, `:memory:`, or a `libsql://`
    /// remote URL (in which case `auth_token` must be `Some`).
    #[instrument(skip(auth_token))]
    pub async fn connect(dsn: &str, auth_token: Option<String>) -> Result<Self, PersistenceError> {
        if dsn.is_empty() {
            return Err(PersistenceError::Connection("DSN vazio".to_string()));
        }

        let is_remote = dsn.starts_with("libsql://") || dsn.starts_with("https://");
        let database = if is_remote {
            let token = auth_token
                .ok_or_else(|| PersistenceError::Connection("token de autenticacao ausente para DSN remoto".to_string()))?;
            Builder::new_remote(dsn.to_string(), token)
                .build()
                .await
                .map_err(|e| PersistenceError::Connection(e.to_string()))?
        } else {
            Builder::new_local(dsn)
                .build()
                .await
                .map_err(|e| PersistenceError::Connection(e.to_string()))?
        };

        let is_memory = dsn.contains(":memory:") || dsn.contains("mode=memory");
        let bootstrap = database.connect().map_err(|e| PersistenceError::Connection(e.to_string()))?;
        apply_schema(&bootstrap).await?;
        info!(%dsn, "cnab-persistence: schema ready");

        let anchor = if is_memory { Some(Arc::new(bootstrap)) } else { None };
        Ok(Self { database: Arc::new(database), _memory_anchor: anchor })
    }

    pub fn connection(&self) -> Result<Connection, PersistenceError> {
        self.database.connect().map_err(|e| PersistenceError::Connection(e.to_string()))
    }
}
