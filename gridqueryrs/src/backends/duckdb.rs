//! DuckDB backend implementation.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use duckdb::types::Value as DuckValue;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use crate::dialect::DuckDbDialect;
use crate::error::{GridQueryError, Result};
use crate::executor::{duck_value_to_json, json_to_duck_value, ColumnMeta, QueryResult};
use crate::query_builder::CompiledQuery;

use super::BackendConnection;

/// DuckDB connection implementing the unified backend trait.
///
/// Pooled connections are clones of one root connection, so in-memory
/// databases are shared by every query.
#[derive(Clone)]
pub struct DuckDbConnection {
    dialect: DuckDbDialect,
    limiter: Arc<Semaphore>,
    root: Arc<Mutex<duckdb::Connection>>,
    pool: Arc<Mutex<Vec<duckdb::Connection>>>,
}

impl DuckDbConnection {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "opening DuckDB database");
        let conn = duckdb::Connection::open(path)
            .map_err(|e| GridQueryError::Execution(format!("open duckdb: {e}")))?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = duckdb::Connection::open_in_memory()
            .map_err(|e| GridQueryError::Execution(format!("open duckdb: {e}")))?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection, e.g. one a caller has already seeded.
    pub fn from_connection(conn: duckdb::Connection) -> Self {
        Self {
            dialect: DuckDbDialect,
            limiter: Arc::new(Semaphore::new(16)),
            root: Arc::new(Mutex::new(conn)),
            pool: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Configure maximum concurrent executions; callers can tune based on hardware.
    pub fn with_max_concurrency(mut self, max_in_flight: usize) -> Self {
        tracing::debug!(max_concurrency = max_in_flight, "configuring DuckDB concurrency");
        self.limiter = Arc::new(Semaphore::new(max_in_flight));
        self
    }

    /// Execution slots not currently held by a running statement.
    pub fn available_slots(&self) -> usize {
        self.limiter.available_permits()
    }

    /// The permit moves into the blocking task, so a statement abandoned by a
    /// timeout keeps its slot until DuckDB actually returns.
    async fn acquire_slot(&self) -> Result<OwnedSemaphorePermit> {
        if self.available_slots() == 0 {
            tracing::debug!("all DuckDB slots in use, waiting for permit");
        }
        self.limiter
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| GridQueryError::Execution(format!("limiter closed: {e}")))
    }

    async fn checkout_connection(&self) -> Result<duckdb::Connection> {
        let mut guard = self.pool.lock().await;
        if let Some(conn) = guard.pop() {
            let pool_size = guard.len();
            drop(guard);
            tracing::trace!(pool_remaining = pool_size, "reusing pooled DuckDB connection");
            return Ok(conn);
        }
        drop(guard);
        tracing::debug!("cloning new DuckDB connection");
        self.root
            .lock()
            .await
            .try_clone()
            .map_err(|e| GridQueryError::Execution(format!("clone duckdb connection: {e}")))
    }
}

#[async_trait]
impl BackendConnection for DuckDbConnection {
    fn dialect(&self) -> &(dyn crate::dialect::Dialect + Send + Sync) {
        &self.dialect
    }

    async fn execute(&self, query: &CompiledQuery) -> Result<QueryResult> {
        let sql = query.sql.clone();
        let params: Vec<DuckValue> = query.params.iter().map(json_to_duck_value).collect();
        let permit = self.acquire_slot().await?;
        let conn = self.checkout_connection().await?;
        let pool = self.pool.clone();
        let result =
            tokio::task::spawn_blocking(move || -> Result<(QueryResult, duckdb::Connection)> {
                let _permit = permit;
                let start = Instant::now();
                let result = {
                    let mut stmt = conn.prepare(&sql)?;
                    let mut rows_iter = stmt.query(duckdb::params_from_iter(params))?;
                    let stmt_ref = rows_iter.as_ref().ok_or_else(|| {
                        GridQueryError::Execution("statement missing".to_string())
                    })?;
                    let mut column_names = Vec::new();
                    for idx in 0..stmt_ref.column_count() {
                        let name = stmt_ref
                            .column_name(idx)
                            .map_err(|e| GridQueryError::Execution(e.to_string()))?;
                        column_names.push(name.to_string());
                    }
                    let mut rows = Vec::new();
                    while let Some(row) = rows_iter.next()? {
                        let mut map = serde_json::Map::new();
                        for (idx, name) in column_names.iter().enumerate() {
                            let value = duck_value_to_json(row.get_ref(idx)?.to_owned());
                            map.insert(name.clone(), value);
                        }
                        rows.push(map);
                    }
                    let columns: Vec<_> = column_names
                        .into_iter()
                        .map(|name| ColumnMeta { name })
                        .collect();
                    QueryResult { columns, rows }
                };
                tracing::debug!(
                    rows = result.rows.len(),
                    columns = result.columns.len(),
                    ms = start.elapsed().as_millis(),
                    "duckdb execute"
                );
                Ok((result, conn))
            })
            .await
            .map_err(|e| GridQueryError::Execution(format!("task join error: {e}")))?;

        let (result, conn) = result?;
        {
            let mut guard = pool.lock().await;
            guard.push(conn);
        }
        Ok(result)
    }
}
