//! Rows service: compile a grid request, run it, and shape the page response.

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::backends::{BackendConnection, ConnectionManager};
use crate::config::QueryConfig;
use crate::error::{GridQueryError, Result};
use crate::executor::QueryResult;
use crate::query_builder::{CompiledQuery, SqlBuilder};
use crate::request::QueryRequest;
use crate::sql_ast::RenderMode;

pub const FALLBACK_NOTICE: &str = "Using fallback mode - database connection failed";

/// Page of rows in the shape the grid's datasource expects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsResponse {
    pub rows: Vec<Map<String, Value>>,
    /// `min(pageSize, rows returned)`.
    pub last_row: u64,
    pub success: bool,
    pub has_more: bool,
    /// Compiled SQL, only set in fallback mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored_filters: Vec<String>,
}

impl RowsResponse {
    /// Empty but successful page carrying the SQL that could not be executed.
    pub fn fallback(sql: String, ignored_filters: Vec<String>) -> Self {
        Self {
            rows: Vec::new(),
            last_row: 0,
            success: true,
            has_more: false,
            sql_query: Some(sql),
            notice: Some(FALLBACK_NOTICE.to_string()),
            ignored_filters,
        }
    }
}

/// Serve one page for `request` from the named data source.
///
/// Invalid requests are rejected before anything is compiled. Execution
/// failures fall back to an empty page with the inline SQL when the data
/// source's `fallback_on_execution_error` is set.
pub async fn run_rows_query(
    connections: &ConnectionManager,
    data_source: &str,
    request: &QueryRequest,
) -> Result<RowsResponse> {
    let config = connections.config_for(data_source).query;
    let connection = connections.get(data_source).ok_or_else(|| {
        GridQueryError::Validation(format!("data source {data_source} not registered"))
    })?;
    run_rows_query_with(connection.as_ref(), &config, request).await
}

/// Same as [`run_rows_query`] against a single connection.
pub async fn run_rows_query_with(
    connection: &dyn BackendConnection,
    config: &QueryConfig,
    request: &QueryRequest,
) -> Result<RowsResponse> {
    request.validate()?;
    let window = request.page_window()?;
    if config.max_page_size > 0 && window.page_size() > config.max_page_size {
        return Err(GridQueryError::Validation(format!(
            "page size {} exceeds the maximum of {}",
            window.page_size(),
            config.max_page_size
        )));
    }

    let builder = SqlBuilder;
    let mode = if config.parameterized {
        RenderMode::Parameterized
    } else {
        RenderMode::Inline
    };
    let compiled = builder.build_with_dialect(request, connection.dialect(), mode)?;
    if !compiled.ignored_filters.is_empty() {
        tracing::warn!(
            table = request.table_name.as_str(),
            ignored = ?compiled.ignored_filters,
            "request contains filters that were not applied"
        );
    }

    match execute_with_timeout(connection, &compiled, config.timeout_ms).await {
        Ok(result) => {
            let page = window.trim(result.rows);
            tracing::debug!(
                rows = page.row_count,
                has_more = page.has_more,
                start_row = window.start_row(),
                "served grid page"
            );
            Ok(RowsResponse {
                rows: page.rows,
                last_row: page.row_count,
                success: true,
                has_more: page.has_more,
                sql_query: None,
                notice: None,
                ignored_filters: compiled.ignored_filters,
            })
        }
        Err(e) if config.fallback_on_execution_error => {
            let sql = builder.build_inline(request, connection.dialect())?;
            tracing::warn!(error = %e, sql = %sql, "query execution failed, using fallback mode");
            Ok(RowsResponse::fallback(sql, compiled.ignored_filters))
        }
        Err(e) => {
            tracing::error!(error = %e, "query execution failed");
            Err(e)
        }
    }
}

async fn execute_with_timeout(
    connection: &dyn BackendConnection,
    compiled: &CompiledQuery,
    timeout_ms: u64,
) -> Result<QueryResult> {
    if timeout_ms == 0 {
        return connection.execute(compiled).await;
    }
    tokio::time::timeout(Duration::from_millis(timeout_ms), connection.execute(compiled))
        .await
        .map_err(|_| GridQueryError::Execution(format!("query timed out after {timeout_ms}ms")))?
}
