//! Request-to-SQL compiler.
//!
//! The planner resolves grouping depth once, runs each clause builder and
//! assembles a [`SelectQuery`](crate::sql_ast::SelectQuery); the renderer turns
//! it into SQL for a dialect, either with bound parameters or inline literals.

use serde_json::Value;

use crate::backends::ConnectionManager;
use crate::dialect::{Dialect, MySqlDialect};
use crate::error::{GridQueryError, Result};
use crate::request::QueryRequest;
use crate::sql_ast::{RenderMode, SqlRenderer};

mod builders;
mod filters;
mod grouping;
mod planner;

pub use grouping::{is_grouping, GroupingDepth};
pub use planner::QueryPlan;

/// Compiled statement ready for execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    /// Values for the statement's placeholders; empty for inline SQL.
    pub params: Vec<Value>,
    /// Filter model keys that were not understood and compiled to `true`.
    pub ignored_filters: Vec<String>,
}

pub struct SqlBuilder;

impl Default for SqlBuilder {
    fn default() -> Self {
        Self
    }
}

impl SqlBuilder {
    /// Validate the request and build its SELECT tree.
    pub fn plan(&self, request: &QueryRequest) -> Result<QueryPlan> {
        planner::build_query(request)
    }

    /// Build SQL for a dialect in the given render mode.
    pub fn build_with_dialect(
        &self,
        request: &QueryRequest,
        dialect: &dyn Dialect,
        mode: RenderMode,
    ) -> Result<CompiledQuery> {
        let plan = self.plan(request)?;
        let rendered = SqlRenderer::new(dialect, mode).render_select(&plan.query);
        tracing::debug!(sql = %rendered.sql, params = rendered.params.len(), "compiled grid query");
        Ok(CompiledQuery {
            sql: rendered.sql,
            params: rendered.params,
            ignored_filters: plan.ignored_filters,
        })
    }

    /// Parameterized SQL; values travel separately in [`CompiledQuery::params`].
    pub fn build_parameterized(
        &self,
        request: &QueryRequest,
        dialect: &dyn Dialect,
    ) -> Result<CompiledQuery> {
        self.build_with_dialect(request, dialect, RenderMode::Parameterized)
    }

    /// SQL with values written inline, for logs and debugging output.
    pub fn build_inline(&self, request: &QueryRequest, dialect: &dyn Dialect) -> Result<String> {
        Ok(self
            .build_with_dialect(request, dialect, RenderMode::Inline)?
            .sql)
    }

    /// Build SQL using the dialect of a registered data source.
    pub fn build_for_request(
        &self,
        connections: &ConnectionManager,
        data_source: &str,
        request: &QueryRequest,
        mode: RenderMode,
    ) -> Result<CompiledQuery> {
        let connection = connections.get(data_source).ok_or_else(|| {
            GridQueryError::Validation(format!("data source {data_source} not registered"))
        })?;
        self.build_with_dialect(request, connection.dialect(), mode)
    }
}

/// Inline MySQL-flavoured SQL for a request, the statement shape grid backends
/// have historically logged and executed.
pub fn get_rows_sql(request: &QueryRequest) -> Result<String> {
    SqlBuilder.build_inline(request, &MySqlDialect)
}
