pub mod backends;
pub mod config;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod pagination;
pub mod query_builder;
pub mod request;
pub mod runtime;
pub mod sql_ast;

pub use backends::{BackendConnection, ConnectionManager};
#[cfg(feature = "duckdb")]
pub use backends::DuckDbConnection;
pub use config::GridQueryConfig;
pub use error::GridQueryError;
pub use executor::QueryResult;
pub use query_builder::{get_rows_sql, CompiledQuery, SqlBuilder};
pub use request::{FilterPredicate, QueryRequest};
pub use runtime::{run_rows_query, RowsResponse};
