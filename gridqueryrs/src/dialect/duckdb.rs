//! DuckDB dialect implementation.

use super::Dialect;

/// DuckDB treats double quotes as identifiers, so literals use the
/// single-quoted default; placeholders are positional `?`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuckDbDialect;

impl Dialect for DuckDbDialect {}
