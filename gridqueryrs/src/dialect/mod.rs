//! SQL dialect abstractions for different database backends.
//!
//! Dialects only decide how values reach the statement: literal quoting for
//! inline rendering and placeholder syntax for parameterized rendering. Clause
//! layout and keywords are shared so every dialect produces the same SQL shape.

use serde_json::Value;

pub trait Dialect {
    /// Placeholder for the bound value at zero-based `idx`.
    fn placeholder(&self, _idx: usize, _value: &Value) -> String {
        "?".to_string()
    }
    /// Dialects that compare text against numbers implicitly leave `expr` alone.
    fn render_text_cast(&self, expr: &str) -> String {
        expr.to_string()
    }
    fn render_aggregation(&self, func: &str, expr: &str) -> String {
        format!("{func}({expr})")
    }
    fn render_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Array(items) => {
                let rendered: Vec<String> = items.iter().map(|v| self.render_literal(v)).collect();
                rendered.join(", ")
            }
            Value::Object(_) => {
                format!("'{}'", value.to_string().replace('\'', "''"))
            }
        }
    }
}

mod mysql;
pub use mysql::MySqlDialect;

mod duckdb;
pub use duckdb::DuckDbDialect;

mod postgres;
pub use postgres::PostgresDialect;
