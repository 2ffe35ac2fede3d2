//! PostgreSQL dialect implementation.

use serde_json::Value;

use super::Dialect;

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn placeholder(&self, idx: usize, value: &Value) -> String {
        // Pin parameter types to what the backend binds (f64, String) instead of
        // letting the server infer them from the compared column.
        match value {
            Value::Number(_) => format!("${}::float8", idx + 1),
            Value::String(_) => format!("${}::text", idx + 1),
            _ => format!("${}", idx + 1),
        }
    }

    fn render_text_cast(&self, expr: &str) -> String {
        format!("{expr}::text")
    }
}
