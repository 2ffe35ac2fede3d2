//! MySQL dialect implementation.
//!
//! String literals are double-quoted, which is the statement shape grid
//! backends on MySQL have always produced (`country = "USA"`).

use serde_json::Value;

use super::Dialect;

#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn render_literal(&self, value: &Value) -> String {
        match value {
            Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\"\"")),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "NULL".to_string(),
            other => format!("\"{}\"", other.to_string().replace('\\', "\\\\").replace('"', "\"\"")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn double_quotes_strings() {
        assert_eq!(MySqlDialect.render_literal(&json!("USA")), "\"USA\"");
        assert_eq!(MySqlDialect.render_literal(&json!(2008)), "2008");
    }

    #[test]
    fn escapes_embedded_quotes_and_backslashes() {
        assert_eq!(
            MySqlDialect.render_literal(&json!("a\" or \"1\"=\"1")),
            "\"a\"\" or \"\"1\"\"=\"\"1\""
        );
        assert_eq!(MySqlDialect.render_literal(&json!("c:\\")), "\"c:\\\\\"");
    }
}
