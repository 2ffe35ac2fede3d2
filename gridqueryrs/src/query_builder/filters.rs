use serde_json::Value;

use crate::request::{FilterPredicate, NumberFilter, TextFilter};
use crate::sql_ast::{SqlBinaryOperator, SqlExpr};

/// Translate one filter model entry into a boolean expression on `column`.
///
/// Unsupported predicates become `true` so one bad filter never fails the whole
/// request; the caller records them as ignored.
pub(crate) fn render_filter_expr(column: &str, predicate: &FilterPredicate) -> SqlExpr {
    match predicate {
        FilterPredicate::Text(text) => text_filter_expr(column, text),
        FilterPredicate::Number(number) => number_filter_expr(column, number),
        FilterPredicate::Unsupported { filter_type, op } => {
            tracing::warn!(
                column = column,
                filter_type = filter_type.as_str(),
                op = op.as_deref().unwrap_or(""),
                "unsupported filter ignored"
            );
            SqlExpr::True
        }
    }
}

fn text_filter_expr(column: &str, filter: &TextFilter) -> SqlExpr {
    let (op, pattern) = match filter {
        TextFilter::Equals(v) => (SqlBinaryOperator::Eq, v.clone()),
        TextFilter::NotEqual(v) => (SqlBinaryOperator::Neq, v.clone()),
        TextFilter::Contains(v) => (SqlBinaryOperator::Like, format!("%{v}%")),
        TextFilter::NotContains(v) => (SqlBinaryOperator::NotLike, format!("%{v}%")),
        TextFilter::StartsWith(v) => (SqlBinaryOperator::Like, format!("{v}%")),
        TextFilter::EndsWith(v) => (SqlBinaryOperator::Like, format!("%{v}")),
    };
    SqlExpr::binary(
        op,
        SqlExpr::column(column),
        SqlExpr::Literal(Value::String(pattern)),
    )
}

fn number_filter_expr(column: &str, filter: &NumberFilter) -> SqlExpr {
    let compare = |op, value: &serde_json::Number| {
        SqlExpr::binary(
            op,
            SqlExpr::column(column),
            SqlExpr::Literal(Value::Number(value.clone())),
        )
    };
    match filter {
        NumberFilter::Equals(v) => compare(SqlBinaryOperator::Eq, v),
        NumberFilter::NotEqual(v) => compare(SqlBinaryOperator::Neq, v),
        NumberFilter::GreaterThan(v) => compare(SqlBinaryOperator::Gt, v),
        NumberFilter::GreaterThanOrEqual(v) => compare(SqlBinaryOperator::Gte, v),
        NumberFilter::LessThan(v) => compare(SqlBinaryOperator::Lt, v),
        NumberFilter::LessThanOrEqual(v) => compare(SqlBinaryOperator::Lte, v),
        NumberFilter::InRange { from, to } => SqlExpr::Nested(Box::new(SqlExpr::binary(
            SqlBinaryOperator::And,
            compare(SqlBinaryOperator::Gte, from),
            compare(SqlBinaryOperator::Lte, to),
        ))),
    }
}
