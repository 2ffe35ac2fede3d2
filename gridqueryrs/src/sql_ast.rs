use serde_json::Value;

use crate::dialect::Dialect;
use crate::request::SortDirection;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    /// Column reference, emitted verbatim.
    Column(String),
    Literal(Value),
    BinaryOp {
        op: SqlBinaryOperator,
        left: Box<SqlExpr>,
        right: Box<SqlExpr>,
    },
    /// Parenthesised sub-expression.
    Nested(Box<SqlExpr>),
    Aggregate {
        func: String,
        expr: Box<SqlExpr>,
    },
    /// Expression compared as text, for group keys that arrive as strings
    /// whatever the column type.
    AsText(Box<SqlExpr>),
    /// Always-true predicate used for filters the compiler cannot translate.
    True,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlBinaryOperator {
    And,
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
}

impl SqlExpr {
    pub fn column(name: impl Into<String>) -> Self {
        SqlExpr::Column(name.into())
    }

    pub fn binary(op: SqlBinaryOperator, left: SqlExpr, right: SqlExpr) -> Self {
        SqlExpr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: SqlExpr,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    /// Empty selects every column (`*`).
    pub select: Vec<SelectItem>,
    pub from: String,
    pub filters: Vec<SqlExpr>,
    pub group_by: Vec<SqlExpr>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// How literal values reach the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Values are written into the statement. Used for debugging output and the
    /// degraded-mode response.
    Inline,
    /// Values become dialect placeholders and are returned separately for binding.
    Parameterized,
}

/// SQL text plus the values bound to its placeholders, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedSql {
    pub sql: String,
    pub params: Vec<Value>,
}

pub struct SqlRenderer<'d> {
    dialect: &'d dyn Dialect,
    mode: RenderMode,
}

impl<'d> SqlRenderer<'d> {
    pub fn new(dialect: &'d dyn Dialect, mode: RenderMode) -> Self {
        Self { dialect, mode }
    }

    /// Render clauses in fixed SQL order: SELECT, FROM, WHERE, GROUP BY, ORDER BY,
    /// LIMIT/OFFSET. Every clause carries its own leading space.
    pub fn render_select(&self, query: &SelectQuery) -> RenderedSql {
        let mut params = Vec::new();

        let mut sql = if query.select.is_empty() {
            " select *".to_string()
        } else {
            let items: Vec<String> = query
                .select
                .iter()
                .map(|item| {
                    let expr_sql = self.render_expr(&item.expr, &mut params);
                    match &item.alias {
                        Some(alias) => format!("{expr_sql} as {alias}"),
                        None => expr_sql,
                    }
                })
                .collect();
            format!(" select {}", items.join(", "))
        };

        sql.push_str(&format!(" FROM {}", query.from));

        if !query.filters.is_empty() {
            let filters: Vec<String> = query
                .filters
                .iter()
                .map(|f| self.render_expr(f, &mut params))
                .collect();
            sql.push_str(&format!(" where {}", filters.join(" and ")));
        }

        if !query.group_by.is_empty() {
            let groups: Vec<String> = query
                .group_by
                .iter()
                .map(|g| self.render_expr(g, &mut params))
                .collect();
            sql.push_str(&format!(" group by {}", groups.join(", ")));
        }

        if !query.order_by.is_empty() {
            let orders: Vec<String> = query
                .order_by
                .iter()
                .map(|o| format!("{} {}", o.column, o.direction.as_sql()))
                .collect();
            sql.push_str(&format!(" order by {}", orders.join(", ")));
        }

        if let Some(limit) = query.limit {
            sql.push_str(&format!(" limit {limit}"));
        }
        if let Some(offset) = query.offset {
            sql.push_str(&format!(" offset {offset}"));
        }

        RenderedSql { sql, params }
    }

    fn render_expr(&self, expr: &SqlExpr, params: &mut Vec<Value>) -> String {
        match expr {
            SqlExpr::Column(name) => name.clone(),
            SqlExpr::Literal(value) => match self.mode {
                RenderMode::Inline => self.dialect.render_literal(value),
                RenderMode::Parameterized => {
                    let placeholder = self.dialect.placeholder(params.len(), value);
                    params.push(value.clone());
                    placeholder
                }
            },
            SqlExpr::BinaryOp { op, left, right } => {
                let op_sql = match op {
                    SqlBinaryOperator::And => "and",
                    SqlBinaryOperator::Eq => "=",
                    SqlBinaryOperator::Neq => "!=",
                    SqlBinaryOperator::Gt => ">",
                    SqlBinaryOperator::Gte => ">=",
                    SqlBinaryOperator::Lt => "<",
                    SqlBinaryOperator::Lte => "<=",
                    SqlBinaryOperator::Like => "like",
                    SqlBinaryOperator::NotLike => "not like",
                };
                let left = self.render_expr(left, params);
                let right = self.render_expr(right, params);
                format!("{left} {op_sql} {right}")
            }
            SqlExpr::Nested(inner) => format!("({})", self.render_expr(inner, params)),
            SqlExpr::Aggregate { func, expr } => {
                let inner = self.render_expr(expr, params);
                self.dialect.render_aggregation(func, &inner)
            }
            SqlExpr::AsText(inner) => {
                let inner = self.render_expr(inner, params);
                self.dialect.render_text_cast(&inner)
            }
            SqlExpr::True => "true".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{DuckDbDialect, MySqlDialect};
    use serde_json::json;

    fn range_query() -> SelectQuery {
        SelectQuery {
            from: "olympics".to_string(),
            filters: vec![SqlExpr::Nested(Box::new(SqlExpr::binary(
                SqlBinaryOperator::And,
                SqlExpr::binary(
                    SqlBinaryOperator::Gte,
                    SqlExpr::column("year"),
                    SqlExpr::Literal(json!(2000)),
                ),
                SqlExpr::binary(
                    SqlBinaryOperator::Lte,
                    SqlExpr::column("year"),
                    SqlExpr::Literal(json!(2008)),
                ),
            )))],
            limit: Some(11),
            offset: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn inline_and_parameterized_share_shape() {
        let dialect = MySqlDialect;
        let query = range_query();

        let inline = SqlRenderer::new(&dialect, RenderMode::Inline).render_select(&query);
        assert_eq!(
            inline.sql,
            " select * FROM olympics where (year >= 2000 and year <= 2008) limit 11 offset 0"
        );
        assert!(inline.params.is_empty());

        let bound = SqlRenderer::new(&dialect, RenderMode::Parameterized).render_select(&query);
        assert_eq!(
            bound.sql,
            " select * FROM olympics where (year >= ? and year <= ?) limit 11 offset 0"
        );
        assert_eq!(bound.params, vec![json!(2000), json!(2008)]);
    }

    #[test]
    fn renders_aggregate_with_alias_and_order() {
        let dialect = DuckDbDialect;
        let query = SelectQuery {
            select: vec![
                SelectItem {
                    expr: SqlExpr::column("sport"),
                    alias: None,
                },
                SelectItem {
                    expr: SqlExpr::Aggregate {
                        func: "avg".to_string(),
                        expr: Box::new(SqlExpr::column("age")),
                    },
                    alias: Some("age".to_string()),
                },
            ],
            from: "olympics".to_string(),
            group_by: vec![SqlExpr::column("sport")],
            order_by: vec![OrderItem {
                column: "sport".to_string(),
                direction: SortDirection::Desc,
            }],
            ..Default::default()
        };

        let sql = SqlRenderer::new(&dialect, RenderMode::Inline)
            .render_select(&query)
            .sql;
        assert_eq!(
            sql,
            " select sport, avg(age) as age FROM olympics group by sport order by sport desc"
        );
    }

    #[test]
    fn always_true_filter_renders_bare() {
        let dialect = MySqlDialect;
        let query = SelectQuery {
            from: "t".to_string(),
            filters: vec![SqlExpr::True],
            ..Default::default()
        };
        let sql = SqlRenderer::new(&dialect, RenderMode::Parameterized)
            .render_select(&query)
            .sql;
        assert_eq!(sql, " select * FROM t where true");
    }
}
