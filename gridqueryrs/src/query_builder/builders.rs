//! Clause builders.
//!
//! Each builder maps the request plus its resolved grouping depth to one part of
//! the SELECT statement. None of them fail for a validated request.

use std::collections::HashSet;

use serde_json::Value;

use crate::pagination::PageWindow;
use crate::request::{FilterPredicate, QueryRequest};
use crate::sql_ast::{OrderItem, SelectItem, SqlBinaryOperator, SqlExpr};

use super::filters::render_filter_expr;
use super::grouping::GroupingDepth;

/// Next group column plus one aggregate per value column while grouping; empty
/// (every column) at leaf level.
pub fn build_select(request: &QueryRequest, grouping: GroupingDepth) -> Vec<SelectItem> {
    let Some(group_col) = grouping.next_group_col(&request.row_group_cols) else {
        return Vec::new();
    };

    let mut items = vec![SelectItem {
        expr: SqlExpr::column(&group_col.field),
        alias: None,
    }];
    items.extend(request.value_cols.iter().map(|value_col| SelectItem {
        expr: SqlExpr::Aggregate {
            func: value_col.agg_func.clone(),
            expr: Box::new(SqlExpr::column(&value_col.field)),
        },
        alias: Some(value_col.field.clone()),
    }));
    items
}

pub fn build_from(request: &QueryRequest) -> String {
    request.table_name.clone()
}

/// Group path equalities followed by filter model clauses. Group keys are
/// strings, so the pinned column is compared as text.
///
/// Column keys of filters that could not be translated are appended to
/// `ignored_filters`.
pub fn build_filters(request: &QueryRequest, ignored_filters: &mut Vec<String>) -> Vec<SqlExpr> {
    let mut filters: Vec<SqlExpr> = request
        .row_group_cols
        .iter()
        .zip(&request.group_keys)
        .map(|(col, key)| {
            SqlExpr::binary(
                SqlBinaryOperator::Eq,
                SqlExpr::AsText(Box::new(SqlExpr::column(&col.field))),
                SqlExpr::Literal(Value::String(key.clone())),
            )
        })
        .collect();

    for (column, predicate) in request.filters() {
        if matches!(predicate, FilterPredicate::Unsupported { .. }) {
            ignored_filters.push(column.clone());
        }
        filters.push(render_filter_expr(column, predicate));
    }
    filters
}

pub fn build_group_by(request: &QueryRequest, grouping: GroupingDepth) -> Vec<SqlExpr> {
    grouping
        .next_group_col(&request.row_group_cols)
        .map(|col| vec![SqlExpr::column(&col.field)])
        .unwrap_or_default()
}

/// Caller sort order, minus columns deeper than the level being revealed when
/// grouping.
pub fn build_order_by(request: &QueryRequest, grouping: GroupingDepth) -> Vec<OrderItem> {
    let in_scope: HashSet<&str> = grouping
        .sortable_ids(&request.row_group_cols)
        .into_iter()
        .collect();

    request
        .sorts()
        .iter()
        .filter(|item| !grouping.is_grouping() || in_scope.contains(item.col_id.as_str()))
        .map(|item| OrderItem {
            column: item.col_id.clone(),
            direction: item.sort,
        })
        .collect()
}

/// `(limit, offset)` with the over-fetch row included in the limit.
pub fn build_limit(window: PageWindow) -> (u64, u64) {
    (window.limit(), window.offset())
}
