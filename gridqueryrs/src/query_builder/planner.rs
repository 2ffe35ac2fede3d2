use crate::error::Result;
use crate::request::QueryRequest;
use crate::sql_ast::SelectQuery;

use super::builders::{
    build_filters, build_from, build_group_by, build_limit, build_order_by, build_select,
};
use super::grouping::GroupingDepth;

/// A validated request turned into a SELECT tree, before any dialect is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub query: SelectQuery,
    pub grouping: GroupingDepth,
    /// Filter model keys that compiled to `true`.
    pub ignored_filters: Vec<String>,
}

pub(crate) fn build_query(request: &QueryRequest) -> Result<QueryPlan> {
    request.validate()?;
    let window = request.page_window()?;
    let grouping = GroupingDepth::resolve(request);

    let mut ignored_filters = Vec::new();
    let (limit, offset) = build_limit(window);
    let query = SelectQuery {
        select: build_select(request, grouping),
        from: build_from(request),
        filters: build_filters(request, &mut ignored_filters),
        group_by: build_group_by(request, grouping),
        order_by: build_order_by(request, grouping),
        limit: Some(limit),
        offset: Some(offset),
    };

    tracing::debug!(
        table = request.table_name.as_str(),
        depth = grouping.depth(),
        grouping = grouping.is_grouping(),
        filters = query.filters.len(),
        ignored = ignored_filters.len(),
        "planned grid query"
    );

    Ok(QueryPlan {
        query,
        grouping,
        ignored_filters,
    })
}
