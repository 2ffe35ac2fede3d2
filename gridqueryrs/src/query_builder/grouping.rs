//! Grouping depth: how far the grid has drilled into its row groups.

use crate::request::{QueryRequest, RowGroupCol};

/// True while there are configured group levels the caller has not expanded yet.
pub fn is_grouping(row_group_cols: &[RowGroupCol], group_keys: &[String]) -> bool {
    GroupingDepth::from_counts(group_keys.len(), row_group_cols.len()).is_grouping()
}

/// Resolved once per compile and handed to every clause builder, so SELECT,
/// GROUP BY and ORDER BY always agree on the level being revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingDepth {
    /// Number of group levels already expanded (`group_keys.len()`).
    depth: usize,
    /// Number of configured group levels (`row_group_cols.len()`).
    levels: usize,
}

impl GroupingDepth {
    pub fn resolve(request: &QueryRequest) -> Self {
        Self::from_counts(request.group_keys.len(), request.row_group_cols.len())
    }

    fn from_counts(depth: usize, levels: usize) -> Self {
        Self { depth, levels }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_grouping(&self) -> bool {
        self.levels > self.depth
    }

    /// The group column revealed by this request, if grouping.
    pub fn next_group_col<'a>(&self, cols: &'a [RowGroupCol]) -> Option<&'a RowGroupCol> {
        if self.is_grouping() {
            cols.get(self.depth)
        } else {
            None
        }
    }

    /// Ids of the expanded levels plus the one being revealed.
    pub fn sortable_ids<'a>(&self, cols: &'a [RowGroupCol]) -> Vec<&'a str> {
        cols.iter()
            .take(self.depth + 1)
            .map(|c| c.id.as_str())
            .collect()
    }
}
