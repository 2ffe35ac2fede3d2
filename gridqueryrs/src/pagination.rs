//! Row window handling for LIMIT/OFFSET paging.
//!
//! The grid asks for rows `[start_row, end_row)`. The compiled statement fetches
//! one row more than the page holds so the caller can tell whether another page
//! exists without issuing a separate COUNT query.

use serde::Serialize;

use crate::error::{GridQueryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    start_row: u64,
    end_row: u64,
}

impl PageWindow {
    /// Validate raw row bounds; negative or reversed windows are rejected here so
    /// no negative LIMIT or OFFSET can reach the SQL text.
    pub fn new(start_row: i64, end_row: i64) -> Result<Self> {
        if start_row < 0 || end_row < 0 {
            return Err(GridQueryError::Validation(format!(
                "row window must be non-negative (startRow={start_row}, endRow={end_row})"
            )));
        }
        if end_row < start_row {
            return Err(GridQueryError::Validation(format!(
                "endRow {end_row} is before startRow {start_row}"
            )));
        }
        Ok(Self {
            start_row: start_row as u64,
            end_row: end_row as u64,
        })
    }

    pub fn start_row(&self) -> u64 {
        self.start_row
    }

    pub fn page_size(&self) -> u64 {
        self.end_row - self.start_row
    }

    /// Page size plus the over-fetch row.
    pub fn limit(&self) -> u64 {
        self.page_size() + 1
    }

    pub fn offset(&self) -> u64 {
        self.start_row
    }

    /// Drop the over-fetch row (and anything past it) from a fetched page.
    pub fn trim<T>(&self, mut rows: Vec<T>) -> Page<T> {
        let page_size = usize::try_from(self.page_size()).unwrap_or(usize::MAX);
        let has_more = rows.len() > page_size;
        rows.truncate(page_size);
        Page {
            row_count: rows.len() as u64,
            rows,
            has_more,
        }
    }
}

/// One page of rows after the over-fetch row has been removed.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub rows: Vec<T>,
    /// `min(page_size, rows fetched)`.
    pub row_count: u64,
    pub has_more: bool,
}
