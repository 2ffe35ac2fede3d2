//! Row request model sent by a server-side data grid.
//!
//! Field names follow the grid's camelCase wire format. Construction through
//! [`QueryRequest::from_json`] parses and validates in one step; requests built
//! in code should call [`QueryRequest::validate`] before compiling.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::{GridQueryError, Result};
use crate::pagination::PageWindow;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub table_name: String,
    /// Full grouping hierarchy, outermost level first.
    #[serde(default)]
    pub row_group_cols: Vec<RowGroupCol>,
    /// Group values already drilled into; `group_keys[i]` belongs to `row_group_cols[i]`.
    #[serde(default)]
    pub group_keys: Vec<String>,
    #[serde(default)]
    pub value_cols: Vec<ValueCol>,
    /// Keyed by column. Iteration follows the key order of the incoming JSON object.
    #[serde(default)]
    pub filter_model: Option<IndexMap<String, FilterPredicate>>,
    #[serde(default)]
    pub sort_model: Option<Vec<SortModelItem>>,
    pub start_row: i64,
    /// Exclusive upper bound of the page window.
    pub end_row: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RowGroupCol {
    pub id: String,
    pub field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValueCol {
    pub field: String,
    /// SQL aggregate function name (`sum`, `avg`, `count`, ...), emitted as given.
    pub agg_func: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SortModelItem {
    pub col_id: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// A single column filter from the grid's filter model.
///
/// Well-formed text and number filters are fully typed. Anything the compiler
/// does not understand (another `filterType`, or an unknown `type` inside a known
/// one) is kept as [`FilterPredicate::Unsupported`] and compiles to `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilter", into = "RawFilter")]
pub enum FilterPredicate {
    Text(TextFilter),
    Number(NumberFilter),
    Unsupported {
        filter_type: String,
        op: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextFilter {
    Equals(String),
    NotEqual(String),
    Contains(String),
    NotContains(String),
    StartsWith(String),
    EndsWith(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberFilter {
    Equals(Number),
    NotEqual(Number),
    GreaterThan(Number),
    GreaterThanOrEqual(Number),
    LessThan(Number),
    LessThanOrEqual(Number),
    /// Both bounds inclusive.
    InRange { from: Number, to: Number },
}

impl TextFilter {
    pub fn op_name(&self) -> &'static str {
        match self {
            TextFilter::Equals(_) => "equals",
            TextFilter::NotEqual(_) => "notEqual",
            TextFilter::Contains(_) => "contains",
            TextFilter::NotContains(_) => "notContains",
            TextFilter::StartsWith(_) => "startsWith",
            TextFilter::EndsWith(_) => "endsWith",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            TextFilter::Equals(v)
            | TextFilter::NotEqual(v)
            | TextFilter::Contains(v)
            | TextFilter::NotContains(v)
            | TextFilter::StartsWith(v)
            | TextFilter::EndsWith(v) => v,
        }
    }

    fn parse(op: &str, value: String) -> Option<Self> {
        Some(match op {
            "equals" => TextFilter::Equals(value),
            "notEqual" => TextFilter::NotEqual(value),
            "contains" => TextFilter::Contains(value),
            "notContains" => TextFilter::NotContains(value),
            "startsWith" => TextFilter::StartsWith(value),
            "endsWith" => TextFilter::EndsWith(value),
            _ => return None,
        })
    }

    fn is_known(op: &str) -> bool {
        matches!(
            op,
            "equals" | "notEqual" | "contains" | "notContains" | "startsWith" | "endsWith"
        )
    }
}

impl NumberFilter {
    pub fn op_name(&self) -> &'static str {
        match self {
            NumberFilter::Equals(_) => "equals",
            NumberFilter::NotEqual(_) => "notEqual",
            NumberFilter::GreaterThan(_) => "greaterThan",
            NumberFilter::GreaterThanOrEqual(_) => "greaterThanOrEqual",
            NumberFilter::LessThan(_) => "lessThan",
            NumberFilter::LessThanOrEqual(_) => "lessThanOrEqual",
            NumberFilter::InRange { .. } => "inRange",
        }
    }

    fn is_known(op: &str) -> bool {
        matches!(
            op,
            "equals"
                | "notEqual"
                | "greaterThan"
                | "greaterThanOrEqual"
                | "lessThan"
                | "lessThanOrEqual"
                | "inRange"
        )
    }
}

/// Wire shape of a filter model entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFilter {
    filter_type: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    op: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter_to: Option<Value>,
}

impl TryFrom<RawFilter> for FilterPredicate {
    type Error = String;

    fn try_from(raw: RawFilter) -> std::result::Result<Self, Self::Error> {
        let op = match raw.op.as_deref() {
            Some(op) => op,
            None => {
                return Ok(FilterPredicate::Unsupported {
                    filter_type: raw.filter_type,
                    op: None,
                })
            }
        };

        match raw.filter_type.as_str() {
            "text" if TextFilter::is_known(op) => {
                let value = match raw.filter {
                    Some(Value::String(s)) => s,
                    Some(other) => {
                        return Err(format!(
                            "text filter '{op}' expects a string value, got {other}"
                        ))
                    }
                    None => return Err(format!("text filter '{op}' is missing its value")),
                };
                TextFilter::parse(op, value)
                    .map(FilterPredicate::Text)
                    .ok_or_else(|| format!("unknown text filter '{op}'"))
            }
            "number" if NumberFilter::is_known(op) => {
                let value = expect_number(op, "filter", raw.filter)?;
                let filter = match op {
                    "equals" => NumberFilter::Equals(value),
                    "notEqual" => NumberFilter::NotEqual(value),
                    "greaterThan" => NumberFilter::GreaterThan(value),
                    "greaterThanOrEqual" => NumberFilter::GreaterThanOrEqual(value),
                    "lessThan" => NumberFilter::LessThan(value),
                    "lessThanOrEqual" => NumberFilter::LessThanOrEqual(value),
                    _ => NumberFilter::InRange {
                        from: value,
                        to: expect_number(op, "filterTo", raw.filter_to)?,
                    },
                };
                Ok(FilterPredicate::Number(filter))
            }
            _ => Ok(FilterPredicate::Unsupported {
                filter_type: raw.filter_type.clone(),
                op: Some(op.to_string()),
            }),
        }
    }
}

fn expect_number(
    op: &str,
    field: &str,
    value: Option<Value>,
) -> std::result::Result<Number, String> {
    match value {
        Some(Value::Number(n)) => Ok(integral(n)),
        Some(other) => Err(format!(
            "number filter '{op}' expects a numeric {field}, got {other}"
        )),
        None => Err(format!("number filter '{op}' is missing {field}")),
    }
}

/// `2000.0` on the wire renders as `2000`, the way a JS client prints it.
fn integral(n: Number) -> Number {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 9.0e15 => Number::from(f as i64),
        _ => n,
    }
}

impl From<FilterPredicate> for RawFilter {
    fn from(predicate: FilterPredicate) -> Self {
        match predicate {
            FilterPredicate::Text(text) => RawFilter {
                filter_type: "text".to_string(),
                op: Some(text.op_name().to_string()),
                filter: Some(Value::String(text.value().to_string())),
                filter_to: None,
            },
            FilterPredicate::Number(number) => {
                let op = Some(number.op_name().to_string());
                let (filter, filter_to) = match number {
                    NumberFilter::Equals(v)
                    | NumberFilter::NotEqual(v)
                    | NumberFilter::GreaterThan(v)
                    | NumberFilter::GreaterThanOrEqual(v)
                    | NumberFilter::LessThan(v)
                    | NumberFilter::LessThanOrEqual(v) => (Some(Value::Number(v)), None),
                    NumberFilter::InRange { from, to } => {
                        (Some(Value::Number(from)), Some(Value::Number(to)))
                    }
                };
                RawFilter {
                    filter_type: "number".to_string(),
                    op,
                    filter,
                    filter_to,
                }
            }
            FilterPredicate::Unsupported { filter_type, op } => RawFilter {
                filter_type,
                op,
                filter: None,
                filter_to: None,
            },
        }
    }
}

impl QueryRequest {
    /// Parse a request from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let request: QueryRequest = serde_json::from_str(json)?;
        request.validate()?;
        Ok(request)
    }

    /// Reject malformed requests before any SQL is built.
    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(GridQueryError::Validation(
                "tableName must not be empty".to_string(),
            ));
        }
        if self.group_keys.len() > self.row_group_cols.len() {
            return Err(GridQueryError::Validation(format!(
                "{} group keys supplied but only {} row group columns configured",
                self.group_keys.len(),
                self.row_group_cols.len()
            )));
        }
        if let Some(col) = self.row_group_cols.iter().find(|c| c.field.is_empty()) {
            return Err(GridQueryError::Validation(format!(
                "row group column '{}' has an empty field",
                col.id
            )));
        }
        if let Some(col) = self
            .value_cols
            .iter()
            .find(|c| c.field.is_empty() || c.agg_func.is_empty())
        {
            return Err(GridQueryError::Validation(format!(
                "value column '{}' needs both a field and an aggFunc",
                col.field
            )));
        }
        self.page_window()?;
        Ok(())
    }

    /// Row window requested by the grid.
    pub fn page_window(&self) -> Result<PageWindow> {
        PageWindow::new(self.start_row, self.end_row)
    }

    /// Filter entries in request order; empty when no filter model was sent.
    pub fn filters(&self) -> impl Iterator<Item = (&String, &FilterPredicate)> + '_ {
        self.filter_model.iter().flat_map(|model| model.iter())
    }

    /// Sort entries in request order; empty when no sort model was sent.
    pub fn sorts(&self) -> &[SortModelItem] {
        self.sort_model.as_deref().unwrap_or_default()
    }
}
