//! Rows service tests against in-process fake backends.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use gridquery::backends::{BackendConnection, ConnectionManager};
use gridquery::config::{GridQueryConfig, QueryConfig};
use gridquery::dialect::{Dialect, MySqlDialect};
use gridquery::executor::{ColumnMeta, QueryResult};
use gridquery::query_builder::CompiledQuery;
use gridquery::request::QueryRequest;
use gridquery::runtime::{run_rows_query, run_rows_query_with, FALLBACK_NOTICE};
use gridquery::GridQueryError;
use serde_json::{json, Map, Value};

/// Returns `row_count` rows and remembers the last statement it was given.
struct FakeConnection {
    row_count: usize,
    fail: bool,
    delay: Option<Duration>,
    seen: Mutex<Option<CompiledQuery>>,
}

impl FakeConnection {
    fn returning(row_count: usize) -> Self {
        Self {
            row_count,
            fail: false,
            delay: None,
            seen: Mutex::new(None),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::returning(0)
        }
    }

    fn last_query(&self) -> CompiledQuery {
        self.seen.lock().unwrap().clone().expect("query executed")
    }
}

#[async_trait::async_trait]
impl BackendConnection for FakeConnection {
    fn dialect(&self) -> &(dyn Dialect + Send + Sync) {
        &MySqlDialect
    }

    async fn execute(&self, query: &CompiledQuery) -> gridquery::error::Result<QueryResult> {
        *self.seen.lock().unwrap() = Some(query.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(GridQueryError::Execution("connection refused".to_string()));
        }
        let rows = (0..self.row_count)
            .map(|i| {
                let mut row = Map::new();
                row.insert("id".to_string(), Value::from(i as u64));
                row
            })
            .collect();
        Ok(QueryResult {
            columns: vec![ColumnMeta {
                name: "id".to_string(),
            }],
            rows,
        })
    }
}

fn page_request(start_row: i64, end_row: i64) -> QueryRequest {
    QueryRequest::from_json(
        &json!({
            "tableName": "olympics",
            "rowGroupCols": [{"field": "country", "id": "country"}],
            "valueCols": [{"field": "gold", "aggFunc": "sum"}],
            "groupKeys": ["USA"],
            "filterModel": {
                "sport": {"filterType": "set", "values": ["Swimming"]}
            },
            "startRow": start_row,
            "endRow": end_row
        })
        .to_string(),
    )
    .unwrap()
}

#[tokio::test]
async fn full_page_reports_more_rows() {
    let conn = FakeConnection::returning(11);
    let response = run_rows_query_with(&conn, &QueryConfig::default(), &page_request(0, 10))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.rows.len(), 10);
    assert_eq!(response.last_row, 10);
    assert!(response.has_more);
    assert!(response.sql_query.is_none());
    assert_eq!(response.ignored_filters, vec!["sport"]);

    let executed = conn.last_query();
    assert_eq!(
        executed.sql,
        " select * FROM olympics where country = ? and true limit 11 offset 0"
    );
    assert_eq!(executed.params, vec![json!("USA")]);
}

#[tokio::test]
async fn short_page_is_the_last_one() {
    let conn = FakeConnection::returning(4);
    let response = run_rows_query_with(&conn, &QueryConfig::default(), &page_request(20, 30))
        .await
        .unwrap();
    assert_eq!(response.last_row, 4);
    assert!(!response.has_more);
    assert!(conn.last_query().sql.ends_with(" limit 11 offset 20"));
}

#[tokio::test]
async fn inline_mode_executes_literal_sql() {
    let conn = FakeConnection::returning(0);
    let config = QueryConfig {
        parameterized: false,
        ..Default::default()
    };
    run_rows_query_with(&conn, &config, &page_request(0, 10))
        .await
        .unwrap();
    let executed = conn.last_query();
    assert!(executed.sql.contains("country = \"USA\""));
    assert!(executed.params.is_empty());
}

#[tokio::test]
async fn execution_failure_falls_back_to_sql_text() {
    let conn = FakeConnection::failing();
    let response = run_rows_query_with(&conn, &QueryConfig::default(), &page_request(0, 10))
        .await
        .unwrap();

    assert!(response.success);
    assert!(response.rows.is_empty());
    assert_eq!(response.last_row, 0);
    assert_eq!(
        response.sql_query.as_deref(),
        Some(" select * FROM olympics where country = \"USA\" and true limit 11 offset 0")
    );
    assert_eq!(response.notice.as_deref(), Some(FALLBACK_NOTICE));

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["lastRow"], json!(0));
    assert_eq!(body["success"], json!(true));
    assert!(body["sqlQuery"].is_string());
}

#[tokio::test]
async fn execution_failure_propagates_when_fallback_disabled() {
    let conn = FakeConnection::failing();
    let config = QueryConfig {
        fallback_on_execution_error: false,
        ..Default::default()
    };
    let err = run_rows_query_with(&conn, &config, &page_request(0, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, GridQueryError::Execution(_)));
}

#[tokio::test]
async fn slow_queries_time_out_into_fallback() {
    let conn = FakeConnection {
        delay: Some(Duration::from_millis(200)),
        ..FakeConnection::returning(3)
    };
    let config = QueryConfig {
        timeout_ms: 10,
        ..Default::default()
    };
    let response = run_rows_query_with(&conn, &config, &page_request(0, 10))
        .await
        .unwrap();
    assert!(response.sql_query.is_some());
    assert!(response.rows.is_empty());
}

#[tokio::test]
async fn invalid_requests_never_reach_the_backend() {
    let conn = FakeConnection::returning(1);
    let request = QueryRequest {
        table_name: "olympics".to_string(),
        start_row: 10,
        end_row: 0,
        ..Default::default()
    };
    let err = run_rows_query_with(&conn, &QueryConfig::default(), &request)
        .await
        .unwrap_err();
    assert!(matches!(err, GridQueryError::Validation(_)));
    assert!(conn.seen.lock().unwrap().is_none());
}

#[tokio::test]
async fn page_size_cap_comes_from_datasource_config() {
    let config = GridQueryConfig::from_toml(
        r#"
[datasources.grid.query]
max_page_size = 50
"#,
    )
    .unwrap();
    let mut connections = ConnectionManager::with_config(config);
    connections.insert("grid", Arc::new(FakeConnection::returning(0)));

    let err = run_rows_query(&connections, "grid", &page_request(0, 100))
        .await
        .unwrap_err();
    assert!(matches!(err, GridQueryError::Validation(_)));

    let ok = run_rows_query(&connections, "grid", &page_request(0, 50)).await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn unknown_data_source_is_rejected() {
    let connections = ConnectionManager::new();
    let err = run_rows_query(&connections, "missing", &page_request(0, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, GridQueryError::Validation(_)));
}
