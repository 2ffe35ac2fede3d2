use std::{env, fs, sync::Arc};

use gridquery::{
    backends::{BackendConnection, ConnectionManager, DuckDbConnection},
    run_rows_query, GridQueryConfig, QueryRequest,
};
use tracing_subscriber::EnvFilter;

const DATA_SOURCE: &str = "olympics_db";

fn bootstrap_duckdb() -> anyhow::Result<duckdb::Connection> {
    let conn = duckdb::Connection::open_in_memory()?;
    conn.execute_batch(
        "
        CREATE TABLE olympics (
            athlete VARCHAR,
            age INTEGER,
            country VARCHAR,
            year INTEGER,
            sport VARCHAR,
            gold DOUBLE,
            silver DOUBLE,
            bronze DOUBLE
        );
        INSERT INTO olympics VALUES
            ('Michael Phelps', 23, 'United States', 2008, 'Swimming', 8, 0, 0),
            ('Michael Phelps', 19, 'United States', 2004, 'Swimming', 6, 0, 2),
            ('Natalie Coughlin', 25, 'United States', 2008, 'Swimming', 1, 2, 3),
            ('Ian Thorpe', 17, 'Australia', 2000, 'Swimming', 3, 2, 0),
            ('Leisel Jones', 23, 'Australia', 2008, 'Swimming', 2, 1, 0),
            ('Chris Hoy', 32, 'Great Britain', 2008, 'Cycling', 3, 0, 0),
            ('Usain Bolt', 21, 'Jamaica', 2008, 'Athletics', 3, 0, 0);
        ",
    )?;
    Ok(conn)
}

const DEFAULT_REQUEST: &str = r#"{
    "tableName": "olympics",
    "rowGroupCols": [{"id": "country", "field": "country"}],
    "valueCols": [{"field": "gold", "aggFunc": "sum"}],
    "groupKeys": [],
    "sortModel": [{"colId": "country", "sort": "asc"}],
    "startRow": 0,
    "endRow": 3
}"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let request_json = match env::args().nth(1) {
        Some(path) => fs::read_to_string(path)?,
        None => DEFAULT_REQUEST.to_string(),
    };
    let request = QueryRequest::from_json(&request_json)?;

    let config = GridQueryConfig::load_default();
    let resolved = config.for_datasource(DATA_SOURCE);
    let connection = DuckDbConnection::from_connection(bootstrap_duckdb()?)
        .with_max_concurrency(resolved.duckdb.max_concurrency);

    let mut connections = ConnectionManager::with_config(config);
    connections.insert(DATA_SOURCE, Arc::new(connection) as Arc<dyn BackendConnection>);

    let response = run_rows_query(&connections, DATA_SOURCE, &request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
