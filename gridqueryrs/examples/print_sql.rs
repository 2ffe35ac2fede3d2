use std::{env, fs, path::PathBuf};

use gridquery::{
    dialect::{Dialect, DuckDbDialect, MySqlDialect, PostgresDialect},
    query_builder::SqlBuilder,
    QueryRequest,
};
use tracing_subscriber::EnvFilter;

fn usage() {
    eprintln!("Usage: print_sql <request_json> [mysql|duckdb|postgres]");
    eprintln!("Example: cargo run --example print_sql -- examples/requests/country_gold.json postgres");
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        usage();
        std::process::exit(1);
    }

    let request_path = PathBuf::from(args.remove(0));
    let dialect: Box<dyn Dialect> = match args.first().map(String::as_str) {
        None | Some("mysql") => Box::new(MySqlDialect),
        Some("duckdb") => Box::new(DuckDbDialect),
        Some("postgres") => Box::new(PostgresDialect),
        Some(other) => anyhow::bail!("unknown dialect {other}"),
    };

    let request = QueryRequest::from_json(&fs::read_to_string(request_path)?)?;

    let builder = SqlBuilder;
    println!("-- inline");
    println!("{}", builder.build_inline(&request, dialect.as_ref())?);

    let compiled = builder.build_parameterized(&request, dialect.as_ref())?;
    println!("-- parameterized");
    println!("{}", compiled.sql);
    println!("-- params: {}", serde_json::to_string(&compiled.params)?);
    if !compiled.ignored_filters.is_empty() {
        println!("-- ignored filters: {}", compiled.ignored_filters.join(", "));
    }
    Ok(())
}
