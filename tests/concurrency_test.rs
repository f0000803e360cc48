//! Concurrent tool calls share one warehouse client and never see each
//! other's results.

mod common;

use bigquery_mcp_server::tools::{OutputFormat, QueryToolHandler, RunQueryInput};
use common::{FakeWarehouse, parse, rows};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn input(sql: &str) -> RunQueryInput {
    RunQueryInput {
        sql: sql.to_string(),
        params: None,
        location: None,
        format: OutputFormat::Json,
    }
}

#[tokio::test]
async fn test_concurrent_queries_get_their_own_results() {
    // The slower query is issued first so completion order differs from call order
    let warehouse = Arc::new(
        FakeWarehouse::new("p")
            .with_slow_query(
                "SELECT 'slow' AS tag",
                rows(json!([{"tag": "slow"}])),
                Duration::from_millis(50),
            )
            .with_query("SELECT 'fast' AS tag", rows(json!([{"tag": "fast"}]))),
    );

    let slow = QueryToolHandler::new(warehouse.clone());
    let fast = QueryToolHandler::new(warehouse.clone());
    let (slow_reply, fast_reply) = tokio::join!(
        slow.run_query(input("SELECT 'slow' AS tag")),
        fast.run_query(input("SELECT 'fast' AS tag")),
    );

    assert_eq!(parse(&slow_reply.text), json!([{"tag": "slow"}]));
    assert_eq!(parse(&fast_reply.text), json!([{"tag": "fast"}]));
    assert_eq!(warehouse.calls().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_spawned_queries() {
    let mut warehouse = FakeWarehouse::new("p");
    for i in 0..16 {
        warehouse = warehouse.with_query(&format!("SELECT {i} AS n"), rows(json!([{"n": i}])));
    }
    let warehouse = Arc::new(warehouse);

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let handler = QueryToolHandler::new(warehouse.clone());
            tokio::spawn(async move { (i, handler.run_query(input(&format!("SELECT {i} AS n"))).await) })
        })
        .collect();

    for task in tasks {
        let (i, reply) = task.await.unwrap();
        assert!(!reply.is_error);
        assert_eq!(parse(&reply.text), json!([{"n": i}]));
    }
}
