//! Integration tests for list_datasets, list_tables and the diagnostic tools.

mod common;

use bigquery_mcp_server::tools::{CatalogToolHandler, DiagnosticsToolHandler, ListTablesInput};
use common::{Call, FakeWarehouse, parse, summary};
use rmcp::model::CallToolResult;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_list_datasets_returns_ids_in_order() {
    let warehouse =
        Arc::new(FakeWarehouse::new("shop-prod").with_datasets(&["raw", "staging", "marts"]));
    let reply = CatalogToolHandler::new(warehouse.clone())
        .list_datasets()
        .await;

    assert!(!reply.is_error);
    assert_eq!(parse(&reply.text), json!(["raw", "staging", "marts"]));
    assert_eq!(reply.text, "[\n  \"raw\",\n  \"staging\",\n  \"marts\"\n]");
    // Tool listings follow every page
    assert_eq!(warehouse.calls(), vec![Call::ListDatasets(None)]);
}

#[tokio::test]
async fn test_list_datasets_empty_project() {
    let warehouse = Arc::new(FakeWarehouse::new("empty"));
    let reply = CatalogToolHandler::new(warehouse).list_datasets().await;
    assert!(!reply.is_error);
    assert_eq!(reply.text, "[]");
}

#[tokio::test]
async fn test_list_tables_forwards_dataset_id() {
    let warehouse = Arc::new(
        FakeWarehouse::new("shop-prod")
            .with_tables("ds1", &["orders", "customers"])
            .with_tables("ds2", &["other"]),
    );
    let reply = CatalogToolHandler::new(warehouse.clone())
        .list_tables(ListTablesInput {
            dataset_id: "ds1".to_string(),
        })
        .await;

    assert!(!reply.is_error);
    assert_eq!(parse(&reply.text), json!(["orders", "customers"]));
    assert_eq!(warehouse.calls(), vec![Call::ListTables("ds1".to_string())]);
}

#[tokio::test]
async fn test_list_tables_keeps_surrounding_whitespace() {
    let warehouse = Arc::new(FakeWarehouse::new("shop-prod").with_tables(" ds1 ", &["orders"]));
    let reply = CatalogToolHandler::new(warehouse.clone())
        .list_tables(ListTablesInput {
            dataset_id: " ds1 ".to_string(),
        })
        .await;

    assert!(!reply.is_error);
    assert_eq!(warehouse.calls(), vec![Call::ListTables(" ds1 ".to_string())]);
}

#[tokio::test]
async fn test_list_tables_blank_dataset_id_is_error_envelope() {
    let warehouse = Arc::new(FakeWarehouse::new("shop-prod"));
    for dataset_id in ["", "   "] {
        let reply = CatalogToolHandler::new(warehouse.clone())
            .list_tables(ListTablesInput {
                dataset_id: dataset_id.to_string(),
            })
            .await;

        assert!(reply.is_error);
        assert_eq!(reply.text, "BigQuery error: datasetId must not be empty");

        let value = serde_json::to_value(CallToolResult::from(reply)).unwrap();
        assert_eq!(value["isError"], true);
    }
    assert!(warehouse.calls().is_empty());
}

#[tokio::test]
async fn test_list_tables_missing_dataset_is_error_envelope() {
    let warehouse = Arc::new(FakeWarehouse::new("shop-prod"));
    let reply = CatalogToolHandler::new(warehouse)
        .list_tables(ListTablesInput {
            dataset_id: "ghost".to_string(),
        })
        .await;

    assert!(reply.is_error);
    assert_eq!(reply.text, "BigQuery error: Not found: Dataset shop-prod:ghost");
}

#[tokio::test]
async fn test_list_datasets_failure_is_error_envelope() {
    let warehouse = Arc::new(FakeWarehouse::new("p").failing("Access Denied: Project p"));
    let reply = CatalogToolHandler::new(warehouse).list_datasets().await;
    assert!(reply.is_error);
    assert_eq!(reply.text, "BigQuery error: Access Denied: Project p");
}

#[tokio::test]
async fn test_connection_lists_one_dataset() {
    let warehouse = Arc::new(FakeWarehouse::new("shop-prod").with_datasets(&["raw", "marts"]));
    let handler = DiagnosticsToolHandler::new(warehouse.clone(), Arc::new(summary("shop-prod")));

    let reply = handler.test_connection().await;

    assert!(!reply.is_error);
    assert_eq!(
        parse(&reply.text),
        json!({"success": true, "project": "shop-prod", "datasets_found": 1})
    );
    assert_eq!(warehouse.calls(), vec![Call::ListDatasets(Some(1))]);
}

#[tokio::test]
async fn test_connection_failure_is_error_envelope() {
    let warehouse = Arc::new(FakeWarehouse::new("p").failing("invalid_grant"));
    let handler = DiagnosticsToolHandler::new(warehouse, Arc::new(summary("p")));

    let reply = handler.test_connection().await;
    assert!(reply.is_error);
    assert_eq!(reply.text, "BigQuery connection test failed: invalid_grant");
}

#[tokio::test]
async fn test_describe_credentials_makes_no_calls() {
    let warehouse = Arc::new(FakeWarehouse::new("shop-prod"));
    let handler = DiagnosticsToolHandler::new(warehouse.clone(), Arc::new(summary("shop-prod")));

    let reply = handler.describe_credentials();
    let value = parse(&reply.text);
    assert_eq!(value["project_id"], "shop-prod");
    assert_eq!(value["source"], "key_file");
    assert_eq!(value["has_private_key"], true);
    assert!(value.get("private_key").is_none());
    assert!(warehouse.calls().is_empty());
}
