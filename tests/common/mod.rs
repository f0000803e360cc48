//! Shared helpers for integration tests: an in-memory warehouse.

#![allow(dead_code)]

use async_trait::async_trait;
use bigquery_mcp_server::credentials::CredentialSummary;
use bigquery_mcp_server::error::{BqError, BqResult};
use bigquery_mcp_server::models::{ColumnMetadata, QueryOutcome, QueryRequest, ResultSet, Row};
use bigquery_mcp_server::warehouse::Warehouse;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// A call the fake warehouse received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    RunQuery(QueryRequest),
    ListDatasets(Option<u32>),
    ListTables(String),
}

/// Warehouse double with canned answers per SQL text and dataset.
#[derive(Default)]
pub struct FakeWarehouse {
    project: String,
    datasets: Vec<String>,
    tables: HashMap<String, Vec<String>>,
    queries: HashMap<String, (QueryOutcome, Duration)>,
    failure: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeWarehouse {
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            ..Self::default()
        }
    }

    pub fn with_datasets(mut self, datasets: &[&str]) -> Self {
        self.datasets = datasets.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_tables(mut self, dataset: &str, tables: &[&str]) -> Self {
        self.tables.insert(
            dataset.to_string(),
            tables.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn with_query(self, sql: &str, outcome: QueryOutcome) -> Self {
        self.with_slow_query(sql, outcome, Duration::ZERO)
    }

    /// Answer `sql` only after `delay`.
    pub fn with_slow_query(mut self, sql: &str, outcome: QueryOutcome, delay: Duration) -> Self {
        self.queries.insert(sql.to_string(), (outcome, delay));
        self
    }

    /// Make every call fail with an API error carrying `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> BqResult<()> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(message) => Err(BqError::api(400, Some("invalid".to_string()), message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Warehouse for FakeWarehouse {
    fn project_id(&self) -> &str {
        &self.project
    }

    async fn run_query(&self, request: QueryRequest) -> BqResult<QueryOutcome> {
        let sql = request.sql.clone();
        self.record(Call::RunQuery(request))?;
        let (outcome, delay) = self.queries.get(&sql).cloned().ok_or_else(|| {
            BqError::api(
                400,
                Some("invalidQuery".to_string()),
                format!("Unrecognized query: {sql}"),
            )
        })?;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(outcome)
    }

    async fn list_datasets(&self, max_results: Option<u32>) -> BqResult<Vec<String>> {
        self.record(Call::ListDatasets(max_results))?;
        let limit = max_results.map_or(self.datasets.len(), |m| m as usize);
        Ok(self.datasets.iter().take(limit).cloned().collect())
    }

    async fn list_tables(&self, dataset_id: &str) -> BqResult<Vec<String>> {
        self.record(Call::ListTables(dataset_id.to_string()))?;
        self.tables.get(dataset_id).cloned().ok_or_else(|| {
            BqError::api(
                404,
                Some("notFound".to_string()),
                format!("Not found: Dataset {}:{dataset_id}", self.project),
            )
        })
    }
}

/// Build a row set from JSON objects; columns come from the first row's keys.
pub fn rows(values: JsonValue) -> QueryOutcome {
    let rows: Vec<Row> = values
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect()
        })
        .unwrap_or_default();
    let columns = rows
        .first()
        .map(|row| {
            row.iter()
                .map(|(name, value)| {
                    let type_name = match value {
                        JsonValue::Number(n) if n.is_i64() => "INTEGER",
                        JsonValue::Number(_) => "FLOAT",
                        JsonValue::Bool(_) => "BOOLEAN",
                        _ => "STRING",
                    };
                    ColumnMetadata::new(name, type_name, "NULLABLE")
                })
                .collect()
        })
        .unwrap_or_default();
    QueryOutcome::Rows(ResultSet { columns, rows })
}

pub fn summary(project: &str) -> CredentialSummary {
    CredentialSummary {
        source: "key_file".to_string(),
        key_file: Some("/secrets/sa.json".to_string()),
        project_id: project.to_string(),
        client_email: Some(format!("reader@{project}.iam.gserviceaccount.com")),
        credential_type: Some("service_account".to_string()),
        has_private_key: true,
    }
}

/// Parse a reply's text as JSON, failing the test if it is not.
pub fn parse(text: &str) -> JsonValue {
    serde_json::from_str(text).unwrap_or_else(|e| panic!("reply is not JSON ({e}): {text}"))
}
