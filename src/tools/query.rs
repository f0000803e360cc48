//! Query execution tool.
//!
//! This module implements the `run_query` MCP tool. The SQL is sent as-is as
//! one standard SQL job; BigQuery does all validation.

use crate::models::{ERROR_PREFIX, QueryOutcome, QueryParam, QueryRequest, ToolReply};
use crate::tools::format::{OutputFormat, format_as_markdown, format_as_table};
use crate::warehouse::Warehouse;
use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Text returned for statements that produce no row set.
pub const NO_ROWS_REPLY: &str = "[]";

/// Input for the run_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RunQueryInput {
    /// The SQL query to execute (standard SQL)
    pub sql: String,
    /// Named parameters for the query, referenced as @name in the SQL
    #[serde(default)]
    pub params: Option<BTreeMap<String, QueryParam>>,
    /// Job location, e.g. "US" or "EU". Defaults to the server's configured location.
    #[serde(default)]
    pub location: Option<String>,
    /// Output format: "json" (default) returns row objects, "table" returns an ASCII table, "markdown" returns a markdown table
    #[serde(default)]
    pub format: OutputFormat,
}

impl From<RunQueryInput> for QueryRequest {
    fn from(input: RunQueryInput) -> Self {
        Self {
            sql: input.sql,
            params: input.params.unwrap_or_default(),
            location: input.location.filter(|l| !l.trim().is_empty()),
        }
    }
}

/// Handler for query execution.
pub struct QueryToolHandler {
    warehouse: Arc<dyn Warehouse>,
}

impl QueryToolHandler {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }

    /// Run the query and render its rows.
    ///
    /// Warehouse failures come back as an error reply, never as `Err`.
    pub async fn run_query(&self, input: RunQueryInput) -> ToolReply {
        let format = input.format;
        let request = QueryRequest::from(input);
        debug!(
            sql = %request.sql,
            param_types = ?request.params.values().map(QueryParam::type_name).collect::<Vec<_>>(),
            "Running query"
        );

        let start = Instant::now();
        let outcome = match self.warehouse.run_query(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Query failed");
                return ToolReply::from_error(ERROR_PREFIX, &e);
            }
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            row_count = outcome.row_count(),
            elapsed_ms = elapsed_ms,
            "Query executed"
        );

        match outcome {
            QueryOutcome::NoRowSet { affected_rows } => {
                if let Some(affected) = affected_rows {
                    info!(affected_rows = affected, "Statement returned no row set");
                }
                ToolReply::text(NO_ROWS_REPLY)
            }
            QueryOutcome::Rows(result) => match format {
                OutputFormat::Json => ToolReply::json(&result.rows),
                OutputFormat::Table => ToolReply::text(format_as_table(&result, elapsed_ms)),
                OutputFormat::Markdown => ToolReply::text(format_as_markdown(&result)),
            },
        }
    }
}
