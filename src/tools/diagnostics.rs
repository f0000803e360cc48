//! Diagnostic tools: `test_connection` and `describe_credentials`.

use crate::credentials::CredentialSummary;
use crate::models::ToolReply;
use crate::warehouse::Warehouse;
use schemars::JsonSchema;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub const CONNECTION_TEST_PREFIX: &str = "BigQuery connection test failed";

/// Output of the test_connection tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ConnectionTestOutput {
    pub success: bool,
    pub project: String,
    /// Datasets seen by the check (0 or 1)
    pub datasets_found: usize,
}

pub struct DiagnosticsToolHandler {
    warehouse: Arc<dyn Warehouse>,
    credentials: Arc<CredentialSummary>,
}

impl DiagnosticsToolHandler {
    pub fn new(warehouse: Arc<dyn Warehouse>, credentials: Arc<CredentialSummary>) -> Self {
        Self {
            warehouse,
            credentials,
        }
    }

    /// Check the API by listing at most one dataset.
    pub async fn test_connection(&self) -> ToolReply {
        let start = Instant::now();
        match self.warehouse.list_datasets(Some(1)).await {
            Ok(datasets) => {
                info!(
                    project_id = %self.warehouse.project_id(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Connection test succeeded"
                );
                ToolReply::json(&ConnectionTestOutput {
                    success: true,
                    project: self.warehouse.project_id().to_string(),
                    datasets_found: datasets.len(),
                })
            }
            Err(e) => {
                warn!(error = %e, "Connection test failed");
                ToolReply::from_error(CONNECTION_TEST_PREFIX, &e)
            }
        }
    }

    pub fn describe_credentials(&self) -> ToolReply {
        ToolReply::json(self.credentials.as_ref())
    }
}
