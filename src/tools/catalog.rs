//! Dataset and table listing tools.
//!
//! This module implements the `list_datasets` and `list_tables` MCP tools.
//! Both return a pretty JSON array of ids in the order the API returns them.

use crate::models::{ERROR_PREFIX, ToolReply};
use crate::warehouse::Warehouse;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Input for the list_tables tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// The dataset ID to list tables from
    #[serde(rename = "datasetId")]
    pub dataset_id: String,
}

/// Handler for catalog listings.
pub struct CatalogToolHandler {
    warehouse: Arc<dyn Warehouse>,
}

impl CatalogToolHandler {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }

    pub async fn list_datasets(&self) -> ToolReply {
        match self.warehouse.list_datasets(None).await {
            Ok(datasets) => {
                info!(
                    project_id = %self.warehouse.project_id(),
                    count = datasets.len(),
                    "Listed datasets"
                );
                ToolReply::json(&datasets)
            }
            Err(e) => {
                warn!(error = %e, "Listing datasets failed");
                ToolReply::from_error(ERROR_PREFIX, &e)
            }
        }
    }

    /// The dataset id is forwarded unchanged. A blank id never reaches the API.
    pub async fn list_tables(&self, input: ListTablesInput) -> ToolReply {
        if input.dataset_id.trim().is_empty() {
            warn!("Listing tables rejected: blank datasetId");
            return ToolReply::error(format!("{ERROR_PREFIX}: datasetId must not be empty"));
        }

        match self.warehouse.list_tables(&input.dataset_id).await {
            Ok(tables) => {
                info!(
                    dataset_id = %input.dataset_id,
                    count = tables.len(),
                    "Listed tables"
                );
                ToolReply::json(&tables)
            }
            Err(e) => {
                warn!(dataset_id = %input.dataset_id, error = %e, "Listing tables failed");
                ToolReply::from_error(ERROR_PREFIX, &e)
            }
        }
    }
}
