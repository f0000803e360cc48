//! MCP service implementation using rmcp.
//!
//! This module defines the BigQueryService struct with all BigQuery tools
//! exposed via the MCP protocol using the rmcp framework's macros.

use crate::credentials::CredentialSummary;
use crate::tools::{
    CatalogToolHandler, DiagnosticsToolHandler, ListTablesInput, QueryToolHandler, RunQueryInput,
};
use crate::warehouse::Warehouse;
use rmcp::{
    ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    ErrorData, tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct BigQueryService {
    /// Shared warehouse client for all tool calls
    warehouse: Arc<dyn Warehouse>,
    /// Redacted credential details for describe_credentials
    credentials: Arc<CredentialSummary>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl BigQueryService {
    pub fn new(warehouse: Arc<dyn Warehouse>, credentials: Arc<CredentialSummary>) -> Self {
        Self {
            warehouse,
            credentials,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl BigQueryService {
    #[tool(
        description = "Execute a BigQuery SQL query.\nUses standard SQL. Named parameters are referenced as @name and passed in `params`.\nReturns the rows as a JSON array of objects; statements without a result set return [].\nOutput format: json (default), table, or markdown."
    )]
    async fn run_query(&self, Parameters(input): Parameters<RunQueryInput>) -> Result<CallToolResult, ErrorData> {
        Ok(QueryToolHandler::new(self.warehouse.clone())
            .run_query(input)
            .await
            .into())
    }

    #[tool(description = "List all datasets in the BigQuery project.")]
    async fn list_datasets(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CatalogToolHandler::new(self.warehouse.clone())
            .list_datasets()
            .await
            .into())
    }

    #[tool(description = "List all tables in a BigQuery dataset.")]
    async fn list_tables(&self, Parameters(input): Parameters<ListTablesInput>) -> Result<CallToolResult, ErrorData> {
        Ok(CatalogToolHandler::new(self.warehouse.clone())
            .list_tables(input)
            .await
            .into())
    }

    #[tool(
        description = "Check that the server can reach BigQuery with its credentials.\nLists at most one dataset and reports the project."
    )]
    async fn test_connection(&self) -> Result<CallToolResult, ErrorData> {
        Ok(self.diagnostics().test_connection().await.into())
    }

    #[tool(
        description = "Describe the credentials the server is using (source, project, client email).\nSecrets are never included."
    )]
    async fn describe_credentials(&self) -> Result<CallToolResult, ErrorData> {
        Ok(self.diagnostics().describe_credentials().into())
    }
}

impl BigQueryService {
    fn diagnostics(&self) -> DiagnosticsToolHandler {
        DiagnosticsToolHandler::new(self.warehouse.clone(), self.credentials.clone())
    }
}

#[tool_handler]
impl ServerHandler for BigQueryService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "bigquery-mcp-server".to_owned(),
                title: Some("BigQuery MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "BigQuery tools for project `{}`.\n\
                \n\
                ## Workflow\n\
                1. Call `list_datasets` to see the datasets in the project\n\
                2. Call `list_tables` with a `datasetId` to see its tables\n\
                3. Call `run_query` with standard SQL, e.g. SELECT * FROM `dataset.table` LIMIT 10\n\
                \n\
                ## Errors\n\
                Failed calls return text starting with \"BigQuery error:\" followed by the API message.\n\
                Use `test_connection` to check access and `describe_credentials` to see which identity is in use.",
                self.warehouse.project_id()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BqResult;
    use crate::models::{QueryOutcome, QueryRequest};
    use async_trait::async_trait;

    struct EmptyWarehouse;

    #[async_trait]
    impl Warehouse for EmptyWarehouse {
        fn project_id(&self) -> &str {
            "test-project"
        }

        async fn run_query(&self, _request: QueryRequest) -> BqResult<QueryOutcome> {
            Ok(QueryOutcome::NoRowSet {
                affected_rows: None,
            })
        }

        async fn list_datasets(&self, _max_results: Option<u32>) -> BqResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn list_tables(&self, _dataset_id: &str) -> BqResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn create_test_service() -> BigQueryService {
        let summary = CredentialSummary {
            source: "inline_json".to_string(),
            key_file: None,
            project_id: "test-project".to_string(),
            client_email: None,
            credential_type: Some("service_account".to_string()),
            has_private_key: true,
        };
        BigQueryService::new(Arc::new(EmptyWarehouse), Arc::new(summary))
    }

    #[test]
    fn test_server_info() {
        let service = create_test_service();
        let info = service.get_info();
        assert_eq!(info.server_info.name, "bigquery-mcp-server");
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("test-project"));
    }

    #[test]
    fn test_tool_router_lists_all_tools() {
        let service = create_test_service();
        let mut names: Vec<String> = service
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            [
                "describe_credentials",
                "list_datasets",
                "list_tables",
                "run_query",
                "test_connection"
            ]
        );
    }

    #[tokio::test]
    async fn test_list_tables_blank_dataset_id_is_error_envelope() {
        let service = create_test_service();
        let result = service
            .list_tables(Parameters(ListTablesInput {
                dataset_id: "  ".to_string(),
            }))
            .await
            .unwrap();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["isError"], true);
        assert_eq!(
            value["content"][0]["text"],
            "BigQuery error: datasetId must not be empty"
        );
    }

    #[test]
    fn test_list_tables_schema_requires_dataset_id() {
        let service = create_test_service();
        let tool = service
            .tool_router
            .list_all()
            .into_iter()
            .find(|tool| tool.name == "list_tables")
            .unwrap();
        let schema = serde_json::Value::Object(tool.input_schema.as_ref().clone());
        assert!(schema["properties"].get("datasetId").is_some());
    }
}
