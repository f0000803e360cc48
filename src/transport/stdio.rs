//! Stdio transport for the MCP server.
//!
//! Reads JSON-RPC messages from stdin and writes responses to stdout. Logs go
//! to stderr so they never interleave with protocol traffic.

use crate::error::{BqError, BqResult};
use crate::mcp::BigQueryService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{info, warn};

pub struct StdioTransport {
    service: BigQueryService,
}

impl StdioTransport {
    pub fn new(service: BigQueryService) -> Self {
        Self { service }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> BqResult<()> {
        info!("Starting BigQuery MCP server with stdio transport");

        let running = self
            .service
            .clone()
            .serve(stdio())
            .await
            .map_err(|e| BqError::internal(format!("Failed to start stdio transport: {e}")))?;

        tokio::select! {
            result = running.waiting() => {
                result.map_err(|e| {
                    warn!(error = %e, "Stdio transport error");
                    BqError::internal(format!("Stdio transport error: {e}"))
                })?;
                info!("Stdio transport completed normally");
                Ok(())
            }
            _ = wait_for_signal() => {
                tokio::spawn(async {
                    wait_for_signal().await;
                    warn!("Received second signal, forcing immediate exit");
                    std::process::exit(1);
                });
                // A blocking stdin read cannot be cancelled, so exit outright
                info!("Shutdown signal received, exiting");
                std::process::exit(0);
            }
        }
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}
