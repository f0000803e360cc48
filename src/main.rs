//! BigQuery MCP Server - Main entry point.
//!
//! This server provides MCP (Model Context Protocol) tools for AI assistants
//! to run BigQuery queries and browse datasets and tables.

use bigquery_mcp_server::auth::BearerAuth;
use bigquery_mcp_server::config::{Config, TransportMode};
use bigquery_mcp_server::error::BqResult;
use bigquery_mcp_server::mcp::BigQueryService;
use bigquery_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use bigquery_mcp_server::warehouse::{BigQueryClient, ClientOptions};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber. Logs go to stderr so stdout stays free
/// for the stdio transport.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Resolve credentials and build the service. Any failure here is fatal.
fn build_service(config: &Config) -> BqResult<BigQueryService> {
    let source = config.resolve_credentials()?;
    info!(source = source.kind(), "Resolved BigQuery credentials");

    let client = BigQueryClient::new(
        &source,
        ClientOptions {
            project_id: config.project_override().map(str::to_string),
            location: config.location().map(str::to_string),
            api_base: None,
        },
    )?;
    let summary = Arc::new(client.credential_summary().clone());

    Ok(BigQueryService::new(Arc::new(client), summary))
}

async fn serve(transport: impl Transport) -> BqResult<()> {
    info!(transport = transport.name(), "Serving MCP requests");
    transport.run().await
}

#[tokio::main]
async fn main() {
    let config = Config::parse_args();
    init_tracing(&config);

    info!(
        transport = %config.transport,
        "Starting BigQuery MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let service = match build_service(&config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = match config.transport {
        TransportMode::Stdio => serve(StdioTransport::new(service)).await,
        TransportMode::Http => {
            let auth = match BearerAuth::from_tokens(&config.auth_tokens) {
                Ok(auth) => auth,
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            };
            if auth.is_enabled() {
                info!(tokens = auth.token_count(), "Bearer token authentication enabled");
            }
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            serve(HttpTransport::new(
                service,
                auth,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            ))
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}
