//! HTTP transport with Streamable HTTP support for the MCP server.
//!
//! MCP messages are served at the configured endpoint (`/sse` by default)
//! with SSE-streamed responses. `/health` answers `ok` without authentication.

use crate::auth::{BearerAuth, require_bearer};
use crate::error::{BqError, BqResult};
use crate::mcp::BigQueryService;
use crate::transport::{Transport, wait_for_signal};
use axum::{Router, middleware, routing::get};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// SSE connections can keep the server alive forever, so shutdown is forced
/// after this long.
const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpTransport {
    service: BigQueryService,
    auth: Arc<BearerAuth>,
    host: String,
    port: u16,
    /// MCP endpoint path
    endpoint: String,
}

impl HttpTransport {
    pub fn new(
        service: BigQueryService,
        auth: BearerAuth,
        host: impl Into<String>,
        port: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            service,
            auth: Arc::new(auth),
            host: host.into(),
            port,
            endpoint: endpoint.into(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the axum router: the MCP service behind auth, plus `/health`.
    pub fn router(&self) -> Router {
        let service = self.service.clone();
        let mcp = StreamableHttpService::new(
            move || Ok(service.clone()),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        // nest_service rejects "/", so the root endpoint becomes the fallback
        let mcp_routes = if self.endpoint == "/" {
            Router::new().fallback_service(mcp)
        } else {
            Router::new().nest_service(&self.endpoint, mcp)
        };
        let mcp_routes =
            mcp_routes.layer(middleware::from_fn_with_state(self.auth.clone(), require_bearer));

        Router::new()
            .route("/health", get(|| async { "ok" }))
            .merge(mcp_routes)
    }
}

impl Transport for HttpTransport {
    async fn run(&self) -> BqResult<()> {
        let bind_addr = self.bind_addr();
        let app = self.router();

        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| BqError::config(format!("Failed to bind to {bind_addr}: {e}")))?;

        let port = listener
            .local_addr()
            .map(|addr| addr.port())
            .unwrap_or(self.port);
        info!(
            endpoint = %self.endpoint,
            auth = self.auth.is_enabled(),
            "BigQuery MCP server running on port {port}"
        );

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let notify = shutdown_notify.clone();
        let shutdown_signal = async move {
            wait_for_signal().await;
            notify.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!(error = %e, "HTTP server error");
                    return Err(BqError::internal(format!("HTTP server error: {e}")));
                }
                info!("HTTP server stopped");
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)"
                );
                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
