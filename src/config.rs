//! Configuration handling for the BigQuery MCP Server.
//!
//! This module provides configuration management via CLI arguments and environment variables.

use crate::credentials::{CREDENTIALS_FILE_ENV, CredentialSource, INLINE_CREDENTIALS_ENV};
use crate::error::BqResult;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_MCP_ENDPOINT: &str = "/sse";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for local CLI integration)
    Stdio,
    /// HTTP with Server-Sent Events (for remote clients)
    #[default]
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Configuration for the BigQuery MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bigquery-mcp-server",
    about = "MCP server for BigQuery - enables AI assistants to run queries and browse datasets",
    version,
    author
)]
pub struct Config {
    /// Inline service account credentials (JSON). Takes priority over --credentials-file.
    #[arg(
        long,
        value_name = "JSON",
        env = INLINE_CREDENTIALS_ENV,
        hide_env_values = true
    )]
    pub credentials_json: Option<String>,

    /// Path to a service account key file
    #[arg(long, value_name = "PATH", env = CREDENTIALS_FILE_ENV)]
    pub credentials_file: Option<PathBuf>,

    /// Project to run jobs in. Defaults to the project_id of the credentials.
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    pub project_id: Option<String>,

    /// Default job location (e.g. US, EU, asia-northeast1). run_query can override it per call.
    #[arg(long, env = "BIGQUERY_LOCATION")]
    pub default_location: Option<String>,

    /// Transport mode (stdio or http)
    #[arg(short, long, value_enum, default_value = "http", env = "MCP_TRANSPORT")]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(long = "host", default_value = DEFAULT_HTTP_HOST, env = "MCP_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(long = "port", default_value_t = DEFAULT_HTTP_PORT, env = "PORT")]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(long = "endpoint", default_value = DEFAULT_MCP_ENDPOINT, env = "MCP_ENDPOINT")]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = DEFAULT_LOG_LEVEL, env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,

    /// Authentication tokens for HTTP transport.
    /// Can be specified multiple times or as comma-separated values.
    /// When set, all MCP requests must include a valid Bearer token.
    #[arg(
        long = "auth-token",
        value_name = "TOKEN",
        env = "MCP_AUTH_TOKENS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub auth_tokens: Vec<String>,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            credentials_json: None,
            credentials_file: None,
            project_id: None,
            default_location: None,
            transport: TransportMode::Http,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
            auth_tokens: Vec::new(),
        }
    }

    /// Resolve which credentials to authenticate with.
    pub fn resolve_credentials(&self) -> BqResult<CredentialSource> {
        CredentialSource::resolve(
            self.credentials_json.as_deref(),
            self.credentials_file.as_deref(),
        )
    }

    /// Project override, ignoring blank values.
    pub fn project_override(&self) -> Option<&str> {
        non_blank(self.project_id.as_deref())
    }

    /// Default job location, ignoring blank values.
    pub fn location(&self) -> Option<&str> {
        non_blank(self.default_location.as_deref())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transport, TransportMode::Http);
        assert_eq!(config.http_host, DEFAULT_HTTP_HOST);
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.mcp_endpoint, "/sse");
    }

    #[test]
    fn test_parse_defaults_from_args() {
        let config = Config::try_parse_from(["bigquery-mcp-server"]).unwrap();
        assert_eq!(config.transport, TransportMode::Http);
        assert_eq!(config.mcp_endpoint, DEFAULT_MCP_ENDPOINT);
    }

    #[test]
    fn test_parse_explicit_args() {
        let config = Config::try_parse_from([
            "bigquery-mcp-server",
            "--transport",
            "stdio",
            "--port",
            "9000",
            "--credentials-file",
            "/etc/keys/sa.json",
            "--auth-token",
            "alpha,beta",
        ])
        .unwrap();
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.http_port, 9000);
        assert_eq!(
            config.credentials_file,
            Some(PathBuf::from("/etc/keys/sa.json"))
        );
        assert_eq!(config.auth_tokens, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let config = Config {
            project_id: Some("  ".to_string()),
            default_location: Some("EU".to_string()),
            ..Config::default()
        };
        assert!(config.project_override().is_none());
        assert_eq!(config.location(), Some("EU"));
    }

    #[test]
    fn test_resolve_credentials_requires_a_source() {
        let err = Config::default().resolve_credentials().unwrap_err();
        assert!(err.is_startup_error());
    }

    #[test]
    fn test_transport_display() {
        assert_eq!(TransportMode::Http.to_string(), "http");
        assert_eq!(TransportMode::Stdio.to_string(), "stdio");
    }
}
