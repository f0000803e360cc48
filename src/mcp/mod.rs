//! MCP server integration module.
//!
//! This module wires the BigQuery tool handlers into the MCP protocol
//! using the rmcp framework.

pub mod service;

pub use service::BigQueryService;
