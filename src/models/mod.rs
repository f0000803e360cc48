//! Data models for the BigQuery MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod reply;

// Re-export commonly used types
pub use query::{ColumnMetadata, QueryOutcome, QueryParam, QueryRequest, ResultSet, Row};
pub use reply::{ERROR_PREFIX, ToolReply};
