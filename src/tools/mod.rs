//! MCP tool implementations.
//!
//! This module contains all BigQuery tool handlers:
//! - `run_query`: Execute a SQL query with optional named parameters
//! - `list_datasets`: List datasets in the project
//! - `list_tables`: List tables in a dataset
//! - `test_connection`: Check API connectivity
//! - `describe_credentials`: Show which credentials are in use (redacted)
//! - `format`: Table and markdown rendering of query results

pub mod catalog;
pub mod diagnostics;
pub mod format;
pub mod query;

pub use catalog::{CatalogToolHandler, ListTablesInput};
pub use diagnostics::{ConnectionTestOutput, DiagnosticsToolHandler};
pub use format::OutputFormat;
pub use query::{QueryToolHandler, RunQueryInput};
