//! BigQuery MCP Server Library
//!
//! This library exposes BigQuery (run a query, list datasets, list tables) as
//! MCP (Model Context Protocol) tools for AI assistants.

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;
pub mod warehouse;

pub use config::Config;
pub use error::BqError;
pub use mcp::BigQueryService;
pub use warehouse::{BigQueryClient, Warehouse};
