//! Warehouse access layer.
//!
//! This module provides BigQuery access functionality:
//! - The `Warehouse` trait tool handlers call through
//! - A REST client implementation backed by service account credentials
//! - Query parameter encoding
//! - Row decoding from BigQuery's wire format

pub mod client;
pub mod params;
pub mod types;

pub use client::{BigQueryClient, ClientOptions};

use crate::error::BqResult;
use crate::models::{QueryOutcome, QueryRequest};
use async_trait::async_trait;

/// Operations the tools need from the data warehouse.
///
/// Implementations are shared read-only across concurrent tool calls.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Project that jobs and listings run against.
    fn project_id(&self) -> &str;

    /// Run a query as one job and wait for its results.
    async fn run_query(&self, request: QueryRequest) -> BqResult<QueryOutcome>;

    /// List dataset ids in the project, in API order.
    ///
    /// `max_results` stops early once that many ids have been collected.
    async fn list_datasets(&self, max_results: Option<u32>) -> BqResult<Vec<String>>;

    /// List table ids in a dataset, in API order.
    async fn list_tables(&self, dataset_id: &str) -> BqResult<Vec<String>>;
}
