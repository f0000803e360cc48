//! BigQuery REST client.
//!
//! Talks to the BigQuery v2 REST API with a bearer token obtained from the
//! service account key. One client is built at startup and shared by every
//! tool call; `reqwest::Client` pools connections and the token provider caches
//! tokens until they expire.

use crate::credentials::{CredentialSource, CredentialSummary};
use crate::error::{BqError, BqResult};
use crate::models::{QueryOutcome, QueryRequest, ResultSet};
use crate::warehouse::Warehouse;
use crate::warehouse::params::{QueryParameter, encode_params};
use crate::warehouse::types::{TableRow, TableSchema, columns_from_schema, decode_rows};
use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

pub const BIGQUERY_API_BASE: &str = "https://bigquery.googleapis.com/bigquery/v2/";
pub const BIGQUERY_SCOPES: &[&str] = &["https://www.googleapis.com/auth/bigquery"];

/// How long the API may hold a results request open while a job runs.
const RESULTS_WAIT_MS: u32 = 10_000;

/// Options for building a client beyond the credentials themselves.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Overrides the project_id from the credentials
    pub project_id: Option<String>,
    /// Default job location when a query does not set one
    pub location: Option<String>,
    /// REST API root, defaults to `BIGQUERY_API_BASE`
    pub api_base: Option<String>,
}

pub struct BigQueryClient {
    http: reqwest::Client,
    auth: CustomServiceAccount,
    base_url: Url,
    project_id: String,
    default_location: Option<String>,
    summary: CredentialSummary,
}

impl BigQueryClient {
    /// Build a client from resolved credentials.
    ///
    /// Fails if the key material cannot be loaded or parsed, or no project id
    /// is known.
    pub fn new(source: &CredentialSource, options: ClientOptions) -> BqResult<Self> {
        let (key, raw) = source.load()?;

        let non_blank = |p: &String| !p.trim().is_empty();
        let project_id = options
            .project_id
            .filter(non_blank)
            .or_else(|| key.project_id.clone().filter(non_blank))
            .ok_or_else(|| {
                BqError::config(
                    "No project id available. Set --project-id (GOOGLE_CLOUD_PROJECT) \
                    or use credentials that include project_id.",
                )
            })?;

        let auth = CustomServiceAccount::from_json(&raw)
            .map_err(|e| BqError::credentials(format!("Invalid service account key: {e}")))?;

        let base_url = Url::parse(options.api_base.as_deref().unwrap_or(BIGQUERY_API_BASE))
            .map_err(|e| BqError::config(format!("Invalid BigQuery API base URL: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("bigquery-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let summary = CredentialSummary::new(source, &key, &project_id);

        info!(
            project_id = %project_id,
            source = source.kind(),
            "BigQuery client initialized"
        );

        Ok(Self {
            http,
            auth,
            base_url,
            project_id,
            default_location: options.location,
            summary,
        })
    }

    /// Redacted description of the credentials in use.
    pub fn credential_summary(&self) -> &CredentialSummary {
        &self.summary
    }

    /// Send an authorized request and decode the JSON response.
    async fn send<T: DeserializeOwned + Send>(&self, request: reqwest::RequestBuilder) -> BqResult<T> {
        let token = self.auth.token(BIGQUERY_SCOPES).await?;
        let response = request.bearer_auth(token.as_str()).send().await?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| BqError::invalid_response(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(api_error(status.as_u16(), &body))
    }

    /// Fetch (or wait for) results of a query job.
    async fn fetch_results(
        &self,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> BqResult<QueryResponse> {
        let mut url = endpoint_url(
            &self.base_url,
            &["projects", &job.project_id, "queries", &job.job_id],
        )?;
        let mut pairs = vec![
            ("timeoutMs", RESULTS_WAIT_MS.to_string()),
            ("formatOptions.useInt64Timestamp", "true".to_string()),
        ];
        if let Some(location) = &job.location {
            pairs.push(("location", location.clone()));
        }
        if let Some(token) = page_token {
            pairs.push(("pageToken", token.to_string()));
        }
        url.query_pairs_mut().extend_pairs(pairs);

        self.send(self.http.get(url)).await
    }

    /// Walk a paginated list endpoint, collecting ids.
    async fn collect_ids<P>(&self, base: Url, max_results: Option<u32>) -> BqResult<Vec<String>>
    where
        P: DeserializeOwned + ListPage + Send,
    {
        let limit = max_results.map(|m| m as usize);
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = base.clone();
            let mut pairs = Vec::new();
            if let Some(max) = max_results {
                pairs.push(("maxResults", max.to_string()));
            }
            if let Some(token) = &page_token {
                pairs.push(("pageToken", token.clone()));
            }
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }

            let page: P = self.send(self.http.get(url)).await?;
            let (page_ids, next) = page.into_parts();
            ids.extend(page_ids);

            if let Some(limit) = limit {
                if ids.len() >= limit {
                    ids.truncate(limit);
                    break;
                }
            }
            match next {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(ids)
    }
}

impl std::fmt::Debug for BigQueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigQueryClient")
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url.as_str())
            .field("default_location", &self.default_location)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn run_query(&self, request: QueryRequest) -> BqResult<QueryOutcome> {
        let query_parameters = encode_params(&request.params);
        let body = QueryJobRequest {
            query: &request.sql,
            use_legacy_sql: false,
            parameter_mode: (!query_parameters.is_empty()).then_some("NAMED"),
            query_parameters,
            location: request
                .location
                .as_deref()
                .or(self.default_location.as_deref()),
            timeout_ms: RESULTS_WAIT_MS,
            request_id: uuid::Uuid::new_v4().to_string(),
            format_options: FormatOptions {
                use_int64_timestamp: true,
            },
        };

        debug!(
            sql = %request.sql,
            params = request.params.len(),
            location = ?body.location,
            "Submitting query job"
        );

        let url = endpoint_url(&self.base_url, &["projects", &self.project_id, "queries"])?;
        let mut page: QueryResponse = self.send(self.http.post(url).json(&body)).await?;
        let job = page.job_reference.take();

        while !page.job_complete {
            let job = job.as_ref().ok_or_else(|| {
                BqError::invalid_response("incomplete query response without a jobReference")
            })?;
            debug!(job_id = %job.job_id, "Query job still running");
            page = self.fetch_results(job, None).await?;
        }

        let Some(schema) = page.schema.take() else {
            return Ok(QueryOutcome::NoRowSet {
                affected_rows: page
                    .num_dml_affected_rows
                    .as_deref()
                    .and_then(|n| n.parse().ok()),
            });
        };

        let mut rows = decode_rows(&schema.fields, &page.rows);
        let mut page_token = page.page_token.take();
        while let Some(token) = page_token.filter(|t| !t.is_empty()) {
            let job = job.as_ref().ok_or_else(|| {
                BqError::invalid_response("paged query response without a jobReference")
            })?;
            let next = self.fetch_results(job, Some(&token)).await?;
            rows.extend(decode_rows(&schema.fields, &next.rows));
            page_token = next.page_token;
        }

        Ok(QueryOutcome::Rows(ResultSet {
            columns: columns_from_schema(&schema),
            rows,
        }))
    }

    async fn list_datasets(&self, max_results: Option<u32>) -> BqResult<Vec<String>> {
        let url = endpoint_url(&self.base_url, &["projects", &self.project_id, "datasets"])?;
        self.collect_ids::<DatasetList>(url, max_results).await
    }

    async fn list_tables(&self, dataset_id: &str) -> BqResult<Vec<String>> {
        let url = endpoint_url(
            &self.base_url,
            &["projects", &self.project_id, "datasets", dataset_id, "tables"],
        )?;
        self.collect_ids::<TableList>(url, None).await
    }
}

/// Append path segments (percent-encoded) to the API root.
pub(crate) fn endpoint_url(base: &Url, segments: &[&str]) -> BqResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| BqError::config(format!("BigQuery API base URL cannot be a base: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Build an API error from a non-success response body.
///
/// Google APIs answer with `{"error": {"code", "message", "errors": [{"reason"}], "status"}}`.
/// When the body has no usable message, the raw body (or the status text) is used.
pub(crate) fn api_error(status: u16, body: &str) -> BqError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error);

    let reason = parsed.as_ref().and_then(|detail| {
        detail
            .errors
            .iter()
            .find_map(|e| e.reason.clone())
            .or_else(|| detail.status.clone())
    });

    let message = parsed
        .and_then(|detail| detail.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let body = body.trim();
            if body.is_empty() {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.to_string()
            }
        });

    BqError::api(status, reason, message)
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryJobRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameter_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    query_parameters: Vec<QueryParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    timeout_ms: u32,
    request_id: String,
    format_options: FormatOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormatOptions {
    use_int64_timestamp: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    project_id: String,
    job_id: String,
    #[serde(default)]
    location: Option<String>,
}

/// Shared shape of `jobs.query` and `jobs.getQueryResults` responses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    #[serde(default)]
    job_reference: Option<JobReference>,
    #[serde(default)]
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<TableRow>,
    #[serde(default)]
    page_token: Option<String>,
    #[serde(default)]
    num_dml_affected_rows: Option<String>,
}

/// One page of a list endpoint.
trait ListPage {
    fn into_parts(self) -> (Vec<String>, Option<String>);
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetList {
    #[serde(default)]
    datasets: Vec<DatasetEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetEntry {
    dataset_reference: DatasetReference,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetReference {
    dataset_id: String,
}

impl ListPage for DatasetList {
    fn into_parts(self) -> (Vec<String>, Option<String>) {
        let ids = self
            .datasets
            .into_iter()
            .map(|d| d.dataset_reference.dataset_id)
            .collect();
        (ids, self.next_page_token)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableList {
    #[serde(default)]
    tables: Vec<TableEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableEntry {
    table_reference: TableReference,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableReference {
    table_id: String,
}

impl ListPage for TableList {
    fn into_parts(self) -> (Vec<String>, Option<String>) {
        let ids = self
            .tables
            .into_iter()
            .map(|t| t.table_reference.table_id)
            .collect();
        (ids, self.next_page_token)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    #[serde(default)]
    reason: Option<String>,
}
