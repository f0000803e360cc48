//! Query-related data models.
//!
//! This module defines types for BigQuery query requests and results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A named query parameter value.
///
/// Referenced in SQL as `@name`. Arrays and objects are not accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl QueryParam {
    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

/// A query to run as a single BigQuery job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    pub sql: String,
    pub params: BTreeMap<String, QueryParam>,
    /// Job location override; None uses the client default.
    pub location: Option<String>,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Self::default()
        }
    }

    /// Add a named parameter to this query.
    pub fn with_param(mut self, name: impl Into<String>, param: QueryParam) -> Self {
        self.params.insert(name.into(), param);
        self
    }

    /// Set the job location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    /// BigQuery type (e.g., "INTEGER", "STRING", "RECORD")
    pub type_name: String,
    /// NULLABLE, REQUIRED or REPEATED
    pub mode: String,
}

impl ColumnMetadata {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        mode: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            mode: mode.into(),
        }
    }
}

/// Rows returned by a query, keyed by column name in column order.
pub type Row = serde_json::Map<String, JsonValue>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<ColumnMetadata>,
    pub rows: Vec<Row>,
}

/// What a finished query job produced.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The statement produced a row set (possibly empty).
    Rows(ResultSet),
    /// The statement produced no row set (DDL, DML, scripts).
    NoRowSet {
        /// Rows touched by a DML statement, when reported
        affected_rows: Option<u64>,
    },
}

impl QueryOutcome {
    /// Number of rows in the row set, zero when there is none.
    pub fn row_count(&self) -> usize {
        match self {
            Self::Rows(set) => set.rows.len(),
            Self::NoRowSet { .. } => 0,
        }
    }
}
