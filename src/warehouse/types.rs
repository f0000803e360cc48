//! BigQuery type mappings.
//!
//! The REST API returns rows as nested `{"f": [{"v": ...}]}` cells where every
//! scalar is a string. This module turns them into plain JSON objects using
//! the result schema.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. `decode_value` converts the wire value according to that category
//!
//! REPEATED columns wrap each element in its own `{"v": ...}` cell and RECORD
//! columns nest another `{"f": [...]}` row.

use crate::models::{ColumnMetadata, Row};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    /// NULLABLE when absent
    #[serde(default)]
    pub mode: Option<String>,
    /// Sub-fields of a RECORD column
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl FieldSchema {
    pub fn is_repeated(&self) -> bool {
        self.mode
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("REPEATED"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub v: JsonValue,
}

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for BigQuery column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Boolean,
    Timestamp,
    Json,
    Record,
    /// NUMERIC, DATE, BYTES, GEOGRAPHY, ... kept as the API's string form
    Text,
}

/// Classify a BigQuery type name (legacy or standard SQL spelling).
pub fn categorize_type(type_name: &str) -> TypeCategory {
    match type_name.to_ascii_uppercase().as_str() {
        "INTEGER" | "INT64" => TypeCategory::Integer,
        "FLOAT" | "FLOAT64" => TypeCategory::Float,
        "BOOLEAN" | "BOOL" => TypeCategory::Boolean,
        "TIMESTAMP" => TypeCategory::Timestamp,
        "JSON" => TypeCategory::Json,
        "RECORD" | "STRUCT" => TypeCategory::Record,
        _ => TypeCategory::Text,
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Column metadata for the top-level fields of a schema.
pub fn columns_from_schema(schema: &TableSchema) -> Vec<ColumnMetadata> {
    schema
        .fields
        .iter()
        .map(|field| {
            ColumnMetadata::new(
                &field.name,
                &field.field_type,
                field.mode.as_deref().unwrap_or("NULLABLE"),
            )
        })
        .collect()
}

/// Decode wire rows into JSON objects keyed by column name.
pub fn decode_rows(fields: &[FieldSchema], rows: &[TableRow]) -> Vec<Row> {
    rows.iter().map(|row| decode_row(fields, row)).collect()
}

fn decode_row(fields: &[FieldSchema], row: &TableRow) -> Row {
    fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let value = row
                .f
                .get(idx)
                .map(|cell| decode_field(field, &cell.v))
                .unwrap_or(JsonValue::Null);
            (field.name.clone(), value)
        })
        .collect()
}

/// Decode one cell value, unwrapping REPEATED arrays.
pub fn decode_field(field: &FieldSchema, value: &JsonValue) -> JsonValue {
    if value.is_null() {
        return JsonValue::Null;
    }
    if field.is_repeated() {
        return match value {
            JsonValue::Array(items) => JsonValue::Array(
                items
                    .iter()
                    .map(|item| decode_value(field, item.get("v").unwrap_or(item)))
                    .collect(),
            ),
            other => decode_value(field, other),
        };
    }
    decode_value(field, value)
}

fn decode_value(field: &FieldSchema, value: &JsonValue) -> JsonValue {
    if value.is_null() {
        return JsonValue::Null;
    }
    match categorize_type(&field.field_type) {
        TypeCategory::Record => match serde_json::from_value::<TableRow>(value.clone()) {
            Ok(nested) => JsonValue::Object(decode_row(&field.fields, &nested)),
            Err(_) => value.clone(),
        },
        category => match value.as_str() {
            Some(raw) => decode_scalar(raw, category),
            None => value.clone(),
        },
    }
}

/// Convert a scalar wire string. Unparseable input is kept as a string.
pub fn decode_scalar(raw: &str, category: TypeCategory) -> JsonValue {
    let fallback = || JsonValue::String(raw.to_string());
    match category {
        TypeCategory::Integer => raw.parse::<i64>().map(JsonValue::from).unwrap_or_else(|_| fallback()),
        TypeCategory::Float => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number)
            .unwrap_or_else(fallback),
        TypeCategory::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" => JsonValue::Bool(true),
            "false" => JsonValue::Bool(false),
            _ => fallback(),
        },
        TypeCategory::Timestamp => decode_timestamp(raw)
            .map(|ts| JsonValue::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            .unwrap_or_else(fallback),
        TypeCategory::Json => serde_json::from_str(raw).unwrap_or_else(|_| fallback()),
        TypeCategory::Record | TypeCategory::Text => fallback(),
    }
}

/// TIMESTAMP arrives as integer microseconds (`useInt64Timestamp`) or as
/// floating point seconds such as "1.7040672E9".
fn decode_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(micros) = raw.parse::<i64>() {
        return DateTime::from_timestamp_micros(micros);
    }
    let secs = raw.parse::<f64>().ok()?;
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((secs * 1_000_000.0).round() as i64)
}
