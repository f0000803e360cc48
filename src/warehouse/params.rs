//! Parameter binding for BigQuery queries.
//!
//! Named parameters are sent as `queryParameters` entries. Every scalar value
//! travels as a string inside `parameterValue`; NULL is an empty `parameterValue`.

use crate::models::QueryParam;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParameter {
    pub name: String,
    pub parameter_type: ParameterType,
    pub parameter_value: ParameterValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterType {
    #[serde(rename = "type")]
    pub type_name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Map a parameter to its BigQuery standard SQL type and wire value.
pub(crate) fn bind_param(param: &QueryParam) -> (&'static str, Option<String>) {
    match param {
        // Untyped NULL binds as STRING
        QueryParam::Null => ("STRING", None),
        QueryParam::Bool(v) => ("BOOL", Some(v.to_string())),
        QueryParam::Int(v) => ("INT64", Some(v.to_string())),
        QueryParam::Float(v) => ("FLOAT64", Some(format_float(*v))),
        QueryParam::String(v) => ("STRING", Some(v.clone())),
    }
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        v.to_string()
    }
}

/// Build the `queryParameters` list for a request.
pub fn encode_params(params: &BTreeMap<String, QueryParam>) -> Vec<QueryParameter> {
    params
        .iter()
        .map(|(name, param)| {
            let (type_name, value) = bind_param(param);
            QueryParameter {
                name: name.trim_start_matches('@').to_string(),
                parameter_type: ParameterType { type_name },
                parameter_value: ParameterValue { value },
            }
        })
        .collect()
}
