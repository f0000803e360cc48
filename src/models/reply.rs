//! Tool reply envelope.
//!
//! Every tool answers with a single text block, flagged as an error when the
//! warehouse call failed.

use crate::error::BqError;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

/// Prefix for errors raised by the warehouse during a tool call.
pub const ERROR_PREFIX: &str = "BigQuery error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReply {
    pub text: String,
    pub is_error: bool,
}

impl ToolReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// Pretty-printed JSON (2-space indent).
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self::text(text),
            Err(e) => Self::error(format!("Failed to serialize result: {e}")),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// Envelope a warehouse failure as `<prefix>: <message>`.
    pub fn from_error(prefix: &str, err: &BqError) -> Self {
        Self::error(format!("{prefix}: {}", err.message()))
    }
}

impl From<ToolReply> for CallToolResult {
    fn from(reply: ToolReply) -> Self {
        let content = vec![Content::text(reply.text)];
        if reply.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}
