//! Bearer token authentication for the HTTP transport.
//!
//! When tokens are configured, every request to the MCP endpoint must carry
//! `Authorization: Bearer <token>`. `/health` is mounted outside this layer.

use crate::error::{BqError, BqResult};
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

/// Accepted bearer tokens. Empty means authentication is off.
#[derive(Clone, Default)]
pub struct BearerAuth {
    tokens: Vec<String>,
}

impl BearerAuth {
    /// Build from configured tokens. Blank entries are a configuration error.
    pub fn from_tokens(tokens: &[String]) -> BqResult<Self> {
        let mut accepted: Vec<String> = Vec::with_capacity(tokens.len());
        for token in tokens {
            let trimmed = token.trim();
            if trimmed.is_empty() {
                return Err(BqError::config("Empty token value in MCP_AUTH_TOKENS"));
            }
            if !accepted.iter().any(|t| t == trimmed) {
                accepted.push(trimmed.to_string());
            }
        }
        Ok(Self { tokens: accepted })
    }

    pub fn is_enabled(&self) -> bool {
        !self.tokens.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Check a presented token against every configured one without
    /// short-circuiting.
    pub fn accepts(&self, presented: &str) -> bool {
        self.tokens
            .iter()
            .fold(false, |found, expected| {
                found | constant_time_eq(presented.as_bytes(), expected.as_bytes())
            })
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

/// axum middleware enforcing [`BearerAuth`].
pub async fn require_bearer(
    State(auth): State<Arc<BearerAuth>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !auth.is_enabled() {
        return next.run(request).await;
    }

    let token = match bearer_token(&request) {
        Ok(Some(token)) => token,
        Ok(None) => {
            warn!("Rejected request without Authorization header");
            return unauthorized(
                "Missing Bearer token in Authorization header",
                "Include a valid token: 'Authorization: Bearer <token>'",
            );
        }
        Err(message) => {
            warn!("Rejected request with malformed Authorization header");
            return unauthorized(message, "Use the format: 'Authorization: Bearer <token>'");
        }
    };

    if auth.accepts(token) {
        next.run(request).await
    } else {
        warn!(token_prefix = %mask_token(token), "Rejected request with unknown token");
        unauthorized(
            "Invalid Bearer token",
            "Check that the token matches one configured on the server",
        )
    }
}

fn bearer_token(request: &Request<Body>) -> Result<Option<&str>, &'static str> {
    let Some(value) = request.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| "Authorization header contains invalid characters")?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or("Invalid Authorization header format. Expected 'Bearer <token>'")?
        .trim();
    if token.is_empty() {
        return Err("Bearer token is empty");
    }
    Ok(Some(token))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(3).collect();
    if prefix.len() == token.len() {
        "***".to_string()
    } else {
        format!("{prefix}***")
    }
}

#[derive(Serialize)]
struct UnauthorizedBody {
    error: UnauthorizedDetail,
}

#[derive(Serialize)]
struct UnauthorizedDetail {
    code: &'static str,
    message: String,
    suggestion: String,
}

fn unauthorized(message: impl Into<String>, suggestion: impl Into<String>) -> Response {
    let body = UnauthorizedBody {
        error: UnauthorizedDetail {
            code: "unauthorized",
            message: message.into(),
            suggestion: suggestion.into(),
        },
    };
    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}
