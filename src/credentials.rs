//! Credential resolution for the BigQuery client.
//!
//! Credentials come from exactly one of two places, checked in priority order:
//! an inline JSON payload, then a path to a service account key file. Resolution
//! happens once at startup, before any listener binds.

use crate::error::{BqError, BqResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const INLINE_CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS_JSON";
pub const CREDENTIALS_FILE_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Parsed Google service account key.
///
/// Only the fields the server inspects are typed; the raw JSON is handed to the
/// token library as-is.
#[derive(Clone, Default, Deserialize)]
pub struct ServiceAccountKey {
    /// Usually "service_account"
    #[serde(rename = "type", default)]
    pub credential_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    private_key: Option<String>,
}

impl ServiceAccountKey {
    /// Parse key material, reporting where it came from on failure.
    pub fn parse(raw: &str, origin: &str) -> BqResult<Self> {
        serde_json::from_str(raw.trim()).map_err(|e| {
            BqError::credentials(format!("Failed to parse {origin} as credential JSON: {e}"))
        })
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("credential_type", &self.credential_type)
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where the credentials were found.
#[derive(Clone)]
pub enum CredentialSource {
    /// Inline JSON payload (`GOOGLE_APPLICATION_CREDENTIALS_JSON`).
    Inline { key: ServiceAccountKey, raw: String },
    /// Path to a key file (`GOOGLE_APPLICATION_CREDENTIALS`).
    KeyFile { path: PathBuf },
}

impl CredentialSource {
    /// Resolve the credential source.
    ///
    /// Blank values are treated as absent. An inline payload wins over a file
    /// path even when both are set.
    pub fn resolve(inline: Option<&str>, key_file: Option<&Path>) -> BqResult<Self> {
        let inline = inline.filter(|s| !s.trim().is_empty());
        let key_file = key_file.filter(|p| !p.as_os_str().is_empty());

        if let Some(raw) = inline {
            let key = ServiceAccountKey::parse(raw, INLINE_CREDENTIALS_ENV)?;
            return Ok(Self::Inline {
                key,
                raw: raw.trim().to_string(),
            });
        }

        if let Some(path) = key_file {
            if !path.exists() {
                return Err(BqError::credentials(format!(
                    "Service account file not found at path: {}",
                    path.display()
                )));
            }
            return Ok(Self::KeyFile {
                path: path.to_path_buf(),
            });
        }

        Err(BqError::credentials(format!(
            "Either {CREDENTIALS_FILE_ENV} or {INLINE_CREDENTIALS_ENV} environment variable is required"
        )))
    }

    /// Short name of the source kind, for logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Inline { .. } => "inline_json",
            Self::KeyFile { .. } => "key_file",
        }
    }

    /// Load the key material: the parsed key plus the raw JSON text.
    pub fn load(&self) -> BqResult<(ServiceAccountKey, String)> {
        match self {
            Self::Inline { key, raw } => Ok((key.clone(), raw.clone())),
            Self::KeyFile { path } => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    BqError::credentials(format!(
                        "Failed to read service account file {}: {e}",
                        path.display()
                    ))
                })?;
                let key = ServiceAccountKey::parse(&raw, &path.display().to_string())?;
                Ok((key, raw))
            }
        }
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline { key, .. } => f.debug_struct("Inline").field("key", key).finish(),
            Self::KeyFile { path } => f.debug_struct("KeyFile").field("path", path).finish(),
        }
    }
}

/// Credential details safe to show to clients (no secrets).
#[derive(Debug, Clone, Serialize, schemars::JsonSchema)]
pub struct CredentialSummary {
    /// "inline_json" or "key_file"
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
    /// Project that queries and listings run against
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<String>,
    pub has_private_key: bool,
}

impl CredentialSummary {
    pub fn new(source: &CredentialSource, key: &ServiceAccountKey, project_id: &str) -> Self {
        let key_file = match source {
            CredentialSource::KeyFile { path } => Some(path.display().to_string()),
            CredentialSource::Inline { .. } => None,
        };
        Self {
            source: source.kind().to_string(),
            key_file,
            project_id: project_id.to_string(),
            client_email: key.client_email.clone(),
            credential_type: key.credential_type.clone(),
            has_private_key: key.has_private_key(),
        }
    }
}
