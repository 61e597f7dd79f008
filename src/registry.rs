//! HTTP client for the motd package registry.
//!
//! Thin wrapper around `reqwest::blocking::Client`. Publishing a release is
//! one multipart POST per archive: a JSON part named `info` carrying the
//! upload metadata and a binary part named `files` carrying the zip bytes,
//! authenticated with a `token` header.

use anyhow::{Context, Result, bail};
use reqwest::blocking::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::targets::{APP_NAME, split_alias};

/// Registry endpoint that accepts package uploads.
const UPLOAD_PATH: &str = "/api/v1/packages";

/// User-Agent header sent with every registry request.
const USER_AGENT: &str = "motd-dist";

// ---------------------------------------------------------------------------
// Upload metadata
// ---------------------------------------------------------------------------

/// Metadata record sent as the `info` part of an upload.
///
/// `id` is always the application name and `download` is always `"zip"`;
/// `os` and `arch` come from splitting the target alias.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadMeta {
    pub id: String,
    pub version: String,
    pub os: String,
    pub arch: String,
    pub download: String,
}

impl UploadMeta {
    /// Build the metadata record for one target alias.
    pub fn for_alias(version: &str, alias: &str) -> Result<Self> {
        let (os, arch) = split_alias(alias)?;
        Ok(Self {
            id: APP_NAME.to_string(),
            version: version.to_string(),
            os: os.to_string(),
            arch: arch.to_string(),
            download: "zip".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// RegistryClient
// ---------------------------------------------------------------------------

/// Client for the motd package registry.
///
/// The base URL is trimmed and stripped of trailing slashes to prevent
/// double-slash issues when joining the endpoint path.
pub struct RegistryClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl RegistryClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let normalized = base_url.trim().trim_end_matches('/').to_string();
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: normalized,
            token: token.to_string(),
        })
    }

    /// Upload one archive with its metadata record.
    ///
    /// Transport failures are errors. Any HTTP response, success or not,
    /// comes back as an [`UploadResponse`] so the caller can print the body
    /// verbatim before acting on the status.
    pub fn publish(&self, meta: &UploadMeta, archive_path: &Path) -> Result<UploadResponse> {
        let info = serde_json::to_string(meta).context("failed to serialize upload metadata")?;

        let archive_name = archive_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                anyhow::anyhow!("archive has no valid filename: {}", archive_path.display())
            })?
            .to_string();

        let bytes = std::fs::read(archive_path)
            .with_context(|| format!("failed to read archive {}", archive_path.display()))?;

        let form = Form::new()
            .part(
                "info",
                Part::text(info)
                    .mime_str("application/json")
                    .context("failed to set metadata part MIME type")?,
            )
            .part(
                "files",
                Part::bytes(bytes)
                    .file_name(archive_name)
                    .mime_str("application/zip")
                    .context("failed to set archive part MIME type")?,
            );

        let url = self.url(UPLOAD_PATH);
        let resp = self
            .client
            .post(&url)
            .header("token", &self.token)
            .multipart(form)
            .send()
            .with_context(|| format!("failed to connect to registry at {url}"))?;

        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        Ok(UploadResponse { status, body })
    }

    /// Build a full URL by joining the base URL with an endpoint path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// ---------------------------------------------------------------------------
// HTTP error mapping
// ---------------------------------------------------------------------------

/// Status and raw body of an upload request.
#[derive(Debug)]
pub struct UploadResponse {
    pub status: reqwest::StatusCode,
    pub body: String,
}

impl UploadResponse {
    /// Map a non-success status to a user-facing error with any
    /// server-provided detail.
    pub fn check_status(&self) -> Result<()> {
        if self.status.is_success() {
            return Ok(());
        }

        match self.status.as_u16() {
            401 | 403 => {
                let detail = extract_error_message(&self.body);
                bail!("Registry rejected the upload token: {detail}");
            }
            400 => {
                let detail = extract_error_message(&self.body);
                bail!("Bad request: {detail}");
            }
            404 => {
                let detail = extract_error_message(&self.body);
                bail!("Not found: {detail}");
            }
            500..=599 => {
                let detail = extract_error_message(&self.body);
                bail!("Registry error: {detail}");
            }
            _ => {
                bail!("Unexpected response (HTTP {}): {}", self.status, self.body);
            }
        }
    }
}

/// Try to extract a `message` or `error` field from a JSON error body.
/// Falls back to the raw body (truncated) if parsing fails.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(s) = value
            .get("message")
            .or_else(|| value.get("error"))
            .and_then(|m| m.as_str())
        {
            return s.to_string();
        }
    }

    if body.is_empty() {
        return "no details provided".to_string();
    }

    let trimmed = body.trim();
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
