pub mod auth;
pub mod media;
pub mod posts;
pub mod profile;
pub mod types;

use std::path::PathBuf;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::types::MessageBody;
use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiClientError {
    /// Bad credentials or a server-side signup rejection.
    #[error("{message}")]
    Auth { message: String },
    /// Rejected locally before any request was sent.
    #[error("{0}")]
    Validation(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("API error (status {status}): {detail}")]
    Api { status: u16, detail: String },
    #[error("deserialization error: {0}")]
    Deserialize(String),
    #[error("failed to read image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ApiClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Message to show in a view, falling back to `generic` for failures
    /// that carry nothing a user can act on.
    pub fn user_message(&self, generic: &str) -> String {
        match self {
            Self::Auth { message } | Self::Validation(message) => message.clone(),
            Self::Image { .. } => self.to_string(),
            _ => generic.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Percent-encoding set for a single path segment (keep unreserved chars).
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub(crate) fn encode_segment(s: &str) -> String {
    utf8_percent_encode(s, SEGMENT_ENCODE_SET).to_string()
}

/// Extract the backend's `message` field from an error body, if any.
pub(crate) fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<MessageBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

// ---------------------------------------------------------------------------
// API client
// ---------------------------------------------------------------------------

/// HTTP client for the backend REST API.
///
/// Cloning is cheap (the underlying `reqwest::Client` is reference counted).
/// A clone carries at most one bearer token, attached to every request it
/// sends; whether a token is required is the caller's concern.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    media_base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, media_base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            media_base_url: media_base_url.into(),
            token: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.api_base_url, &config.media_base_url)
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn media_base_url(&self) -> &str {
        &self.media_base_url
    }

    /// Build a full API URL from a path (e.g. "/api/posts/all").
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Start a request, attaching the bearer token when one is held.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, auth = self.token.is_some(), "api request");
        let builder = self.http_client.request(method, self.url(path));
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and deserialize a successful JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiClientError> {
        let resp = Self::check_status(builder.send().await?).await?;
        let body = resp.text().await?;
        serde_json::from_str::<T>(&body)
            .map_err(|e| ApiClientError::Deserialize(format!("{e}: {body}")))
    }

    /// Send a request whose successful body is irrelevant.
    pub(crate) async fn send_unit(&self, builder: RequestBuilder) -> Result<(), ApiClientError> {
        Self::check_status(builder.send().await?).await?;
        Ok(())
    }

    /// Map non-success statuses onto the error taxonomy.
    async fn check_status(resp: Response) -> Result<Response, ApiClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let url = resp.url().path().to_string();
        let body = resp.text().await.unwrap_or_default();
        let detail = server_message(&body).unwrap_or(body);

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiClientError::NotFound(if detail.is_empty() {
                url
            } else {
                detail
            }));
        }

        Err(ApiClientError::Api {
            status: status.as_u16(),
            detail,
        })
    }
}
