//! Image uploads and media URL resolution.

use std::path::{Path, PathBuf};

use reqwest::multipart::Part;
use url::Url;

use crate::api::{ApiClient, ApiClientError};

/// An image read from disk, ready to be sent as a multipart part.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiClientError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ApiClientError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            mime,
            bytes,
        })
    }

    /// Short human-readable description used in place of a rendered preview.
    pub fn describe(&self) -> String {
        format!(
            "{} ({}, {})",
            self.file_name,
            self.mime,
            format_size(self.bytes.len())
        )
    }

    pub(crate) fn into_part(self) -> Result<Part, ApiClientError> {
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime)?)
    }
}

fn format_size(n: usize) -> String {
    if n >= 1024 * 1024 {
        format!("{:.1} MB", n as f64 / (1024.0 * 1024.0))
    } else if n >= 1024 {
        format!("{:.1} KB", n as f64 / 1024.0)
    } else {
        format!("{n} B")
    }
}

/// Resolve a server-relative media path (e.g. `/uploads/x.png`) against the
/// media origin. Absolute URLs pass through unchanged.
pub fn resolve_media_url(media_base: &str, path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(path) {
        return Some(url.to_string());
    }
    let base = Url::parse(media_base).ok()?;
    base.join(path).ok().map(|u| u.to_string())
}

impl ApiClient {
    pub fn media_url(&self, path: &str) -> Option<String> {
        resolve_media_url(&self.media_base_url, path)
    }
}
