//! Image payloads handed to the orchestrator.
//!
//! The core never decodes images; a payload is the data URL (or remote URL)
//! that goes into the `image` field of the prediction input.
use std::fmt;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};

use crate::error::{AppError, AppResult};

#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload(String);

impl ImagePayload {
    pub fn from_data_url(data_url: &str) -> AppResult<Self> {
        if data_url.trim().is_empty() {
            return Err(AppError::Validation("Image data is required".to_string()));
        }
        Ok(ImagePayload(data_url.to_string()))
    }

    pub fn from_bytes(mime: &str, bytes: &[u8]) -> AppResult<Self> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Image data is required".to_string()));
        }
        let encoded = general_purpose::STANDARD.encode(bytes);
        Ok(ImagePayload(format!("data:{};base64,{}", mime, encoded)))
    }

    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_bytes(mime_for_path(path), &bytes)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImagePayload({} bytes)", self.0.len())
    }
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
