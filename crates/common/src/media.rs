//! Client for the external media-hosting service.
//!
//! Binary media (video files, thumbnails, avatars, cover images) is not
//! stored locally: uploads are staged to a temp file, pushed to the media
//! host, and the host's durable URL is what gets persisted. The temp file
//! is removed on every exit path, success or failure.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::MediaConfig;
use crate::{AppError, AppResult, IdGenerator};

/// A file accepted by the media host.
#[derive(Debug, Clone, Deserialize)]
pub struct HostedMedia {
    /// Durable URL of the hosted file.
    pub url: String,
    /// Duration in seconds, present for video/audio uploads.
    #[serde(default)]
    pub duration: Option<f64>,
}

/// A staged upload on the local filesystem.
///
/// Owns the temp file; dropping the guard removes it. This is what makes
/// the "temp file deleted regardless of upload outcome" invariant hold on
/// early returns and panics as well as the happy path.
#[derive(Debug)]
pub struct TempMedia {
    path: PathBuf,
    original_name: String,
}

impl TempMedia {
    /// Stage bytes into a temp file under `dir`.
    pub async fn stage(dir: &Path, original_name: &str, data: &[u8]) -> AppResult<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp dir: {e}")))?;

        let file_name = format!("{}_{}", IdGenerator::new().generate(), sanitize(original_name));
        let path = dir.join(file_name);

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to stage upload: {e}")))?;

        Ok(Self {
            path,
            original_name: original_name.to_string(),
        })
    }

    /// Path of the staged file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Original client-supplied file name.
    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }
}

impl Drop for TempMedia {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove temp file");
            }
        }
    }
}

/// Media host backend trait.
#[async_trait::async_trait]
pub trait MediaHost: Send + Sync {
    /// Upload a staged file, returning its durable URL and metadata.
    async fn upload(&self, file: &TempMedia) -> AppResult<HostedMedia>;
}

/// HTTP media host backend.
pub struct RemoteMediaHost {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
}

impl RemoteMediaHost {
    /// Create a new media host client from configuration.
    pub fn new(config: &MediaConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.upload_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build media client: {e}")))?;

        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait::async_trait]
impl MediaHost for RemoteMediaHost {
    async fn upload(&self, file: &TempMedia) -> AppResult<HostedMedia> {
        let data = tokio::fs::read(file.path())
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read staged file: {e}")))?;

        let content_type = mime_guess::from_path(file.original_name())
            .first_or_octet_stream()
            .to_string();

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file.original_name().to_string())
            .mime_str(&content_type)
            .map_err(|e| AppError::Internal(format!("Invalid content type: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .text("resource_type", "auto")
            .part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Media host returned {}",
                response.status()
            )));
        }

        let media = response.json::<HostedMedia>().await?;
        tracing::debug!(url = %media.url, "Uploaded file to media host");
        Ok(media)
    }
}

/// Strip path separators and control characters from a client file name.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0'..='\x1f' => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() {
        "upload.bin".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_media_removed_on_drop() {
        let dir = std::env::temp_dir().join("playtube-media-test");
        let staged = TempMedia::stage(&dir, "clip.mp4", b"data").await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_stage_keeps_original_name() {
        let dir = std::env::temp_dir().join("playtube-media-test");
        let staged = TempMedia::stage(&dir, "thumb.png", b"png").await.unwrap();
        assert_eq!(staged.original_name(), "thumb.png");
        assert!(staged.path().to_string_lossy().ends_with("thumb.png"));
    }

    #[test]
    fn test_sanitize_strips_separators() {
        assert_eq!(sanitize("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize(""), "upload.bin");
    }
}
