//! Media store client.
//!
//! Product images live in an external media store. Uploads return a public
//! URL plus an opaque handle; deletes are best-effort by design - a failed
//! delete is logged and never blocks the product write that triggered it.

use reqwest::multipart;
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::MediaConfig;
use crate::models::MediaAsset;

/// Errors from the media store client.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Transport-level failure talking to the media store.
    #[error("media store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The media store rejected the request.
    #[error("media store returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// REST client for the media store.
#[derive(Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    config: MediaConfig,
}

impl MediaClient {
    /// Create a new media store client.
    #[must_use]
    pub fn new(config: MediaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Upload an image, returning its public URL and deletable handle.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Http` on transport failure and `MediaError::Api`
    /// if the store rejects the upload.
    pub async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<MediaAsset, MediaError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_owned())
            .mime_str(content_type)?;
        let form = multipart::Form::new()
            .text("folder", self.config.folder.clone())
            .part("file", part);

        let url = format!("{}/v1/assets", self.config.api_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Api { status, body });
        }

        let asset: MediaAsset = response.json().await?;
        tracing::info!(handle = %asset.handle, "image uploaded");
        Ok(asset)
    }

    /// Delete an asset by handle. Best-effort: failures are logged only.
    pub async fn delete(&self, handle: &str) {
        let url = format!("{}/v1/assets/{handle}", self.config.api_url);
        let result = self
            .http
            .delete(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!(handle, "image deleted");
            }
            Ok(response) => {
                tracing::warn!(handle, status = %response.status(), "media store refused delete");
            }
            Err(e) => {
                tracing::warn!(handle, error = %e, "media store delete failed");
            }
        }
    }
}
