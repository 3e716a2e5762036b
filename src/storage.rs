use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;

use crate::errors::BackendError;

// @module: Audio object upload collaborator

/// Upload seam between the pipeline and object storage.
///
/// The core never performs storage operations itself; it only consumes the
/// locator string an implementation hands back.
#[async_trait]
pub trait ObjectStore: Send + Sync + Debug {
    /// Upload the file at `path` and return the storage locator under which
    /// the transcription backend can read it
    async fn upload(&self, path: &Path) -> Result<String, BackendError>;
}

/// Response of the upload-ticket endpoint: a presigned URL to PUT the bytes
/// to, and the locator the transcription backend will be given
#[derive(Debug, Deserialize)]
struct UploadTicket {
    upload_url: String,
    media_uri: String,
}

/// Uploads through a presigned-URL issuing service.
///
/// Two-step flow: request an upload ticket, then PUT the audio bytes to the
/// presigned URL. Credential handling stays entirely on the service side.
#[derive(Debug)]
pub struct PresignedUrlStore {
    client: Client,
    endpoint: String,
}

impl PresignedUrlStore {
    /// Create a store that requests tickets from the given service endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(300))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
        }
    }

    async fn request_ticket(&self) -> Result<UploadTicket, BackendError> {
        let url = format!("{}/upload", self.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        response
            .json::<UploadTicket>()
            .await
            .map_err(|e| BackendError::ParseError(format!("upload ticket response: {}", e)))
    }
}

#[async_trait]
impl ObjectStore for PresignedUrlStore {
    async fn upload(&self, path: &Path) -> Result<String, BackendError> {
        let ticket = self.request_ticket().await?;
        debug!("Obtained upload ticket for {}", ticket.media_uri);

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BackendError::RequestFailed(format!("reading audio file: {}", e)))?;

        info!(
            "Uploading {} bytes of audio (this may take some time)",
            bytes.len()
        );

        let response = self
            .client
            .put(&ticket.upload_url)
            .body(bytes)
            .send()
            .await
            .map_err(|e| BackendError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        info!("Upload complete");
        Ok(ticket.media_uri)
    }
}

/// A store for audio that is already uploaded: returns a fixed locator and
/// never touches the file
#[derive(Debug)]
pub struct StaticStore {
    media_uri: String,
}

impl StaticStore {
    /// Wrap an existing storage locator
    pub fn new(media_uri: impl Into<String>) -> Self {
        Self {
            media_uri: media_uri.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for StaticStore {
    async fn upload(&self, _path: &Path) -> Result<String, BackendError> {
        Ok(self.media_uri.clone())
    }
}
