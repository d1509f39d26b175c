//! Upload client for shipping the CSV export to a collection server.
//!
//! The export artifact is handed over as an opaque `text/plain` body, one
//! POST per export. Failures are surfaced to the caller for a user-visible
//! notice and never retried automatically.

use serde::Deserialize;

/// Upload client error types.
#[derive(Debug)]
pub enum UploadError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::Config(msg) => write!(f, "Upload config error: {msg}"),
            UploadError::Network(msg) => write!(f, "Upload network error: {msg}"),
            UploadError::Server { status, message } => {
                write!(f, "Upload server error ({status}): {message}")
            }
        }
    }
}

impl std::error::Error for UploadError {}

/// Optional acknowledgement body from the server.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub status: Option<String>,
    pub file: Option<String>,
}

/// Async upload client.
pub struct DatasetUploader {
    client: reqwest::Client,
    url: String,
}

impl DatasetUploader {
    /// Create a new uploader targeting `url`.
    pub fn new(url: impl Into<String>) -> Result<Self, UploadError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(UploadError::Config("upload URL is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| UploadError::Config(e.to_string()))?;

        Ok(Self { client, url })
    }

    /// Upload one CSV export, returning the server's acknowledgement if it
    /// sent one.
    pub async fn upload_csv(&self, csv: &str) -> Result<Option<UploadResponse>, UploadError> {
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "text/plain")
            .body(csv.to_string())
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UploadError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await.ok())
    }
}

/// Blocking uploader for use in synchronous contexts.
pub struct BlockingDatasetUploader {
    inner: DatasetUploader,
    runtime: tokio::runtime::Runtime,
}

impl BlockingDatasetUploader {
    /// Create a new blocking uploader.
    pub fn new(url: impl Into<String>) -> Result<Self, UploadError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| UploadError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: DatasetUploader::new(url)?,
            runtime,
        })
    }

    /// Upload one CSV export.
    pub fn upload_csv(&self, csv: &str) -> Result<Option<UploadResponse>, UploadError> {
        self.runtime.block_on(self.inner.upload_csv(csv))
    }
}
