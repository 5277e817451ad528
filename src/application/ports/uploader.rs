//! Cloud upload port interfaces

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioData;

/// Upload errors. Network and quota failures collapse into one
/// descriptive message for the user; nothing is retried.
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    #[error("Could not obtain an access token: {0}")]
    TokenDenied(String),

    #[error("Upload failed: {0}")]
    Failed(String),
}

/// Fractional upload progress callback, 0.0 to 100.0
pub type UploadProgress = Arc<dyn Fn(f64) + Send + Sync>;

/// Port for short-lived access token acquisition
#[async_trait]
pub trait TokenBroker: Send + Sync {
    /// Obtain a bearer token scoped for file upload
    async fn access_token(&self) -> Result<String, UploadError>;
}

/// Port for the cloud-drive upload endpoint
#[async_trait]
pub trait DriveUploader: Send + Sync {
    /// Multipart upload of one clip (JSON metadata + media bytes).
    /// Progress is reported as bytes are acknowledged. Returns the
    /// remote file identifier.
    async fn upload(
        &self,
        clip: &AudioData,
        name: &str,
        token: &str,
        on_progress: Option<UploadProgress>,
    ) -> Result<String, UploadError>;
}
