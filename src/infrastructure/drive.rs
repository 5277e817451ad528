//! Cloud-drive upload adapters
//!
//! Multipart upload (JSON metadata + media bytes) against the Drive v3
//! endpoint, authorized by a bearer token from an OAuth refresh
//! exchange. The media part streams in fixed chunks so fractional
//! progress can be reported as bytes are handed to the transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::application::ports::{DriveUploader, TokenBroker, UploadError, UploadProgress};
use crate::domain::audio::AudioData;

/// Drive v3 multipart upload endpoint
const UPLOAD_ENDPOINT: &str = "https://www.googleapis.com/upload/drive/v3/files";

/// OAuth token endpoint
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Streaming chunk granularity for progress accounting
const UPLOAD_CHUNK_BYTES: usize = 256 * 1024;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Drive v3 upload client
pub struct DriveClient {
    base_url: String,
    client: reqwest::Client,
}

impl DriveClient {
    /// Create a client against the production endpoint
    pub fn new() -> Self {
        Self {
            base_url: UPLOAD_ENDPOINT.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client against a custom endpoint (tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for DriveClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriveUploader for DriveClient {
    async fn upload(
        &self,
        clip: &AudioData,
        name: &str,
        token: &str,
        on_progress: Option<UploadProgress>,
    ) -> Result<String, UploadError> {
        let metadata = serde_json::json!({
            "name": name,
            "mimeType": clip.mime_type().as_str(),
        });

        let total = clip.size_bytes().max(1);
        let sent = Arc::new(AtomicUsize::new(0));
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = clip
            .data()
            .chunks(UPLOAD_CHUNK_BYTES)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();

        let progress_sent = Arc::clone(&sent);
        let media_stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
            if let Ok(bytes) = &chunk {
                let done = progress_sent.fetch_add(bytes.len(), Ordering::SeqCst) + bytes.len();
                if let Some(progress) = &on_progress {
                    progress((done as f64 / total as f64 * 100.0).min(100.0));
                }
            }
            chunk
        }));

        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json; charset=UTF-8")
                    .map_err(|e| UploadError::Failed(e.to_string()))?,
            )
            .part(
                "media",
                reqwest::multipart::Part::stream_with_length(
                    reqwest::Body::wrap_stream(media_stream),
                    clip.size_bytes() as u64,
                )
                .mime_str(clip.mime_type().as_str())
                .map_err(|e| UploadError::Failed(e.to_string()))?,
            );

        let response = self
            .client
            .post(format!("{}?uploadType=multipart&fields=id", self.base_url))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = if body.contains("storageQuotaExceeded") || status.as_u16() == 429 {
                "storage quota exceeded"
            } else if status.as_u16() == 401 || status.as_u16() == 403 {
                "not authorized for the drive"
            } else {
                "request rejected"
            };
            return Err(UploadError::Failed(format!(
                "{} (HTTP {}): {}",
                reason,
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Failed(e.to_string()))?;
        Ok(uploaded.id)
    }
}

/// Token broker exchanging a stored OAuth refresh token for a
/// short-lived access token
pub struct OAuthTokenBroker {
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    client: reqwest::Client,
}

impl OAuthTokenBroker {
    /// Create a broker against the production token endpoint
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            token_url: TOKEN_ENDPOINT.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the broker at a custom token endpoint (tests)
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }
}

#[async_trait]
impl TokenBroker for OAuthTokenBroker {
    async fn access_token(&self) -> Result<String, UploadError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| UploadError::TokenDenied(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::TokenDenied(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| UploadError::TokenDenied(e.to_string()))?;
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::AudioMimeType;
    use std::sync::Mutex;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn clip(len: usize) -> AudioData {
        AudioData::new(vec![7u8; len], AudioMimeType::Flac)
    }

    #[tokio::test]
    async fn upload_reports_monotonic_progress_to_100() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(query_param("uploadType", "multipart"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "file-123"
            })))
            .mount(&server)
            .await;

        let client = DriveClient::with_base_url(format!("{}/upload", server.uri()));
        let seen: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let id = client
            .upload(
                &clip(UPLOAD_CHUNK_BYTES * 2 + 10),
                "clip.flac",
                "token",
                Some(Arc::new(move |p| seen_clone.lock().unwrap().push(p))),
            )
            .await
            .unwrap();

        assert_eq!(id, "file-123");
        let progress = seen.lock().unwrap();
        assert_eq!(progress.len(), 3);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert!((progress.last().unwrap() - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn upload_surfaces_quota_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_string(r#"{"error":{"errors":[{"reason":"storageQuotaExceeded"}]}}"#),
            )
            .mount(&server)
            .await;

        let client = DriveClient::with_base_url(server.uri());
        let result = client.upload(&clip(10), "clip.flac", "token", None).await;

        let message = result.unwrap_err().to_string();
        assert!(message.contains("quota"));
    }

    #[tokio::test]
    async fn broker_exchanges_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "short-lived",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let broker = OAuthTokenBroker::new("id", "secret", "refresh")
            .with_token_url(format!("{}/token", server.uri()));
        assert_eq!(broker.access_token().await.unwrap(), "short-lived");
    }

    #[tokio::test]
    async fn broker_denial_is_a_token_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
            .mount(&server)
            .await;

        let broker =
            OAuthTokenBroker::new("id", "secret", "refresh").with_token_url(server.uri());
        assert!(matches!(
            broker.access_token().await.err(),
            Some(UploadError::TokenDenied(_))
        ));
    }
}
