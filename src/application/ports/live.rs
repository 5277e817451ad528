//! Realtime session port interfaces
//!
//! The remote session object is modeled as `send(frame)` plus a pushed
//! stream of server events, so the live orchestrator's state machine can
//! be exercised without real devices or network.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::live::{RealtimeFrame, ServerEvent};

/// Errors establishing a realtime session
#[derive(Debug, Clone, Error)]
pub enum LiveError {
    #[error("Missing API key. Set GEMINI_API_KEY or configure via 'vivavoce config set api_key <key>'")]
    MissingApiKey,

    #[error("Failed to connect: {0}")]
    ConnectFailed(String),

    #[error("Device unavailable: {0}")]
    Capture(#[from] super::capture::CaptureError),
}

/// Errors sending a frame into an open session
#[derive(Debug, Clone, Error)]
pub enum SendError {
    /// The session is closing or already closed. Expected during
    /// teardown races; callers suppress this.
    #[error("session is closed")]
    Closed,

    #[error("send failed: {0}")]
    Failed(String),
}

/// Configuration for one realtime session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveConfig {
    pub model: String,
    pub voice: String,
    pub system_instruction: String,
}

/// An open realtime session.
///
/// `send` enqueues without blocking; delivery failures after enqueue
/// surface on the event stream as `ServerEvent::Error` or `Closed`.
pub trait LiveSession: Send + Sync {
    /// Forward one realtime input frame
    fn send(&self, frame: RealtimeFrame) -> Result<(), SendError>;

    /// Begin an orderly close. Idempotent.
    fn close(&self);
}

/// Port for dialing the realtime endpoint
#[async_trait]
pub trait LiveConnector: Send + Sync {
    /// Open a session configured for audio-only responses with a fixed
    /// voice and the given system instruction. Events are pushed on the
    /// returned receiver until the session closes.
    async fn connect(
        &self,
        config: LiveConfig,
    ) -> Result<(Box<dyn LiveSession>, mpsc::Receiver<ServerEvent>), LiveError>;
}
