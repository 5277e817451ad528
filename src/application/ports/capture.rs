//! Media capture port interfaces

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::live::InputSource;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No input device available")]
    NoDevice,

    #[error("Device access was denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to start capture: {0}")]
    StartFailed(String),
}

/// Handle to a running microphone stream.
///
/// The enabled gate mutes the hardware track immediately: frames produced
/// while disabled are dropped at the source, never queued. Cloneable so a
/// session teardown path can stop the stream from another task.
#[derive(Clone)]
pub struct MicHandle {
    enabled: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl MicHandle {
    /// Create a handle over shared capture flags
    pub fn new(enabled: Arc<AtomicBool>, stopped: Arc<AtomicBool>) -> Self {
        Self { enabled, stopped }
    }

    /// Enable or disable the underlying hardware track
    pub fn set_enabled(&self, on: bool) {
        self.enabled.store(on, Ordering::SeqCst);
    }

    /// Whether the track is currently enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Shared gate flag, for frame-forwarding loops
    pub fn enabled_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.enabled)
    }

    /// Stop the stream and release the device
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Whether the stream has been stopped
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Port for streaming microphone capture
#[async_trait]
pub trait MicCapture: Send + Sync {
    /// Open the default microphone as 16kHz mono f32 frames.
    ///
    /// Frames arrive in fixed-size blocks on the returned receiver until
    /// the handle is stopped. The handle starts enabled.
    async fn open(&self) -> Result<(MicHandle, mpsc::Receiver<Vec<f32>>), CaptureError>;
}

/// An open video input producing JPEG snapshots
pub trait FrameSource: Send {
    /// Capture one JPEG-encoded snapshot, or None while the device has
    /// no decodable frame yet.
    fn snapshot(&mut self) -> Option<Vec<u8>>;

    /// Release the underlying device
    fn stop(&mut self);
}

/// Port for acquiring a video input (camera or screen)
#[async_trait]
pub trait VideoDevice: Send + Sync {
    /// Acquire the given input source. `InputSource::None` is a caller
    /// error; implementations may reject it.
    async fn open(&self, source: InputSource) -> Result<Box<dyn FrameSource>, CaptureError>;
}
