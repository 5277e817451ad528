//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod auth;
pub mod capture;
pub mod chat;
pub mod config;
pub mod live;
pub mod playback;
pub mod recorder;
pub mod uploader;

// Re-export common types
pub use auth::{IdentityError, IdentityGateway};
pub use capture::{CaptureError, FrameSource, MicCapture, MicHandle, VideoDevice};
pub use chat::{ChatModel, ChatModelError, GenerateRequest, RequestPart};
pub use config::ConfigStore;
pub use live::{LiveConfig, LiveConnector, LiveError, LiveSession, SendError};
pub use playback::{SourceId, SpeechPlayer};
pub use recorder::{ClipEncoder, ClipSpec, RecordingError};
pub use uploader::{DriveUploader, TokenBroker, UploadError, UploadProgress};
