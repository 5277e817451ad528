//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the Gemini APIs, audio devices, and cloud services.

pub mod audio;
pub mod config;
pub mod drive;
pub mod gemini;
pub mod identity;
pub mod video;

// Re-export adapters
pub use audio::{default_encoders, CpalMicCapture, RodioSpeechPlayer};
pub use config::XdgConfigStore;
pub use drive::{DriveClient, OAuthTokenBroker};
pub use gemini::{GeminiChatModel, GeminiLiveConnector};
pub use identity::IdentityClient;
pub use video::FrameDirDevice;
