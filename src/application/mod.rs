//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod chat;
pub mod export;
pub mod identity;
pub mod live_session;
pub mod ports;

// Re-export use cases
pub use chat::{ChatOrchestrator, REPLY_FAILURE_PLACEHOLDER, TRANSCRIBE_INSTRUCTION};
pub use export::{ClipExporter, ClipRecorder, RecordedClip};
pub use identity::{AuthState, IdentitySession};
pub use live_session::{ErrorHook, LiveSessionOrchestrator};
