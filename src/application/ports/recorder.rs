//! Clip encoding port interfaces

use thiserror::Error;

use crate::domain::audio::AudioMimeType;

/// Recording errors
#[derive(Debug, Clone, Error)]
pub enum RecordingError {
    #[error("No supported recording format for {sample_rate} Hz / {channels} channel(s)")]
    NoSupportedFormat { sample_rate: u32, channels: u16 },

    #[error("Encoding failed: {0}")]
    EncodeFailed(String),

    #[error("Nothing was recorded")]
    Empty,

    #[error("Failed to write clip: {0}")]
    WriteFailed(String),
}

/// Sample layout of a recorded stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

impl ClipSpec {
    /// Mono stream at the given rate
    pub const fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
        }
    }
}

/// Port for one container/codec combination.
///
/// The export use case walks an ordered preference list of encoders and
/// picks the first that supports the stream's spec.
pub trait ClipEncoder: Send + Sync {
    /// Container MIME type this encoder produces
    fn mime_type(&self) -> AudioMimeType;

    /// Whether this encoder can handle the given sample layout
    fn supports(&self, spec: ClipSpec) -> bool;

    /// Encode accumulated PCM16 samples into the container format
    fn encode(&self, samples: &[i16], spec: ClipSpec) -> Result<Vec<u8>, RecordingError>;
}
