//! Audio capture, playback, and encoding adapters

mod capture;
mod encoders;
mod player;

pub use capture::CpalMicCapture;
pub use encoders::{default_encoders, FlacClipEncoder, WavClipEncoder};
pub use player::{PlaybackInitError, RodioSpeechPlayer};
