//! Audio domain module

mod data;
pub mod pcm;

pub use data::{AudioData, AudioMimeType};
pub use pcm::{PcmChunk, INPUT_MIME_TYPE, INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE};
