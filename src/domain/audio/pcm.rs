//! PCM16 wire codec
//!
//! The realtime endpoint consumes little-endian 16-bit mono PCM at 16kHz
//! and returns the same format at 24kHz. Conversions here are the only
//! place sample formats change shape.

use base64::Engine;

/// Sample rate for audio sent to the realtime endpoint (mono)
pub const INPUT_SAMPLE_RATE: u32 = 16_000;

/// Sample rate of synthesized audio received from the realtime endpoint (mono)
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

/// MIME type for realtime input audio chunks
pub const INPUT_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// Convert f32 samples in [-1.0, 1.0] to PCM16 little-endian bytes.
/// Out-of-range samples are clamped, not wrapped.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let clamped = s.clamp(-1.0, 1.0);
        let v = (clamped * 32767.0) as i16;
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Convert PCM16 little-endian bytes back to f32 samples.
/// A trailing odd byte is ignored.
pub fn decode_pcm16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

/// Base64-encode bytes for JSON transport
pub fn to_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 transport payload back into bytes
pub fn from_base64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::STANDARD.decode(data)
}

/// One decoded chunk of playable audio
#[derive(Debug, Clone, PartialEq)]
pub struct PcmChunk {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl PcmChunk {
    /// Create a chunk from decoded samples
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Decode a chunk from PCM16 bytes at the given rate
    pub fn from_pcm16(bytes: &[u8], sample_rate: u32) -> Self {
        Self::new(decode_pcm16(bytes), sample_rate)
    }

    /// Get the samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Consume and return the samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Playback duration of this chunk in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Whether the chunk carries no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
