//! Clip encoders for recording export
//!
//! FLAC first (lossless and compact), WAV as the always-available
//! fallback. The export use case walks this preference order.

use std::io::Cursor;

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;

use crate::application::ports::{ClipEncoder, ClipSpec, RecordingError};
use crate::domain::audio::AudioMimeType;

/// Bits per sample for all exported clips
const BITS_PER_SAMPLE: usize = 16;

/// FLAC stream limits
const FLAC_MAX_SAMPLE_RATE: u32 = 192_000;
const FLAC_MAX_CHANNELS: u16 = 8;

/// Default encoder preference list: FLAC, then WAV
pub fn default_encoders() -> Vec<Box<dyn ClipEncoder>> {
    vec![Box::new(FlacClipEncoder), Box::new(WavClipEncoder)]
}

/// Lossless FLAC encoder backed by flacenc
pub struct FlacClipEncoder;

impl ClipEncoder for FlacClipEncoder {
    fn mime_type(&self) -> AudioMimeType {
        AudioMimeType::Flac
    }

    fn supports(&self, spec: ClipSpec) -> bool {
        spec.sample_rate > 0
            && spec.sample_rate <= FLAC_MAX_SAMPLE_RATE
            && (1..=FLAC_MAX_CHANNELS).contains(&spec.channels)
    }

    fn encode(&self, samples: &[i16], spec: ClipSpec) -> Result<Vec<u8>, RecordingError> {
        let samples_i32: Vec<i32> = samples.iter().map(|&s| s as i32).collect();

        let config = config::Encoder::default()
            .into_verified()
            .map_err(|(_, e)| RecordingError::EncodeFailed(format!("{:?}", e)))?;

        let source = MemSource::from_samples(
            &samples_i32,
            spec.channels as usize,
            BITS_PER_SAMPLE,
            spec.sample_rate as usize,
        );

        let flac_stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
            .map_err(|e| RecordingError::EncodeFailed(format!("{:?}", e)))?;

        let mut sink = ByteSink::new();
        flac_stream
            .write(&mut sink)
            .map_err(|e| RecordingError::EncodeFailed(e.to_string()))?;

        Ok(sink.into_inner())
    }
}

/// WAV container encoder backed by hound
pub struct WavClipEncoder;

impl ClipEncoder for WavClipEncoder {
    fn mime_type(&self) -> AudioMimeType {
        AudioMimeType::Wav
    }

    fn supports(&self, spec: ClipSpec) -> bool {
        spec.sample_rate > 0 && spec.channels > 0
    }

    fn encode(&self, samples: &[i16], spec: ClipSpec) -> Result<Vec<u8>, RecordingError> {
        let wav_spec = hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: BITS_PER_SAMPLE as u16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, wav_spec)
                .map_err(|e| RecordingError::EncodeFailed(e.to_string()))?;
            for &sample in samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| RecordingError::EncodeFailed(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| RecordingError::EncodeFailed(e.to_string()))?;
        }

        Ok(cursor.into_inner())
    }
}
