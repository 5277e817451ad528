//! Recording & export use case
//!
//! Captures an active audio stream into an encoded clip and hands it to
//! the caller for local download or a cloud-drive upload.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::audio::{AudioData, AudioMimeType};

use super::ports::{
    ClipEncoder, ClipSpec, DriveUploader, RecordingError, TokenBroker, UploadError, UploadProgress,
};

/// A finished recording ready for export
#[derive(Debug, Clone)]
pub struct RecordedClip {
    pub audio: AudioData,
    pub suggested_name: String,
}

impl RecordedClip {
    /// Write the clip to a local file
    pub async fn save_to(&self, path: impl AsRef<Path>) -> Result<(), RecordingError> {
        tokio::fs::write(path.as_ref(), self.audio.data())
            .await
            .map_err(|e| RecordingError::WriteFailed(e.to_string()))
    }
}

/// Accumulates PCM frames and encodes them on stop.
///
/// The encoder is chosen up front: the first entry in the ordered
/// preference list that supports the stream's sample layout. Creation
/// fails loudly when none does.
pub struct ClipRecorder {
    encoder: Box<dyn ClipEncoder>,
    spec: ClipSpec,
    samples: Vec<i16>,
}

impl ClipRecorder {
    /// Select an encoder from the ordered preference list
    pub fn new(
        encoders: Vec<Box<dyn ClipEncoder>>,
        spec: ClipSpec,
    ) -> Result<Self, RecordingError> {
        let encoder = encoders
            .into_iter()
            .find(|encoder| encoder.supports(spec))
            .ok_or(RecordingError::NoSupportedFormat {
                sample_rate: spec.sample_rate,
                channels: spec.channels,
            })?;

        Ok(Self {
            encoder,
            spec,
            samples: Vec::new(),
        })
    }

    /// Container MIME type the recording will be encoded to
    pub fn mime_type(&self) -> AudioMimeType {
        self.encoder.mime_type()
    }

    /// Append one chunk of f32 samples as they arrive
    pub fn push_frame(&mut self, frame: &[f32]) {
        self.samples
            .extend(frame.iter().map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16));
    }

    /// Append one chunk of PCM16 samples
    pub fn push_pcm16(&mut self, frame: &[i16]) {
        self.samples.extend_from_slice(frame);
    }

    /// Seconds of audio accumulated so far
    pub fn duration_secs(&self) -> f64 {
        if self.spec.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.spec.sample_rate as f64 * self.spec.channels as f64)
    }

    /// Stop recording: concatenate everything captured into one clip
    pub fn stop(self) -> Result<RecordedClip, RecordingError> {
        if self.samples.is_empty() {
            return Err(RecordingError::Empty);
        }
        let mime = self.encoder.mime_type();
        let bytes = self.encoder.encode(&self.samples, self.spec)?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Ok(RecordedClip {
            audio: AudioData::new(bytes, mime),
            suggested_name: format!("vivavoce-recording-{}.{}", stamp, mime.extension()),
        })
    }
}

/// Uploads finished clips to the cloud drive
pub struct ClipExporter<T: TokenBroker, U: DriveUploader> {
    broker: T,
    uploader: U,
}

impl<T: TokenBroker, U: DriveUploader> ClipExporter<T, U> {
    /// Create an exporter over the given ports
    pub fn new(broker: T, uploader: U) -> Self {
        Self { broker, uploader }
    }

    /// Obtain a short-lived token and upload the clip, reporting
    /// fractional progress (0-100) as bytes are acknowledged. Returns
    /// the remote file identifier.
    pub async fn upload(
        &self,
        clip: &RecordedClip,
        on_progress: Option<UploadProgress>,
    ) -> Result<String, UploadError> {
        let token = self.broker.access_token().await?;
        self.uploader
            .upload(&clip.audio, &clip.suggested_name, &token, on_progress)
            .await
    }
}
