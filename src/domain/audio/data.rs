//! Audio attachment value object

use std::fmt;

use super::pcm;

/// Supported audio MIME types for batch attachments and exported clips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioMimeType {
    Flac,
    Wav,
    Ogg,
    Mp3,
    Webm,
}

impl AudioMimeType {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
            Self::Mp3 => "audio/mp3",
            Self::Webm => "audio/webm",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Mp3 => "mp3",
            Self::Webm => "webm",
        }
    }

    /// Guess the MIME type from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "flac" => Some(Self::Flac),
            "wav" => Some(Self::Wav),
            "ogg" | "oga" => Some(Self::Ogg),
            "mp3" => Some(Self::Mp3),
            "webm" => Some(Self::Webm),
            _ => None,
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for AudioMimeType {
    fn default() -> Self {
        Self::Flac
    }
}

/// Value object representing encoded audio ready for a batch request
/// or a local export. Raw bytes plus their MIME type.
#[derive(Debug, Clone)]
pub struct AudioData {
    data: Vec<u8>,
    mime_type: AudioMimeType,
}

impl AudioData {
    /// Create AudioData from raw bytes
    pub fn new(data: Vec<u8>, mime_type: AudioMimeType) -> Self {
        Self { data, mime_type }
    }

    /// Create AudioData from a byte slice
    pub fn from_bytes(data: &[u8], mime_type: AudioMimeType) -> Self {
        Self {
            data: data.to_vec(),
            mime_type,
        }
    }

    /// Get the raw audio data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the raw audio data
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Get the MIME type
    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }

    /// Encode the audio data as base64 for JSON transport
    pub fn to_base64(&self) -> String {
        pcm::to_base64(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_as_str() {
        assert_eq!(AudioMimeType::Flac.as_str(), "audio/flac");
        assert_eq!(AudioMimeType::Wav.as_str(), "audio/wav");
        assert_eq!(AudioMimeType::Webm.as_str(), "audio/webm");
    }

    #[test]
    fn mime_type_extension() {
        assert_eq!(AudioMimeType::Flac.extension(), "flac");
        assert_eq!(AudioMimeType::Wav.extension(), "wav");
    }

    #[test]
    fn default_mime_type_is_flac() {
        assert_eq!(AudioMimeType::default(), AudioMimeType::Flac);
    }

    #[test]
    fn from_extension() {
        assert_eq!(AudioMimeType::from_extension("flac"), Some(AudioMimeType::Flac));
        assert_eq!(AudioMimeType::from_extension("WAV"), Some(AudioMimeType::Wav));
        assert_eq!(AudioMimeType::from_extension("oga"), Some(AudioMimeType::Ogg));
        assert_eq!(AudioMimeType::from_extension("txt"), None);
    }

    #[test]
    fn audio_data_size() {
        let data = AudioData::new(vec![0u8; 2048], AudioMimeType::Wav);
        assert_eq!(data.size_bytes(), 2048);
        assert_eq!(data.human_readable_size(), "2.0 KB");
    }

    #[test]
    fn human_readable_size_bytes() {
        let data = AudioData::new(vec![0u8; 500], AudioMimeType::Flac);
        assert_eq!(data.human_readable_size(), "500 B");
    }

    #[test]
    fn human_readable_size_mb() {
        let data = AudioData::new(vec![0u8; 3 * 1024 * 1024], AudioMimeType::Flac);
        assert_eq!(data.human_readable_size(), "3.0 MB");
    }

    #[test]
    fn to_base64_round_trips() {
        let data = AudioData::new(vec![9, 8, 7], AudioMimeType::Flac);
        let decoded = crate::domain::audio::pcm::from_base64(&data.to_base64()).unwrap();
        assert_eq!(decoded, vec![9, 8, 7]);
    }

    #[test]
    fn from_bytes() {
        let data = AudioData::from_bytes(&[1, 2, 3], AudioMimeType::Mp3);
        assert_eq!(data.data(), &[1, 2, 3]);
        assert_eq!(data.mime_type(), AudioMimeType::Mp3);
    }
}
