//! Video frame source adapters
//!
//! The realtime endpoint takes periodic JPEG snapshots rather than a
//! video stream, so a frame source only has to produce one compressed
//! image per tick. The CLI feeds frames from a directory that any
//! external grabber (e.g. ffmpeg writing numbered stills) can fill;
//! undecodable or missing files read as "no frame yet".

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;

use crate::application::ports::{CaptureError, FrameSource, VideoDevice};
use crate::domain::live::InputSource;

/// Snapshot compression quality (0-100)
pub const SNAPSHOT_JPEG_QUALITY: u8 = 50;

/// Encode an RGB8 buffer as a JPEG snapshot
pub fn encode_jpeg_rgb(rgb: &[u8], width: u32, height: u32) -> Option<Vec<u8>> {
    if width == 0 || height == 0 || rgb.len() != (width * height * 3) as usize {
        return None;
    }
    let mut out = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut out, SNAPSHOT_JPEG_QUALITY);
    encoder
        .encode(rgb, width, height, image::ExtendedColorType::Rgb8)
        .ok()?;
    Some(out.into_inner())
}

/// Frame source over a directory of still images.
///
/// Cycles through the directory in name order, re-encoding each decoded
/// image as a JPEG snapshot. Files that fail to decode are skipped.
pub struct ImageSequenceSource {
    frames: Vec<PathBuf>,
    index: usize,
    stopped: bool,
}

impl ImageSequenceSource {
    /// Scan a directory for image frames
    pub fn scan(dir: &Path) -> Result<Self, CaptureError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CaptureError::StartFailed(format!("{}: {}", dir.display(), e)))?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        frames.sort();

        Ok(Self {
            frames,
            index: 0,
            stopped: false,
        })
    }
}

impl FrameSource for ImageSequenceSource {
    fn snapshot(&mut self) -> Option<Vec<u8>> {
        if self.stopped || self.frames.is_empty() {
            return None;
        }
        // One pass over the catalog per tick; give up until the next
        // tick if nothing decodes.
        for _ in 0..self.frames.len() {
            let path = &self.frames[self.index];
            self.index = (self.index + 1) % self.frames.len();

            let Ok(decoded) = image::open(path) else {
                continue;
            };
            let rgb = decoded.to_rgb8();
            if let Some(jpeg) = encode_jpeg_rgb(rgb.as_raw(), rgb.width(), rgb.height()) {
                return Some(jpeg);
            }
        }
        None
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.frames.clear();
    }
}

/// Video device backed by frame directories, one per input source
pub struct FrameDirDevice {
    camera_dir: Option<PathBuf>,
    screen_dir: Option<PathBuf>,
}

impl FrameDirDevice {
    /// Create a device with optional per-source directories
    pub fn new(camera_dir: Option<PathBuf>, screen_dir: Option<PathBuf>) -> Self {
        Self {
            camera_dir,
            screen_dir,
        }
    }
}

#[async_trait]
impl VideoDevice for FrameDirDevice {
    async fn open(&self, source: InputSource) -> Result<Box<dyn FrameSource>, CaptureError> {
        let dir = match source {
            InputSource::Camera => self.camera_dir.as_ref(),
            InputSource::Screen => self.screen_dir.as_ref(),
            InputSource::None => None,
        }
        .ok_or(CaptureError::NoDevice)?;

        Ok(Box::new(ImageSequenceSource::scan(dir)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_jpeg_produces_jfif_bytes() {
        let rgb = vec![200u8; 4 * 4 * 3];
        let jpeg = encode_jpeg_rgb(&rgb, 4, 4).unwrap();
        // JPEG SOI marker
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn encode_jpeg_rejects_mismatched_dimensions() {
        assert!(encode_jpeg_rgb(&[0u8; 10], 4, 4).is_none());
        assert!(encode_jpeg_rgb(&[], 0, 0).is_none());
    }

    #[test]
    fn empty_directory_yields_no_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ImageSequenceSource::scan(dir.path()).unwrap();
        assert!(source.snapshot().is_none());
    }

    #[test]
    fn snapshot_cycles_and_skips_undecodable_files() {
        let dir = tempfile::tempdir().unwrap();

        // One real image and one file that is not an image.
        let rgb = image::RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30]));
        rgb.save(dir.path().join("a-frame.png")).unwrap();
        std::fs::write(dir.path().join("b-garbage.png"), b"not an image").unwrap();

        let mut source = ImageSequenceSource::scan(dir.path()).unwrap();
        for _ in 0..3 {
            let jpeg = source.snapshot().unwrap();
            assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        }
    }

    #[test]
    fn stop_releases_frames() {
        let dir = tempfile::tempdir().unwrap();
        let rgb = image::RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 0]));
        rgb.save(dir.path().join("frame.png")).unwrap();

        let mut source = ImageSequenceSource::scan(dir.path()).unwrap();
        assert!(source.snapshot().is_some());
        source.stop();
        assert!(source.snapshot().is_none());
    }

    #[tokio::test]
    async fn device_rejects_unconfigured_source() {
        let device = FrameDirDevice::new(None, None);
        let result = device.open(InputSource::Camera).await;
        assert!(matches!(result.err(), Some(CaptureError::NoDevice)));
    }

    #[tokio::test]
    async fn device_opens_configured_directory() {
        let dir = tempfile::tempdir().unwrap();
        let device = FrameDirDevice::new(Some(dir.path().to_path_buf()), None);
        assert!(device.open(InputSource::Camera).await.is_ok());
    }
}
