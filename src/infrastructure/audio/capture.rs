//! Streaming microphone capture using cpal
//!
//! Captures the default input device, mixes down to mono, resamples to
//! 16kHz when the device rate differs, and pushes fixed-size f32 frames
//! until stopped. The cpal stream lives on its own thread because it is
//! not Send.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use rubato::{FftFixedIn, Resampler};
use tokio::sync::{mpsc, oneshot};

use crate::application::ports::{CaptureError, MicCapture, MicHandle};
use crate::domain::audio::INPUT_SAMPLE_RATE;

/// Samples per emitted frame: 100ms of 16kHz mono
const FRAME_SAMPLES: usize = 1600;

/// Resampler block size
const RESAMPLE_CHUNK: usize = 1024;

/// How often the capture thread drains the device buffer
const DRAIN_INTERVAL_MS: u64 = 50;

/// Microphone capture adapter over cpal
pub struct CpalMicCapture;

impl CpalMicCapture {
    /// Create a new capture adapter
    pub fn new() -> Self {
        Self
    }

    /// Get the default input device
    fn get_input_device() -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        host.default_input_device().ok_or(CaptureError::NoDevice)
    }

    /// Get a suitable input configuration.
    /// Prefers mono and configurations that include 16kHz.
    fn get_input_config(
        device: &cpal::Device,
    ) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;

        let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;

        for config in supported_configs {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let includes_target = config.min_sample_rate().0 <= INPUT_SAMPLE_RATE
                && config.max_sample_rate().0 >= INPUT_SAMPLE_RATE;

            let is_better = match &best_config {
                None => true,
                Some(current) => {
                    let fewer_channels = config.channels() < current.channels();
                    let better_rate =
                        includes_target && current.min_sample_rate().0 > INPUT_SAMPLE_RATE;
                    fewer_channels || better_rate
                }
            };
            if is_better {
                best_config = Some(config);
            }
        }

        let config_range = best_config
            .ok_or_else(|| CaptureError::StartFailed("No suitable input config found".into()))?;

        let sample_rate = if config_range.min_sample_rate().0 <= INPUT_SAMPLE_RATE
            && config_range.max_sample_rate().0 >= INPUT_SAMPLE_RATE
        {
            SampleRate(INPUT_SAMPLE_RATE)
        } else {
            config_range.min_sample_rate()
        };

        let sample_format = config_range.sample_format();
        let config = StreamConfig {
            channels: config_range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, sample_format))
    }

    /// Mix interleaved channels down to mono
    fn mix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
        if channels <= 1 {
            return samples.to_vec();
        }
        samples
            .chunks(channels as usize)
            .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
            .collect()
    }
}

impl Default for CpalMicCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming resampler state for one capture session
struct StreamResampler {
    inner: Option<FftFixedIn<f32>>,
    pending: Vec<f32>,
}

impl StreamResampler {
    fn new(source_rate: u32) -> Result<Self, CaptureError> {
        let inner = if source_rate == INPUT_SAMPLE_RATE {
            None
        } else {
            Some(
                FftFixedIn::<f32>::new(
                    source_rate as usize,
                    INPUT_SAMPLE_RATE as usize,
                    RESAMPLE_CHUNK,
                    2,
                    1,
                )
                .map_err(|e| CaptureError::StartFailed(format!("Resampler init failed: {}", e)))?,
            )
        };
        Ok(Self {
            inner,
            pending: Vec::new(),
        })
    }

    /// Feed device-rate samples; returns whatever 16kHz output is ready
    fn process(&mut self, samples: &[f32]) -> Vec<f32> {
        let Some(resampler) = &mut self.inner else {
            return samples.to_vec();
        };

        self.pending.extend_from_slice(samples);
        let mut output = Vec::new();
        loop {
            let needed = resampler.input_frames_next();
            if self.pending.len() < needed {
                break;
            }
            let chunk: Vec<f32> = self.pending.drain(..needed).collect();
            match resampler.process(&[chunk], None) {
                Ok(mut resampled) => output.append(&mut resampled[0]),
                Err(e) => {
                    eprintln!("Resampling failed: {}", e);
                    break;
                }
            }
        }
        output
    }
}

#[async_trait]
impl MicCapture for CpalMicCapture {
    async fn open(&self) -> Result<(MicHandle, mpsc::Receiver<Vec<f32>>), CaptureError> {
        let enabled = Arc::new(AtomicBool::new(true));
        let stopped = Arc::new(AtomicBool::new(false));
        let handle = MicHandle::new(Arc::clone(&enabled), Arc::clone(&stopped));

        let (frame_tx, frame_rx) = mpsc::channel::<Vec<f32>>(32);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), CaptureError>>();

        // Device-rate samples shared between the cpal callback and the
        // drain loop below.
        let capture_buffer: Arc<StdMutex<Vec<f32>>> = Arc::new(StdMutex::new(Vec::new()));

        let thread_enabled = Arc::clone(&enabled);
        let thread_stopped = Arc::clone(&stopped);
        let thread_buffer = Arc::clone(&capture_buffer);

        std::thread::spawn(move || {
            let setup = (|| {
                let device = CpalMicCapture::get_input_device()?;
                let (config, sample_format) = CpalMicCapture::get_input_config(&device)?;
                Ok::<_, CaptureError>((device, config, sample_format))
            })();

            let (device, config, sample_format) = match setup {
                Ok(parts) => parts,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let sample_rate = config.sample_rate.0;
            let channels = config.channels;

            let cb_buffer = Arc::clone(&thread_buffer);
            let cb_enabled = Arc::clone(&thread_enabled);
            let cb_stopped = Arc::clone(&thread_stopped);

            let stream_result = match sample_format {
                SampleFormat::F32 => device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        // Muted or stopped: drop at the source, never queue.
                        if cb_stopped.load(Ordering::SeqCst) || !cb_enabled.load(Ordering::SeqCst) {
                            return;
                        }
                        let mono = CpalMicCapture::mix_to_mono(data, channels);
                        if let Ok(mut buffer) = cb_buffer.lock() {
                            buffer.extend_from_slice(&mono);
                        }
                    },
                    |err| eprintln!("Audio stream error: {}", err),
                    None,
                ),
                SampleFormat::I16 => device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        if cb_stopped.load(Ordering::SeqCst) || !cb_enabled.load(Ordering::SeqCst) {
                            return;
                        }
                        let as_f32: Vec<f32> =
                            data.iter().map(|&s| s as f32 / 32768.0).collect();
                        let mono = CpalMicCapture::mix_to_mono(&as_f32, channels);
                        if let Ok(mut buffer) = cb_buffer.lock() {
                            buffer.extend_from_slice(&mono);
                        }
                    },
                    |err| eprintln!("Audio stream error: {}", err),
                    None,
                ),
                _ => {
                    let _ = ready_tx.send(Err(CaptureError::StartFailed(
                        "Unsupported sample format".into(),
                    )));
                    return;
                }
            };

            let stream = match stream_result {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(CaptureError::PermissionDenied(e.to_string())));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(CaptureError::StartFailed(e.to_string())));
                return;
            }

            let mut resampler = match StreamResampler::new(sample_rate) {
                Ok(resampler) => resampler,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let _ = ready_tx.send(Ok(()));

            // Drain loop: device rate in, fixed 16kHz frames out.
            let mut frame_accumulator: Vec<f32> = Vec::with_capacity(FRAME_SAMPLES * 2);
            while !thread_stopped.load(Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(DRAIN_INTERVAL_MS));

                let raw = {
                    let mut buffer = thread_buffer.lock().unwrap();
                    std::mem::take(&mut *buffer)
                };
                if raw.is_empty() {
                    continue;
                }

                frame_accumulator.extend(resampler.process(&raw));
                while frame_accumulator.len() >= FRAME_SAMPLES {
                    let frame: Vec<f32> = frame_accumulator.drain(..FRAME_SAMPLES).collect();
                    if frame_tx.blocking_send(frame).is_err() {
                        // Receiver gone: the session was torn down.
                        thread_stopped.store(true, Ordering::SeqCst);
                        break;
                    }
                }
            }

            drop(stream);
        });

        match ready_rx.await {
            Ok(Ok(())) => Ok((handle, frame_rx)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CaptureError::StartFailed(
                "Capture thread ended unexpectedly".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_to_mono_single_channel() {
        let mono = vec![0.1f32, 0.2, 0.3];
        assert_eq!(CpalMicCapture::mix_to_mono(&mono, 1), mono);
    }

    #[test]
    fn mix_to_mono_two_channels() {
        let stereo = vec![0.2f32, 0.4, -0.2, -0.4];
        let mixed = CpalMicCapture::mix_to_mono(&stereo, 2);
        assert_eq!(mixed.len(), 2);
        assert!((mixed[0] - 0.3).abs() < 1e-6);
        assert!((mixed[1] + 0.3).abs() < 1e-6);
    }

    #[test]
    fn passthrough_resampler_at_target_rate() {
        let mut resampler = StreamResampler::new(INPUT_SAMPLE_RATE).unwrap();
        let input = vec![0.5f32; 640];
        assert_eq!(resampler.process(&input), input);
    }

    #[test]
    fn resampler_halves_sample_count_from_32k() {
        let mut resampler = StreamResampler::new(32_000).unwrap();
        let input = vec![0.0f32; RESAMPLE_CHUNK * 4];
        let output = resampler.process(&input);
        // 32k -> 16k is a 2:1 ratio; allow for block-boundary slack.
        assert!(output.len() >= RESAMPLE_CHUNK && output.len() <= input.len() / 2 + RESAMPLE_CHUNK);
    }

    #[tokio::test]
    #[ignore = "Requires audio hardware"]
    async fn open_emits_frames() {
        let capture = CpalMicCapture::new();
        let (handle, mut rx) = capture.open().await.unwrap();
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.len(), FRAME_SAMPLES);
        handle.stop();
    }
}
