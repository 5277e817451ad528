//! Rodio-based speech player
//!
//! Plays scheduled PCM chunks on a dedicated audio thread. The rodio
//! sink is an append-order queue, which matches the orchestrator's
//! back-to-back scheduling: chunks appended in cursor order play
//! gaplessly. The thread owns the output stream because it is not Send.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Instant;

use rodio::buffer::SamplesBuffer;
use rodio::source::{EmptyCallback, Source, Zero};
use rodio::{OutputStream, Sink};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::application::ports::{SourceId, SpeechPlayer};
use crate::domain::audio::PcmChunk;

/// Playback initialization errors
#[derive(Debug, Clone, Error)]
pub enum PlaybackInitError {
    #[error("No audio output device available: {0}")]
    NoOutputDevice(String),
}

enum PlayerCmd {
    Start {
        id: SourceId,
        chunk: PcmChunk,
        at: f64,
    },
    StopAll,
}

/// Speech player over a dedicated rodio thread
pub struct RodioSpeechPlayer {
    cmd_tx: mpsc::UnboundedSender<PlayerCmd>,
    completion_tx: Arc<StdMutex<Option<mpsc::UnboundedSender<SourceId>>>>,
    epoch: Instant,
    next_id: AtomicU64,
}

impl RodioSpeechPlayer {
    /// Spawn the audio thread and open the default output device
    pub fn new() -> Result<Self, PlaybackInitError> {
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<PlayerCmd>();
        let completion_tx: Arc<StdMutex<Option<mpsc::UnboundedSender<SourceId>>>> =
            Arc::new(StdMutex::new(None));
        let thread_completions = Arc::clone(&completion_tx);

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), PlaybackInitError>>();
        let epoch = Instant::now();

        std::thread::spawn(move || {
            let (_stream, stream_handle) = match OutputStream::try_default() {
                Ok(parts) => parts,
                Err(e) => {
                    let _ = ready_tx.send(Err(PlaybackInitError::NoOutputDevice(e.to_string())));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));

            let mut sink: Option<Sink> = None;
            while let Some(cmd) = cmd_rx.blocking_recv() {
                match cmd {
                    PlayerCmd::Start { id, chunk, at } => {
                        if sink.is_none() {
                            match Sink::try_new(&stream_handle) {
                                Ok(new_sink) => sink = Some(new_sink),
                                Err(e) => {
                                    eprintln!("Audio sink error: {}", e);
                                    continue;
                                }
                            }
                        }
                        let Some(active) = sink.as_ref() else { continue };

                        // Lead-in silence when the queue is idle and the
                        // start time is still in the future.
                        let now = epoch.elapsed().as_secs_f64();
                        if active.empty() && at > now {
                            let lead = Zero::<f32>::new(1, chunk.sample_rate()).take_duration(
                                std::time::Duration::from_secs_f64(at - now),
                            );
                            active.append(lead);
                        }

                        let rate = chunk.sample_rate();
                        active.append(SamplesBuffer::new(1, rate, chunk.into_samples()));

                        let completions = Arc::clone(&thread_completions);
                        active.append(EmptyCallback::<f32>::new(Box::new(move || {
                            if let Some(tx) = completions.lock().unwrap().as_ref() {
                                let _ = tx.send(id);
                            }
                        })));
                    }
                    PlayerCmd::StopAll => {
                        // Dropping the sink discards everything queued;
                        // stopped sources never report completion.
                        if let Some(sink) = sink.take() {
                            sink.stop();
                        }
                    }
                }
            }
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                cmd_tx,
                completion_tx,
                epoch,
                next_id: AtomicU64::new(1),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PlaybackInitError::NoOutputDevice(
                "playback thread ended unexpectedly".into(),
            )),
        }
    }
}

impl SpeechPlayer for RodioSpeechPlayer {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn start(&self, chunk: PcmChunk, at: f64) -> SourceId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let _ = self.cmd_tx.send(PlayerCmd::Start { id, chunk, at });
        id
    }

    fn stop_all(&self) {
        let _ = self.cmd_tx.send(PlayerCmd::StopAll);
    }

    fn completions(&self) -> mpsc::UnboundedReceiver<SourceId> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.completion_tx.lock().unwrap() = Some(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Playback tests require audio hardware and are ignored by default.

    #[tokio::test]
    #[ignore = "Requires audio hardware"]
    async fn plays_and_reports_completion() {
        let player = RodioSpeechPlayer::new().unwrap();
        let mut completions = player.completions();

        let chunk = PcmChunk::new(vec![0.0; 2400], 24_000); // 100ms of silence
        let id = player.start(chunk, 0.0);

        let done = completions.recv().await.unwrap();
        assert_eq!(done, id);
    }

    #[tokio::test]
    #[ignore = "Requires audio hardware"]
    async fn stop_all_suppresses_completions() {
        let player = RodioSpeechPlayer::new().unwrap();
        let mut completions = player.completions();

        player.start(PcmChunk::new(vec![0.0; 24_000], 24_000), 0.0);
        player.stop_all();

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(completions.try_recv().is_err());
    }
}
