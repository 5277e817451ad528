//! Speech playback port interface

use tokio::sync::mpsc;

use crate::domain::audio::PcmChunk;

/// Identifier of one scheduled playback source
pub type SourceId = u64;

/// Port for scheduled audio output.
///
/// The scheduling policy (back-to-back queueing, barge-in discard) is
/// owned by the live orchestrator; implementations only honor start
/// times on a monotonic clock and report natural completions.
pub trait SpeechPlayer: Send + Sync {
    /// Seconds elapsed on this player's monotonic playback clock
    fn now(&self) -> f64;

    /// Schedule a chunk to start at `at` seconds on the playback clock
    /// and return its source id. `at` values in the past mean "as soon
    /// as possible".
    fn start(&self, chunk: PcmChunk, at: f64) -> SourceId;

    /// Stop every scheduled and playing source immediately. Stopped
    /// sources do not report completion.
    fn stop_all(&self);

    /// Subscribe to natural-completion notifications. A new call
    /// replaces the previous subscription; the orchestrator subscribes
    /// once per session.
    fn completions(&self) -> mpsc::UnboundedReceiver<SourceId>;
}
