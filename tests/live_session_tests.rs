//! Live session orchestrator integration tests
//!
//! Exercises the session state machine against scripted ports: gapless
//! playback scheduling, barge-in discard, teardown idempotence, mic
//! gating, and video-start supersede semantics.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use vivavoce::application::ports::{
    CaptureError, FrameSource, LiveConfig, LiveConnector, LiveError, LiveSession, MicCapture,
    MicHandle, SendError, SourceId, SpeechPlayer, VideoDevice,
};
use vivavoce::application::LiveSessionOrchestrator;
use vivavoce::domain::audio::{pcm, PcmChunk};
use vivavoce::domain::live::{InputSource, LiveStatus, RealtimeFrame, ServerEvent};

/// Bytes of PCM16@24k representing `secs` seconds of audio
fn audio_bytes(secs: f64) -> Vec<u8> {
    let samples = (secs * 24_000.0).round() as usize;
    vec![0u8; samples * 2]
}

// --- scripted session / connector ---

#[derive(Default)]
struct SessionInner {
    frames: Mutex<Vec<RealtimeFrame>>,
    closed: AtomicBool,
}

impl SessionInner {
    fn audio_frames(&self) -> usize {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .filter(|f| matches!(f, RealtimeFrame::Audio(_)))
            .count()
    }

    fn video_payloads(&self) -> Vec<Vec<u8>> {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .filter_map(|f| match f {
                RealtimeFrame::Video(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }
}

struct ScriptedSession {
    inner: Arc<SessionInner>,
}

impl LiveSession for ScriptedSession {
    fn send(&self, frame: RealtimeFrame) -> Result<(), SendError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(SendError::Closed);
        }
        self.inner.frames.lock().unwrap().push(frame);
        Ok(())
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct ScriptedConnector {
    session: Arc<SessionInner>,
    event_tx: Mutex<Option<mpsc::Sender<ServerEvent>>>,
}

impl ScriptedConnector {
    async fn push(&self, event: ServerEvent) {
        let tx = self.event_tx.lock().unwrap().clone().unwrap();
        tx.send(event).await.unwrap();
    }
}

#[async_trait]
impl LiveConnector for ScriptedConnector {
    async fn connect(
        &self,
        _config: LiveConfig,
    ) -> Result<(Box<dyn LiveSession>, mpsc::Receiver<ServerEvent>), LiveError> {
        let (tx, rx) = mpsc::channel(32);
        *self.event_tx.lock().unwrap() = Some(tx);
        Ok((
            Box::new(ScriptedSession {
                inner: Arc::clone(&self.session),
            }),
            rx,
        ))
    }
}

// --- scripted mic ---

#[derive(Default)]
struct ScriptedMic {
    frame_tx: Mutex<Option<mpsc::Sender<Vec<f32>>>>,
    handle: Mutex<Option<MicHandle>>,
}

impl ScriptedMic {
    async fn push_frame(&self, frame: Vec<f32>) {
        let tx = self.frame_tx.lock().unwrap().clone().unwrap();
        tx.send(frame).await.unwrap();
    }

    fn handle(&self) -> MicHandle {
        self.handle.lock().unwrap().clone().unwrap()
    }
}

#[async_trait]
impl MicCapture for ScriptedMic {
    async fn open(&self) -> Result<(MicHandle, mpsc::Receiver<Vec<f32>>), CaptureError> {
        let (tx, rx) = mpsc::channel(32);
        let handle = MicHandle::new(
            Arc::new(AtomicBool::new(true)),
            Arc::new(AtomicBool::new(false)),
        );
        *self.frame_tx.lock().unwrap() = Some(tx);
        *self.handle.lock().unwrap() = Some(handle.clone());
        Ok((handle, rx))
    }
}

struct DeniedMic;

#[async_trait]
impl MicCapture for DeniedMic {
    async fn open(&self) -> Result<(MicHandle, mpsc::Receiver<Vec<f32>>), CaptureError> {
        Err(CaptureError::PermissionDenied("denied".into()))
    }
}

// --- scripted player ---

#[derive(Default)]
struct ScriptedPlayer {
    clock: Mutex<f64>,
    starts: Mutex<Vec<(SourceId, f64, f64)>>,
    stop_all_calls: AtomicU64,
    next_id: AtomicU64,
    completion_tx: Mutex<Option<mpsc::UnboundedSender<SourceId>>>,
}

impl ScriptedPlayer {
    fn complete(&self, id: SourceId) {
        if let Some(tx) = self.completion_tx.lock().unwrap().as_ref() {
            let _ = tx.send(id);
        }
    }

    fn scheduled(&self) -> Vec<(SourceId, f64, f64)> {
        self.starts.lock().unwrap().clone()
    }
}

impl SpeechPlayer for ScriptedPlayer {
    fn now(&self) -> f64 {
        *self.clock.lock().unwrap()
    }

    fn start(&self, chunk: PcmChunk, at: f64) -> SourceId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.starts
            .lock()
            .unwrap()
            .push((id, at, chunk.duration_secs()));
        id
    }

    fn stop_all(&self) {
        self.stop_all_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn completions(&self) -> mpsc::UnboundedReceiver<SourceId> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.completion_tx.lock().unwrap() = Some(tx);
        rx
    }
}

// --- scripted video ---

struct ScriptedFrameSource {
    tag: u8,
    stopped: Arc<AtomicBool>,
}

impl FrameSource for ScriptedFrameSource {
    fn snapshot(&mut self) -> Option<Vec<u8>> {
        if self.stopped.load(Ordering::SeqCst) {
            return None;
        }
        Some(vec![self.tag])
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Device that hands out tagged sources, optionally holding an open
/// call until the test releases it.
#[derive(Default)]
struct ScriptedVideoDevice {
    next_tag: AtomicU64,
    holds: Mutex<Vec<Arc<tokio::sync::Notify>>>,
    stopped_flags: Mutex<Vec<(u8, Arc<AtomicBool>)>>,
}

impl ScriptedVideoDevice {
    /// Queue a hold: the next open() call waits until the returned
    /// notify is signalled.
    fn hold_next_open(&self) -> Arc<tokio::sync::Notify> {
        let notify = Arc::new(tokio::sync::Notify::new());
        self.holds.lock().unwrap().push(Arc::clone(&notify));
        notify
    }

    fn source_stopped(&self, tag: u8) -> bool {
        self.stopped_flags
            .lock()
            .unwrap()
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, flag)| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}

#[async_trait]
impl VideoDevice for ScriptedVideoDevice {
    async fn open(&self, _source: InputSource) -> Result<Box<dyn FrameSource>, CaptureError> {
        let hold = self.holds.lock().unwrap().pop();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        let tag = (self.next_tag.fetch_add(1, Ordering::SeqCst) + 1) as u8;
        let stopped = Arc::new(AtomicBool::new(false));
        self.stopped_flags
            .lock()
            .unwrap()
            .push((tag, Arc::clone(&stopped)));
        Ok(Box::new(ScriptedFrameSource { tag, stopped }))
    }
}

// --- harness ---

struct Harness {
    orchestrator: LiveSessionOrchestrator,
    connector: Arc<ScriptedConnector>,
    mic: Arc<ScriptedMic>,
    player: Arc<ScriptedPlayer>,
    video: Arc<ScriptedVideoDevice>,
}

impl Harness {
    fn new() -> Self {
        let connector = Arc::new(ScriptedConnector::default());
        let mic = Arc::new(ScriptedMic::default());
        let player = Arc::new(ScriptedPlayer::default());
        let video = Arc::new(ScriptedVideoDevice::default());
        let orchestrator = LiveSessionOrchestrator::new(
            Arc::clone(&connector) as _,
            Arc::clone(&mic) as _,
            Arc::clone(&video) as _,
            Arc::clone(&player) as _,
        );
        Self {
            orchestrator,
            connector,
            mic,
            player,
            video,
        }
    }

    async fn connect(&mut self) {
        self.orchestrator
            .connect("test-model", Some("test instruction"))
            .await
            .unwrap();
    }

    /// Let the pump and forward tasks drain
    async fn settle(&self) {
        sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn playback_is_scheduled_back_to_back() {
    let mut h = Harness::new();
    h.connect().await;

    // Three buffers arriving faster than real time.
    for _ in 0..3 {
        h.connector.push(ServerEvent::Audio(audio_bytes(0.1))).await;
    }
    h.settle().await;

    let starts = h.player.scheduled();
    assert_eq!(starts.len(), 3);
    for window in starts.windows(2) {
        let (_, at_a, dur_a) = window[0];
        let (_, at_b, _) = window[1];
        // Non-decreasing, and no overlap with the previous buffer.
        assert!(at_b >= at_a);
        assert!(at_b >= at_a + dur_a - 1e-9);
        // Back-to-back: no gap either.
        assert!((at_b - (at_a + dur_a)).abs() < 1e-9);
    }
    assert_eq!(h.orchestrator.current_status(), LiveStatus::Speaking);
}

#[tokio::test(start_paused = true)]
async fn drained_playback_reports_listening() {
    let mut h = Harness::new();
    h.connect().await;

    h.connector.push(ServerEvent::Audio(audio_bytes(0.1))).await;
    h.connector.push(ServerEvent::Audio(audio_bytes(0.1))).await;
    h.settle().await;
    assert_eq!(h.orchestrator.current_status(), LiveStatus::Speaking);

    let ids: Vec<SourceId> = h.player.scheduled().iter().map(|(id, _, _)| *id).collect();
    h.player.complete(ids[0]);
    h.settle().await;
    // One buffer still queued.
    assert_eq!(h.orchestrator.current_status(), LiveStatus::Speaking);

    h.player.complete(ids[1]);
    h.settle().await;
    assert_eq!(h.orchestrator.current_status(), LiveStatus::Listening);
}

#[tokio::test(start_paused = true)]
async fn interruption_discards_queued_speech_and_resets_cursor() {
    let mut h = Harness::new();
    h.connect().await;

    h.connector.push(ServerEvent::Audio(audio_bytes(0.5))).await;
    h.connector.push(ServerEvent::Audio(audio_bytes(0.5))).await;
    h.settle().await;

    h.connector.push(ServerEvent::Interrupted).await;
    h.settle().await;

    assert_eq!(h.player.stop_all_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.orchestrator.current_status(), LiveStatus::Listening);

    // The next buffer starts from the playback clock, not from the old
    // cursor position (which had advanced to 1.0s).
    h.connector.push(ServerEvent::Audio(audio_bytes(0.1))).await;
    h.settle().await;

    let starts = h.player.scheduled();
    let (_, at, _) = starts[2];
    assert!(at.abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn mic_frames_are_forwarded_as_pcm16() {
    let mut h = Harness::new();
    h.connect().await;

    h.mic.push_frame(vec![0.5f32; 160]).await;
    h.settle().await;

    let frames = h.connector.session.frames.lock().unwrap().clone();
    assert_eq!(frames.len(), 1);
    match &frames[0] {
        RealtimeFrame::Audio(bytes) => {
            assert_eq!(bytes.len(), 320);
            let decoded = pcm::decode_pcm16(bytes);
            assert!((decoded[0] - 0.5).abs() < 0.001);
        }
        other => panic!("expected audio frame, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn muted_frames_are_dropped_not_queued() {
    let mut h = Harness::new();
    h.connect().await;

    assert!(!h.orchestrator.toggle_mic());
    h.mic.push_frame(vec![0.1f32; 160]).await;
    h.mic.push_frame(vec![0.2f32; 160]).await;
    h.settle().await;
    assert_eq!(h.connector.session.audio_frames(), 0);

    // Unmuting only affects frames from now on.
    assert!(h.orchestrator.toggle_mic());
    h.mic.push_frame(vec![0.3f32; 160]).await;
    h.settle().await;
    assert_eq!(h.connector.session.audio_frames(), 1);
}

#[tokio::test(start_paused = true)]
async fn toggle_mic_twice_restores_state_and_connection() {
    let mut h = Harness::new();
    h.connect().await;

    assert!(!h.orchestrator.toggle_mic());
    assert!(h.orchestrator.toggle_mic());
    assert!(h.orchestrator.is_mic_enabled());
    assert!(h.orchestrator.is_connected());
    assert!(h.mic.handle().is_enabled());
    assert_eq!(h.orchestrator.current_status(), LiveStatus::Listening);
}

#[tokio::test(start_paused = true)]
async fn disconnect_is_idempotent_and_releases_resources() {
    let mut h = Harness::new();
    h.connect().await;

    h.orchestrator.disconnect();
    assert!(!h.orchestrator.is_connected());
    assert_eq!(h.orchestrator.current_status(), LiveStatus::Inactive);
    assert!(h.mic.handle().is_stopped());
    assert!(h.connector.session.closed.load(Ordering::SeqCst));
    assert_eq!(h.player.stop_all_calls.load(Ordering::SeqCst), 1);

    // Second call no-ops past already-released resources.
    h.orchestrator.disconnect();
    assert_eq!(h.orchestrator.current_status(), LiveStatus::Inactive);
}

#[tokio::test(start_paused = true)]
async fn reconnect_tears_down_previous_session_first() {
    let mut h = Harness::new();
    h.connect().await;
    let first_handle = h.mic.handle();

    h.connect().await;
    assert!(first_handle.is_stopped());
    assert!(h.orchestrator.is_connected());
    assert_eq!(h.orchestrator.current_status(), LiveStatus::Listening);
}

#[tokio::test(start_paused = true)]
async fn permission_denial_aborts_connect_without_retry() {
    let connector = Arc::new(ScriptedConnector::default());
    let player = Arc::new(ScriptedPlayer::default());
    let video = Arc::new(ScriptedVideoDevice::default());
    let mut orchestrator = LiveSessionOrchestrator::new(
        connector as _,
        Arc::new(DeniedMic) as _,
        video as _,
        player as _,
    );

    let result = orchestrator.connect("test-model", None).await;
    assert!(matches!(result.err(), Some(LiveError::Capture(_))));
    assert_eq!(orchestrator.current_status(), LiveStatus::Inactive);
    assert!(!orchestrator.is_connected());
}

#[tokio::test(start_paused = true)]
async fn session_error_reports_and_tears_down() {
    let mut h = Harness::new();

    let reported: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reported);
    h.orchestrator
        .set_error_hook(Arc::new(move |message| sink.lock().unwrap().push(message)));

    h.connect().await;
    h.connector
        .push(ServerEvent::Error("backend fell over".into()))
        .await;
    h.settle().await;

    assert_eq!(h.orchestrator.current_status(), LiveStatus::Inactive);
    assert_eq!(
        reported.lock().unwrap().clone(),
        vec!["backend fell over".to_string()]
    );
    assert!(h.mic.handle().is_stopped());
    assert!(h.connector.session.closed.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn server_close_resets_without_error() {
    let mut h = Harness::new();
    h.connect().await;

    h.connector.push(ServerEvent::Closed).await;
    h.settle().await;

    assert_eq!(h.orchestrator.current_status(), LiveStatus::Inactive);
}

#[tokio::test(start_paused = true)]
async fn video_snapshots_are_forwarded() {
    let mut h = Harness::new();
    h.connect().await;

    h.orchestrator.start_video_stream(InputSource::Camera);
    sleep(Duration::from_millis(1200)).await;

    let payloads = h.connector.session.video_payloads();
    assert!(!payloads.is_empty());
    assert!(payloads.iter().all(|p| p == &vec![1u8]));

    h.orchestrator.stop_video_stream();
    assert!(h.video.source_stopped(1));
}

#[tokio::test(start_paused = true)]
async fn superseded_video_start_stops_its_own_stream() {
    let mut h = Harness::new();
    h.connect().await;

    // First request's device acquisition stalls; a second request
    // lands and completes while the first is still pending.
    let hold = h.video.hold_next_open();
    h.orchestrator.start_video_stream(InputSource::Camera);
    sleep(Duration::from_millis(5)).await;

    h.orchestrator.start_video_stream(InputSource::Screen);
    sleep(Duration::from_millis(600)).await;

    // Now the stale acquisition resolves.
    hold.notify_one();
    sleep(Duration::from_millis(600)).await;

    // The stale source (tag 2: it resolved second) was stopped and
    // never forwarded a frame; only the winner's frames flow.
    let payloads = h.connector.session.video_payloads();
    assert!(!payloads.is_empty());
    assert!(payloads.iter().all(|p| p == &vec![1u8]));
    assert!(h.video.source_stopped(2));
    assert!(!h.video.source_stopped(1));
}

#[tokio::test(start_paused = true)]
async fn replacing_video_stream_stops_previous_source() {
    let mut h = Harness::new();
    h.connect().await;

    h.orchestrator.start_video_stream(InputSource::Camera);
    sleep(Duration::from_millis(600)).await;

    h.orchestrator.start_video_stream(InputSource::Screen);
    sleep(Duration::from_millis(600)).await;

    assert!(h.video.source_stopped(1));
    assert!(!h.video.source_stopped(2));

    let payloads = h.connector.session.video_payloads();
    assert!(payloads.contains(&vec![1u8]));
    assert!(payloads.contains(&vec![2u8]));
}
