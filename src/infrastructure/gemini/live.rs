//! Gemini Live realtime session adapter
//!
//! Speaks the BidiGenerateContent WebSocket protocol: a setup message
//! selecting audio-only responses and a voice, then base64 media chunks
//! in both directions. A writer task drains an outbound queue and a
//! reader task pushes parsed server events, so the session object stays
//! cheap to share across the orchestrator's capture loops.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::application::ports::{LiveConfig, LiveConnector, LiveError, LiveSession, SendError};
use crate::domain::audio::pcm;
use crate::domain::live::{RealtimeFrame, ServerEvent};

/// Realtime endpoint for the Gemini Live API
const LIVE_ENDPOINT: &str =
    "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// MIME type for outbound video snapshots
const VIDEO_MIME_TYPE: &str = "image/jpeg";

/// How long to wait for the server's setup acknowledgement
const SETUP_TIMEOUT_SECS: u64 = 10;

// Client-to-server wire types

#[derive(Debug, Serialize)]
struct SetupMessage {
    setup: Setup,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Setup {
    model: String,
    generation_config: SetupGenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SetupGenerationConfig {
    response_modalities: Vec<String>,
    speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeInputMessage {
    realtime_input: RealtimeInput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeInput {
    media_chunks: Vec<MediaChunk>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MediaChunk {
    mime_type: String,
    data: String,
}

// Server-to-client wire types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerMessage {
    setup_complete: Option<serde_json::Value>,
    server_content: Option<ServerContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerContent {
    model_turn: Option<ModelTurn>,
    interrupted: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ModelTurn {
    parts: Option<Vec<InboundPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboundPart {
    inline_data: Option<InboundInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboundInlineData {
    mime_type: Option<String>,
    data: Option<String>,
}

/// Build the session setup message
fn build_setup(config: &LiveConfig) -> SetupMessage {
    let model = if config.model.starts_with("models/") {
        config.model.clone()
    } else {
        format!("models/{}", config.model)
    };
    SetupMessage {
        setup: Setup {
            model,
            generation_config: SetupGenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: config.voice.clone(),
                        },
                    },
                },
            },
            system_instruction: SystemInstruction {
                parts: vec![TextPart {
                    text: config.system_instruction.clone(),
                }],
            },
        },
    }
}

/// Wrap one frame as a realtime-input message
fn build_realtime_input(frame: &RealtimeFrame) -> RealtimeInputMessage {
    let (mime_type, data) = match frame {
        RealtimeFrame::Audio(bytes) => (pcm::INPUT_MIME_TYPE.to_string(), pcm::to_base64(bytes)),
        RealtimeFrame::Video(bytes) => (VIDEO_MIME_TYPE.to_string(), pcm::to_base64(bytes)),
    };
    RealtimeInputMessage {
        realtime_input: RealtimeInput {
            media_chunks: vec![MediaChunk { mime_type, data }],
        },
    }
}

/// Parse one server message into orchestrator events
fn parse_server_message(text: &str) -> Vec<ServerEvent> {
    let Ok(message) = serde_json::from_str::<ServerMessage>(text) else {
        return Vec::new();
    };
    let Some(content) = message.server_content else {
        return Vec::new();
    };

    let mut events = Vec::new();
    if content.interrupted == Some(true) {
        events.push(ServerEvent::Interrupted);
    }
    if let Some(parts) = content.model_turn.and_then(|turn| turn.parts) {
        for part in parts {
            let Some(inline) = part.inline_data else {
                continue;
            };
            let is_audio = inline
                .mime_type
                .as_deref()
                .is_some_and(|mime| mime.starts_with("audio/pcm"));
            if !is_audio {
                continue;
            }
            if let Some(bytes) = inline.data.as_deref().and_then(|d| pcm::from_base64(d).ok()) {
                events.push(ServerEvent::Audio(bytes));
            }
        }
    }
    events
}

/// Outbound queue entries for the writer task
enum Outbound {
    Frame(RealtimeFrame),
    Close,
}

/// Handle to an open Gemini Live session
struct GeminiLiveSession {
    out_tx: mpsc::Sender<Outbound>,
}

impl LiveSession for GeminiLiveSession {
    fn send(&self, frame: RealtimeFrame) -> Result<(), SendError> {
        self.out_tx
            .try_send(Outbound::Frame(frame))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Closed(_) => SendError::Closed,
                mpsc::error::TrySendError::Full(_) => {
                    SendError::Failed("outbound queue full".to_string())
                }
            })
    }

    fn close(&self) {
        let _ = self.out_tx.try_send(Outbound::Close);
    }
}

/// Dials the Gemini Live endpoint
pub struct GeminiLiveConnector {
    api_key: String,
    endpoint: String,
}

impl GeminiLiveConnector {
    /// Create a connector with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: LIVE_ENDPOINT.to_string(),
        }
    }

    /// Create a connector against a custom endpoint (tests)
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl LiveConnector for GeminiLiveConnector {
    async fn connect(
        &self,
        config: LiveConfig,
    ) -> Result<(Box<dyn LiveSession>, mpsc::Receiver<ServerEvent>), LiveError> {
        if self.api_key.is_empty() {
            return Err(LiveError::MissingApiKey);
        }

        let url = format!("{}?key={}", self.endpoint, self.api_key);
        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| LiveError::ConnectFailed(e.to_string()))?;
        let (mut ws_tx, mut ws_rx) = stream.split();

        let setup = serde_json::to_string(&build_setup(&config))
            .map_err(|e| LiveError::ConnectFailed(e.to_string()))?;
        ws_tx
            .send(Message::Text(setup))
            .await
            .map_err(|e| LiveError::ConnectFailed(e.to_string()))?;

        // The session is open once the server acknowledges the setup.
        let ack = timeout(Duration::from_secs(SETUP_TIMEOUT_SECS), async {
            while let Some(message) = ws_rx.next().await {
                let message = message.map_err(|e| LiveError::ConnectFailed(e.to_string()))?;
                let text = match message {
                    Message::Text(text) => text,
                    Message::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Message::Close(_) => {
                        return Err(LiveError::ConnectFailed(
                            "connection closed during setup".to_string(),
                        ))
                    }
                    _ => continue,
                };
                if let Ok(message) = serde_json::from_str::<ServerMessage>(&text) {
                    if message.setup_complete.is_some() {
                        return Ok(());
                    }
                }
            }
            Err(LiveError::ConnectFailed(
                "connection ended during setup".to_string(),
            ))
        })
        .await
        .map_err(|_| LiveError::ConnectFailed("timed out waiting for setup".to_string()))?;
        ack?;

        let (out_tx, mut out_rx) = mpsc::channel::<Outbound>(64);
        let (event_tx, event_rx) = mpsc::channel::<ServerEvent>(64);

        // Writer: drain the outbound queue into the socket.
        tokio::spawn(async move {
            while let Some(outbound) = out_rx.recv().await {
                match outbound {
                    Outbound::Frame(frame) => {
                        let Ok(payload) = serde_json::to_string(&build_realtime_input(&frame))
                        else {
                            continue;
                        };
                        if ws_tx.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Outbound::Close => {
                        let _ = ws_tx.close().await;
                        break;
                    }
                }
            }
        });

        // Reader: push parsed server events until the socket ends.
        tokio::spawn(async move {
            while let Some(message) = ws_rx.next().await {
                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        let _ = event_tx.send(ServerEvent::Error(e.to_string())).await;
                        return;
                    }
                };
                let text = match message {
                    Message::Text(text) => text,
                    Message::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Message::Close(_) => break,
                    _ => continue,
                };
                for event in parse_server_message(&text) {
                    if event_tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
            let _ = event_tx.send(ServerEvent::Closed).await;
        });

        Ok((Box::new(GeminiLiveSession { out_tx }), event_rx))
    }
}
