//! Turn-based chat orchestrator
//!
//! Single-shot request/response exchange, independent of the live
//! session. The transcript is updated optimistically: the user's
//! message lands before the round-trip completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::domain::audio::AudioData;
use crate::domain::chat::{ChatMessage, ModelTier, Transcript};

use super::ports::{ChatModel, ChatModelError, GenerateRequest, RequestPart};

/// Literal reply appended when a request fails
pub const REPLY_FAILURE_PLACEHOLDER: &str = "Sorry, something went wrong. Please try again.";

/// Fixed instruction for one-shot transcription requests
pub const TRANSCRIBE_INSTRUCTION: &str =
    "Transcribe this audio exactly as spoken. Output only the transcript text, with no commentary.";

/// Orchestrates the turn-based chat transcript
pub struct ChatOrchestrator<M: ChatModel> {
    model: M,
    transcript: Mutex<Transcript>,
    loading: AtomicBool,
}

impl<M: ChatModel> ChatOrchestrator<M> {
    /// Create an orchestrator with an empty transcript
    pub fn new(model: M) -> Self {
        Self {
            model,
            transcript: Mutex::new(Transcript::new()),
            loading: AtomicBool::new(false),
        }
    }

    /// Send one user message and append the model's reply.
    ///
    /// The user message is appended before the request is issued. On
    /// failure a literal placeholder is appended instead of an error.
    /// Concurrent calls are not coalesced: each call independently sets
    /// and clears the shared loading flag, so overlapping calls can race
    /// on it. That raciness is a documented limitation, not a contract.
    pub async fn send_message(&self, text: &str, tier: ModelTier) {
        {
            let mut transcript = self.transcript.lock().unwrap();
            transcript.push(ChatMessage::user(text));
        }
        self.loading.store(true, Ordering::SeqCst);

        let mut request = GenerateRequest::text(tier.model_id(), text)
            .with_thinking_budget(tier.thinking_budget());
        request.max_output_tokens = tier.max_output_tokens();

        let reply = match self.model.generate(request).await {
            Ok(reply) => reply,
            Err(_) => REPLY_FAILURE_PLACEHOLDER.to_string(),
        };

        {
            let mut transcript = self.transcript.lock().unwrap();
            transcript.push(ChatMessage::model(reply, tier.is_thinking()));
        }
        self.loading.store(false, Ordering::SeqCst);
    }

    /// One-shot transcription of an audio attachment.
    ///
    /// Returns the transcript text or propagates the failure. Nothing is
    /// appended to the chat transcript; placement is the caller's call.
    pub async fn transcribe_audio(&self, audio: &AudioData) -> Result<String, ChatModelError> {
        let request = GenerateRequest {
            model: ModelTier::Flash.model_id().to_string(),
            parts: vec![RequestPart::Audio(audio.clone())],
            system_instruction: Some(TRANSCRIBE_INSTRUCTION.to_string()),
            thinking_budget: Some(0),
            max_output_tokens: None,
        };
        self.model.generate(request).await
    }

    /// Reset the transcript to empty
    pub fn clear_messages(&self) {
        self.transcript.lock().unwrap().clear();
    }

    /// Snapshot of the transcript in append order
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.transcript.lock().unwrap().messages().to_vec()
    }

    /// Whether a send is in flight
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }
}
