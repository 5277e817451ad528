//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::chat::ModelTier;

/// Default realtime conversation model
pub const DEFAULT_LIVE_MODEL: &str = "gemini-2.5-flash-preview-native-audio-dialog";

/// Fixed synthesized voice for live sessions
pub const DEFAULT_VOICE: &str = "Orus";

/// Default system instruction for live sessions without a scenario
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are a friendly, knowledgeable voice assistant. Keep responses conversational and concise.";

/// Cloud-drive OAuth configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub live_model: Option<String>,
    pub voice: Option<String>,
    pub tier: Option<String>,
    pub drive: Option<DriveConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            api_key: None,
            live_model: Some(DEFAULT_LIVE_MODEL.to_string()),
            voice: Some(DEFAULT_VOICE.to_string()),
            tier: Some(ModelTier::default().to_string()),
            drive: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            api_key: other.api_key.or(self.api_key),
            live_model: other.live_model.or(self.live_model),
            voice: other.voice.or(self.voice),
            tier: other.tier.or(self.tier),
            drive: Self::merge_drive_config(self.drive, other.drive),
        }
    }

    /// Merge drive config sections
    fn merge_drive_config(
        base: Option<DriveConfig>,
        other: Option<DriveConfig>,
    ) -> Option<DriveConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(DriveConfig {
                client_id: o.client_id.or(b.client_id),
                client_secret: o.client_secret.or(b.client_secret),
                refresh_token: o.refresh_token.or(b.refresh_token),
            }),
        }
    }

    /// Get the live model, or the default if not set
    pub fn live_model_or_default(&self) -> &str {
        self.live_model.as_deref().unwrap_or(DEFAULT_LIVE_MODEL)
    }

    /// Get the synthesized voice, or the default if not set
    pub fn voice_or_default(&self) -> &str {
        self.voice.as_deref().unwrap_or(DEFAULT_VOICE)
    }

    /// Get the chat tier as parsed ModelTier, or default if not set/invalid
    pub fn tier_or_default(&self) -> ModelTier {
        self.tier
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}
