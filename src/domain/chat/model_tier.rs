//! Model tier selection

use std::fmt;
use std::str::FromStr;

use crate::domain::error::InvalidTierError;

/// Low-latency model identifier
const FLASH_MODEL: &str = "gemini-2.5-flash";

/// High-capability model identifier
const PRO_MODEL: &str = "gemini-2.5-pro";

/// Internal-reasoning token budget for the thinker tier
const THINKING_BUDGET: i32 = 32_768;

/// Reply length cap for the non-reasoning tiers
const MAX_REPLY_TOKENS: u32 = 4_096;

/// All available tiers
pub const ALL_TIERS: &[ModelTier] = &[ModelTier::Flash, ModelTier::Pro, ModelTier::Thinker];

/// Backend model tier for turn-based chat.
///
/// Maps one-to-one onto a backend model identifier plus generation
/// configuration. The identifiers and the reasoning budget are fixed
/// configuration values, not user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelTier {
    /// Fast replies, reasoning disabled
    #[default]
    Flash,
    /// High capability, reasoning disabled
    Pro,
    /// High capability with an extended internal-reasoning budget.
    /// Output-length capping is deliberately left unset for this tier.
    Thinker,
}

impl ModelTier {
    /// Backend model identifier for this tier
    pub const fn model_id(&self) -> &'static str {
        match self {
            Self::Flash => FLASH_MODEL,
            Self::Pro | Self::Thinker => PRO_MODEL,
        }
    }

    /// Internal-reasoning token budget. Zero disables reasoning.
    pub const fn thinking_budget(&self) -> i32 {
        match self {
            Self::Flash | Self::Pro => 0,
            Self::Thinker => THINKING_BUDGET,
        }
    }

    /// Reply length cap. The thinker tier deliberately leaves this
    /// unset so reasoning output is never truncated mid-thought.
    pub const fn max_output_tokens(&self) -> Option<u32> {
        match self {
            Self::Flash | Self::Pro => Some(MAX_REPLY_TOKENS),
            Self::Thinker => None,
        }
    }

    /// Whether replies from this tier are tagged as reasoning-produced
    pub const fn is_thinking(&self) -> bool {
        matches!(self, Self::Thinker)
    }

    /// Get the string identifier for this tier
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flash => "flash",
            Self::Pro => "pro",
            Self::Thinker => "thinker",
        }
    }
}

impl FromStr for ModelTier {
    type Err = InvalidTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flash" => Ok(Self::Flash),
            "pro" => Ok(Self::Pro),
            "thinker" => Ok(Self::Thinker),
            _ => Err(InvalidTierError {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_is_fast_model_without_reasoning() {
        assert_eq!(ModelTier::Flash.model_id(), "gemini-2.5-flash");
        assert_eq!(ModelTier::Flash.thinking_budget(), 0);
        assert!(!ModelTier::Flash.is_thinking());
    }

    #[test]
    fn pro_and_thinker_share_model() {
        assert_eq!(ModelTier::Pro.model_id(), ModelTier::Thinker.model_id());
    }

    #[test]
    fn thinker_has_reasoning_budget() {
        assert_eq!(ModelTier::Thinker.thinking_budget(), 32_768);
        assert!(ModelTier::Thinker.is_thinking());
    }

    #[test]
    fn thinker_has_no_output_cap() {
        assert!(ModelTier::Thinker.max_output_tokens().is_none());
        assert!(ModelTier::Flash.max_output_tokens().is_some());
        assert!(ModelTier::Pro.max_output_tokens().is_some());
    }

    #[test]
    fn parse_all_tiers() {
        assert_eq!("flash".parse::<ModelTier>().unwrap(), ModelTier::Flash);
        assert_eq!("pro".parse::<ModelTier>().unwrap(), ModelTier::Pro);
        assert_eq!("thinker".parse::<ModelTier>().unwrap(), ModelTier::Thinker);
    }

    #[test]
    fn parse_case_insensitive() {
        assert_eq!("Flash".parse::<ModelTier>().unwrap(), ModelTier::Flash);
        assert_eq!(" PRO ".parse::<ModelTier>().unwrap(), ModelTier::Pro);
    }

    #[test]
    fn parse_invalid() {
        assert!("turbo".parse::<ModelTier>().is_err());
        assert!("".parse::<ModelTier>().is_err());
    }

    #[test]
    fn default_is_flash() {
        assert_eq!(ModelTier::default(), ModelTier::Flash);
    }

    #[test]
    fn display() {
        assert_eq!(ModelTier::Thinker.to_string(), "thinker");
    }
}
