//! Scenario catalog
//!
//! Static, immutable configuration data describing the conversation
//! presets the CLI offers. Never mutated at runtime.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::InvalidScenarioError;

/// Video input source for a live session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputSource {
    /// Voice only, no video
    #[default]
    None,
    /// Forward camera snapshots
    Camera,
    /// Forward screen snapshots
    Screen,
}

impl InputSource {
    /// Get the string identifier
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Camera => "camera",
            Self::Screen => "screen",
        }
    }
}

impl FromStr for InputSource {
    type Err = InvalidScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "camera" => Ok(Self::Camera),
            "screen" => Ok(Self::Screen),
            _ => Err(InvalidScenarioError {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub input: InputSource,
    pub icon: &'static str,
    pub system_instruction: &'static str,
}

/// The fixed scenario catalog
pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        id: "free-chat",
        title: "Open Conversation",
        description: "Talk about anything, hands-free.",
        input: InputSource::None,
        icon: "💬",
        system_instruction:
            "You are a friendly, knowledgeable voice assistant. Keep responses conversational and concise.",
    },
    Scenario {
        id: "screen-coach",
        title: "Screen Assistant",
        description: "Share your screen and get step-by-step help with what's on it.",
        input: InputSource::Screen,
        icon: "🖥️",
        system_instruction:
            "You can see the user's screen. Help them with whatever they are working on. Refer to visible elements concretely and keep guidance short.",
    },
    Scenario {
        id: "show-and-tell",
        title: "Show & Tell",
        description: "Point the camera at something and talk it over.",
        input: InputSource::Camera,
        icon: "📷",
        system_instruction:
            "You can see through the user's camera. Describe and discuss what they show you. Be curious and specific.",
    },
    Scenario {
        id: "language-practice",
        title: "Language Practice",
        description: "Practice speaking a foreign language with gentle corrections.",
        input: InputSource::None,
        icon: "🗣️",
        system_instruction:
            "You are a patient language tutor. Converse in the language the user speaks to you, correct mistakes briefly, and keep the conversation flowing.",
    },
];

impl Scenario {
    /// All catalog entries
    pub fn all() -> &'static [Scenario] {
        SCENARIOS
    }

    /// Look up a scenario by its identifier
    pub fn find(id: &str) -> Option<&'static Scenario> {
        SCENARIOS.iter().find(|s| s.id == id.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_non_empty() {
        assert!(!Scenario::all().is_empty());
    }

    #[test]
    fn ids_are_unique() {
        for (i, a) in SCENARIOS.iter().enumerate() {
            for b in &SCENARIOS[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn find_known_scenario() {
        let s = Scenario::find("screen-coach").unwrap();
        assert_eq!(s.input, InputSource::Screen);
        assert!(!s.system_instruction.is_empty());
    }

    #[test]
    fn find_unknown_scenario() {
        assert!(Scenario::find("does-not-exist").is_none());
    }

    #[test]
    fn find_trims_whitespace() {
        assert!(Scenario::find("  free-chat ").is_some());
    }

    #[test]
    fn input_source_parse() {
        assert_eq!("camera".parse::<InputSource>().unwrap(), InputSource::Camera);
        assert_eq!("SCREEN".parse::<InputSource>().unwrap(), InputSource::Screen);
        assert_eq!("off".parse::<InputSource>().unwrap(), InputSource::None);
        assert!("window".parse::<InputSource>().is_err());
    }

    #[test]
    fn every_entry_has_copy() {
        for s in SCENARIOS {
            assert!(!s.title.is_empty());
            assert!(!s.description.is_empty());
            assert!(!s.icon.is_empty());
        }
    }
}
