//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::chat::ModelTier;
use crate::domain::live::InputSource;

/// Vivavoce - real-time AI voice conversation
#[derive(Parser, Debug)]
#[command(name = "vivavoce")]
#[command(version = "0.1.0")]
#[command(about = "Real-time AI voice conversation using Google Gemini Live")]
#[command(long_about = None)]
pub struct Cli {
    /// Scenario preset for the live session (see `vivavoce scenarios`)
    #[arg(short, long, value_name = "ID")]
    pub scenario: Option<String>,

    /// Realtime model override
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Start the live session with the microphone muted
    #[arg(long)]
    pub muted: bool,

    /// Video input for the live session
    #[arg(long, value_name = "SOURCE")]
    pub video: Option<VideoArg>,

    /// Directory of camera frame stills to forward
    #[arg(long, value_name = "DIR")]
    pub camera_frames: Option<PathBuf>,

    /// Directory of screen frame stills to forward
    #[arg(long, value_name = "DIR")]
    pub screen_frames: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one chat message and print the reply
    Chat {
        /// The message to send
        message: String,

        /// Model tier to answer with
        #[arg(short, long, value_name = "TIER")]
        tier: Option<TierArg>,
    },
    /// Transcribe an audio file
    Transcribe {
        /// Audio file (flac, wav, ogg, mp3, webm)
        file: PathBuf,
    },
    /// Record the microphone until Ctrl-C, then export the clip
    Record {
        /// Output path (defaults to a timestamped name in the
        /// current directory)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Upload the clip to the configured cloud drive instead of
        /// saving locally
        #[arg(long)]
        upload: bool,
    },
    /// Sign in against the identity backend (per-run, nothing stored)
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL", conflicts_with = "guest")]
        email: Option<String>,

        /// Account password
        #[arg(long, value_name = "PASSWORD", env = "VIVAVOCE_PASSWORD")]
        password: Option<String>,

        /// Skip the backend and use the local guest identity
        #[arg(long)]
        guest: bool,
    },
    /// List the scenario catalog
    Scenarios,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Model tier argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TierArg {
    Flash,
    Pro,
    Thinker,
}

impl From<TierArg> for ModelTier {
    fn from(arg: TierArg) -> Self {
        match arg {
            TierArg::Flash => ModelTier::Flash,
            TierArg::Pro => ModelTier::Pro,
            TierArg::Thinker => ModelTier::Thinker,
        }
    }
}

/// Video source argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum VideoArg {
    None,
    Camera,
    Screen,
}

impl From<VideoArg> for InputSource {
    fn from(arg: VideoArg) -> Self {
        match arg {
            VideoArg::None => InputSource::None,
            VideoArg::Camera => InputSource::Camera,
            VideoArg::Screen => InputSource::Screen,
        }
    }
}

/// Parsed live session options
#[derive(Debug, Clone)]
pub struct LiveOptions {
    pub scenario: Option<String>,
    pub model: Option<String>,
    pub muted: bool,
    pub video: Option<InputSource>,
    pub camera_frames: Option<PathBuf>,
    pub screen_frames: Option<PathBuf>,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "api_key",
    "live_model",
    "voice",
    "tier",
    "drive.client_id",
    "drive.client_secret",
    "drive.refresh_token",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
