//! Configuration domain module

mod app_config;

pub use app_config::{
    AppConfig, DriveConfig, DEFAULT_LIVE_MODEL, DEFAULT_SYSTEM_INSTRUCTION, DEFAULT_VOICE,
};
