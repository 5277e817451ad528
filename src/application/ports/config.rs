//! Configuration port interface

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for configuration storage
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load configuration. Missing storage yields an empty config, not
    /// an error.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Persist the given configuration
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Location of the backing file
    fn path(&self) -> PathBuf;

    /// Whether the backing file exists
    fn exists(&self) -> bool;

    /// Create the backing file with defaults; fails if it already exists
    async fn init(&self) -> Result<(), ConfigError>;
}
