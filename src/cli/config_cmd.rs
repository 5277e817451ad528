//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::chat::ModelTier;
use crate::domain::config::DriveConfig;
use crate::domain::error::ConfigError;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        });
    }

    validate_config_value(key, value)?;

    let mut config = store.load().await?;

    match key {
        "api_key" => config.api_key = Some(value.to_string()),
        "live_model" => config.live_model = Some(value.to_string()),
        "voice" => config.voice = Some(value.to_string()),
        "tier" => config.tier = Some(value.to_string()),
        "drive.client_id" | "drive.client_secret" | "drive.refresh_token" => {
            let drive = config.drive.get_or_insert_with(DriveConfig::default);
            match key {
                "drive.client_id" => drive.client_id = Some(value.to_string()),
                "drive.client_secret" => drive.client_secret = Some(value.to_string()),
                "drive.refresh_token" => drive.refresh_token = Some(value.to_string()),
                _ => unreachable!(),
            }
        }
        _ => unreachable!(), // Already validated
    }

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        });
    }

    let config = store.load().await?;

    let value = match key {
        "api_key" => config.api_key.map(|s| mask_secret(&s)),
        "live_model" => config.live_model,
        "voice" => config.voice,
        "tier" => config.tier,
        "drive.client_id" => config.drive.as_ref().and_then(|d| d.client_id.clone()),
        "drive.client_secret" => config
            .drive
            .as_ref()
            .and_then(|d| d.client_secret.as_deref().map(mask_secret)),
        "drive.refresh_token" => config
            .drive
            .as_ref()
            .and_then(|d| d.refresh_token.as_deref().map(mask_secret)),
        _ => unreachable!(),
    };

    match value {
        Some(v) => presenter.output(&v),
        None => presenter.output("(not set)"),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    presenter.key_value(
        "api_key",
        &config
            .api_key
            .map(|s| mask_secret(&s))
            .unwrap_or_else(|| "(not set)".to_string()),
    );
    presenter.key_value(
        "live_model",
        config.live_model.as_deref().unwrap_or("(not set)"),
    );
    presenter.key_value("voice", config.voice.as_deref().unwrap_or("(not set)"));
    presenter.key_value("tier", config.tier.as_deref().unwrap_or("(not set)"));
    presenter.key_value(
        "drive.client_id",
        config
            .drive
            .as_ref()
            .and_then(|d| d.client_id.as_deref())
            .unwrap_or("(not set)"),
    );
    presenter.key_value(
        "drive.client_secret",
        &config
            .drive
            .as_ref()
            .and_then(|d| d.client_secret.as_deref().map(mask_secret))
            .unwrap_or_else(|| "(not set)".to_string()),
    );
    presenter.key_value(
        "drive.refresh_token",
        &config
            .drive
            .as_ref()
            .and_then(|d| d.refresh_token.as_deref().map(mask_secret))
            .unwrap_or_else(|| "(not set)".to_string()),
    );

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

/// Validate a config value based on key type
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "tier" => {
            value
                .parse::<ModelTier>()
                .map_err(|e| ConfigError::ValidationError {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
        }
        "voice" | "live_model" => {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    key: key.to_string(),
                    message: "Value must not be empty".to_string(),
                });
            }
        }
        _ => {} // keys and tokens accept any string
    }
    Ok(())
}

/// Mask a secret for display (show first 4 and last 4 chars)
fn mask_secret(secret: &str) -> String {
    if secret.len() <= 8 {
        "*".repeat(secret.len())
    } else {
        format!("{}...{}", &secret[..4], &secret[secret.len() - 4..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_secret_long() {
        assert_eq!(mask_secret("abcdefghijklmnop"), "abcd...mnop");
    }

    #[test]
    fn mask_secret_short() {
        assert_eq!(mask_secret("short"), "*****");
    }

    #[test]
    fn validate_tier_valid() {
        assert!(validate_config_value("tier", "flash").is_ok());
        assert!(validate_config_value("tier", "thinker").is_ok());
    }

    #[test]
    fn validate_tier_invalid() {
        assert!(validate_config_value("tier", "turbo").is_err());
    }

    #[test]
    fn validate_voice_rejects_empty() {
        assert!(validate_config_value("voice", "  ").is_err());
        assert!(validate_config_value("voice", "Orus").is_ok());
    }

    #[test]
    fn api_key_accepts_any_string() {
        assert!(validate_config_value("api_key", "anything").is_ok());
    }
}
