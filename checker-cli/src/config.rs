use anyhow::{Context, Result};
use checker_core::{CheckerConfig, ConfigError};
use config::{Config, File};
use dialoguer::Input;
use std::env;
use tracing::info;

/// Loads and validates the YAML configuration file.
pub fn load(path: &str) -> Result<CheckerConfig, ConfigError> {
    let settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    let cfg: CheckerConfig = settings.try_deserialize().map_err(|e| ConfigError::Parse {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// Single-account fallback when no config file exists: environment
/// variables first, interactive prompts for whatever is missing.
pub fn fallback_single_account() -> Result<CheckerConfig> {
    info!("No config file found, falling back to environment/prompts");

    let api_id = match env::var("API_ID") {
        Ok(v) => v,
        Err(_) => Input::<String>::new()
            .with_prompt("Enter your API ID")
            .interact_text()
            .context("failed to read API ID")?,
    };
    let api_hash = match env::var("API_HASH") {
        Ok(v) => v,
        Err(_) => Input::<String>::new()
            .with_prompt("Enter your API hash")
            .interact_text()
            .context("failed to read API hash")?,
    };
    let phone_number = match env::var("PHONE_NUMBER") {
        Ok(v) => v,
        Err(_) => Input::<String>::new()
            .with_prompt("Enter your phone number")
            .interact_text()
            .context("failed to read phone number")?,
    };

    let api_id: i32 = api_id
        .trim()
        .parse()
        .context("API_ID must be an integer")?;
    Ok(CheckerConfig::single_account(
        phone_number.trim().to_string(),
        api_id,
        api_hash.trim().to_string(),
    ))
}
