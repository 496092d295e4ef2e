use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const DEFAULT_DAILY_LIMIT: u32 = 50;
pub const DEFAULT_BATCH_PAUSE_SECS: u64 = 120;
pub const DEFAULT_REQUEST_PAUSE_MIN_SECS: u64 = 120;
pub const DEFAULT_REQUEST_PAUSE_MAX_SECS: u64 = 180;
pub const DEFAULT_QUOTA_FILE: &str = "account_limits.json";

/// One platform account. Immutable for the process lifetime once loaded.
///
/// Credential material is wiped on drop and never appears in Debug output.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Account {
    pub phone_number: String,
    pub api_id: i32,
    pub api_hash: String,
    #[serde(default)]
    pub session_name: Option<String>,
    /// Per-account override of the inter-request pause lower bound, seconds.
    #[serde(default)]
    pub request_pause_min: Option<u64>,
    /// Per-account override of the inter-request pause upper bound, seconds.
    #[serde(default)]
    pub request_pause_max: Option<u64>,
}

impl Account {
    pub fn session_name(&self) -> &str {
        self.session_name.as_deref().unwrap_or(&self.phone_number)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("phone_number", &self.phone_number)
            .field("api_id", &"***REDACTED***")
            .field("api_hash", &"***REDACTED***")
            .field("session_name", &self.session_name)
            .field("request_pause_min", &self.request_pause_min)
            .field("request_pause_max", &self.request_pause_max)
            .finish()
    }
}

/// Global dispatch settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_batch_pause")]
    pub batch_pause_seconds: u64,
    #[serde(default = "default_pause_min")]
    pub request_pause_min: u64,
    #[serde(default = "default_pause_max")]
    pub request_pause_max: u64,
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    #[serde(default = "default_quota_file")]
    pub quota_file: String,
    /// Base URL of the lookup gateway the CLI backend talks to.
    #[serde(default)]
    pub gateway_url: Option<String>,
}

fn default_batch_pause() -> u64 {
    DEFAULT_BATCH_PAUSE_SECS
}
fn default_pause_min() -> u64 {
    DEFAULT_REQUEST_PAUSE_MIN_SECS
}
fn default_pause_max() -> u64 {
    DEFAULT_REQUEST_PAUSE_MAX_SECS
}
fn default_daily_limit() -> u32 {
    DEFAULT_DAILY_LIMIT
}
fn default_quota_file() -> String {
    DEFAULT_QUOTA_FILE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            batch_pause_seconds: DEFAULT_BATCH_PAUSE_SECS,
            request_pause_min: DEFAULT_REQUEST_PAUSE_MIN_SECS,
            request_pause_max: DEFAULT_REQUEST_PAUSE_MAX_SECS,
            daily_limit: DEFAULT_DAILY_LIMIT,
            quota_file: DEFAULT_QUOTA_FILE.to_string(),
            gateway_url: None,
        }
    }
}

/// Top-level configuration: the account list plus global settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckerConfig {
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub settings: Settings,
}

impl CheckerConfig {
    /// Single-account fallback used when no config file exists and the
    /// account comes from environment variables or interactive prompts.
    pub fn single_account(phone_number: String, api_id: i32, api_hash: String) -> Self {
        Self {
            accounts: vec![Account {
                session_name: Some(phone_number.clone()),
                phone_number,
                api_id,
                api_hash,
                request_pause_min: None,
                request_pause_max: None,
            }],
            settings: Settings::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.accounts.is_empty() {
            return Err(ConfigError::MissingField {
                field: "accounts".to_string(),
            });
        }
        if self.settings.request_pause_min > self.settings.request_pause_max {
            return Err(ConfigError::InvalidValue {
                field: "settings.request_pause_min".to_string(),
                reason: format!(
                    "lower bound {} exceeds upper bound {}",
                    self.settings.request_pause_min, self.settings.request_pause_max
                ),
            });
        }
        for account in &self.accounts {
            if account.phone_number.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "accounts[].phone_number".to_string(),
                });
            }
        }
        Ok(())
    }
}

const EXAMPLE_CONFIG: &str = r#"accounts:
  - phone_number: "+1234567890"
    api_id: 12345678
    api_hash: "your_api_hash_here"
  - phone_number: "+0987654321"
    api_id: 87654321
    api_hash: "another_api_hash_here"
    # Optional per-account pacing overrides, seconds
    request_pause_min: 90
    request_pause_max: 150

settings:
  batch_pause_seconds: 120
  request_pause_min: 120
  request_pause_max: 180
  daily_limit: 50
  quota_file: "account_limits.json"
  gateway_url: "http://127.0.0.1:8470"
"#;

/// Writes a commented example configuration next to where the real one
/// is expected, so a first run leaves something to copy from.
pub fn write_example_config(path: &str) -> std::io::Result<()> {
    std::fs::write(path, EXAMPLE_CONFIG)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(phone: &str) -> Account {
        Account {
            phone_number: phone.to_string(),
            api_id: 1,
            api_hash: "hash".to_string(),
            session_name: None,
            request_pause_min: None,
            request_pause_max: None,
        }
    }

    #[test]
    fn validate_rejects_empty_account_list() {
        let cfg = CheckerConfig {
            accounts: vec![],
            settings: Settings::default(),
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn validate_rejects_inverted_pause_bounds() {
        let mut cfg = CheckerConfig {
            accounts: vec![account("+15550001")],
            settings: Settings::default(),
        };
        cfg.settings.request_pause_min = 200;
        cfg.settings.request_pause_max = 100;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn debug_redacts_credentials() {
        let mut acct = account("+15550001");
        acct.api_hash = "super-secret-value".to_string();
        let rendered = format!("{acct:?}");
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn single_account_fallback_uses_defaults() {
        let cfg =
            CheckerConfig::single_account("+15550001".to_string(), 42, "secret".to_string());
        assert_eq!(cfg.accounts.len(), 1);
        assert_eq!(cfg.settings.daily_limit, DEFAULT_DAILY_LIMIT);
        cfg.validate().unwrap();
    }
}
