//! Config-file loading and account selection.
//!
//! The file is JSON: an `accounts` list plus the bot knobs under `bot`.
//! Every field is optional; a missing file yields pure defaults so the
//! binary can run with nothing but `--location`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use rover_core::config::BotConfig;

/// On-disk configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub accounts: Vec<AccountEntry>,
    /// Seconds to wait before re-login after a lost session.
    pub relogin_wait_secs: u64,
    pub bot: BotConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            accounts: vec![AccountEntry::default()],
            relogin_wait_secs: 30,
            bot: BotConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountEntry {
    pub username: String,
    /// Start location as "lat,lng"; the CLI flag overrides this.
    pub location: Option<String>,
}

impl Default for AccountEntry {
    fn default() -> Self {
        Self {
            username: "rover".to_string(),
            location: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when the file is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn account(&self, index: usize) -> Result<&AccountEntry> {
        match self.accounts.get(index) {
            Some(account) => Ok(account),
            None => bail!(
                "account index {index} out of range ({} configured)",
                self.accounts.len()
            ),
        }
    }

    pub fn relogin_wait(&self) -> Duration {
        Duration::from_secs(self.relogin_wait_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let settings = Settings::load("definitely/not/here.json").unwrap();
        assert_eq!(settings.accounts.len(), 1);
        assert_eq!(settings.accounts[0].username, "rover");
        assert_eq!(settings.relogin_wait_secs, 30);
    }

    #[test]
    fn test_parse_sample_config() {
        let settings: Settings = serde_json::from_str(
            r#"{
                "accounts": [
                    { "username": "alice", "location": "48.8584,2.2945" },
                    { "username": "bob" }
                ],
                "bot": {
                    "visit_all_landmarks": true,
                    "triage": { "quality_floor": 80.0 }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(settings.accounts.len(), 2);
        assert_eq!(settings.account(0).unwrap().username, "alice");
        assert!(settings.account(2).is_err());
        assert!(settings.bot.visit_all_landmarks);
        assert_eq!(settings.bot.triage.quality_floor, 80.0);
        // Untouched knobs keep their defaults.
        assert_eq!(settings.bot.step_size_m, 200.0);
    }
}
