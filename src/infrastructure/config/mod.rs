//! Configuration management

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;

/// Environment variable holding the Slack bot token
pub const SLACK_TOKEN_ENV: &str = "SLACK_TOKEN";
/// Environment variable holding the Travis CI token
pub const TRAVIS_TOKEN_ENV: &str = "TRAVIS_CI_TOKEN";

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub slack: SlackConfig,
    pub travis: TravisConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    /// Username shown on posted replies
    pub name: String,
    pub icon_emoji: String,
    /// Offset from UTC used when displaying build times
    pub utc_offset_hours: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlackConfig {
    pub api_base: String,
    pub token: Option<String>,
    pub ping_interval_secs: u64,
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TravisConfig {
    pub api_base: String,
    /// Base of the build page links
    pub web_base: String,
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "travis-bot".to_string(),
                icon_emoji: ":construction_worker:".to_string(),
                utc_offset_hours: 9,
            },
            slack: SlackConfig {
                api_base: "https://slack.com/api".to_string(),
                token: None,
                ping_interval_secs: 30,
                reconnect_delay_ms: 1000,
            },
            travis: TravisConfig {
                api_base: "https://api.travis-ci.org".to_string(),
                web_base: "https://travis-ci.org".to_string(),
                token: None,
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Tokens from the environment override the file
    pub fn apply_env(&mut self) {
        if let Some(token) = non_empty_env(SLACK_TOKEN_ENV) {
            self.slack.token = Some(token);
        }

        if let Some(token) = non_empty_env(TRAVIS_TOKEN_ENV) {
            self.travis.token = Some(token);
        }
    }

    pub fn timezone(&self) -> Result<FixedOffset, ConfigError> {
        self.bot
            .utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "utc-offset-hours out of range: {}",
                    self.bot.utc_offset_hours
                ))
            })
    }

    pub fn slack_token(&self) -> Result<&str, ConfigError> {
        self.slack
            .token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField(SLACK_TOKEN_ENV.to_string()))
    }

    /// Travis token; an absent token is passed on as empty and rejected by authentication
    pub fn travis_token(&self) -> &str {
        self.travis.token.as_deref().unwrap_or_default()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
