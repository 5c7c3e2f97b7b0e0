use std::env;

use tracing::info;

use crate::error::ConfigError;
use crate::types::{ApprovalMode, Intensity, MediaKind};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Pipeline
    pub channels: Vec<String>,
    pub limit_per_channel: u32,
    pub media_kind_filter: MediaKind,
    pub optimization_intensity: Intensity,
    pub publish_cooldown_secs: u64,
    pub session_cooldown_secs: u64,
    pub approval_mode: ApprovalMode,

    // Reddit's public listing API needs only a descriptive User-Agent.
    pub reddit_user_agent: String,

    // Instagram
    pub instagram_username: String,
    pub instagram_password: String,

    // OpenAI — optional; empty disables caption optimization
    pub openai_api_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let channels: Vec<String> = env::var("RELAY_CHANNELS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }

        Ok(Self {
            channels,
            limit_per_channel: parse_var("RELAY_LIMIT_PER_CHANNEL", 10)?,
            media_kind_filter: match env::var("RELAY_MEDIA_KIND").as_deref() {
                Ok("video") => MediaKind::Video,
                Ok("gif") => MediaKind::Gif,
                _ => MediaKind::Image,
            },
            optimization_intensity: Intensity::parse_or_default(
                &env::var("RELAY_INTENSITY").unwrap_or_default(),
            ),
            publish_cooldown_secs: parse_var("RELAY_PUBLISH_COOLDOWN_SECS", 600)?,
            session_cooldown_secs: parse_var("RELAY_SESSION_COOLDOWN_SECS", 30)?,
            approval_mode: match env::var("RELAY_APPROVAL_MODE").as_deref() {
                Ok("manual") => ApprovalMode::Manual,
                _ => ApprovalMode::Auto,
            },
            reddit_user_agent: env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| "relay/0.1".to_string()),
            instagram_username: required_env("INSTAGRAM_USERNAME")?,
            instagram_password: required_env("INSTAGRAM_PASSWORD")?,
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
        })
    }

    /// Log the active settings without leaking credentials.
    pub fn log_redacted(&self) {
        info!(
            channels = ?self.channels,
            limit_per_channel = self.limit_per_channel,
            media_kind = %self.media_kind_filter,
            intensity = %self.optimization_intensity,
            publish_cooldown_secs = self.publish_cooldown_secs,
            session_cooldown_secs = self.session_cooldown_secs,
            approval_mode = ?self.approval_mode,
            captioner_enabled = !self.openai_api_key.is_empty(),
            "Configuration loaded"
        );
    }
}

fn required_env(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVar(key))
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar {
            var: key,
            expected: "a number",
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; keep them in one test to avoid
    // interference under the parallel test runner.
    #[test]
    fn from_env_round_trip() {
        let vars = [
            ("RELAY_CHANNELS", "mma, ufc ,"),
            ("RELAY_LIMIT_PER_CHANNEL", "5"),
            ("RELAY_INTENSITY", "creative"),
            ("RELAY_PUBLISH_COOLDOWN_SECS", "120"),
            ("RELAY_APPROVAL_MODE", "manual"),
            ("INSTAGRAM_USERNAME", "user"),
            ("INSTAGRAM_PASSWORD", "pass"),
        ];
        for (k, v) in vars {
            env::set_var(k, v);
        }
        env::remove_var("OPENAI_API_KEY");

        let config = Config::from_env().unwrap();
        assert_eq!(config.channels, vec!["mma", "ufc"]);
        assert_eq!(config.limit_per_channel, 5);
        assert_eq!(config.optimization_intensity, Intensity::Creative);
        assert_eq!(config.publish_cooldown_secs, 120);
        assert_eq!(config.session_cooldown_secs, 30);
        assert_eq!(config.approval_mode, ApprovalMode::Manual);
        assert!(config.openai_api_key.is_empty());

        env::remove_var("RELAY_CHANNELS");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::NoChannels));

        for (k, _) in vars {
            env::remove_var(k);
        }
    }
}
