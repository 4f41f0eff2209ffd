//! TOML configuration with defaulted sections.
//!
//! A missing config file falls back to defaults; the Telegram bot token
//! and the provider API key can also come from `TELEGRAM_BOT_TOKEN` and
//! `OPENAI_API_KEY` environment variables.

use crate::error::CampusError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level campus configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub campus: CampusConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub activities: ActivitiesConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampusConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CampusConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// The single privileged-user check. No other authorization exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Chat id of the bot developer. Empty disables `/dev`, `/pm`,
    /// and `/suggest` delivery.
    #[serde(default)]
    pub dev_user: String,
}

/// OpenAI-compatible completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Models the `/ask` command accepts as its optional first argument.
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            models: default_models(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub telegram: Option<TelegramConfig>,
}

/// Telegram bot config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
}

/// Local schedule datasets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_timetable_path")]
    pub timetable_path: String,
    #[serde(default = "default_cycles_path")]
    pub cycles_path: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timetable_path: default_timetable_path(),
            cycles_path: default_cycles_path(),
        }
    }
}

/// Remote activities feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitiesConfig {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u64,
}

impl Default for ActivitiesConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            timeout_secs: default_feed_timeout(),
        }
    }
}

/// Hong Kong Observatory forecast feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub api_url: String,
    #[serde(default = "default_weather_lang")]
    pub lang: String,
    #[serde(default = "default_weather_days")]
    pub days: usize,
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: default_weather_url(),
            lang: default_weather_lang(),
            days: default_weather_days(),
            timeout_secs: default_feed_timeout(),
        }
    }
}

fn default_name() -> String {
    "campus".to_string()
}
fn default_data_dir() -> String {
    "~/.campus".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_models() -> Vec<String> {
    vec!["gpt-4o-mini".to_string(), "deepseek-v3".to_string()]
}
fn default_provider_timeout() -> u64 {
    60
}
fn default_timetable_path() -> String {
    "data/timetable.json".to_string()
}
fn default_cycles_path() -> String {
    "data/cycles.json".to_string()
}
fn default_feed_url() -> String {
    "https://iot.spyc.hk/event-schedule".to_string()
}
fn default_feed_timeout() -> u64 {
    5
}
fn default_weather_url() -> String {
    "https://data.weather.gov.hk/weatherAPI/opendata/weather.php".to_string()
}
fn default_weather_lang() -> String {
    "tc".to_string()
}
fn default_weather_days() -> usize {
    9
}

/// Expand `~` to the home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. Environment
/// variables fill in secrets left empty in the file.
pub fn load(path: &str) -> Result<Config, CampusError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CampusError::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| CampusError::Config(format!("failed to parse config: {e}")))?
    } else {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    if config.provider.api_key.is_empty() {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.provider.api_key = key;
        }
    }
    if let Some(ref mut tg) = config.channel.telegram {
        if tg.bot_token.is_empty() {
            if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
                tg.bot_token = token;
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.campus.name, "campus");
        assert_eq!(cfg.provider.model, "gpt-4o-mini");
        assert_eq!(cfg.activities.timeout_secs, 5);
        assert_eq!(cfg.weather.days, 9);
        assert!(cfg.channel.telegram.is_none());
        assert!(cfg.auth.dev_user.is_empty());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
            [campus]
            name = "spyc-bot"

            [channel.telegram]
            enabled = true
            bot_token = "123:abc"

            [activities]
            timeout_secs = 10
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.campus.name, "spyc-bot");
        assert_eq!(cfg.campus.data_dir, "~/.campus");
        let tg = cfg.channel.telegram.unwrap();
        assert!(tg.enabled);
        assert_eq!(tg.bot_token, "123:abc");
        assert_eq!(cfg.activities.timeout_secs, 10);
        assert_eq!(cfg.activities.feed_url, default_feed_url());
    }

    #[test]
    fn test_shellexpand_home() {
        std::env::set_var("HOME", "/home/campus");
        assert_eq!(shellexpand("~/data"), "/home/campus/data");
        assert_eq!(shellexpand("/abs/path"), "/abs/path");
    }
}
