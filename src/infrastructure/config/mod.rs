//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::application::services::ReconnectPolicy;
use crate::domain::entities::{normalize_number, GlobalSettings, DEFAULT_COOLDOWN_SECS};

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub plugins: PluginConfig,
    pub storage: StorageConfig,
    pub supervisor: SupervisorConfig,
    pub logging: LoggingConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    /// Phone number of the bot account; also treated as an owner
    pub number: Option<String>,
    /// Prefix written to `settings.json` on first start
    pub prefix: String,
    /// Owner numbers written to `settings.json` on first start
    pub owners: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginConfig {
    pub directory: PathBuf,
    pub default_cooldown: u64,
    /// Reload when manifests change on disk
    pub watch: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SupervisorConfig {
    pub reconnect_interval_secs: u64,
    pub max_reconnect_attempts: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AdaptersConfig {
    pub console: Option<ConsoleConfig>,
}

/// Local stdin/stdout connection for development
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Sender jid or number lines are attributed to
    pub sender: String,
    /// Chat jid; a `@g.us` jid simulates a group
    pub chat: Option<String>,
    pub push_name: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "Mahachi Bot".to_string(),
            number: None,
            prefix: ".".to_string(),
            owners: Vec::new(),
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./plugins"),
            default_cooldown: DEFAULT_COOLDOWN_SECS,
            watch: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./data"),
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            reconnect_interval_secs: 5,
            max_reconnect_attempts: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for AdaptersConfig {
    fn default() -> Self {
        Self {
            console: Some(ConsoleConfig::default()),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sender: "263700000000".to_string(),
            chat: None,
            push_name: "Console".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// `BOT_NUMBER`, `BOT_PREFIX` and `LOG_LEVEL` override file values
    pub fn apply_env(&mut self) {
        if let Ok(number) = std::env::var("BOT_NUMBER") {
            self.bot.number = Some(number);
        }

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            self.bot.prefix = prefix;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.initial_settings()
            .validate()
            .map_err(|reason| ConfigError::InvalidValue(format!("bot.prefix: {}", reason)))?;

        if self.supervisor.reconnect_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "supervisor.reconnect-interval-secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Settings written on first start, before `settings.json` exists
    pub fn initial_settings(&self) -> GlobalSettings {
        let mut owners: Vec<String> = self.bot.owners.iter().map(|o| normalize_number(o)).collect();
        if let Some(number) = &self.bot.number {
            let number = normalize_number(number);
            if !number.is_empty() && !owners.contains(&number) {
                owners.push(number);
            }
        }
        owners.retain(|o| !o.is_empty());

        GlobalSettings {
            prefix: self.bot.prefix.clone(),
            owners,
            ..GlobalSettings::default()
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            interval: Duration::from_secs(self.supervisor.reconnect_interval_secs),
            max_attempts: self.supervisor.max_reconnect_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse("bot:\n  name: Test\nplugins:\n  watch: false\n").unwrap();

        assert_eq!(config.bot.name, "Test");
        assert_eq!(config.bot.prefix, ".");
        assert!(!config.plugins.watch);
        assert_eq!(config.plugins.default_cooldown, DEFAULT_COOLDOWN_SECS);
        assert_eq!(config.supervisor.max_reconnect_attempts, 5);
        assert_eq!(config.reconnect_policy().interval, Duration::from_secs(5));
    }

    #[test]
    fn test_kebab_case_keys() {
        let config = Config::parse(
            "supervisor:\n  reconnect-interval-secs: 2\n  max-reconnect-attempts: 9\nadapters:\n  console:\n    sender: '111'\n    push-name: Dev\n",
        )
        .unwrap();

        assert_eq!(config.supervisor.reconnect_interval_secs, 2);
        assert_eq!(config.supervisor.max_reconnect_attempts, 9);
        let console = config.adapters.console.unwrap();
        assert!(console.enabled);
        assert_eq!(console.push_name, "Dev");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            Config::parse("bot:\n  prefix: ''\n"),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            Config::parse("supervisor:\n  reconnect-interval-secs: 0\n"),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(Config::parse("bot: [1, 2"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_initial_settings_include_bot_number() {
        let mut config = Config::default();
        config.bot.owners = vec!["+263 77 123 4567".to_string()];
        config.bot.number = Some("263771234567".to_string());

        let settings = config.initial_settings();
        assert_eq!(settings.owners, vec!["263771234567".to_string()]);
        assert_eq!(settings.prefix, ".");
    }

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = Config::default().to_yaml().unwrap();
        let config = Config::parse(&yaml).unwrap();
        assert_eq!(config.bot.prefix, ".");
        assert_eq!(config.plugins.directory, PathBuf::from("./plugins"));
    }
}
