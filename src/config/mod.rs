//! Configuration Management
//!
//! Defaults are embedded from `default_config.toml`; a user file at
//! `~/.config/code4care/config.toml` is merged onto them key by key.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG: &str = include_str!("../../default_config.toml");

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// SOS countdown settings
    pub sos: SosConfig,

    /// Desktop notification settings
    pub notification: NotificationConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// SOS countdown settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SosConfig {
    /// Seconds from activation until emergency services are contacted
    pub countdown_secs: u32,

    /// Tick granularity in milliseconds
    pub tick_interval_ms: u64,
}

impl SosConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for SosConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 10,
            tick_interval_ms: 1000,
        }
    }
}

/// Desktop notification settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Enable desktop notifications
    pub enabled: bool,

    /// How long a notification stays on screen
    pub timeout_seconds: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_seconds: 5,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level (overridden by `CODE4CARE_LOG`)
    pub level: String,

    /// Output format: "pretty", "compact" or "json"
    pub format: String,

    /// Show timestamps
    pub timestamps: bool,

    /// Show file and line numbers
    pub file_line: bool,

    /// Also write a daily-rotated log file
    pub file_output: bool,

    /// Log file directory (`~` is expanded)
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            timestamps: true,
            file_line: false,
            file_output: false,
            file_path: None,
        }
    }
}

impl AppConfig {
    /// Load the embedded defaults, then the user config if present.
    ///
    /// A broken user config is logged and ignored.
    pub fn load() -> ConfigResult<Self> {
        let mut config: AppConfig = toml::from_str(DEFAULT_CONFIG).map_err(|e| {
            ConfigError::ParseError(format!("Failed to parse default config: {}", e))
        })?;

        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                let merged = std::fs::read_to_string(&user_config_path)
                    .map_err(|e| ConfigError::IoError(e.to_string()))
                    .and_then(|user| Self::merge(DEFAULT_CONFIG, &user));
                match merged {
                    Ok(user_config) => {
                        config = user_config;
                        tracing::info!("Loaded user config from {:?}", user_config_path);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load user config: {}", e);
                    }
                }
            }
        }

        Ok(config)
    }

    /// Load configuration from a specific file.
    ///
    /// Sections and keys missing from the file keep their defaults.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: AppConfig = toml::from_str(&contents).map_err(|e| {
            ConfigError::ParseError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `overlay` onto `base` key by key, then validate.
    ///
    /// Tables merge recursively; any other value in the overlay wins.
    pub fn merge(base: &str, overlay: &str) -> ConfigResult<Self> {
        let mut merged: toml::Table = toml::from_str(base).map_err(|e| {
            ConfigError::ParseError(format!("Failed to parse base config: {}", e))
        })?;
        let overlay: toml::Table = toml::from_str(overlay).map_err(|e| {
            ConfigError::ParseError(format!("Failed to parse user config: {}", e))
        })?;
        merge_tables(&mut merged, overlay);

        let config: AppConfig = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// User config path (~/.config/code4care/config.toml)
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|config_dir| config_dir.join("code4care").join("config.toml"))
    }

    /// Write this configuration as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let toml_string =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml_string).map_err(|e| ConfigError::IoError(e.to_string()))?;

        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.sos.countdown_secs == 0 {
            return Err(ConfigError::Invalid(
                "sos.countdown_secs must be at least 1".to_string(),
            ));
        }
        if self.sos.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "sos.tick_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                merge_tables(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_parses() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str("[sos]\ncountdown_secs = 3\n").unwrap();
        assert_eq!(config.sos.countdown_secs, 3);
        assert_eq!(config.sos.tick_interval_ms, 1000);
        assert_eq!(config.notification, NotificationConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_merge_keeps_base_values_the_overlay_omits() {
        let base = "[sos]\ncountdown_secs = 10\ntick_interval_ms = 500\n\n[logging]\nlevel = \"debug\"\n";
        let overlay = "[sos]\ncountdown_secs = 3\n\n[notification]\nenabled = true\n";

        let config = AppConfig::merge(base, overlay).unwrap();
        assert_eq!(config.sos.countdown_secs, 3);
        assert_eq!(config.sos.tick_interval_ms, 500);
        assert_eq!(config.logging.level, "debug");
        assert!(config.notification.enabled);
        assert_eq!(config.notification.timeout_seconds, 5);
    }

    #[test]
    fn test_merge_onto_embedded_defaults() {
        let config = AppConfig::merge(DEFAULT_CONFIG, "[logging]\nformat = \"json\"\n").unwrap();
        let expected: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.sos, expected.sos);
        assert_eq!(config.notification, expected.notification);
    }

    #[test]
    fn test_merge_rejects_invalid_result() {
        assert!(matches!(
            AppConfig::merge(DEFAULT_CONFIG, "[sos]\ntick_interval_ms = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::merge(DEFAULT_CONFIG, "[sos\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_tick_interval() {
        let sos = SosConfig {
            tick_interval_ms: 250,
            ..Default::default()
        };
        assert_eq!(sos.tick_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_validate_rejects_zero_countdown() {
        let mut config = AppConfig::default();
        config.sos.countdown_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.sos.tick_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.sos.countdown_secs = 5;
        config.notification.enabled = true;
        config.logging.format = "json".to_string();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            AppConfig::load_from_file(&path),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sos\ncountdown_secs = ").unwrap();
        assert!(matches!(
            AppConfig::load_from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
