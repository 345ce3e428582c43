use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sink::mqtt_sink::MqttConfig;

/// Player settings persisted in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Sequencer settings
    pub poll_interval_secs: f64,
    pub idle_multiplier: u32,
    pub max_off_attempts: u32,

    // MQTT settings
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_client_id: String,
    pub mqtt_queue_capacity: usize,

    // Logging
    pub logging_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 0.5,
            idle_multiplier: 10,
            max_off_attempts: 5,

            mqtt_host: "northpole.local".to_string(),
            mqtt_port: 1883,
            mqtt_client_id: "pilit-player".to_string(),
            mqtt_queue_capacity: 256,

            logging_enabled: true,
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_secs)
    }

    /// Interval between ticks while the show is outside its window.
    pub fn idle_interval(&self) -> Duration {
        self.poll_interval() * self.idle_multiplier
    }

    pub fn mqtt_config(&self) -> MqttConfig {
        MqttConfig {
            host: self.mqtt_host.clone(),
            port: self.mqtt_port,
            client_id: self.mqtt_client_id.clone(),
            queue_capacity: self.mqtt_queue_capacity,
        }
    }

    /// Apply command line overrides of the broker address and re-check the
    /// result.
    pub fn with_mqtt_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = host {
            self.mqtt_host = host;
        }
        if let Some(port) = port {
            self.mqtt_port = port;
        }
        ConfigManager::validate_settings(&self).map_err(ConfigError::ValidationError)?;
        Ok(self)
    }
}

/// Configuration manager for player settings
/// Separates the schema of available options from the persisted values.
/// Configuration is stored in config.json in the working directory by default
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

/// Available configuration options with validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSchema {
    pub sequencer: SequencerConfigSchema,
    pub mqtt: MqttConfigSchema,
    pub logging: LoggingConfigSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencerConfigSchema {
    pub poll_interval_secs: ConfigOption<f64>,
    pub idle_multiplier: ConfigOption<u32>,
    pub max_off_attempts: ConfigOption<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfigSchema {
    pub mqtt_host: ConfigOption<String>,
    pub mqtt_port: ConfigOption<u16>,
    pub mqtt_client_id: ConfigOption<String>,
    pub mqtt_queue_capacity: ConfigOption<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfigSchema {
    pub logging_enabled: ConfigOption<bool>,
}

/// Configuration option with validation and available choices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigOption<T> {
    pub default: T,
    pub valid_range: Option<(T, T)>,
    pub description: String,
    pub requires_restart: bool,
}

/// Persisted configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub settings: Settings,
    pub created_at: String,
    pub modified_at: String,
}

fn check_range<T: PartialOrd + std::fmt::Display>(
    errors: &mut Vec<String>,
    name: &str,
    value: T,
    option: &ConfigOption<T>,
) {
    if let Some((min, max)) = &option.valid_range {
        if value < *min || value > *max {
            errors.push(format!("{} must be between {} and {}", name, min, max));
        }
    }
}

impl ConfigManager {
    /// Create a new configuration manager
    /// If no path is provided, defaults to 'config.json' in the current working directory
    pub fn new(config_path: Option<PathBuf>) -> Self {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from("config.json"));

        Self {
            config_path,
            settings: Settings::default(),
        }
    }

    /// Load settings from configuration file
    /// A missing file is created with default settings
    pub fn load(&mut self) -> Result<Settings, ConfigError> {
        if !self.config_path.exists() {
            self.save()?;
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        let config_file: ConfigFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if config_file.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Config file version {} doesn't match player version {}. Using defaults for new settings.",
                config_file.version,
                env!("CARGO_PKG_VERSION")
            );
        }

        Self::validate_settings(&config_file.settings).map_err(ConfigError::ValidationError)?;

        self.settings = config_file.settings;
        Ok(self.settings.clone())
    }

    /// Save current settings to configuration file
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            if parent != Path::new("") && parent != Path::new(".") {
                fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
            }
        }

        let now = chrono::Utc::now().to_rfc3339();
        let config_file = ConfigFile {
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings: self.settings.clone(),
            created_at: now.clone(),
            modified_at: now,
        };

        let content = serde_json::to_string_pretty(&config_file)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(&self.config_path, content)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get configuration schema with available options
    pub fn schema() -> ConfigSchema {
        let defaults = Settings::default();
        ConfigSchema {
            sequencer: SequencerConfigSchema {
                poll_interval_secs: ConfigOption {
                    default: defaults.poll_interval_secs,
                    valid_range: Some((0.05, 10.0)),
                    description: "Seconds between sequencer ticks while the show runs"
                        .to_string(),
                    requires_restart: true,
                },
                idle_multiplier: ConfigOption {
                    default: defaults.idle_multiplier,
                    valid_range: Some((1, 120)),
                    description: "Poll interval multiplier while outside the show window"
                        .to_string(),
                    requires_restart: true,
                },
                max_off_attempts: ConfigOption {
                    default: defaults.max_off_attempts,
                    valid_range: Some((1, 100)),
                    description: "Off commands sent per channel each time the show stops"
                        .to_string(),
                    requires_restart: true,
                },
            },
            mqtt: MqttConfigSchema {
                mqtt_host: ConfigOption {
                    default: defaults.mqtt_host,
                    valid_range: None,
                    description: "Host name of the MQTT broker".to_string(),
                    requires_restart: true,
                },
                mqtt_port: ConfigOption {
                    default: defaults.mqtt_port,
                    valid_range: Some((1, 65535)),
                    description: "TCP port of the MQTT broker".to_string(),
                    requires_restart: true,
                },
                mqtt_client_id: ConfigOption {
                    default: defaults.mqtt_client_id,
                    valid_range: None,
                    description: "Client id presented to the broker".to_string(),
                    requires_restart: true,
                },
                mqtt_queue_capacity: ConfigOption {
                    default: defaults.mqtt_queue_capacity,
                    valid_range: Some((16, 65536)),
                    description: "Commands that may wait for the broker before being dropped"
                        .to_string(),
                    requires_restart: true,
                },
            },
            logging: LoggingConfigSchema {
                logging_enabled: ConfigOption {
                    default: defaults.logging_enabled,
                    valid_range: None,
                    description: "Log every dispatched command".to_string(),
                    requires_restart: true,
                },
            },
        }
    }

    /// Validate settings against schema
    pub fn validate_settings(settings: &Settings) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let schema = Self::schema();

        check_range(
            &mut errors,
            "poll_interval_secs",
            settings.poll_interval_secs,
            &schema.sequencer.poll_interval_secs,
        );
        check_range(
            &mut errors,
            "idle_multiplier",
            settings.idle_multiplier,
            &schema.sequencer.idle_multiplier,
        );
        check_range(
            &mut errors,
            "max_off_attempts",
            settings.max_off_attempts,
            &schema.sequencer.max_off_attempts,
        );
        check_range(
            &mut errors,
            "mqtt_port",
            settings.mqtt_port,
            &schema.mqtt.mqtt_port,
        );
        check_range(
            &mut errors,
            "mqtt_queue_capacity",
            settings.mqtt_queue_capacity,
            &schema.mqtt.mqtt_queue_capacity,
        );

        if settings.mqtt_host.trim().is_empty() {
            errors.push("mqtt_host must not be empty".to_string());
        }
        if settings.mqtt_client_id.trim().is_empty() {
            errors.push("mqtt_client_id must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Failed to parse config file: {0}")]
    ParseError(String),
    #[error("Failed to serialize config: {0}")]
    SerializeError(String),
    #[error("Config validation errors: {}", .0.join(", "))]
    ValidationError(Vec<String>),
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_config_manager_new() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.json");

        let manager = ConfigManager::new(Some(config_path.clone()));
        assert_eq!(manager.config_path(), config_path);
        assert_eq!(manager.settings(), &Settings::default());
    }

    #[test]
    fn test_load_creates_default_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let mut manager = ConfigManager::new(Some(config_path.clone()));
        let settings = manager.load().unwrap();

        assert_eq!(settings, Settings::default());
        assert!(config_path.exists());
    }

    #[test]
    fn test_load_saved_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.json");

        let mut settings = Settings::default();
        settings.poll_interval_secs = 0.25;
        settings.mqtt_host = "broker.lan".to_string();
        let config_file = ConfigFile {
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings,
            created_at: chrono::Utc::now().to_rfc3339(),
            modified_at: chrono::Utc::now().to_rfc3339(),
        };
        fs::write(&config_path, serde_json::to_string_pretty(&config_file).unwrap()).unwrap();

        let mut manager = ConfigManager::new(Some(config_path));
        let loaded_settings = manager.load().unwrap();

        assert_eq!(loaded_settings.poll_interval_secs, 0.25);
        assert_eq!(loaded_settings.mqtt_host, "broker.lan");
        assert_eq!(loaded_settings.max_off_attempts, 5);
        assert_eq!(manager.settings(), &loaded_settings);
    }

    #[test]
    fn test_load_rejects_invalid_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.json");
        fs::write(
            &config_path,
            r#"{"version": "0.0.0", "settings": {"mqtt_port": 0},
                "created_at": "", "modified_at": ""}"#,
        )
        .unwrap();

        let mut manager = ConfigManager::new(Some(config_path));
        assert!(matches!(manager.load(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_mqtt_overrides_are_validated() {
        let settings = Settings::default()
            .with_mqtt_overrides(Some("broker.lan".to_string()), Some(8883))
            .unwrap();
        assert_eq!(settings.mqtt_host, "broker.lan");
        assert_eq!(settings.mqtt_port, 8883);
        assert_eq!(settings.mqtt_config().queue_capacity, 256);

        let unchanged = Settings::default().with_mqtt_overrides(None, None).unwrap();
        assert_eq!(unchanged, Settings::default());

        assert!(matches!(
            Settings::default().with_mqtt_overrides(None, Some(0)),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            Settings::default().with_mqtt_overrides(Some("  ".to_string()), None),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        assert!(ConfigManager::validate_settings(&settings).is_ok());

        settings.poll_interval_secs = 0.0;
        assert!(ConfigManager::validate_settings(&settings).is_err());

        settings.poll_interval_secs = 0.5;
        settings.max_off_attempts = 0;
        settings.mqtt_host = String::new();
        let errors = ConfigManager::validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_intervals() {
        let settings = Settings::default();
        assert_eq!(settings.poll_interval(), Duration::from_millis(500));
        assert_eq!(settings.idle_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_schema_completeness() {
        let schema = ConfigManager::schema();
        assert_eq!(schema.sequencer.max_off_attempts.default, 5);
        assert_eq!(schema.sequencer.idle_multiplier.default, 10);
        assert!(!schema.mqtt.mqtt_host.description.is_empty());
        assert!(schema.mqtt.mqtt_port.valid_range.is_some());
    }
}
