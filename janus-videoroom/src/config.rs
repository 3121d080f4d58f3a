use crate::command::JanusPlugins;
use crate::logging;
use crate::session::DEFAULT_CHANNEL_CAPACITY;
use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoroomConfig {
    /// Plugin package requested when attaching subscriber handles
    pub plugin: String,
    /// Inputs a session queues before callers wait
    pub channel_capacity: usize,
    pub logging: LoggingConfig,
}

impl Default for VideoroomConfig {
    fn default() -> Self {
        Self {
            plugin: JanusPlugins::VIDEOROOM.to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            logging: LoggingConfig::default(),
        }
    }
}

/// Output layout of the log subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level of the adapter's own events
    pub level: String,
    /// Level of every other target (media engine, transport, runtime)
    pub default_level: String,
    pub format: LogFormat,
    /// Append to this file instead of stdout
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            default_level: "warn".to_string(),
            format: LogFormat::default(),
            file_path: None,
        }
    }
}

impl VideoroomConfig {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // VIDEOROOM_CHANNEL_CAPACITY, VIDEOROOM_LOGGING__FILE_PATH, ...
        builder = builder.add_source(
            Environment::with_prefix("VIDEOROOM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load configuration, then install the log subscriber it describes
    pub fn init(config_file: Option<&str>) -> anyhow::Result<Self> {
        let config = Self::load(config_file)?;
        logging::init_logging(&config.logging)?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }
}
