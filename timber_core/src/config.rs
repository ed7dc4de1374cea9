//! Configuration file support.
//!
//! A logger can be described in TOML, by default at
//! `$XDG_CONFIG_HOME/timber/config.toml`.

use crate::formatter::{ColorMode, DefaultFormatter};
use crate::inspect::InspectOptions;
use crate::rotation::Compression;
use crate::stream::{FileStreamOptions, FileWriteStreamMode, InitialContent};
use crate::{Error, LevelSetting, Logger, LoggerOptions, Result, WriteLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Logger configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default = "default_console_level")]
    pub console_level: LevelSetting,

    /// Omitted means "same as console_level"
    #[serde(default)]
    pub write_level: Option<LevelSetting>,

    #[serde(default)]
    pub color: ColorMode,

    #[serde(default)]
    pub inspect: InspectOptions,

    #[serde(default)]
    pub file: Option<FileConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            label: None,
            console_level: default_console_level(),
            write_level: None,
            color: ColorMode::default(),
            inspect: InspectOptions::default(),
            file: None,
        }
    }
}

/// Log file configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileConfig {
    /// Relative paths are resolved against the data directory
    pub path: PathBuf,

    #[serde(default)]
    pub mode: FileWriteStreamMode,

    #[serde(default)]
    pub compression: Compression,

    /// Literal header; a timestamp header is used when omitted
    #[serde(default)]
    pub header: Option<String>,
}

fn default_console_level() -> LevelSetting {
    LevelSetting::Info
}

fn home_or_current(sub: &str) -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(sub))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl LogConfig {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: LogConfig = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_or_current(".config"));
        base.join("timber").join("config.toml")
    }

    /// Directory relative log paths are resolved against
    pub fn default_data_dir() -> PathBuf {
        let base = dirs::data_local_dir().unwrap_or_else(|| home_or_current(".local/share"));
        base.join("timber")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(file) = &self.file {
            if file.path.as_os_str().is_empty() {
                return Err(Error::Config("file.path must not be empty".into()));
            }
        }
        if self.inspect.break_length == 0 {
            return Err(Error::Config("inspect.break_length must be positive".into()));
        }
        Ok(())
    }

    /// Logger options described by this configuration, without a stream
    pub fn logger_options(&self) -> LoggerOptions {
        LoggerOptions {
            formatter: Arc::new(DefaultFormatter::new(self.color)),
            label: self.label.clone(),
            inspect: self.inspect.clone(),
            console_level: self.console_level.threshold(),
            write_level: WriteLevel::from(self.write_level),
            ..Default::default()
        }
    }

    /// Stream options for the configured file, if any
    pub fn file_options(&self, base_dir: &Path) -> Option<FileStreamOptions> {
        let file = self.file.as_ref()?;
        let initial_content = match &file.header {
            Some(header) => InitialContent::Text(header.clone()),
            None => InitialContent::Timestamp,
        };
        Some(
            FileStreamOptions::new(base_dir.join(&file.path))
                .mode(file.mode)
                .compression(file.compression)
                .initial_content(initial_content),
        )
    }
}

impl Logger {
    /// Build a root logger from configuration, opening its log file if one
    /// is configured. Relative file paths are resolved against `base_dir`.
    pub fn from_config(config: &LogConfig, base_dir: &Path) -> Result<Self> {
        config.validate()?;
        let logger = Logger::new(config.logger_options());
        if let Some(options) = config.file_options(base_dir) {
            logger.create_file_write_stream(options)?;
        }
        Ok(logger)
    }
}
