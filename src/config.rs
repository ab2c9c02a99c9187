//! Configuration for generation and post-processing

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration options for generation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// chrono format for the long date form
    pub date_format: String,

    /// Rewrite numeric dates in date-typed fields
    pub format_dates: bool,

    /// Split method text into identifier and name lines
    pub split_methods: bool,

    /// External converter run on the filled grid, if any
    pub conversion: Option<ConversionConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            date_format: "%Y年%m月%d日".to_string(),
            format_dates: true,
            split_methods: true,
            conversion: None,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string; missing keys keep defaults
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the long date format
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Enable or disable date rewriting
    pub fn with_format_dates(mut self, enabled: bool) -> Self {
        self.format_dates = enabled;
        self
    }

    /// Enable or disable method-text splitting
    pub fn with_split_methods(mut self, enabled: bool) -> Self {
        self.split_methods = enabled;
        self
    }

    /// Set the post-processing converter
    pub fn with_conversion(mut self, conversion: ConversionConfig) -> Self {
        self.conversion = Some(conversion);
        self
    }
}

/// An external program that converts the filled grid into another format.
///
/// `{input}` and `{output}` in `args` are replaced with file paths.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversionConfig {
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extension of the converted file
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_args() -> Vec<String> {
    vec!["{input}".to_string(), "{output}".to_string()]
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_extension() -> String {
    "pdf".to_string()
}

impl ConversionConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: default_args(),
            timeout_secs: default_timeout_secs(),
            extension: default_extension(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
