//! Configuration management for recfmt.

use std::env;
use std::path::Path;

use miette::Diagnostic;
use recfmt_encoding::{Charset, PackSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tracing_setup::{TracingConfig, TracingError};

/// Environment variable naming the YAML configuration file.
pub const CONFIG_PATH_ENV: &str = "RECFMT_CONFIG_PATH";

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecfmtConfig {
    /// Keep parsed layout files in the factory cache.
    #[serde(default = "default_cache_layouts")]
    pub cache_layouts: bool,

    /// Charset for layouts without a `text-encoding` directive.
    #[serde(default = "default_text_encoding")]
    pub default_text_encoding: String,

    /// Sign nibbles used instead of the charset convention.
    #[serde(default)]
    pub pack: Option<PackConfig>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_cache_layouts() -> bool {
    true
}

fn default_text_encoding() -> String {
    "UTF-8".to_string()
}

impl Default for RecfmtConfig {
    fn default() -> Self {
        Self {
            cache_layouts: default_cache_layouts(),
            default_text_encoding: default_text_encoding(),
            pack: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl RecfmtConfig {
    /// Load configuration from the file named by `RECFMT_CONFIG_PATH`, if
    /// any, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Apply `RECFMT_*` environment variable overrides.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if `RECFMT_CACHE_LAYOUTS` is not
    /// a boolean.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| env::var(name).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(cache) = lookup("RECFMT_CACHE_LAYOUTS") {
            self.cache_layouts =
                cache
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "RECFMT_CACHE_LAYOUTS",
                        message: format!("expected true or false, but was [{cache}]"),
                    })?;
        }
        if let Some(encoding) = lookup("RECFMT_TEXT_ENCODING") {
            self.default_text_encoding = encoding;
        }
        if let Some(level) = lookup("RECFMT_LOG_LEVEL") {
            self.logging.log_level = level;
        }
        if let Some(format) = lookup("RECFMT_LOG_FORMAT") {
            self.logging.log_format = format;
        }
        Ok(())
    }

    /// Resolve the default charset.
    pub fn text_encoding(&self) -> Result<Charset, ConfigError> {
        Charset::for_name(&self.default_text_encoding).map_err(|e| ConfigError::InvalidValue {
            key: "default_text_encoding",
            message: e.to_string(),
        })
    }

    /// Resolve the configured pack settings.
    pub fn pack_settings(&self) -> Result<Option<PackSettings>, ConfigError> {
        self.pack.as_ref().map(PackConfig::to_settings).transpose()
    }

    /// Tracing configuration derived from the logging section.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for an unknown log format.
    pub fn tracing(&self) -> Result<TracingConfig, ConfigError> {
        let log_format =
            self.logging
                .log_format
                .parse()
                .map_err(|e: TracingError| ConfigError::InvalidValue {
                    key: "log_format",
                    message: e.to_string(),
                })?;
        Ok(TracingConfig {
            log_level: self.logging.log_level.clone(),
            log_format,
        })
    }
}

/// Packed-decimal nibble defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackConfig {
    /// Pack byte; only its low nibble is kept.
    #[serde(default)]
    pub pack_nibble: u8,
    /// Sign nibble for non-negative values.
    pub positive_sign: u8,
    /// Sign nibble for negative values.
    pub negative_sign: u8,
}

impl PackConfig {
    /// Validate into [`PackSettings`].
    pub fn to_settings(&self) -> Result<PackSettings, ConfigError> {
        PackSettings::new(self.pack_nibble, self.positive_sign, self.negative_sign).map_err(|e| {
            ConfigError::InvalidValue {
                key: "pack",
                message: e.to_string(),
            }
        })
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter
    pub log_level: String,
    /// Log format (json, text, compact)
    pub log_format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: "text".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("IO error: {0}")]
    #[diagnostic(code(recfmt::config::io))]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid YAML for this structure.
    #[error("Parse error: {0}")]
    #[diagnostic(code(recfmt::config::parse))]
    Parse(#[from] serde_yaml::Error),

    /// A configuration value is out of range.
    #[error("invalid value for {key}: {message}")]
    #[diagnostic(code(recfmt::config::invalid_value))]
    InvalidValue {
        /// Configuration key.
        key: &'static str,
        /// What is wrong.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracing_setup::LogFormat;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = RecfmtConfig::default();
        assert!(config.cache_layouts);
        assert_eq!(config.default_text_encoding, "UTF-8");
        assert_eq!(config.pack_settings().unwrap(), None);
        assert_eq!(config.text_encoding().unwrap(), Charset::utf_8());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recfmt.yaml");
        std::fs::write(
            &path,
            "cache_layouts: false\ndefault_text_encoding: sjis\npack:\n  pack_nibble: 48\n  positive_sign: 4\n  negative_sign: 7\nlogging:\n  log_level: debug\n  log_format: json\n",
        )
        .unwrap();

        let config = RecfmtConfig::load_from_file(&path).unwrap();
        assert!(!config.cache_layouts);
        assert!(!config.text_encoding().unwrap().is_ebcdic());
        assert_eq!(
            config.pack_settings().unwrap(),
            Some(PackSettings::new(0x30, 4, 7).unwrap())
        );
        assert_eq!(config.tracing().unwrap().log_format, LogFormat::Json);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recfmt.yaml");
        std::fs::write(&path, "default_text_encoding: IBM-1047\n").unwrap();
        let config = RecfmtConfig::load_from_file(&path).unwrap();
        assert!(config.cache_layouts);
        assert!(config.text_encoding().unwrap().is_ebcdic());
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RECFMT_CACHE_LAYOUTS", "false"),
            ("RECFMT_TEXT_ENCODING", "windows-31j"),
            ("RECFMT_LOG_LEVEL", "trace"),
        ]
        .into_iter()
        .collect();
        let mut config = RecfmtConfig::default();
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert!(!config.cache_layouts);
        assert_eq!(config.default_text_encoding, "windows-31j");
        assert_eq!(config.logging.log_level, "trace");
        assert_eq!(config.logging.log_format, "text");
    }

    #[test]
    fn test_invalid_values() {
        let config = RecfmtConfig {
            default_text_encoding: "no-such-charset".to_string(),
            pack: Some(PackConfig {
                pack_nibble: 0,
                positive_sign: 3,
                negative_sign: 3,
            }),
            ..RecfmtConfig::default()
        };
        assert!(matches!(
            config.text_encoding(),
            Err(ConfigError::InvalidValue { key: "default_text_encoding", .. })
        ));
        assert!(config.pack_settings().is_err());
    }

    #[test]
    fn test_invalid_overrides_are_reported() {
        let mut config = RecfmtConfig::default();
        let err = config
            .apply_overrides(|name| (name == "RECFMT_CACHE_LAYOUTS").then(|| "ture".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "RECFMT_CACHE_LAYOUTS", .. }
        ));
        assert!(config.cache_layouts);

        config
            .apply_overrides(|name| (name == "RECFMT_LOG_FORMAT").then(|| "jsno".to_string()))
            .unwrap();
        assert!(matches!(
            config.tracing(),
            Err(ConfigError::InvalidValue { key: "log_format", .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            RecfmtConfig::load_from_file("/nonexistent/recfmt.yaml"),
            Err(ConfigError::Io(_))
        ));
    }
}
