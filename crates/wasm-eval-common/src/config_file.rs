//! Configuration file structures for wasm-eval.
//!
//! This module defines structures for TOML configuration files:
//! - [`ConfigFile`]: Top-level configuration file structure
//! - [`LoggingConfig`]: Log filter and output format

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::RuntimeConfig;

/// Top-level configuration file structure.
///
/// # Example
///
/// ```toml
/// [runtime.engine]
/// opt_level = "speed"
/// wasm_backtrace = false
///
/// [runtime.eval]
/// export = { named = "run" }
/// argument = "pass"
/// width = "i32"
/// truncate = false
///
/// [logging]
/// filter = "info,wasm_eval=debug"
/// json = false
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    /// Runtime configuration (engine + evaluation policy).
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigFileError::Io {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed as TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigFileError> {
        toml::from_str(content).map_err(|e| ConfigFileError::Parse {
            message: e.to_string(),
        })
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is not set.
    #[serde(default = "defaults::log_filter")]
    pub filter: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: defaults::log_filter(),
            json: false,
        }
    }
}

/// Configuration file errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("Failed to parse config file: {message}")]
    Parse { message: String },
}

/// Default value functions for serde.
mod defaults {
    pub fn log_filter() -> String {
        "info,wasm_eval=debug".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArgumentPolicy, ArgumentWidth, ExportPolicy, OptLevel};

    #[test]
    fn test_default_config_file() {
        let config = ConfigFile::default();

        assert_eq!(config.logging.filter, "info,wasm_eval=debug");
        assert!(!config.logging.json);
        assert_eq!(config.runtime, RuntimeConfig::default());
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [logging]
            json = true
        "#;

        let config = ConfigFile::from_toml(toml).unwrap();

        assert!(config.logging.json);
        // Defaults applied
        assert_eq!(config.logging.filter, "info,wasm_eval=debug");
        assert_eq!(config.runtime.eval.export, ExportPolicy::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [runtime.engine]
            opt_level = "none"
            wasm_backtrace = true

            [runtime.eval]
            export = "first"
            argument = "ignore"
            width = "i64"
            truncate = true

            [logging]
            filter = "warn"
            json = true
        "#;

        let config = ConfigFile::from_toml(toml).unwrap();

        assert_eq!(config.runtime.engine.opt_level, OptLevel::None);
        assert!(config.runtime.engine.wasm_backtrace);
        assert_eq!(config.runtime.eval.export, ExportPolicy::First);
        assert_eq!(config.runtime.eval.argument, ArgumentPolicy::Ignore);
        assert_eq!(config.runtime.eval.width, ArgumentWidth::I64);
        assert!(config.runtime.eval.truncate);
        assert_eq!(config.logging.filter, "warn");
        assert!(config.logging.json);
    }

    #[test]
    fn test_parse_named_export() {
        let toml = r#"
            [runtime.eval]
            export = { named = "serverLog" }
        "#;

        let config = ConfigFile::from_toml(toml).unwrap();

        assert_eq!(
            config.runtime.eval.export,
            ExportPolicy::Named("serverLog".into())
        );
    }

    #[test]
    fn test_parse_invalid_toml() {
        let invalid = "this is not valid toml [";
        let result = ConfigFile::from_toml(invalid);
        assert!(matches!(result, Err(ConfigFileError::Parse { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigFile::from_file("/nonexistent/wasm-eval.toml");
        assert!(matches!(result, Err(ConfigFileError::Io { .. })));
    }
}
