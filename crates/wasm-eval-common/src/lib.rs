//! Common errors and configuration for wasm-eval.
//!
//! This crate has no engine dependency so that it can be used by builds
//! compiled without WASM support:
//! - [`EvalError`]: the uniform error taxonomy of an `EVALWASM` invocation
//! - [`RuntimeConfig`]: engine and evaluation policy settings
//! - [`ConfigFile`]: TOML configuration file loading

pub mod config;
pub mod config_file;
pub mod error;

pub use config::{
    ArgumentPolicy, ArgumentWidth, EngineConfig, EvalConfig, ExportPolicy, OptLevel, RuntimeConfig,
};
pub use config_file::{ConfigFile, ConfigFileError, LoggingConfig};
pub use error::EvalError;
