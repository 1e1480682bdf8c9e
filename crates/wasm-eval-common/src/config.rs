//! Configuration structures for wasm-eval.
//!
//! This module defines configuration options for the evaluation shim:
//! - [`RuntimeConfig`]: Top-level configuration containing all settings
//! - [`EngineConfig`]: Wasmtime engine settings applied to each fresh engine
//! - [`EvalConfig`]: Export resolution and argument marshalling policy

use serde::{Deserialize, Serialize};

/// Export name resolved when no other policy is configured.
pub const DEFAULT_EXPORT: &str = "run";

/// Top-level runtime configuration.
///
/// This structure can be loaded from files (TOML, JSON) and is cloned into
/// each evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuntimeConfig {
    /// Wasmtime engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Evaluation policy.
    #[serde(default)]
    pub eval: EvalConfig,
}

/// Wasmtime engine configuration.
///
/// A new engine is built from these settings for every invocation; nothing
/// here outlives a single evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Cranelift optimization level.
    #[serde(default)]
    pub opt_level: OptLevel,

    /// Capture wasm backtraces on traps.
    ///
    /// Backtraces are attached to the engine error as extra context; the
    /// trap message reported to the client is the same either way.
    #[serde(default = "defaults::wasm_backtrace")]
    pub wasm_backtrace: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            opt_level: OptLevel::default(),
            wasm_backtrace: defaults::wasm_backtrace(),
        }
    }
}

/// Cranelift optimization level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptLevel {
    /// No optimizations; fastest compilation.
    None,
    /// Optimize for execution speed.
    #[default]
    Speed,
    /// Optimize for speed and code size.
    SpeedAndSize,
}

/// Export resolution and argument marshalling policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EvalConfig {
    /// Which export to invoke.
    #[serde(default)]
    pub export: ExportPolicy,

    /// Whether the script argument is passed to the export.
    #[serde(default)]
    pub argument: ArgumentPolicy,

    /// Integer width of the export's parameter.
    #[serde(default)]
    pub width: ArgumentWidth,

    /// Narrow out-of-range values instead of rejecting them.
    ///
    /// Only meaningful for [`ArgumentWidth::I32`].
    #[serde(default)]
    pub truncate: bool,
}

/// How the export to invoke is located in the instance.
///
/// In TOML: `export = { named = "run" }` or `export = "first"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPolicy {
    /// Resolve the export with this exact name.
    Named(String),
    /// Resolve the first export the module declares.
    First,
}

impl Default for ExportPolicy {
    fn default() -> Self {
        Self::Named(DEFAULT_EXPORT.to_string())
    }
}

impl std::fmt::Display for ExportPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => write!(f, "named `{name}`"),
            Self::First => write!(f, "first export"),
        }
    }
}

/// Whether the script argument reaches the export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentPolicy {
    /// Call the export with the argument as its single parameter.
    #[default]
    Pass,
    /// Validate the argument but call the export with no parameters.
    Ignore,
}

/// Wasm value type the argument is marshalled into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentWidth {
    /// 32-bit integer parameter.
    #[default]
    I32,
    /// 64-bit integer parameter.
    I64,
}

/// Default value functions for serde.
mod defaults {
    pub const fn wasm_backtrace() -> bool {
        false
    }
}
