//! Wasmtime engine configuration and creation.
//!
//! A [`WasmEngine`] is built fresh for every invocation and dropped when the
//! invocation ends. It carries no state between scripts.

use std::sync::Arc;

use tracing::debug;
use wasmtime::{Config, Engine};

use wasm_eval_common::{EngineConfig, EvalError, OptLevel};

use crate::ledger::{Lease, ResourceKind, ResourceLedger};

/// Per-invocation WebAssembly engine wrapper.
///
/// The engine is configured for synchronous execution: no async support,
/// no fuel metering and no epoch interruption. A script runs to completion
/// or to a trap.
///
/// # Example
///
/// ```ignore
/// use wasm_eval_common::EngineConfig;
/// use wasm_eval_core::{ResourceLedger, WasmEngine};
///
/// let ledger = ResourceLedger::new();
/// let engine = WasmEngine::new(&EngineConfig::default(), &ledger)?;
/// ```
pub struct WasmEngine {
    engine: Engine,
    config: EngineConfig,
    _lease: Lease,
}

impl WasmEngine {
    /// Create a new WebAssembly engine with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Internal`] if Wasmtime rejects the configuration.
    pub fn new(config: &EngineConfig, ledger: &Arc<ResourceLedger>) -> Result<Self, EvalError> {
        let mut wasmtime_config = Config::new();

        wasmtime_config.cranelift_opt_level(match config.opt_level {
            OptLevel::None => wasmtime::OptLevel::None,
            OptLevel::Speed => wasmtime::OptLevel::Speed,
            OptLevel::SpeedAndSize => wasmtime::OptLevel::SpeedAndSize,
        });
        wasmtime_config.wasm_backtrace(config.wasm_backtrace);

        let engine = Engine::new(&wasmtime_config).map_err(|e| {
            EvalError::internal(format!("Failed to create Wasmtime engine: {e}"))
        })?;

        debug!(opt_level = ?config.opt_level, "Wasmtime engine created");

        Ok(Self {
            engine,
            config: config.clone(),
            _lease: ledger.acquire(ResourceKind::Engine),
        })
    }

    /// Get a reference to the inner Wasmtime engine.
    pub fn inner(&self) -> &Engine {
        &self.engine
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl std::fmt::Debug for WasmEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmEngine")
            .field("opt_level", &self.config.opt_level)
            .field("wasm_backtrace", &self.config.wasm_backtrace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_creation_default() {
        let ledger = ResourceLedger::new();
        let engine = WasmEngine::new(&EngineConfig::default(), &ledger);

        assert!(engine.is_ok());
        assert_eq!(ledger.live(ResourceKind::Engine), 1);
    }

    #[test]
    fn test_engine_creation_all_opt_levels() {
        let ledger = ResourceLedger::new();

        for opt_level in [OptLevel::None, OptLevel::Speed, OptLevel::SpeedAndSize] {
            let config = EngineConfig {
                opt_level,
                ..Default::default()
            };
            let engine = WasmEngine::new(&config, &ledger).unwrap();
            assert_eq!(engine.config().opt_level, opt_level);
        }

        assert_eq!(ledger.created(ResourceKind::Engine), 3);
        assert!(ledger.is_balanced());
    }

    #[test]
    fn test_engine_drop_releases_lease() {
        let ledger = ResourceLedger::new();
        let engine = WasmEngine::new(&EngineConfig::default(), &ledger).unwrap();

        drop(engine);
        assert_eq!(ledger.released(ResourceKind::Engine), 1);
    }

    #[test]
    fn test_engine_debug() {
        let ledger = ResourceLedger::new();
        let engine = WasmEngine::new(&EngineConfig::default(), &ledger).unwrap();

        let debug_str = format!("{engine:?}");
        assert!(debug_str.contains("WasmEngine"));
        assert!(debug_str.contains("opt_level"));
    }
}
