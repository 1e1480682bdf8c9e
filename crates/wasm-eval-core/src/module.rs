//! WAT translation and WebAssembly module compilation.
//!
//! Translation and compilation are separate steps so that malformed text
//! ([`EvalError::Parse`]) is distinguishable from a well-formed module that
//! fails validation ([`EvalError::Compile`]).

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument};
use wasmtime::Module;

use wasm_eval_common::EvalError;

use crate::WasmEngine;
use crate::ledger::{Lease, ResourceKind, ResourceLedger};

/// Translate WebAssembly text into binary module bytes.
///
/// # Errors
///
/// Returns [`EvalError::Parse`] carrying the translator's diagnostic if the
/// text is not well-formed WAT.
#[instrument(skip(source), fields(source_len = source.len()))]
pub fn translate_wat(source: &str) -> Result<Vec<u8>, EvalError> {
    let bytes = wat::parse_str(source).map_err(|e| EvalError::parse(e.to_string()))?;
    debug!(bytes_len = bytes.len(), "WAT translated");
    Ok(bytes)
}

/// A compiled WebAssembly module.
///
/// Owned by a single invocation and never reused.
pub struct CompiledModule {
    inner: Module,
    _lease: Lease,
}

impl CompiledModule {
    /// Compile a core module from WebAssembly bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Compile`] with the engine's diagnostic if the
    /// bytes are not a valid module.
    #[instrument(skip(engine, bytes, ledger), fields(bytes_len = bytes.len()))]
    pub fn from_binary(
        engine: &WasmEngine,
        bytes: &[u8],
        ledger: &Arc<ResourceLedger>,
    ) -> Result<Self, EvalError> {
        let start = Instant::now();

        let module = Module::from_binary(engine.inner(), bytes)
            .map_err(|e| EvalError::compile(format!("{e:#}")))?;

        debug!(
            duration_us = start.elapsed().as_micros(),
            exports = module.exports().len(),
            "Core module compiled"
        );

        Ok(Self {
            inner: module,
            _lease: ledger.acquire(ResourceKind::Module),
        })
    }

    /// Get the inner Wasmtime module.
    pub fn inner(&self) -> &Module {
        &self.inner
    }

    /// Name of the first export the module declares, if any.
    pub fn first_export(&self) -> Option<&str> {
        self.inner.exports().next().map(|export| export.name())
    }
}

impl std::fmt::Debug for CompiledModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledModule")
            .field("exports", &self.inner.exports().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_eval_common::EngineConfig;

    // Minimal valid Wasm module (empty module)
    const MINIMAL_WASM: &[u8] = &[
        0x00, 0x61, 0x73, 0x6d, // magic: \0asm
        0x01, 0x00, 0x00, 0x00, // version: 1
    ];

    fn engine(ledger: &Arc<ResourceLedger>) -> WasmEngine {
        WasmEngine::new(&EngineConfig::default(), ledger).unwrap()
    }

    #[test]
    fn test_translate_valid_wat() {
        let bytes = translate_wat("(module)").unwrap();
        assert!(bytes.starts_with(MINIMAL_WASM));
    }

    #[test]
    fn test_translate_malformed_wat() {
        let result = translate_wat("(module (func");
        assert!(matches!(result, Err(EvalError::Parse { .. })));
    }

    #[test]
    fn test_module_compilation() {
        let ledger = ResourceLedger::new();
        let engine = engine(&ledger);

        let module = CompiledModule::from_binary(&engine, MINIMAL_WASM, &ledger).unwrap();
        assert!(module.first_export().is_none());
        assert_eq!(ledger.live(ResourceKind::Module), 1);

        drop(module);
        assert_eq!(ledger.live(ResourceKind::Module), 0);
    }

    #[test]
    fn test_validation_failure_creates_no_module() {
        let ledger = ResourceLedger::new();
        let engine = engine(&ledger);

        // Well-formed text, but the body leaves an i64 where an i32 is expected.
        let bytes = translate_wat(r#"(module (func (result i32) i64.const 1))"#).unwrap();
        let result = CompiledModule::from_binary(&engine, &bytes, &ledger);

        assert!(matches!(result, Err(EvalError::Compile { .. })));
        assert_eq!(ledger.created(ResourceKind::Module), 0);
    }

    #[test]
    fn test_malformed_binary_reports_engine_diagnostic() {
        let ledger = ResourceLedger::new();
        let engine = engine(&ledger);

        let expected = Module::from_binary(engine.inner(), b"\0as")
            .map(|_| ())
            .unwrap_err();
        let err = CompiledModule::from_binary(&engine, b"\0as", &ledger).unwrap_err();

        assert_eq!(err, EvalError::compile(format!("{expected:#}")));
        assert_eq!(ledger.created(ResourceKind::Module), 0);
    }

    #[test]
    fn test_first_export_follows_declaration_order() {
        let ledger = ResourceLedger::new();
        let engine = engine(&ledger);
        let bytes = translate_wat(
            r#"
            (module
                (func (export "compute") (result i32) i32.const 1)
                (func (export "run") (result i32) i32.const 2)
            )
            "#,
        )
        .unwrap();

        let module = CompiledModule::from_binary(&engine, &bytes, &ledger).unwrap();
        assert_eq!(module.first_export(), Some("compute"));
    }

    #[test]
    fn test_module_debug() {
        let ledger = ResourceLedger::new();
        let engine = engine(&ledger);
        let module = CompiledModule::from_binary(&engine, MINIMAL_WASM, &ledger).unwrap();

        assert_eq!(format!("{module:?}"), "CompiledModule { exports: 0, .. }");
    }
}
