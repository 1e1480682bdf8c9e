//! WebAssembly instance lifecycle management.
//!
//! This module provides [`InstanceRunner`], which drives the steps after
//! compilation:
//!
//! 1. Link host functions with the module
//! 2. Instantiate the module in the invocation's store
//! 3. Resolve the export to invoke
//! 4. Call it and marshal the result
//!
//! At steps 2 and 4 the engine can fail in two ways: with an error (nothing
//! ran, e.g. an unknown import or a parameter mismatch) or with a [`Trap`]
//! (guest code ran and faulted). The two are reported as different
//! [`EvalError`] variants.

use std::sync::Arc;

use tracing::{debug, instrument};
use wasmtime::{Func, Instance, Linker, Store, Trap, Val, ValType};

use wasm_eval_common::{EvalError, ExportPolicy};

use crate::ledger::{ResourceKind, ResourceLedger};
use crate::store::ScriptContext;
use crate::{CompiledModule, WasmEngine};

/// Value produced by a successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    /// The export returned a single integer (`i32` results are sign-extended).
    Integer(i64),

    /// The export returned nothing.
    Unit,
}

impl ExecutionResult {
    /// Returns the integer result, if any.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ExecutionResult::Integer(value) => Some(*value),
            ExecutionResult::Unit => None,
        }
    }

    /// Returns `true` if the export returned nothing.
    pub fn is_unit(&self) -> bool {
        matches!(self, ExecutionResult::Unit)
    }
}

/// The fixed set of host functions offered to guest modules.
///
/// Implementations define functions on the linker before instantiation. Any
/// import a module declares that is not defined here makes instantiation
/// fail with [`EvalError::Instantiation`].
pub trait HostImports: Send + Sync {
    /// Define this import set on the linker.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Internal`] if the engine rejects a definition.
    fn register(&self, linker: &mut Linker<ScriptContext>) -> Result<(), EvalError>;
}

/// No host imports at all.
impl HostImports for () {
    fn register(&self, _linker: &mut Linker<ScriptContext>) -> Result<(), EvalError> {
        Ok(())
    }
}

/// Instance lifecycle manager for one invocation.
///
/// The runner owns the linker, which is bound to the invocation's engine.
pub struct InstanceRunner {
    linker: Linker<ScriptContext>,
    ledger: Arc<ResourceLedger>,
}

impl InstanceRunner {
    /// Create a new instance runner for the given engine.
    pub fn new(engine: &WasmEngine, ledger: &Arc<ResourceLedger>) -> Self {
        Self {
            linker: Linker::new(engine.inner()),
            ledger: Arc::clone(ledger),
        }
    }

    /// Get a mutable reference to the linker.
    ///
    /// Use this to register host functions.
    pub fn linker_mut(&mut self) -> &mut Linker<ScriptContext> {
        &mut self.linker
    }

    /// Instantiate a compiled module, running its start function if it has one.
    ///
    /// The instance's lease is tied to the store.
    ///
    /// # Errors
    ///
    /// - [`EvalError::InstantiationTrap`] if the start function trapped
    /// - [`EvalError::Instantiation`] for any other linking failure
    #[instrument(skip_all)]
    pub fn instantiate(
        &self,
        store: &mut Store<ScriptContext>,
        module: &CompiledModule,
    ) -> Result<Instance, EvalError> {
        let instance = self
            .linker
            .instantiate(&mut *store, module.inner())
            .map_err(|e| match trap_message(&e) {
                Some(message) => EvalError::instantiation_trap(message),
                None => EvalError::instantiation(format!("{e:#}")),
            })?;

        store
            .data_mut()
            .hold(self.ledger.acquire(ResourceKind::Instance));
        debug!("Module instantiated");

        Ok(instance)
    }

    /// Resolve the function export selected by `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::ExportResolution`] if no export matches or the
    /// match is not a function.
    pub fn resolve(
        &self,
        store: &mut Store<ScriptContext>,
        instance: &Instance,
        module: &CompiledModule,
        policy: &ExportPolicy,
    ) -> Result<Func, EvalError> {
        let name = match policy {
            ExportPolicy::Named(name) => name.as_str(),
            ExportPolicy::First => module
                .first_export()
                .ok_or_else(|| EvalError::export_resolution("module declares no exports"))?,
        };

        let export = instance
            .get_export(&mut *store, name)
            .ok_or_else(|| EvalError::export_resolution(format!("export `{name}` not found")))?;

        let func = export.into_func().ok_or_else(|| {
            EvalError::export_resolution(format!("export `{name}` is not a function"))
        })?;

        debug!(export = name, "Export resolved");
        Ok(func)
    }

    /// Call a resolved export with the given parameters.
    ///
    /// The result signature is checked before any guest code runs: the export
    /// must return nothing or a single `i32`/`i64`. Parameter arity and types
    /// are checked by the engine.
    ///
    /// # Errors
    ///
    /// - [`EvalError::CallTrap`] if the function trapped
    /// - [`EvalError::Call`] if the call was rejected before execution
    #[instrument(skip_all, fields(params = params.len()))]
    pub fn invoke(
        &self,
        store: &mut Store<ScriptContext>,
        func: &Func,
        params: &[Val],
    ) -> Result<ExecutionResult, EvalError> {
        let ty = func.ty(&*store);
        let result_types: Vec<ValType> = ty.results().collect();

        match result_types.as_slice() {
            [] | [ValType::I32 | ValType::I64] => {}
            other => {
                return Err(EvalError::call(format!(
                    "unsupported result signature {other:?}: expected no result or a single i32/i64"
                )));
            }
        }

        let mut results = vec![Val::I32(0); result_types.len()];
        func.call(&mut *store, params, &mut results)
            .map_err(|e| match trap_message(&e) {
                Some(message) => EvalError::call_trap(message),
                None => EvalError::call(format!("{e:#}")),
            })?;

        match results.first() {
            None => Ok(ExecutionResult::Unit),
            Some(Val::I32(value)) => Ok(ExecutionResult::Integer(i64::from(*value))),
            Some(Val::I64(value)) => Ok(ExecutionResult::Integer(*value)),
            Some(other) => Err(EvalError::call(format!(
                "unexpected result value {other:?}"
            ))),
        }
    }
}

/// Extract the trap message if the engine error was caused by a trap.
fn trap_message(error: &wasmtime::Error) -> Option<String> {
    error.downcast_ref::<Trap>().map(ToString::to_string)
}

impl std::fmt::Debug for InstanceRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceRunner").finish_non_exhaustive()
    }
}
