//! The evaluation pipeline.
//!
//! [`Evaluator::evaluate`] runs one script end to end:
//!
//! ```text
//! marshal arg -> open session (engine, store) -> translate -> compile
//!   -> register imports -> instantiate -> resolve export -> call -> result
//! ```
//!
//! Every step may short-circuit with an [`EvalError`]. All engine objects are
//! owned by a [`Session`] whose field order fixes the teardown order
//! (module, then store, then engine), so success and every failure path
//! release resources the same way.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use wasmtime::{Store, Val};

use wasm_eval_common::{ArgumentPolicy, ArgumentWidth, EvalConfig, EvalError, RuntimeConfig};

use crate::WasmEngine;
use crate::instance::{ExecutionResult, HostImports, InstanceRunner};
use crate::ledger::ResourceLedger;
use crate::module::{CompiledModule, translate_wat};
use crate::store::{ScriptContext, create_store};

/// Runs scripts with a fixed configuration and host import set.
///
/// The evaluator itself holds no engine state; each call to
/// [`evaluate`](Self::evaluate) builds and tears down its own engine, so an
/// evaluator can be shared between threads.
pub struct Evaluator<I> {
    config: RuntimeConfig,
    imports: I,
    ledger: Arc<ResourceLedger>,
}

impl<I: HostImports> Evaluator<I> {
    /// Create an evaluator.
    pub fn new(config: RuntimeConfig, imports: I) -> Self {
        Self {
            config,
            imports,
            ledger: ResourceLedger::new(),
        }
    }

    /// Get the runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Ledger of every engine resource this evaluator has created.
    pub fn ledger(&self) -> &Arc<ResourceLedger> {
        &self.ledger
    }

    /// Evaluate a WAT script with a single integer argument.
    ///
    /// # Errors
    ///
    /// Returns the [`EvalError`] of the first step that failed. Argument
    /// marshalling failures are reported before any engine object exists.
    #[instrument(skip(self, script), fields(script_len = script.len()))]
    pub fn evaluate(&self, script: &str, script_arg: i64) -> Result<ExecutionResult, EvalError> {
        let start = Instant::now();

        let result = marshal_argument(&self.config.eval, script_arg)
            .and_then(|params| self.run(script, &params));

        match &result {
            Ok(value) => {
                info!(
                    duration_us = start.elapsed().as_micros(),
                    result = ?value,
                    "Evaluation completed"
                );
            }
            Err(e) if e.is_internal() => {
                error!(kind = e.kind(), error = %e, "Evaluation aborted by internal fault");
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Evaluation failed");
            }
        }

        result
    }

    fn run(&self, script: &str, params: &[Val]) -> Result<ExecutionResult, EvalError> {
        let mut session = Session::open(&self.config, &self.ledger)?;

        let wasm = translate_wat(script)?;
        let compiled = CompiledModule::from_binary(&session.engine, &wasm, &self.ledger);
        drop(wasm);
        let module = session.module.insert(compiled?);

        let mut runner = InstanceRunner::new(&session.engine, &self.ledger);
        self.imports.register(runner.linker_mut())?;

        let instance = runner.instantiate(&mut session.store, module)?;
        let func = runner.resolve(
            &mut session.store,
            &instance,
            module,
            &self.config.eval.export,
        )?;
        let result = runner.invoke(&mut session.store, &func, params)?;

        debug!(
            host_calls = session.store.data().host_calls,
            guest_logs = session.store.data().logs.len(),
            "Export returned"
        );

        Ok(result)
    }
}

impl<I> std::fmt::Debug for Evaluator<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Engine objects of one invocation.
///
/// Fields drop in declaration order: the module first, then the store (and
/// with it the instance and host state), then the engine.
struct Session {
    module: Option<CompiledModule>,
    store: Store<ScriptContext>,
    engine: WasmEngine,
}

impl Session {
    fn open(config: &RuntimeConfig, ledger: &Arc<ResourceLedger>) -> Result<Self, EvalError> {
        let engine = WasmEngine::new(&config.engine, ledger)?;
        let invocation_id = Uuid::new_v4().to_string();
        let store = create_store(&engine, ledger, invocation_id);

        Ok(Self {
            module: None,
            store,
            engine,
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(
            invocation_id = %self.store.data().invocation_id,
            compiled = self.module.is_some(),
            elapsed_us = self.store.data().elapsed().as_micros(),
            "Tearing down session"
        );
    }
}

/// Convert the script argument into the export's parameter list.
///
/// The argument is validated against the configured width even when
/// [`ArgumentPolicy::Ignore`] drops it from the call.
#[allow(clippy::cast_possible_truncation)]
fn marshal_argument(config: &EvalConfig, script_arg: i64) -> Result<Vec<Val>, EvalError> {
    let value = match config.width {
        ArgumentWidth::I64 => Val::I64(script_arg),
        ArgumentWidth::I32 => match i32::try_from(script_arg) {
            Ok(narrow) => Val::I32(narrow),
            Err(_) if config.truncate => Val::I32(script_arg as i32),
            Err(_) => {
                return Err(EvalError::invalid_argument(format!(
                    "{script_arg} does not fit in a 32-bit integer"
                )));
            }
        },
    };

    Ok(match config.argument {
        ArgumentPolicy::Pass => vec![value],
        ArgumentPolicy::Ignore => Vec::new(),
    })
}
