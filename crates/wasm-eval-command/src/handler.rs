//! `EVALWASM` command handler.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error};

use wasm_eval_common::{EvalError, RuntimeConfig};

use crate::reply::Reply;

#[cfg(feature = "wasm")]
use crate::args;
#[cfg(feature = "wasm")]
use tracing::instrument;
#[cfg(feature = "wasm")]
use wasm_eval_core::{Evaluator, ResourceLedger};
#[cfg(feature = "wasm")]
use wasm_eval_host::StandardImports;

/// Lowercase command name, as used in arity errors.
pub const COMMAND_NAME: &str = "evalwasm";

/// Handler for `EVALWASM <script> <arg>`.
///
/// One handler can serve any number of invocations, including concurrent
/// ones; each invocation builds its own engine.
#[derive(Debug)]
pub struct EvalWasm {
    #[cfg(feature = "wasm")]
    evaluator: Evaluator<StandardImports>,
}

#[cfg(feature = "wasm")]
impl EvalWasm {
    /// Create a handler with the standard host imports.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            evaluator: Evaluator::new(config, StandardImports),
        }
    }

    /// Handle one invocation. `argv[0]` is the command name.
    #[instrument(skip_all, fields(argc = argv.len()))]
    pub fn handle(&self, argv: &[Bytes]) -> Reply {
        let args = match args::parse(argv) {
            Ok(args) => args,
            Err(e) => {
                debug!(error = %e, "Rejected invocation");
                return Reply::from(e);
            }
        };

        match self.evaluator.evaluate(args.script, args.script_arg) {
            Ok(result) => Reply::from(result),
            Err(e) => Reply::from(e),
        }
    }

    /// Get the runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        self.evaluator.config()
    }

    /// Ledger of every engine resource created by this handler.
    pub fn ledger(&self) -> &Arc<ResourceLedger> {
        self.evaluator.ledger()
    }
}

#[cfg(not(feature = "wasm"))]
impl EvalWasm {
    /// Create a handler. The configuration is ignored in this build.
    pub fn new(config: RuntimeConfig) -> Self {
        let _ = config;
        Self {}
    }

    /// Handle one invocation.
    ///
    /// Always replies with [`EvalError::CapabilityDisabled`]; the arguments
    /// are not inspected.
    pub fn handle(&self, argv: &[Bytes]) -> Reply {
        debug!(argc = argv.len(), "WASM support not compiled in");
        Reply::from(EvalError::CapabilityDisabled)
    }
}

impl EvalWasm {
    /// Handle one invocation on the blocking thread pool.
    ///
    /// Compilation and guest execution are synchronous, so async callers
    /// must not run [`handle`](Self::handle) on a runtime worker.
    pub async fn handle_async(self: Arc<Self>, argv: Vec<Bytes>) -> Reply {
        match tokio::task::spawn_blocking(move || self.handle(&argv)).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Evaluation task failed");
                Reply::from(EvalError::internal(format!("evaluation task failed: {e}")))
            }
        }
    }
}
