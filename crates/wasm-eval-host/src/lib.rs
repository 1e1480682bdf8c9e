//! Host functions imported by wasm-eval scripts.
//!
//! Scripts may import the following functions from the `env` module:
//!
//! | Import      | Signature                             | Effect                  |
//! |-------------|---------------------------------------|-------------------------|
//! | `env.hello` | `() -> ()`                            | Records "Hello World!"  |
//! | `env.log`   | `(level i32, ptr i32, len i32) -> ()` | Records a guest message |
//!
//! Any other import makes instantiation fail. The effects are diagnostic
//! only; scripts must not depend on them for their result.

pub mod linker;
pub mod logging;

pub use linker::{HELLO_IMPORT, HOST_MODULE, LOG_IMPORT, register_all};
pub use logging::{GREETING, GuestLog, MAX_MESSAGE_LEN};

use wasm_eval_common::EvalError;
use wasm_eval_core::{HostImports, ScriptContext};
use wasmtime::Linker;

/// The standard import set: `env.hello` and `env.log`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardImports;

impl HostImports for StandardImports {
    fn register(&self, linker: &mut Linker<ScriptContext>) -> Result<(), EvalError> {
        register_all(linker)
    }
}
