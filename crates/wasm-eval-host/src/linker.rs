//! Definitions of the `env` imports on a per-invocation linker.
//!
//! Every function here counts itself in [`ScriptContext::host_calls`] and
//! never traps, whatever the guest passes.

use tracing::{info, warn};
use wasmtime::{Caller, Linker};

use wasm_eval_common::EvalError;
use wasm_eval_core::ScriptContext;

use crate::logging::{GuestLog, level_from_code};

/// Import module name all host functions live under.
pub const HOST_MODULE: &str = "env";

/// Name of the zero-argument, zero-result callback.
pub const HELLO_IMPORT: &str = "hello";

/// Name of the guest logging function.
pub const LOG_IMPORT: &str = "log";

/// Register all standard host functions on a core module linker.
///
/// This registers the following host functions:
/// - `env::hello` - Zero-argument callback
/// - `env::log` - Logging function for guest code
///
/// # Errors
///
/// Returns an error if function registration fails.
pub fn register_all(linker: &mut Linker<ScriptContext>) -> Result<(), EvalError> {
    register_hello(linker)?;
    register_logging(linker)?;
    Ok(())
}

/// Register the `env::hello` callback.
///
/// Takes no arguments and returns nothing. Each call bumps the context's
/// host call counter and records a greeting.
pub fn register_hello(linker: &mut Linker<ScriptContext>) -> Result<(), EvalError> {
    linker
        .func_wrap(
            HOST_MODULE,
            HELLO_IMPORT,
            |mut caller: Caller<'_, ScriptContext>| {
                let ctx = caller.data_mut();
                ctx.host_calls += 1;
                info!(invocation_id = %ctx.invocation_id, "Calling back...");
                GuestLog::greet(ctx);
            },
        )
        .map_err(|e| {
            EvalError::internal(format!("Failed to register {HELLO_IMPORT} function: {e}"))
        })?;

    Ok(())
}

/// Register the logging host function.
///
/// Registers `env::log(level: i32, ptr: i32, len: i32)` which allows guest
/// code to emit logs at various levels (debug, info, warn, error).
///
/// # Memory Protocol
///
/// The guest passes:
/// - `level`: Log level (0=debug, 1=info, 2=warn, 3=error)
/// - `ptr`: Pointer to the message string in guest memory
/// - `len`: Length of the message in bytes (UTF-8)
///
/// The guest must export its memory as `memory`. Bad pointers are logged
/// and ignored; they never trap.
pub fn register_logging(linker: &mut Linker<ScriptContext>) -> Result<(), EvalError> {
    linker
        .func_wrap(
            HOST_MODULE,
            LOG_IMPORT,
            |mut caller: Caller<'_, ScriptContext>, level: i32, ptr: i32, len: i32| {
                caller.data_mut().host_calls += 1;

                let (Ok(start), Ok(len)) = (usize::try_from(ptr), usize::try_from(len)) else {
                    warn!(ptr, len, "Invalid pointer or length (negative value)");
                    return;
                };

                let Some(memory) = caller
                    .get_export("memory")
                    .and_then(wasmtime::Extern::into_memory)
                else {
                    warn!("Memory export not found in guest module");
                    return;
                };

                // Copy the message out so the borrow of guest memory ends
                // before the context is borrowed mutably.
                let message = {
                    let data = memory.data(&caller);
                    let Some(end) = start.checked_add(len) else {
                        warn!(start, len, "Pointer + length overflow");
                        return;
                    };

                    let Some(bytes) = data.get(start..end) else {
                        warn!(
                            start,
                            end,
                            memory_size = data.len(),
                            "Memory access out of bounds"
                        );
                        return;
                    };

                    String::from_utf8_lossy(bytes).into_owned()
                };

                GuestLog::record(caller.data_mut(), level_from_code(level), &message);
            },
        )
        .map_err(|e| {
            EvalError::internal(format!("Failed to register {LOG_IMPORT} function: {e}"))
        })?;

    Ok(())
}
