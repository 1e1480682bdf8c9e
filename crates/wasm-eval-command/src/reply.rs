//! Reply values returned to the client.
//!
//! Encoding a [`Reply`] onto the wire belongs to the surrounding server;
//! this module only decides which reply an invocation produces.

use bytes::Bytes;

use wasm_eval_common::EvalError;

/// Bulk payload returned when the export produced no result.
pub const SUCCESS_MARKER: &str = "Success";

/// Reply to a single `EVALWASM` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Integer result of the export.
    Integer(i64),

    /// Bulk string (the success marker for unit exports).
    Bulk(Bytes),

    /// Error reply, including its `ERR ` code prefix.
    Error(String),
}

impl Reply {
    /// Create the success marker reply.
    pub fn success() -> Self {
        Reply::Bulk(Bytes::from_static(SUCCESS_MARKER.as_bytes()))
    }

    /// Create an error reply from an evaluation error.
    ///
    /// Error replies are single-line, so CR and LF in engine diagnostics
    /// become spaces.
    pub fn error(error: &EvalError) -> Self {
        let message = format!("ERR {error}")
            .chars()
            .map(|c| if matches!(c, '\r' | '\n') { ' ' } else { c })
            .collect();
        Reply::Error(message)
    }

    /// Returns `true` if this is an error reply.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl From<EvalError> for Reply {
    fn from(error: EvalError) -> Self {
        Reply::error(&error)
    }
}

#[cfg(feature = "wasm")]
impl From<wasm_eval_core::ExecutionResult> for Reply {
    fn from(result: wasm_eval_core::ExecutionResult) -> Self {
        match result {
            wasm_eval_core::ExecutionResult::Integer(value) => Reply::Integer(value),
            wasm_eval_core::ExecutionResult::Unit => Reply::success(),
        }
    }
}

/// Renders the reply the way `redis-cli` prints it.
impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Integer(value) => write!(f, "(integer) {value}"),
            Reply::Bulk(bytes) => write!(f, "\"{}\"", String::from_utf8_lossy(bytes)),
            Reply::Error(message) => write!(f, "(error) {message}"),
        }
    }
}
