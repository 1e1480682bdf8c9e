//! Guest log capture.
//!
//! Messages a script emits through its host imports are appended to the
//! invocation's [`ScriptContext`] and mirrored to `tracing` under the
//! `wasm_eval::guest` target, tagged with the invocation id. Both are
//! bounded: per message by [`MAX_MESSAGE_LEN`], per invocation by
//! [`MAX_LOG_ENTRIES`].

use tracing::{debug, error, info, warn};
use wasm_eval_core::{LogLevel, MAX_LOG_ENTRIES, ScriptContext};

/// Longest message kept per entry, in bytes. Longer messages are cut at the
/// nearest character boundary below this length.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Greeting recorded by `env.hello`.
pub const GREETING: &str = "Hello World!";

/// Records guest log entries for one invocation.
pub struct GuestLog;

impl GuestLog {
    /// Append a message to the context and mirror it to `tracing`.
    ///
    /// Once the context holds [`MAX_LOG_ENTRIES`] further messages are
    /// dropped; the first dropped message emits a single warning.
    pub fn record(ctx: &mut ScriptContext, level: LogLevel, message: &str) {
        let message = clip(message);

        if !ctx.log(level, message.to_owned()) {
            if ctx.dropped_logs == 1 {
                warn!(
                    invocation_id = %ctx.invocation_id,
                    limit = MAX_LOG_ENTRIES,
                    "Guest log limit reached, dropping further messages"
                );
            }
            return;
        }

        let id = ctx.invocation_id.as_str();
        match level {
            LogLevel::Debug => debug!(target: "wasm_eval::guest", invocation_id = id, "{message}"),
            LogLevel::Info => info!(target: "wasm_eval::guest", invocation_id = id, "{message}"),
            LogLevel::Warn => warn!(target: "wasm_eval::guest", invocation_id = id, "{message}"),
            LogLevel::Error => error!(target: "wasm_eval::guest", invocation_id = id, "{message}"),
        }
    }

    /// Record the `env.hello` greeting.
    pub fn greet(ctx: &mut ScriptContext) {
        Self::record(ctx, LogLevel::Info, GREETING);
    }
}

/// Map the level code a guest passes to `env.log`.
///
/// 0 is debug, 2 warn, 3 error; anything else is info.
pub fn level_from_code(code: i32) -> LogLevel {
    match code {
        0 => LogLevel::Debug,
        2 => LogLevel::Warn,
        3 => LogLevel::Error,
        _ => LogLevel::Info,
    }
}

fn clip(message: &str) -> &str {
    if message.len() <= MAX_MESSAGE_LEN {
        return message;
    }
    let mut end = MAX_MESSAGE_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}
