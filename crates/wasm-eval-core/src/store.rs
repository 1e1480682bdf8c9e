//! Per-invocation execution context and store management.
//!
//! This module provides:
//! - [`ScriptContext`]: Per-invocation state accessible from host functions
//! - [`LogEntry`] and [`LogLevel`]: Structured logging from guest code

use std::sync::Arc;
use std::time::{Duration, Instant};

use wasmtime::Store;

use crate::WasmEngine;
use crate::ledger::{Lease, ResourceKind, ResourceLedger};

/// Most guest log entries kept per invocation. Later entries are counted in
/// [`ScriptContext::dropped_logs`] and discarded.
pub const MAX_LOG_ENTRIES: usize = 256;

/// Per-invocation execution context.
///
/// This is the data of the invocation's [`Store`]. Host functions reach it
/// through [`wasmtime::Caller`], so anything they capture lives exactly as
/// long as the store.
pub struct ScriptContext {
    /// Unique invocation identifier for tracing.
    pub invocation_id: String,

    /// Logs collected from guest code, at most [`MAX_LOG_ENTRIES`].
    pub logs: Vec<LogEntry>,

    /// Guest log entries discarded once `logs` was full.
    pub dropped_logs: u32,

    /// Number of host callbacks the guest made.
    pub host_calls: u32,

    /// Leases of resources whose lifetime is bound to the store.
    leases: Vec<Lease>,

    start_time: Instant,
}

/// A single log entry from guest code.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Log level (debug, info, warn, error).
    pub level: LogLevel,

    /// Log message content.
    pub message: String,

    /// Timestamp when the log was recorded.
    pub timestamp: Instant,
}

/// Log level for guest logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug-level messages.
    Debug,
    /// Informational messages.
    Info,
    /// Warning messages.
    Warn,
    /// Error messages.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl ScriptContext {
    /// Create a new context with the given invocation ID.
    pub fn new(invocation_id: String) -> Self {
        Self {
            invocation_id,
            logs: Vec::new(),
            dropped_logs: 0,
            host_calls: 0,
            leases: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// Add a log entry.
    ///
    /// Returns `false` and counts the entry as dropped if the context already
    /// holds [`MAX_LOG_ENTRIES`].
    pub fn log(&mut self, level: LogLevel, message: String) -> bool {
        if self.logs.len() >= MAX_LOG_ENTRIES {
            self.dropped_logs = self.dropped_logs.saturating_add(1);
            return false;
        }

        self.logs.push(LogEntry {
            level,
            message,
            timestamp: Instant::now(),
        });
        true
    }

    /// Tie a lease to the lifetime of this context.
    pub fn hold(&mut self, lease: Lease) {
        self.leases.push(lease);
    }

    /// Get elapsed time since the context was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl std::fmt::Debug for ScriptContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptContext")
            .field("invocation_id", &self.invocation_id)
            .field("logs", &self.logs.len())
            .field("dropped_logs", &self.dropped_logs)
            .field("host_calls", &self.host_calls)
            .finish_non_exhaustive()
    }
}

/// Create a new Wasmtime store for one invocation.
///
/// The store's lease is held by its [`ScriptContext`], so it is released
/// when the store is dropped.
pub fn create_store(
    engine: &WasmEngine,
    ledger: &Arc<ResourceLedger>,
    invocation_id: String,
) -> Store<ScriptContext> {
    let mut context = ScriptContext::new(invocation_id);
    context.hold(ledger.acquire(ResourceKind::Store));

    Store::new(engine.inner(), context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_eval_common::EngineConfig;

    #[test]
    fn test_script_context_creation() {
        let ctx = ScriptContext::new("test-invocation-123".into());

        assert_eq!(ctx.invocation_id, "test-invocation-123");
        assert!(ctx.logs.is_empty());
        assert_eq!(ctx.host_calls, 0);
    }

    #[test]
    fn test_script_context_logging() {
        let mut ctx = ScriptContext::new("test".into());

        ctx.log(LogLevel::Info, "Hello".into());
        ctx.log(LogLevel::Error, "World".into());

        assert_eq!(ctx.logs.len(), 2);
        assert_eq!(ctx.logs[0].level, LogLevel::Info);
        assert_eq!(ctx.logs[0].message, "Hello");
        assert_eq!(ctx.logs[1].level, LogLevel::Error);
    }

    #[test]
    fn test_log_entries_are_capped() {
        let mut ctx = ScriptContext::new("flood".into());

        for i in 0..MAX_LOG_ENTRIES {
            assert!(ctx.log(LogLevel::Debug, format!("entry {i}")));
        }
        assert!(!ctx.log(LogLevel::Error, "one too many".into()));
        assert!(!ctx.log(LogLevel::Error, "two too many".into()));

        assert_eq!(ctx.logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(ctx.dropped_logs, 2);
        assert_eq!(ctx.logs.last().unwrap().message, format!("entry {}", MAX_LOG_ENTRIES - 1));
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Debug.to_string(), "DEBUG");
        assert_eq!(LogLevel::Info.to_string(), "INFO");
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
        assert_eq!(LogLevel::Error.to_string(), "ERROR");
    }

    #[test]
    fn test_store_lease_follows_store() {
        let ledger = ResourceLedger::new();
        let engine = WasmEngine::new(&EngineConfig::default(), &ledger).unwrap();

        let store = create_store(&engine, &ledger, "test-123".into());
        assert_eq!(store.data().invocation_id, "test-123");
        assert_eq!(ledger.live(ResourceKind::Store), 1);

        drop(store);
        assert_eq!(ledger.live(ResourceKind::Store), 0);
        assert_eq!(ledger.live(ResourceKind::Engine), 1);
    }
}
