//! Embedding shim between `EVALWASM` and the Wasmtime engine.
//!
//! This crate turns a WAT script and an integer into a result:
//! - [`WasmEngine`]: Per-invocation Wasmtime engine
//! - [`ScriptContext`]: Per-invocation store data seen by host functions
//! - [`CompiledModule`]: WAT translation and module compilation
//! - [`InstanceRunner`]: Instantiation, export resolution and the call
//! - [`Evaluator`]: The whole pipeline with scoped teardown
//! - [`ResourceLedger`]: Created/released accounting for engine objects
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Evaluator                          │
//! │  (Shared, holds config + host imports + ledger only)    │
//! └─────────────────────────────────────────────────────────┘
//!                            │ per invocation
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                       Session                           │
//! │  CompiledModule   (dropped first)                       │
//! │  Store<ScriptContext> + Instance + host state           │
//! │  WasmEngine       (dropped last)                        │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod engine;
pub mod evaluator;
pub mod instance;
pub mod ledger;
pub mod module;
pub mod store;

pub use engine::WasmEngine;
pub use evaluator::Evaluator;
pub use instance::{ExecutionResult, HostImports, InstanceRunner};
pub use ledger::{Lease, ResourceKind, ResourceLedger};
pub use module::{CompiledModule, translate_wat};
pub use store::{LogEntry, LogLevel, MAX_LOG_ENTRIES, ScriptContext};
