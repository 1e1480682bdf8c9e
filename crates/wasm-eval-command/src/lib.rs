//! `EVALWASM` command handler.
//!
//! This crate is the surface a database client reaches:
//!
//! ```text
//! EVALWASM <wat-script> <integer>
//! ```
//!
//! It checks arity, parses the integer argument, hands the script to the
//! embedding shim and turns the outcome into a [`Reply`]. All of that is
//! behind the `wasm` cargo feature; without it the handler answers every
//! invocation with [`EvalError::CapabilityDisabled`](wasm_eval_common::EvalError::CapabilityDisabled)
//! and no engine code is compiled in.
//!
//! # Quick Start
//!
//! ```ignore
//! use bytes::Bytes;
//! use wasm_eval_command::EvalWasm;
//! use wasm_eval_common::RuntimeConfig;
//!
//! let command = EvalWasm::new(RuntimeConfig::default());
//! let reply = command.handle(&[
//!     Bytes::from_static(b"EVALWASM"),
//!     Bytes::from_static(br#"(module (func (export "run") (param i32) (result i32) local.get 0))"#),
//!     Bytes::from_static(b"42"),
//! ]);
//! assert_eq!(reply.to_string(), "(integer) 42");
//! ```

pub mod args;
pub mod handler;
pub mod reply;

pub use handler::{COMMAND_NAME, EvalWasm};
pub use reply::{Reply, SUCCESS_MARKER};
