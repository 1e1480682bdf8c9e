//! Error types for wasm-eval.
//!
//! Every way an `EVALWASM` invocation can fail is a variant of [`EvalError`].
//! Engine-originated failures keep the engine's diagnostic text verbatim and
//! prefix it with a fixed step label, so the `Display` output is exactly what
//! the client sees after the `ERR ` reply prefix.

use thiserror::Error;

/// Failure of a single script evaluation.
///
/// The variants fall into three groups:
/// - rejections that happen before any engine work
///   ([`Arity`](Self::Arity), [`ArgumentType`](Self::ArgumentType),
///   [`InvalidArgument`](Self::InvalidArgument),
///   [`CapabilityDisabled`](Self::CapabilityDisabled));
/// - engine errors and traps from the pipeline steps;
/// - internal faults ([`ExportResolution`](Self::ExportResolution),
///   [`Internal`](Self::Internal)) that indicate a defect in the shim rather
///   than bad input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Too many (or too few) positional arguments were supplied.
    #[error("wrong number of arguments for '{command}' command")]
    Arity {
        /// Lower-cased command name.
        command: String,
    },

    /// The script argument is not a base-10 64-bit integer.
    #[error("value is not an integer or out of range")]
    ArgumentType,

    /// The script argument cannot be marshalled into the configured width.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Why the value was rejected.
        reason: String,
    },

    /// The script text is not well-formed WAT.
    #[error("Failed to parse WAT script: {message}")]
    Parse {
        /// Translator diagnostic.
        message: String,
    },

    /// The binary module failed validation or compilation.
    #[error("Failed to compile module: {message}")]
    Compile {
        /// Engine diagnostic.
        message: String,
    },

    /// Linking failed before any module code ran (e.g. unknown import).
    #[error("Failed to instantiate: {message}")]
    Instantiation {
        /// Engine diagnostic.
        message: String,
    },

    /// The module's start function trapped during instantiation.
    #[error("Failed to instantiate: {message}")]
    InstantiationTrap {
        /// Trap message.
        message: String,
    },

    /// The call mechanism rejected the invocation shape.
    #[error("Failed to call function: {message}")]
    Call {
        /// Engine diagnostic.
        message: String,
    },

    /// The exported function trapped while executing.
    #[error("Failed to call function: {message}")]
    CallTrap {
        /// Trap message.
        message: String,
    },

    /// The export the shim asked for does not exist or is not a function.
    #[error("Failed to resolve export: {reason}")]
    ExportResolution {
        /// Description of the resolution failure.
        reason: String,
    },

    /// Any other fault inside the shim (engine creation, import registration).
    #[error("Internal error: {reason}")]
    Internal {
        /// Description of the fault.
        reason: String,
    },

    /// The engine was not compiled into this build.
    #[error("This server was not built with WASM support.")]
    CapabilityDisabled,
}

impl EvalError {
    /// Create a new `Arity` error for the given command name.
    pub fn arity(command: impl AsRef<str>) -> Self {
        Self::Arity {
            command: command.as_ref().to_lowercase(),
        }
    }

    /// Create a new `InvalidArgument` error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a new `Parse` error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new `Compile` error.
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile {
            message: message.into(),
        }
    }

    /// Create a new `Instantiation` error.
    pub fn instantiation(message: impl Into<String>) -> Self {
        Self::Instantiation {
            message: message.into(),
        }
    }

    /// Create a new `InstantiationTrap` error.
    pub fn instantiation_trap(message: impl Into<String>) -> Self {
        Self::InstantiationTrap {
            message: message.into(),
        }
    }

    /// Create a new `Call` error.
    pub fn call(message: impl Into<String>) -> Self {
        Self::Call {
            message: message.into(),
        }
    }

    /// Create a new `CallTrap` error.
    pub fn call_trap(message: impl Into<String>) -> Self {
        Self::CallTrap {
            message: message.into(),
        }
    }

    /// Create a new `ExportResolution` error.
    pub fn export_resolution(reason: impl Into<String>) -> Self {
        Self::ExportResolution {
            reason: reason.into(),
        }
    }

    /// Create a new `Internal` error.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Short machine-readable tag, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Arity { .. } => "arity",
            Self::ArgumentType => "argument_type",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::Parse { .. } => "parse",
            Self::Compile { .. } => "compile",
            Self::Instantiation { .. } => "instantiation",
            Self::InstantiationTrap { .. } => "instantiation_trap",
            Self::Call { .. } => "call",
            Self::CallTrap { .. } => "call_trap",
            Self::ExportResolution { .. } => "export_resolution",
            Self::Internal { .. } => "internal",
            Self::CapabilityDisabled => "capability_disabled",
        }
    }

    /// Returns `true` if guest code ran and trapped.
    pub fn is_trap(&self) -> bool {
        matches!(self, Self::InstantiationTrap { .. } | Self::CallTrap { .. })
    }

    /// Returns `true` if this error indicates a defect in the shim itself.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::ExportResolution { .. } | Self::Internal { .. })
    }
}
