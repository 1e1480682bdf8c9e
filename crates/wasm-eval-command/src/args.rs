//! Argument parsing for `EVALWASM`.

use bytes::Bytes;

use wasm_eval_common::EvalError;

use crate::handler::COMMAND_NAME;

/// Parsed arguments of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalArgs<'a> {
    /// WAT source, borrowed from the request.
    pub script: &'a str,

    /// Integer handed to the export.
    pub script_arg: i64,
}

/// Parse `EVALWASM <script> <arg>`.
///
/// Checks happen in this order: arity, the integer argument, then the
/// script's encoding.
///
/// # Errors
///
/// - [`EvalError::Arity`] unless exactly two arguments follow the command name
/// - [`EvalError::ArgumentType`] if the argument is not a strict integer
/// - [`EvalError::Parse`] if the script is not UTF-8
pub fn parse(argv: &[Bytes]) -> Result<EvalArgs<'_>, EvalError> {
    let [_, script, arg] = argv else {
        let name = argv
            .first()
            .and_then(|name| std::str::from_utf8(name).ok())
            .unwrap_or(COMMAND_NAME);
        return Err(EvalError::arity(name));
    };

    let script_arg = parse_integer(arg)?;
    let script = std::str::from_utf8(script)
        .map_err(|e| EvalError::parse(format!("script is not valid UTF-8: {e}")))?;

    Ok(EvalArgs { script, script_arg })
}

/// Parse a base-10 signed 64-bit integer.
///
/// Only the canonical form is accepted: an optional `-`, no `+`, no
/// surrounding whitespace and no leading zeros. `"0"` is the only spelling
/// of zero.
pub fn parse_integer(bytes: &[u8]) -> Result<i64, EvalError> {
    let digits = bytes.strip_prefix(b"-").unwrap_or(bytes);

    let canonical = match digits {
        [] => false,
        [b'0'] => digits.len() == bytes.len(),
        [first, rest @ ..] => {
            (b'1'..=b'9').contains(first) && rest.iter().all(u8::is_ascii_digit)
        }
    };
    if !canonical {
        return Err(EvalError::ArgumentType);
    }

    std::str::from_utf8(bytes)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or(EvalError::ArgumentType)
}
