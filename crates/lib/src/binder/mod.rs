//! Argument binding for function scripts.
//!
//! A skill script can be backed by a native function instead of a file. Agents still call it the
//! way they would call a command (`"42 --verbose"`), so the binder derives a command-line grammar
//! from the function's [`Signature`], parses the tokens, and binds the result to positional and
//! keyword arguments.

mod bind;
mod function;
mod invocation;
mod parser;
mod signature;

pub use bind::BoundArguments;
pub use function::{FunctionScript, NativeFn, ScriptError};
pub use invocation::Invocation;
pub use parser::parse_bool;
pub use signature::{Param, ParamKind, Signature, ValueType};

#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("cannot bind arguments for '{callable}': {reason}")]
    ArgumentBinding { callable: String, reason: String },
    #[error("'{callable}' does not accept argument '{token}'")]
    UnknownArgument { callable: String, token: String },
    #[error("invalid value '{value}' for '{parameter}' of '{callable}' (expected {expected})")]
    InvalidArgumentValue {
        callable: String,
        parameter: String,
        value: String,
        expected: String,
    },
}

/// Bind an invocation against a signature without a callable attached.
pub fn bind_invocation(
    signature: &Signature,
    invocation: impl Into<Invocation>,
) -> Result<BoundArguments, BindError> {
    let tokens = invocation
        .into()
        .tokens()
        .ok_or_else(|| BindError::ArgumentBinding {
            callable: signature.name.clone(),
            reason: "unbalanced quotes in invocation".to_string(),
        })?;
    let namespace = parser::parse_tokens(signature, &tokens)?;
    bind::bind(signature, namespace)
}
