//! Function scripts: a native callable exposed under a skill's `scripts/` path.
//!
//! Instead of running script files, an agent's shell-style call (`python report.py 42 --verbose`)
//! is routed to a registered Rust function. The binder turns the textual arguments into typed
//! [`BoundArguments`] using the function's [`Signature`].

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use super::bind::{bind, BoundArguments};
use super::invocation::Invocation;
use super::parser::convert;
use super::signature::{ParamKind, Signature, ValueType};
use super::BindError;

/// Native callable signature for function scripts.
pub type NativeFn = dyn Fn(&BoundArguments) -> Result<Value, String> + Send + Sync;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error("script '{script}' failed: {message}")]
    Failed { script: String, message: String },
}

/// A native callable with its parameter descriptor and displayable source.
#[derive(Clone)]
pub struct FunctionScript {
    signature: Arc<Signature>,
    func: Arc<NativeFn>,
    src: String,
}

impl FunctionScript {
    /// Wrap `func`. The source text defaults to the rendered signature.
    pub fn new<F>(signature: Signature, func: F) -> Self
    where
        F: Fn(&BoundArguments) -> Result<Value, String> + Send + Sync + 'static,
    {
        let src = match signature.doc {
            Some(ref doc) => format!("{}\n{}", signature, doc),
            None => signature.to_string(),
        };
        Self {
            signature: Arc::new(signature),
            func: Arc::new(func),
            src,
        }
    }

    /// Replace the text shown when the script is viewed.
    pub fn with_source(mut self, src: impl Into<String>) -> Self {
        self.src = src.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    /// Bind a shell-style invocation to this function's parameters.
    pub fn to_function_input(
        &self,
        invocation: impl Into<Invocation>,
    ) -> Result<BoundArguments, BindError> {
        super::bind_invocation(&self.signature, invocation)
    }

    /// Bind a JSON object of named arguments. String values are converted to the declared type;
    /// other JSON values are taken as given.
    pub fn bind_keywords(&self, args: &Map<String, Value>) -> Result<BoundArguments, BindError> {
        let mut namespace = Map::new();
        for (key, value) in args {
            let param = self.signature.parameters().find(|p| p.name == *key);
            let converted = match param {
                Some(p) if p.kind == ParamKind::VarPositional => {
                    let ty = ValueType::sequence(p.value_type());
                    coerce(&self.signature, &p.name, value, &ty)?
                }
                Some(p) if p.kind != ParamKind::VarKeyword => {
                    coerce(&self.signature, &p.name, value, &p.value_type())?
                }
                _ => value.clone(),
            };
            namespace.insert(key.clone(), converted);
        }
        bind(&self.signature, namespace)
    }

    /// Run the function with already-bound arguments.
    pub fn invoke(&self, bound: &BoundArguments) -> Result<Value, ScriptError> {
        log::debug!("invoking {} with {}", self.signature.name, bound.to_json());
        (self.func)(bound).map_err(|message| ScriptError::Failed {
            script: self.signature.name.clone(),
            message,
        })
    }

    /// Bind a shell-style invocation and run the function.
    pub fn call(&self, invocation: impl Into<Invocation>) -> Result<Value, ScriptError> {
        let bound = self.to_function_input(invocation)?;
        self.invoke(&bound)
    }

    /// Bind named arguments and run the function.
    pub fn call_with_keywords(&self, args: &Map<String, Value>) -> Result<Value, ScriptError> {
        let bound = self.bind_keywords(args)?;
        self.invoke(&bound)
    }
}

fn coerce(
    signature: &Signature,
    parameter: &str,
    value: &Value,
    ty: &ValueType,
) -> Result<Value, BindError> {
    let invalid = |raw: &str| BindError::InvalidArgumentValue {
        callable: signature.name.clone(),
        parameter: parameter.to_string(),
        value: raw.to_string(),
        expected: ty.to_string(),
    };
    match (value, ty.element()) {
        (Value::Array(items), Some(inner)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => convert(s, inner).ok_or_else(|| invalid(s)),
                other => Ok(other.clone()),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (Value::String(s), None) => convert(s, ty).ok_or_else(|| invalid(s)),
        (other, _) => Ok(other.clone()),
    }
}

impl fmt::Debug for FunctionScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionScript")
            .field("signature", &self.signature.to_string())
            .finish_non_exhaustive()
    }
}
