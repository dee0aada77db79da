//! Signature binding: turn a name → value namespace into positional and keyword arguments,
//! checking it against the full signature and filling in defaults.

use serde_json::{Map, Value};

use super::signature::{ParamKind, Signature};
use super::BindError;

/// Arguments ready to apply to a callable.
///
/// `args` holds required positional parameters in declaration order, followed by catch-all
/// positional values. `kwargs` holds everything else: positional parameters that kept their
/// keyword form, keyword-only parameters, and catch-all keyword entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
    /// Parameter names for the leading named entries of `args`.
    positional_names: Vec<String>,
}

impl BoundArguments {
    /// Value bound to a parameter (or catch-all keyword entry) by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.positional_names.iter().position(|n| n == name) {
            Some(i) => self.args.get(i),
            None => self.kwargs.get(name),
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Values collected by the catch-all positional parameter.
    pub fn var_args(&self) -> &[Value] {
        &self.args[self.positional_names.len().min(self.args.len())..]
    }

    /// `{"args": [...], "kwargs": {...}}`.
    pub fn to_json(&self) -> Value {
        serde_json::json!({ "args": self.args, "kwargs": self.kwargs })
    }
}

/// Bind a namespace against `signature`.
///
/// Values for positional-capable parameters are drained into positional order (a catch-all
/// positional list is spread in place); the remainder are keyword arguments. The result is then
/// checked for arity, duplicates, unknown keywords, and required coverage, and defaults are applied.
pub(crate) fn bind(
    signature: &Signature,
    mut namespace: Map<String, Value>,
) -> Result<BoundArguments, BindError> {
    let fail = |reason: String| BindError::ArgumentBinding {
        callable: signature.name.clone(),
        reason,
    };

    let mut positional: Vec<Value> = Vec::new();
    let mut gap = false;
    for param in signature.parameters() {
        match param.kind {
            ParamKind::PositionalOnly | ParamKind::PositionalOrKeyword if !gap => {
                match namespace.shift_remove(&param.name) {
                    Some(v) => positional.push(v),
                    None => gap = true,
                }
            }
            ParamKind::VarPositional => match namespace.shift_remove(&param.name) {
                Some(Value::Array(items)) if items.is_empty() => {}
                Some(_) if gap => {
                    return Err(fail(format!(
                        "values for '*{}' need every earlier positional argument",
                        param.name
                    )));
                }
                Some(Value::Array(items)) => positional.extend(items),
                Some(other) => positional.push(other),
                None => {}
            },
            _ => {}
        }
    }

    // Assign positional values to parameters.
    let named: Vec<_> = signature.parameters().filter(|p| p.is_positional()).collect();
    let mut slots: Vec<Option<Value>> = vec![None; named.len()];
    let mut extra: Vec<Value> = Vec::new();
    for (i, v) in positional.into_iter().enumerate() {
        if i < slots.len() {
            slots[i] = Some(v);
        } else {
            extra.push(v);
        }
    }
    if !extra.is_empty() && signature.var_positional_param().is_none() {
        return Err(fail(format!(
            "too many positional arguments (takes {}, got {})",
            named.len(),
            named.len() + extra.len()
        )));
    }

    // Assign keywords.
    let mut keyword_only: Map<String, Value> = Map::new();
    let mut var_keyword: Map<String, Value> = Map::new();
    for (key, value) in namespace {
        match signature.get(&key) {
            Some(p) if p.kind == ParamKind::PositionalOnly => {
                return Err(fail(format!(
                    "positional-only argument '{}' passed as keyword",
                    key
                )));
            }
            Some(p) if p.is_positional() => {
                let i = named
                    .iter()
                    .position(|n| n.name == p.name)
                    .unwrap_or_default();
                if slots[i].is_some() {
                    return Err(fail(format!("multiple values for argument '{}'", key)));
                }
                slots[i] = Some(value);
            }
            Some(_) => {
                keyword_only.insert(key, value);
            }
            None if signature.accepts_var_keyword() => {
                var_keyword.insert(key, value);
            }
            None => {
                return Err(fail(format!("got an unexpected keyword argument '{}'", key)));
            }
        }
    }

    // Required coverage and defaults.
    let mut missing = Vec::new();
    for (slot, param) in slots.iter_mut().zip(&named) {
        if slot.is_none() {
            match param.default {
                Some(ref d) => *slot = Some(d.clone()),
                None => missing.push(param.name.as_str()),
            }
        }
    }
    let mut kwargs = Map::new();
    let mut trailing: Vec<(String, Value)> = Vec::new();
    for param in signature.parameters().filter(|p| p.kind == ParamKind::KeywordOnly) {
        match keyword_only.shift_remove(&param.name).or_else(|| param.default.clone()) {
            Some(v) => {
                kwargs.insert(param.name.clone(), v);
            }
            None => missing.push(param.name.as_str()),
        }
    }
    if !missing.is_empty() {
        return Err(fail(format!(
            "missing required argument(s): {}",
            missing.join(", ")
        )));
    }

    // Parameters with defaults keep their keyword form unless a later positional value needs them
    // in place.
    let mut args: Vec<Value> = slots.into_iter().flatten().collect();
    let mut names: Vec<String> = named.iter().map(|p| p.name.clone()).collect();
    if extra.is_empty() {
        while let Some(param) = names.last().and_then(|n| signature.get(n)) {
            if param.kind != ParamKind::PositionalOrKeyword || !param.has_default() {
                break;
            }
            let (Some(name), Some(value)) = (names.pop(), args.pop()) else {
                break;
            };
            trailing.push((name, value));
        }
    }
    args.extend(extra);

    let mut ordered = Map::new();
    for (name, value) in trailing.into_iter().rev() {
        ordered.insert(name, value);
    }
    ordered.extend(kwargs);
    ordered.extend(var_keyword);

    Ok(BoundArguments {
        args,
        kwargs: ordered,
        positional_names: names,
    })
}
