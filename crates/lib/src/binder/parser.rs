//! Command-line pass of the binder.
//!
//! Builds a flag/positional grammar from a [`Signature`] and parses string tokens against it:
//! required positional parameters are unflagged slots, parameters with defaults and keyword-only
//! parameters are `--flags`, a catch-all positional parameter takes the remaining unflagged tokens.
//! When the signature has a catch-all keyword parameter, tokens the grammar does not recognize are
//! kept as residue and parsed permissively as `--key value...` pairs.

use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use super::signature::{Param, ParamKind, Signature, ValueType};
use super::BindError;

enum Action {
    /// Presence sets true.
    StoreTrue,
    /// Presence sets false (`--no-<name>`).
    StoreFalse,
    /// Takes one value, or zero or more when `multiple`.
    Store { ty: ValueType, multiple: bool },
}

struct Flag<'a> {
    param: &'a Param,
    action: Action,
}

struct Slot<'a> {
    param: &'a Param,
    ty: ValueType,
    multiple: bool,
}

struct Grammar<'a> {
    flags: HashMap<String, Flag<'a>>,
    slots: Vec<Slot<'a>>,
    permissive: bool,
}

/// Lenient boolean: yes/true/t/y/1 and no/false/f/n/0, case-insensitive.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "t" | "y" | "1" => Some(true),
        "no" | "false" | "f" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Convert one token to the declared type.
pub(crate) fn convert(token: &str, ty: &ValueType) -> Option<Value> {
    match ty {
        ValueType::String => Some(Value::String(token.to_string())),
        ValueType::Integer => token.trim().parse::<i64>().ok().map(Value::from),
        ValueType::Float => token
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        ValueType::Boolean => parse_bool(token).map(Value::Bool),
        ValueType::Optional(inner) | ValueType::Sequence(inner) => convert(token, inner),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Flag-like tokens start with `--` followed by a name.
fn is_flag(token: &str) -> bool {
    token.len() > 2 && token.starts_with("--")
}

fn ends_values(token: &str) -> bool {
    token == "--" || is_flag(token)
}

impl<'a> Grammar<'a> {
    fn build(signature: &'a Signature) -> Self {
        let mut flags = HashMap::new();
        let mut slots = Vec::new();
        let mut permissive = false;

        for param in signature.parameters() {
            let declared = param.value_type();
            let (ty, multiple) = match declared.element() {
                Some(inner) => (inner.clone(), true),
                None => (declared.clone(), false),
            };
            match param.kind {
                ParamKind::PositionalOnly | ParamKind::PositionalOrKeyword
                    if !param.has_default() =>
                {
                    slots.push(Slot {
                        param,
                        ty,
                        multiple,
                    });
                }
                ParamKind::PositionalOnly
                | ParamKind::PositionalOrKeyword
                | ParamKind::KeywordOnly => {
                    let cli = param.cli_name();
                    if ty == ValueType::Boolean && !multiple {
                        if param.default.as_ref().map(truthy).unwrap_or(false) {
                            flags.insert(
                                format!("--no-{}", cli),
                                Flag {
                                    param,
                                    action: Action::StoreFalse,
                                },
                            );
                        } else {
                            flags.insert(
                                format!("--{}", cli),
                                Flag {
                                    param,
                                    action: Action::StoreTrue,
                                },
                            );
                        }
                    } else {
                        flags.insert(
                            format!("--{}", cli),
                            Flag {
                                param,
                                action: Action::Store { ty, multiple },
                            },
                        );
                    }
                }
                ParamKind::VarPositional => slots.push(Slot {
                    param,
                    ty,
                    multiple: true,
                }),
                ParamKind::VarKeyword => permissive = true,
            }
        }

        Self {
            flags,
            slots,
            permissive,
        }
    }
}

/// Parse `tokens` against the grammar derived from `signature`.
///
/// Returns the values for every parameter that received one (explicitly or through its flag's
/// default), in declaration order, followed by any permissively parsed residue keys.
pub(crate) fn parse_tokens(
    signature: &Signature,
    tokens: &[String],
) -> Result<Map<String, Value>, BindError> {
    let grammar = Grammar::build(signature);
    let callable = || signature.name.clone();
    let invalid = |param: &Param, ty: &ValueType, token: &str| BindError::InvalidArgumentValue {
        callable: signature.name.clone(),
        parameter: param.name.clone(),
        value: token.to_string(),
        expected: ty.to_string(),
    };

    let mut given: HashMap<&str, Value> = HashMap::new();
    let mut positionals: Vec<&str> = Vec::new();
    let mut residue: Vec<&str> = Vec::new();
    let mut only_positional = false;

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        i += 1;
        if only_positional {
            positionals.push(token);
            continue;
        }
        if token == "--" {
            only_positional = true;
            continue;
        }
        if !is_flag(token) {
            positionals.push(token);
            continue;
        }

        let (name, inline) = match token.split_once('=') {
            Some((n, v)) => (n, Some(v)),
            None => (token, None),
        };
        let Some(flag) = grammar.flags.get(name) else {
            if !grammar.permissive {
                return Err(BindError::UnknownArgument {
                    callable: callable(),
                    token: token.to_string(),
                });
            }
            residue.push(token);
            while i < tokens.len() && !ends_values(&tokens[i]) {
                residue.push(&tokens[i]);
                i += 1;
            }
            continue;
        };

        let value = match &flag.action {
            Action::StoreTrue | Action::StoreFalse => {
                if let Some(v) = inline {
                    return Err(BindError::ArgumentBinding {
                        callable: callable(),
                        reason: format!("argument {}: ignored explicit argument '{}'", name, v),
                    });
                }
                Value::Bool(matches!(flag.action, Action::StoreTrue))
            }
            Action::Store {
                ty,
                multiple: false,
            } => {
                let raw = match inline {
                    Some(v) => v,
                    None if i < tokens.len() && !ends_values(&tokens[i]) => {
                        i += 1;
                        tokens[i - 1].as_str()
                    }
                    None => {
                        return Err(BindError::ArgumentBinding {
                            callable: callable(),
                            reason: format!("argument {}: expected one argument", name),
                        })
                    }
                };
                convert(raw, ty).ok_or_else(|| invalid(flag.param, ty, raw))?
            }
            Action::Store { ty, multiple: true } => {
                let mut raws: Vec<&str> = inline.into_iter().collect();
                while i < tokens.len() && !ends_values(&tokens[i]) {
                    raws.push(&tokens[i]);
                    i += 1;
                }
                let mut values = Vec::with_capacity(raws.len());
                for raw in raws {
                    values.push(convert(raw, ty).ok_or_else(|| invalid(flag.param, ty, raw))?);
                }
                Value::Array(values)
            }
        };
        given.insert(flag.param.name.as_str(), value);
    }

    // Distribute unflagged tokens over positional slots. A multi-value slot is greedy but leaves
    // one token for each single-value slot after it.
    let mut slot_values: HashMap<&str, Value> = HashMap::new();
    let mut missing = Vec::new();
    let mut next = 0;
    for (k, slot) in grammar.slots.iter().enumerate() {
        if slot.multiple {
            let reserve = grammar.slots[k + 1..].iter().filter(|s| !s.multiple).count();
            let take = positionals.len().saturating_sub(next).saturating_sub(reserve);
            let mut values = Vec::with_capacity(take);
            for &raw in &positionals[next..next + take] {
                values.push(convert(raw, &slot.ty).ok_or_else(|| invalid(slot.param, &slot.ty, raw))?);
            }
            next += take;
            slot_values.insert(slot.param.name.as_str(), Value::Array(values));
        } else if let Some(&raw) = positionals.get(next) {
            next += 1;
            let value = convert(raw, &slot.ty).ok_or_else(|| invalid(slot.param, &slot.ty, raw))?;
            slot_values.insert(slot.param.name.as_str(), value);
        } else {
            missing.push(slot.param.name.as_str());
        }
    }
    if !missing.is_empty() {
        return Err(BindError::ArgumentBinding {
            callable: callable(),
            reason: format!("the following arguments are required: {}", missing.join(", ")),
        });
    }
    if let Some(extra) = positionals.get(next) {
        if !grammar.permissive {
            return Err(BindError::UnknownArgument {
                callable: callable(),
                token: extra.to_string(),
            });
        }
        log::debug!(
            "{}: ignoring {} unclaimed positional token(s)",
            signature.name,
            positionals.len() - next
        );
    }

    let mut namespace = Map::new();
    for param in signature.parameters() {
        let name = param.name.as_str();
        if let Some(v) = slot_values.remove(name).or_else(|| given.remove(name)) {
            namespace.insert(param.name.clone(), v);
            continue;
        }
        let default = grammar.flags.values().find(|f| f.param.name == name).and_then(|f| {
            match f.action {
                Action::StoreTrue => Some(Value::Bool(false)),
                Action::StoreFalse => Some(Value::Bool(true)),
                Action::Store { .. } => f.param.default.clone(),
            }
        });
        if let Some(d) = default {
            namespace.insert(param.name.clone(), d);
        }
    }

    for (key, value) in parse_residue(&residue) {
        namespace.insert(key, value);
    }
    Ok(namespace)
}

/// Parse leftover tokens as `--key value...` entries: no value is `true`, one value is that
/// string, several are a list. Hyphens in keys become underscores. Tokens before the first key
/// are ignored.
pub(crate) fn parse_residue(tokens: &[&str]) -> Map<String, Value> {
    let mut out = Map::new();
    let mut i = 0;
    while i < tokens.len() {
        let Some(flag) = tokens[i].strip_prefix("--") else {
            i += 1;
            continue;
        };
        i += 1;
        let (key, inline) = match flag.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (flag, None),
        };
        let mut values: Vec<Value> = inline.map(|v| Value::String(v.to_string())).into_iter().collect();
        while i < tokens.len() && !tokens[i].starts_with("--") {
            values.push(Value::String(tokens[i].to_string()));
            i += 1;
        }
        let value = match values.len() {
            0 => Value::Bool(true),
            1 => values.remove(0),
            _ => Value::Array(values),
        };
        out.insert(key.replace('-', "_"), value);
    }
    out
}
