//! Invocation input: a shell-style command line or a list of (possibly nested) tokens.

use serde_json::Value;

/// Textual arguments for a script call.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// A single string, split with shell quoting rules.
    Line(String),
    /// Pre-split tokens. A nested array supplies several values in place (e.g. `["--tags", ["a", "b"]]`).
    Tokens(Vec<Value>),
}

impl Invocation {
    /// Interpret a JSON value as an invocation: a string is a command line, an array is a token list,
    /// null is an empty invocation. Objects are not invocations.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Invocation::Line(s.clone())),
            Value::Array(items) => Some(Invocation::Tokens(items.clone())),
            Value::Null => Some(Invocation::Tokens(Vec::new())),
            _ => None,
        }
    }

    /// Flatten to string tokens. Returns `None` when a command line has unbalanced quotes.
    pub fn tokens(&self) -> Option<Vec<String>> {
        match self {
            Invocation::Line(line) => shlex::split(line),
            Invocation::Tokens(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Array(nested) => out.extend(nested.iter().map(token_string)),
                        other => out.push(token_string(other)),
                    }
                }
                Some(out)
            }
        }
    }
}

fn token_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl From<&str> for Invocation {
    fn from(s: &str) -> Self {
        Invocation::Line(s.to_string())
    }
}

impl From<String> for Invocation {
    fn from(s: String) -> Self {
        Invocation::Line(s)
    }
}

impl From<Vec<Value>> for Invocation {
    fn from(items: Vec<Value>) -> Self {
        Invocation::Tokens(items)
    }
}

impl From<Vec<String>> for Invocation {
    fn from(items: Vec<String>) -> Self {
        Invocation::Tokens(items.into_iter().map(Value::String).collect())
    }
}

impl From<&[&str]> for Invocation {
    fn from(items: &[&str]) -> Self {
        Invocation::Tokens(items.iter().map(|s| Value::String(s.to_string())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn line_uses_shell_quoting() {
        let inv = Invocation::from(r#"report "two words" --title 'a b'"#);
        assert_eq!(
            inv.tokens().unwrap(),
            vec!["report", "two words", "--title", "a b"]
        );
    }

    #[test]
    fn unbalanced_quotes_fail() {
        assert!(Invocation::from("say \"oops").tokens().is_none());
    }

    #[test]
    fn nested_arrays_flatten_and_scalars_stringify() {
        let inv = Invocation::from(vec![json!("--tags"), json!(["a", "b"]), json!(3), json!(true)]);
        assert_eq!(inv.tokens().unwrap(), vec!["--tags", "a", "b", "3", "true"]);
    }

    #[test]
    fn json_objects_are_not_invocations() {
        assert!(Invocation::from_json(&json!({"x": 1})).is_none());
        assert_eq!(
            Invocation::from_json(&json!(null)).and_then(|i| i.tokens()),
            Some(Vec::new())
        );
    }
}
