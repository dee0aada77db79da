//! Parameter descriptors for native callables.
//!
//! Rust has no runtime reflection over closure parameters, so a callable carries an explicit
//! [`Signature`] describing each parameter's name, kind, declared type, and default.

use serde_json::Value;
use std::fmt;

/// Declared value type of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    /// Zero or more values of the inner type.
    Sequence(Box<ValueType>),
    /// The inner type, or nothing.
    Optional(Box<ValueType>),
}

impl ValueType {
    pub fn sequence(inner: ValueType) -> Self {
        ValueType::Sequence(Box::new(inner))
    }

    pub fn optional(inner: ValueType) -> Self {
        ValueType::Optional(Box::new(inner))
    }

    /// Strip any `Optional` wrappers.
    pub fn unwrap_optional(&self) -> &ValueType {
        match self {
            ValueType::Optional(inner) => inner.unwrap_optional(),
            other => other,
        }
    }

    /// Element type when this is a sequence (after unwrapping optionals).
    pub fn element(&self) -> Option<&ValueType> {
        match self.unwrap_optional() {
            ValueType::Sequence(inner) => Some(inner.unwrap_optional()),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => f.write_str("string"),
            ValueType::Integer => f.write_str("integer"),
            ValueType::Float => f.write_str("float"),
            ValueType::Boolean => f.write_str("boolean"),
            ValueType::Sequence(inner) => write!(f, "list[{}]", inner),
            ValueType::Optional(inner) => write!(f, "optional[{}]", inner),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// May only be passed by position.
    PositionalOnly,
    /// May be passed by position or by name.
    PositionalOrKeyword,
    /// May only be passed by name.
    KeywordOnly,
    /// Catch-all for extra positional values.
    VarPositional,
    /// Catch-all for extra named values.
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    /// `None` when the parameter is unannotated; treated as a string.
    pub declared_type: Option<ValueType>,
    pub default: Option<Value>,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            declared_type: None,
            default: None,
        }
    }

    pub fn typed(mut self, ty: ValueType) -> Self {
        self.declared_type = Some(ty);
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Declared type with optionals unwrapped; unannotated parameters are strings.
    pub fn value_type(&self) -> ValueType {
        self.declared_type
            .as_ref()
            .map(|t| t.unwrap_optional().clone())
            .unwrap_or(ValueType::String)
    }

    /// True for parameters that can receive a value by position.
    pub fn is_positional(&self) -> bool {
        matches!(
            self.kind,
            ParamKind::PositionalOnly | ParamKind::PositionalOrKeyword
        )
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self.kind, ParamKind::VarPositional | ParamKind::VarKeyword)
    }

    /// Command-line spelling of the parameter: underscores become hyphens.
    pub fn cli_name(&self) -> String {
        self.name.replace('_', "-")
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParamKind::VarPositional => f.write_str("*")?,
            ParamKind::VarKeyword => f.write_str("**")?,
            _ => {}
        }
        f.write_str(&self.name)?;
        if let Some(ref ty) = self.declared_type {
            write!(f, ": {}", ty)?;
        }
        if let Some(ref d) = self.default {
            write!(f, " = {}", d)?;
        }
        Ok(())
    }
}

/// Ordered parameter list of a callable, with the callable's name for error messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub name: String,
    pub doc: Option<String>,
    params: Vec<Param>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Required parameter passed by position or name.
    pub fn positional(self, name: impl Into<String>, ty: ValueType) -> Self {
        self.param(Param::new(name, ParamKind::PositionalOrKeyword).typed(ty))
    }

    /// Required parameter that can only be passed by position.
    pub fn positional_only(self, name: impl Into<String>, ty: ValueType) -> Self {
        self.param(Param::new(name, ParamKind::PositionalOnly).typed(ty))
    }

    /// Parameter passed by position or name, with a default.
    pub fn optional(self, name: impl Into<String>, ty: ValueType, default: impl Into<Value>) -> Self {
        self.param(
            Param::new(name, ParamKind::PositionalOrKeyword)
                .typed(ty)
                .with_default(default),
        )
    }

    /// Keyword-only parameter with a default.
    pub fn keyword(self, name: impl Into<String>, ty: ValueType, default: impl Into<Value>) -> Self {
        self.param(
            Param::new(name, ParamKind::KeywordOnly)
                .typed(ty)
                .with_default(default),
        )
    }

    /// Keyword-only parameter without a default.
    pub fn keyword_required(self, name: impl Into<String>, ty: ValueType) -> Self {
        self.param(Param::new(name, ParamKind::KeywordOnly).typed(ty))
    }

    /// Catch-all positional parameter; `ty` is the element type.
    pub fn var_positional(self, name: impl Into<String>, ty: ValueType) -> Self {
        self.param(Param::new(name, ParamKind::VarPositional).typed(ty))
    }

    /// Catch-all keyword parameter.
    pub fn var_keyword(self, name: impl Into<String>) -> Self {
        self.param(Param::new(name, ParamKind::VarKeyword))
    }

    /// Parameters in declaration order, excluding a leading `self` receiver.
    pub fn parameters(&self) -> impl Iterator<Item = &Param> {
        let receiver = usize::from(self.params.first().is_some_and(|p| p.name == "self"));
        self.params.iter().skip(receiver)
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.parameters().find(|p| p.name == name && !p.is_variadic())
    }

    pub fn var_positional_param(&self) -> Option<&Param> {
        self.parameters()
            .find(|p| p.kind == ParamKind::VarPositional)
    }

    pub fn accepts_var_keyword(&self) -> bool {
        self.parameters().any(|p| p.kind == ParamKind::VarKeyword)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        let mut first = true;
        let mut marked_keyword = false;
        let has_var_positional = self.var_positional_param().is_some();
        for p in self.parameters() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            if p.kind == ParamKind::KeywordOnly && !has_var_positional && !marked_keyword {
                f.write_str("*, ")?;
                marked_keyword = true;
            }
            write!(f, "{}", p)?;
        }
        f.write_str(")")
    }
}
