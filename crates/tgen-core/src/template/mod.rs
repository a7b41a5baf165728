//! A small StringTemplate compatible renderer.
//!
//! Descriptor grammars and harness templates are written for StringTemplate
//! with `<` `>` delimiters. This module covers the part of the language they
//! use:
//!
//! - `<attr>`, `<"literal">`, `<name(a, "b")>`, `<expr:name()>`, `<{...}>`
//! - `<if(a && !b)>...<elseif(c)>...<else>...<endif>`
//! - `<! comment !>`, `<\n>`, `\<`
//! - group files with `name(args) ::= <<...>>`, `<%...%>` or `"..."`
//!
//! Templates called from another template see the caller's attributes
//! (dynamic scoping). Attribute values are inserted verbatim.

mod group;
mod render;

pub use group::TemplateGroup;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or rendering templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Syntax error in {origin}: {message}")]
    Syntax { origin: String, message: String },

    #[error("Unresolved attribute `{0}`")]
    Unresolved(String),

    #[error("Unknown template `{0}`")]
    UnknownTemplate(String),

    #[error("Template `{name}` takes {expected} argument(s), {given} given")]
    ArgumentCount {
        name: String,
        expected: usize,
        given: usize,
    },

    #[error("Template nesting deeper than {0} levels")]
    TooDeep(usize),
}

impl TemplateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TemplateError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn syntax(origin: &str, message: impl Into<String>) -> Self {
        TemplateError::Syntax {
            origin: origin.to_string(),
            message: message.into(),
        }
    }
}

/// A value bound to a template attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Bool(bool),
    /// Declared but without a value; renders as nothing and tests false.
    Absent,
}

impl Value {
    /// Truth value inside `<if(...)>`: present and not `false`.
    pub fn is_true(&self) -> bool {
        match self {
            Value::Text(_) => true,
            Value::Bool(b) => *b,
            Value::Absent => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Absent => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Absent)
    }
}

/// Named attributes for one render call.
pub type Attributes = BTreeMap<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_truth() {
        assert!(Value::from("").is_true());
        assert!(Value::from(true).is_true());
        assert!(!Value::from(false).is_true());
        assert!(!Value::from(None::<String>).is_true());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::Absent.to_string(), "");
        assert_eq!(Value::from("x").to_string(), "x");
    }
}
