//! Dynamic argument and return values

use crate::error::InvokeError;
use std::fmt::{self, Display, Formatter};

/// Value passed to or returned from an operation
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent reference
    #[default]
    Null,

    /// Result of a void operation
    Unit,

    /// Boolean
    Bool(bool),

    /// Integer
    Int(i64),

    /// Floating point
    Float(f64),

    /// String
    Str(String),

    /// Ordered collection
    List(Vec<Value>),
}

impl Value {
    /// Short name of the value's shape, for diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Unit => "unit",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
        }
    }

    /// Integer payload
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Boolean payload
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// True for [`Value::Null`]
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Unit => f.write_str("()"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Option<String>> for Value {
    fn from(v: Option<String>) -> Self {
        v.map_or(Self::Null, Self::Str)
    }
}

/// Conversion from a [`Value`] argument into a host type
pub trait FromValue: Sized {
    /// Extract from the argument at `position`
    ///
    /// # Errors
    /// [`InvokeError::ArgumentType`] if the value has the wrong shape.
    fn from_value(value: &Value, position: usize) -> Result<Self, InvokeError>;
}

fn mismatch(value: &Value, position: usize, expected: &str) -> InvokeError {
    InvokeError::ArgumentType {
        position,
        expected: expected.to_string(),
        actual: value.kind().to_string(),
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value, position: usize) -> Result<Self, InvokeError> {
        value.as_int().ok_or_else(|| mismatch(value, position, "int"))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value, position: usize) -> Result<Self, InvokeError> {
        value.as_bool().ok_or_else(|| mismatch(value, position, "bool"))
    }
}

impl FromValue for String {
    fn from_value(value: &Value, position: usize) -> Result<Self, InvokeError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(value, position, "string"))
    }
}

impl FromValue for Option<String> {
    fn from_value(value: &Value, position: usize) -> Result<Self, InvokeError> {
        match value {
            Value::Null => Ok(None),
            Value::Str(s) => Ok(Some(s.clone())),
            other => Err(mismatch(other, position, "string or null")),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value, _position: usize) -> Result<Self, InvokeError> {
        Ok(value.clone())
    }
}
