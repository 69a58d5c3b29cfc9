// datatree/src/scalar.rs

use std::fmt;

use crate::common::NodeId;
use crate::tagged::ValueType;

/// A key or leaf value handed to the encoder by a Tree Source.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Real(f64),
    /// Stored NUL-terminated, so it may not contain `'\0'`.
    Str(String),
    /// Opaque process-local address. Never dereferenced by this crate.
    Pointer(usize),
}

impl Scalar {
    pub fn value_type(&self) -> ValueType {
        match self {
            Scalar::Bool(_) => ValueType::Bool,
            Scalar::Int(_) => ValueType::Int,
            Scalar::Real(_) => ValueType::Real,
            Scalar::Str(_) => ValueType::String,
            Scalar::Pointer(_) => ValueType::Pointer,
        }
    }

    pub fn as_value(&self) -> Value<'_> {
        match self {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(n) => Value::Int(*n),
            Scalar::Real(f) => Value::Real(*f),
            Scalar::Str(s) => Value::Str(s),
            Scalar::Pointer(p) => Value::Pointer(*p),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Real(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

/// A key or value resolved out of a packed buffer. Strings borrow the buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(&'a str),
    Pointer(usize),
    /// Child-head node id of a nested table.
    Table(NodeId),
}

impl<'a> Value<'a> {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Real(_) => ValueType::Real,
            Value::Str(_) => ValueType::String,
            Value::Pointer(_) => ValueType::Pointer,
            Value::Table(_) => ValueType::Table,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    /// Owned copy of a scalar value; `None` for tables.
    pub fn to_scalar(&self) -> Option<Scalar> {
        match *self {
            Value::Bool(b) => Some(Scalar::Bool(b)),
            Value::Int(n) => Some(Scalar::Int(n)),
            Value::Real(f) => Some(Scalar::Real(f)),
            Value::Str(s) => Some(Scalar::Str(s.to_string())),
            Value::Pointer(p) => Some(Scalar::Pointer(p)),
            Value::Table(_) => None,
        }
    }
}

impl PartialEq<Scalar> for Value<'_> {
    fn eq(&self, other: &Scalar) -> bool {
        *self == other.as_value()
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Real(x) => write!(f, "{:?}", x),
            Value::Str(s) => f.write_str(s),
            Value::Pointer(p) => write!(f, "{:#x}", p),
            Value::Table(head) => write!(f, "[{}]", head),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_compares_with_scalar() {
        assert_eq!(Value::Str("a"), Scalar::from("a"));
        assert_eq!(Value::Int(-5), Scalar::Int(-5));
        assert_ne!(Value::Int(5), Scalar::Real(5.0));
        assert_ne!(Value::Table(2), Scalar::Int(2));
    }

    #[test]
    fn display_follows_dump_format() {
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Real(2.5).to_string(), "2.5");
        assert_eq!(Value::Pointer(0x10).to_string(), "0x10");
        assert_eq!(Value::Table(3).to_string(), "[3]");
    }

    #[test]
    fn tables_have_no_scalar_form() {
        assert_eq!(Value::Table(9).to_scalar(), None);
        assert_eq!(Value::Str("x").to_scalar(), Some(Scalar::Str("x".into())));
    }
}
