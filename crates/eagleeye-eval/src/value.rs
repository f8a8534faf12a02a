//! Runtime values produced by the interpreter.
//!
//! Truthiness follows the usual conventions of rulebook expressions:
//! `None`, `False`, zero, the empty string and empty sequences are false.
//! Booleans take part in arithmetic as 0 and 1.

use crate::error::{ExprError, ExprResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) | Self::Tuple(items) => !items.is_empty(),
        }
    }

    /// Numeric view; booleans coerce to 0/1.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub(crate) fn expect_number(&self, context: &str) -> ExprResult<f64> {
        self.as_number().ok_or_else(|| {
            ExprError::Type(format!("{context} expects a number, got {}", self.type_name()))
        })
    }

    /// Elements of an iterable value. Strings iterate by character.
    pub(crate) fn iter_items(&self, context: &str) -> ExprResult<Vec<Value>> {
        match self {
            Self::List(items) | Self::Tuple(items) => Ok(items.clone()),
            Self::Str(s) => Ok(s.chars().map(|c| Self::Str(c.to_string())).collect()),
            other => Err(ExprError::Type(format!(
                "{context} expects an iterable, got {}",
                other.type_name()
            ))),
        }
    }

    /// Equality with numeric coercion between booleans and numbers.
    /// Values of unrelated types are simply unequal.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_equals(y))
            }
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::None.truthy());
        assert!(!Value::Number(0.0).truthy());
        assert!(Value::Number(f64::NAN).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(Value::List(vec![Value::None]).truthy());
        assert!(!Value::Tuple(vec![]).truthy());
    }

    #[test]
    fn bool_and_number_compare_equal() {
        assert!(Value::Bool(true).loosely_equals(&Value::Number(1.0)));
        assert!(!Value::Str("1".into()).loosely_equals(&Value::Number(1.0)));
        assert!(!Value::None.loosely_equals(&Value::Number(0.0)));
    }
}
