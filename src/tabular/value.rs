//! Cell values for tabular records.
//!
//! Defines [`Value`], the value type stored in a [`TabularInput`](super::TabularInput).
//! Strings, integers, floats and bools are *primitive* and can be written to a
//! CSV cell; structured JSON values (arrays, objects) are kept for other
//! outputs but never reach the CSV file.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A single value recorded under a key of a tabular record.
///
/// # Example
///
/// ```
/// use tabular_csv::tabular::Value;
///
/// assert_eq!(Value::from(3).to_string(), "3");
/// assert_eq!(Value::from(1.0).to_string(), "1.0");
/// assert_eq!(Value::from(true).to_string(), "true");
/// assert!(!Value::from(serde_json::json!([1, 2])).is_primitive());
/// ```
///
/// Deserialization goes through [`serde_json::Value`], so `null` becomes an
/// empty string exactly as `Value::from(json!(null))` does.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Text, written verbatim.
    Str(String),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean, written as `true` / `false`.
    Bool(bool),
    /// Arrays and objects. Not tabulated.
    Structured(serde_json::Value),
}

impl Value {
    /// Returns true for values that can be written to a CSV cell.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Structured(_))
    }

    /// Renders the value as a CSV cell, or `None` for structured values.
    pub fn to_cell(&self) -> Option<String> {
        self.is_primitive().then(|| self.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            // Debug keeps the ".0" on integral floats and is round-trippable.
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Structured(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Value::Int(i64::from(i))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    /// Keeps the shortest decimal form of the `f32`, so `0.1f32` renders as
    /// `0.1` rather than its widened binary expansion.
    fn from(x: f32) -> Self {
        let widened = x.to_string().parse::<f64>().unwrap_or(f64::from(x));
        Value::Float(widened)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Str(String::new()),
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                // u64 beyond i64::MAX and all non-integers land here
                None => n
                    .as_f64()
                    .map(Value::Float)
                    .unwrap_or_else(|| Value::Str(n.to_string())),
            },
            other => Value::Structured(other),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}
