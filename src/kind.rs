//! Runtime kinds of decoded JSON values

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// How JSON numbers are classified when comparing kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum NumberPolicy {
    /// Integers and floats are different kinds (`1` is not compatible with `1.0`)
    #[default]
    Strict,
    /// Every JSON number is the same kind
    Unified,
}

impl fmt::Display for NumberPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberPolicy::Strict => write!(f, "strict"),
            NumberPolicy::Unified => write!(f, "unified"),
        }
    }
}

/// Kind of a JSON value, as far as compatibility is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Bool,
    /// Number held as an `i64`/`u64` (strict policy only)
    Integer,
    /// Number held as an `f64` (strict policy only)
    Float,
    /// Any number (unified policy only)
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Classify a value under the given number policy
    pub fn of(value: &Value, policy: NumberPolicy) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(n) => match policy {
                NumberPolicy::Unified => ValueKind::Number,
                NumberPolicy::Strict if n.is_i64() || n.is_u64() => ValueKind::Integer,
                NumberPolicy::Strict => ValueKind::Float,
            },
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Everything but arrays and objects. Strings are never sequences.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, ValueKind::Array | ValueKind::Object)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
