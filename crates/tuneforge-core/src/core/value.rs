// tuneforge-core/src/core/value.rs
// ============================================================================
// Module: Parameter Value Domain
// Description: Scalar value type for resolved configuration parameters.
// Purpose: Define the closed value domain shared by rules, caches, and items.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every resolved configuration parameter is one of a closed set of scalar
//! kinds: flag, integer, float, or text. Profile tables arrive as JSON, so
//! conversion to and from [`serde_json::Value`] is lossless for scalars and
//! rejects containers and nulls.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Parameter Value
// ============================================================================

/// Scalar value of a resolved configuration parameter.
///
/// Published items never hold a null; absence is modeled by dropping the
/// item, not by a null variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean flag parameter.
    Flag(bool),
    /// Signed integer parameter.
    Integer(i64),
    /// Floating point parameter.
    Float(f64),
    /// Textual or enumerated parameter.
    Text(String),
}

impl ParamValue {
    /// Converts a JSON scalar into a parameter value.
    ///
    /// Returns `None` for nulls, arrays, and objects, which are not part of
    /// the parameter value domain.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(Self::Flag(*flag)),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Some(Self::Integer(int))
                } else {
                    number.as_f64().map(Self::Float)
                }
            }
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Converts the parameter value back into a JSON scalar.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Flag(flag) => Value::Bool(*flag),
            Self::Integer(int) => Value::Number((*int).into()),
            Self::Float(float) => {
                serde_json::Number::from_f64(*float).map_or(Value::Null, Value::Number)
            }
            Self::Text(text) => Value::String(text.clone()),
        }
    }

    /// Returns the integer form of the value when it is numeric.
    ///
    /// Floats are truncated toward zero; flags and text return `None`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(int) => Some(*int),
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Truncation toward zero is the documented conversion."
            )]
            Self::Float(float) if float.is_finite() => Some(*float as i64),
            _ => None,
        }
    }

    /// Returns the floating point form of the value when it is numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(int) => {
                #[allow(
                    clippy::cast_precision_loss,
                    reason = "Parameter magnitudes stay far below the f64 mantissa limit."
                )]
                Some(*int as f64)
            }
            Self::Float(float) => Some(*float),
            _ => None,
        }
    }

    /// Returns the flag form of the value when it is a boolean.
    #[must_use]
    pub const fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the textual form of the value when it is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns a short name for the value kind, used in logs and errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Flag(_) => "flag",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }
}

impl From<bool> for ParamValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<i64> for ParamValue {
    fn from(int: i64) -> Self {
        Self::Integer(int)
    }
}

impl From<f64> for ParamValue {
    fn from(float: f64) -> Self {
        Self::Float(float)
    }
}

impl From<&str> for ParamValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag(flag) => write!(formatter, "{flag}"),
            Self::Integer(int) => write!(formatter, "{int}"),
            Self::Float(float) => write!(formatter, "{float}"),
            Self::Text(text) => write!(formatter, "{text}"),
        }
    }
}
