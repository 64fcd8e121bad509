//! Raw values pulled from a source registry and their gauge coercion.

use serde::{Deserialize, Serialize};

/// One scalar facet of a source metric, as reported by the source registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "value")]
pub enum RawValue {
    Float(f64),
    Integer(i64),
    /// Health checks report their last error as text; empty means healthy.
    Text(String),
    /// Anything the source produced that has no numeric reading.
    Other,
}

impl RawValue {
    /// Coerce into the single `f64` a gauge can hold. Never fails.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Float(v) => *v,
            Self::Integer(v) => *v as f64,
            Self::Text(s) => {
                if s.is_empty() {
                    0.0
                } else {
                    1.0
                }
            },
            Self::Other => 0.0,
        }
    }
}

/// Free-function form of [`RawValue::as_f64`].
#[must_use]
pub fn to_f64(value: &RawValue) -> f64 {
    value.as_f64()
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for RawValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u32> for RawValue {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u64> for RawValue {
    fn from(v: u64) -> Self {
        Self::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

// Health-check style: `None` is healthy, `Some(err)` carries the failure.
impl From<Option<String>> for RawValue {
    fn from(v: Option<String>) -> Self {
        Self::Text(v.unwrap_or_default())
    }
}
