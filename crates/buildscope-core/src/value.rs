//! Raw field values carried by table rows.

use serde::{Deserialize, Serialize};

/// A raw field value as delivered by the data source.
///
/// Sorting always looks at this raw value, never at the formatted text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
    /// Missing or null value
    #[default]
    Empty,
}

impl FieldValue {
    /// Get the plain display text (no formatter applied).
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => format!("{n}"),
            Self::Empty => String::new(),
        }
    }

    /// Numeric view of the value. Text is parsed, the way a numeric sort
    /// reads a `data-sort-value` attribute.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if !n.is_nan() => Some(*n),
            Self::Number(_) | Self::Empty => None,
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
        }
    }

    /// Text view of the value, `None` for numbers and empty values.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Check whether the value is missing or an empty string.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Check whether the value is the number zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.as_number() == Some(0.0)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Empty,
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Empty, Self::Number),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            serde_json::Value::Bool(b) => Self::Text(b.to_string()),
            other => Self::Text(other.to_string()),
        }
    }
}
