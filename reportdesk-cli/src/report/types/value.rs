//! Scalar cell values carried by report rows

use serde::{Deserialize, Serialize};

/// A single cell in a report row
///
/// Backend tables are JSON records, so a cell is whatever scalar the backend
/// produced. Anything that is not a number, string or null is kept as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum CellValue {
    /// Null/missing value
    Empty,
    /// Any JSON number
    Number(f64),
    /// Any JSON string (or stringified non-scalar)
    Text(String),
}

impl CellValue {
    /// Check if this value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Try to get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Empty => serde_json::Value::Null,
            // Non-finite floats have no JSON form and become null
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Parse from JSON value
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => CellValue::Empty,
            serde_json::Value::Bool(b) => CellValue::Text(b.to_string()),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => CellValue::Number(f),
                None => CellValue::Text(n.to_string()),
            },
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                CellValue::Text(json.to_string())
            }
        }
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(json: serde_json::Value) -> Self {
        CellValue::from_json(&json)
    }
}

impl From<CellValue> for serde_json::Value {
    fn from(value: CellValue) -> Self {
        value.to_json()
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}
