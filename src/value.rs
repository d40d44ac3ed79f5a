//! Values that may cross the isolation boundary.
//!
//! Only plain scalar data travels between the renderer and the host: no
//! handles, no callbacks, no shared memory.

use serde::{Deserialize, Serialize};

/// Boundary value types (must be serializable)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(untagged)]
pub enum BridgeValue {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (f64 for JS compatibility)
    Number(f64),
    /// String value
    String(String),
}

impl BridgeValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, BridgeValue::Null)
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BridgeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            BridgeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BridgeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name used in argument errors
    pub fn type_name(&self) -> &'static str {
        match self {
            BridgeValue::Null => "null",
            BridgeValue::Bool(_) => "boolean",
            BridgeValue::Number(_) => "number",
            BridgeValue::String(_) => "string",
        }
    }
}

impl From<bool> for BridgeValue {
    fn from(b: bool) -> Self {
        BridgeValue::Bool(b)
    }
}

impl From<f64> for BridgeValue {
    fn from(n: f64) -> Self {
        BridgeValue::Number(n)
    }
}

impl From<i64> for BridgeValue {
    fn from(n: i64) -> Self {
        BridgeValue::Number(n as f64)
    }
}

impl From<String> for BridgeValue {
    fn from(s: String) -> Self {
        BridgeValue::String(s)
    }
}

impl From<&str> for BridgeValue {
    fn from(s: &str) -> Self {
        BridgeValue::String(s.to_string())
    }
}

impl<T: Into<BridgeValue>> From<Option<T>> for BridgeValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(BridgeValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert!(BridgeValue::Null.is_null());
        assert_eq!(BridgeValue::from(true).as_bool(), Some(true));
        assert_eq!(BridgeValue::from(4.5).as_number(), Some(4.5));
        assert_eq!(BridgeValue::from("{}").as_str(), Some("{}"));
        assert_eq!(BridgeValue::from("x").as_number(), None);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(BridgeValue::from(None::<f64>), BridgeValue::Null);
        assert_eq!(BridgeValue::from(Some(3.0)), BridgeValue::Number(3.0));
    }

    #[test]
    fn test_json_integers_become_numbers() {
        let value: BridgeValue = serde_json::from_str("7").unwrap();
        assert_eq!(value, BridgeValue::Number(7.0));
        let value: BridgeValue = serde_json::from_str("null").unwrap();
        assert!(value.is_null());
    }
}
