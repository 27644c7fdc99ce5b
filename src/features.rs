// Typed feature rows built from request JSON
use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::FeatureError;

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    fn kind(&self) -> &'static str {
        match self {
            FeatureValue::Number(_) => "a number",
            FeatureValue::Text(_) => "a string",
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(n) => write!(f, "{n}"),
            FeatureValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// One row of named feature values, the unit the preprocessor consumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    values: BTreeMap<String, FeatureValue>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: FeatureValue) -> Self {
        self.values.insert(column.to_string(), value);
        self
    }

    /// Builds a row from a JSON object. Booleans become 1.0 / 0.0; nulls, arrays
    /// and nested objects are rejected.
    pub fn from_json_object(object: &Map<String, Value>) -> Result<Self, FeatureError> {
        let mut values = BTreeMap::new();
        for (column, value) in object {
            let value = match value {
                Value::Number(n) => match n.as_f64() {
                    Some(x) if x.is_finite() => FeatureValue::Number(x),
                    _ => {
                        return Err(FeatureError::UnsupportedValue {
                            column: column.clone(),
                            found: "number out of f64 range",
                        })
                    }
                },
                Value::String(s) => FeatureValue::Text(s.clone()),
                Value::Bool(b) => FeatureValue::Number(if *b { 1.0 } else { 0.0 }),
                other => {
                    return Err(FeatureError::UnsupportedValue {
                        column: column.clone(),
                        found: json_kind(other),
                    })
                }
            };
            values.insert(column.clone(), value);
        }
        Ok(Self { values })
    }

    /// Builds a row from any JSON value; only objects are accepted.
    pub fn from_json(value: &Value) -> Result<Self, FeatureError> {
        match value {
            Value::Object(object) => Self::from_json_object(object),
            other => Err(FeatureError::NotAnObject(json_kind(other))),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Numeric value of `column`. Strings that parse as finite numbers are
    /// accepted; `"NaN"` and `"inf"` are not.
    pub fn number(&self, column: &str) -> Result<f64, FeatureError> {
        let mismatch = |found: String| FeatureError::TypeMismatch {
            column: column.to_string(),
            expected: "a finite number",
            found,
        };
        match self.values.get(column) {
            None => Err(FeatureError::Missing(column.to_string())),
            Some(FeatureValue::Number(n)) if n.is_finite() => Ok(*n),
            Some(FeatureValue::Number(n)) => Err(mismatch(n.to_string())),
            Some(FeatureValue::Text(s)) => match s.trim().parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(x),
                _ => Err(mismatch(format!("{s:?}"))),
            },
        }
    }

    /// Categorical value of `column`; must be a string.
    pub fn text(&self, column: &str) -> Result<&str, FeatureError> {
        match self.values.get(column) {
            None => Err(FeatureError::Missing(column.to_string())),
            Some(FeatureValue::Text(s)) => Ok(s),
            Some(other) => Err(FeatureError::TypeMismatch {
                column: column.to_string(),
                expected: "a string",
                found: format!("{} ({other})", other.kind()),
            }),
        }
    }
}

impl fmt::Display for FeatureRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<String> = self
            .values
            .iter()
            .map(|(column, value)| format!("{column}={value}"))
            .collect();
        write!(f, "[{}]", cells.join(", "))
    }
}

/// True when a request body carries no usable data: `null`, `false`, `0`, `""`,
/// `[]` or `{}`.
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
