use crate::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A single scalar cell. Dates are carried as text in `YYYY-MM-DD` form;
/// the column type decides how a cell is filtered and rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| ValidationError(format!("non-finite number cell: {n}"))),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Null => Ok(Self::Null),
            other => Err(ValidationError(format!(
                "cell values must be scalar, got: {other}"
            ))),
        }
    }

    /// Rendering form, also the fallback comparison form for non-numeric cells.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::Bool(b) => b.to_string(),
            Self::Null => String::new(),
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Total order used by the sort stage: numbers compare numerically,
    /// everything else by case-folded display text, nulls first.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (a, b) => a
                .display()
                .to_lowercase()
                .cmp(&b.display().to_lowercase()),
        }
    }
}

/// One dataset row: an id plus a flat column-key to scalar mapping.
/// Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub cells: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ValidationError("dataset rows must be JSON objects".to_string()))?;
        let id = match obj.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(ValidationError(format!(
                    "record id must be a string or number, got: {other}"
                )))
            }
            None => return Err(ValidationError("record is missing an id field".to_string())),
        };
        let mut cells = BTreeMap::new();
        for (key, raw) in obj {
            if key == "id" {
                continue;
            }
            cells.insert(key.clone(), CellValue::from_json(raw)?);
        }
        Ok(Self { id, cells })
    }

    #[must_use]
    pub fn cell(&self, key: &str) -> CellValue {
        self.cells.get(key).cloned().unwrap_or(CellValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_parses_flat_object_and_stringifies_numeric_id() {
        let rec = Record::from_json(&json!({"id": 7, "name": "Ada", "age": 36}))
            .expect("valid record");
        assert_eq!(rec.id, "7");
        assert_eq!(rec.cell("name"), CellValue::Text("Ada".to_string()));
        assert_eq!(rec.cell("age").as_number(), Some(36.0));
        assert_eq!(rec.cell("missing"), CellValue::Null);
    }

    #[test]
    fn record_rejects_nested_values_and_missing_id() {
        let err = Record::from_json(&json!({"id": "1", "tags": ["a"]})).expect_err("nested");
        assert!(err.0.contains("scalar"));
        let err = Record::from_json(&json!({"name": "Ada"})).expect_err("missing id");
        assert!(err.0.contains("id"));
    }

    #[test]
    fn sort_cmp_orders_numbers_numerically_and_text_case_insensitively() {
        let two = CellValue::Number(2.0);
        let ten = CellValue::Number(10.0);
        assert_eq!(two.sort_cmp(&ten), Ordering::Less);

        let a = CellValue::Text("apple".to_string());
        let b = CellValue::Text("Banana".to_string());
        assert_eq!(a.sort_cmp(&b), Ordering::Less);
        assert_eq!(CellValue::Null.sort_cmp(&a), Ordering::Less);
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(CellValue::Number(1250.0).display(), "1250");
        assert_eq!(CellValue::Number(12.5).display(), "12.5");
    }
}
