use crate::record::Record;
use crate::ValidationError;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

/// The in-memory record collection. Loaded once at startup, read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let rows = value
            .as_array()
            .ok_or_else(|| ValidationError("dataset must be a JSON array".to_string()))?;
        let mut records = Vec::with_capacity(rows.len());
        let mut seen = BTreeSet::new();
        for (idx, row) in rows.iter().enumerate() {
            let record = Record::from_json(row)
                .map_err(|e| ValidationError(format!("dataset row {idx}: {e}")))?;
            if !seen.insert(record.id.clone()) {
                return Err(ValidationError(format!(
                    "dataset row {idx}: duplicate record id {}",
                    record.id
                )));
            }
            records.push(record);
        }
        Ok(Self { records })
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads and validates the dataset file. Missing or malformed data is a
/// fatal configuration error.
pub fn load_dataset(path: &Path) -> Result<Dataset, ValidationError> {
    let bytes = std::fs::read(path)
        .map_err(|e| ValidationError(format!("failed to read dataset {}: {e}", path.display())))?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ValidationError(format!("malformed dataset {}: {e}", path.display())))?;
    Dataset::from_json(&value)
}
