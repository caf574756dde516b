use model::core::value::Value;
use serde::Serialize;
use std::{collections::HashMap, fmt::Debug};

/// Output of one calculation call, comparable only within its algorithm family.
pub trait CalculatedResult: Debug + PartialEq + Send {
    fn records_count(&self) -> u64;

    /// Resume point after this result; `None` for non-resumable algorithms.
    fn checkpoint(&self) -> Option<&Value>;
}

/// Per-column aggregate checksums of a whole table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecksumCalculatedResult {
    pub records_count: u64,
    pub column_checksums: Vec<u64>,
}

impl CalculatedResult for ChecksumCalculatedResult {
    fn records_count(&self) -> u64 {
        self.records_count
    }

    fn checkpoint(&self) -> Option<&Value> {
        None
    }
}

/// One chunk of materialized rows in unique-key order.
#[derive(Debug, Clone, Serialize)]
pub struct DataMatchCalculatedResult {
    max_unique_key_value: Option<Value>,
    records: Vec<Vec<Value>>,
}

impl DataMatchCalculatedResult {
    /// Row values are normalized so that equality and hashing agree across drivers.
    pub fn new(max_unique_key_value: Option<Value>, records: Vec<Vec<Value>>) -> Self {
        let records = records
            .into_iter()
            .map(|row| row.into_iter().map(Value::normalized).collect())
            .collect();
        Self {
            max_unique_key_value,
            records,
        }
    }

    pub fn max_unique_key_value(&self) -> Option<&Value> {
        self.max_unique_key_value.as_ref()
    }

    pub fn records(&self) -> &[Vec<Value>] {
        &self.records
    }

    fn row_counts(&self) -> HashMap<&Vec<Value>, usize> {
        let mut counts = HashMap::with_capacity(self.records.len());
        for row in &self.records {
            *counts.entry(row).or_insert(0) += 1;
        }
        counts
    }
}

/// Equal when both chunks hold the same rows, regardless of order.
impl PartialEq for DataMatchCalculatedResult {
    fn eq(&self, other: &Self) -> bool {
        self.records.len() == other.records.len() && self.row_counts() == other.row_counts()
    }
}

impl CalculatedResult for DataMatchCalculatedResult {
    fn records_count(&self) -> u64 {
        self.records.len() as u64
    }

    fn checkpoint(&self) -> Option<&Value> {
        self.max_unique_key_value.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, name: &str) -> Vec<Value> {
        vec![Value::Int(id), Value::from(name)]
    }

    #[test]
    fn test_row_order_does_not_matter() {
        let a = DataMatchCalculatedResult::new(Some(Value::Int(2)), vec![row(1, "a"), row(2, "b")]);
        let b = DataMatchCalculatedResult::new(Some(Value::Int(2)), vec![row(2, "b"), row(1, "a")]);
        assert_eq!(a, b);
        assert_eq!(a.records_count(), 2);
        assert_eq!(a.checkpoint(), Some(&Value::Int(2)));
    }

    #[test]
    fn test_duplicate_rows_count_as_multiset() {
        let a = DataMatchCalculatedResult::new(None, vec![row(1, "a"), row(1, "a"), row(2, "b")]);
        let b = DataMatchCalculatedResult::new(None, vec![row(1, "a"), row(2, "b"), row(2, "b")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_changed_value_is_a_mismatch() {
        let a = DataMatchCalculatedResult::new(None, vec![row(1, "a")]);
        let b = DataMatchCalculatedResult::new(None, vec![row(1, "A")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_float_rows_match_themselves() {
        let nan_row = || vec![Value::Int(1), Value::Float(f64::NAN)];
        let a = DataMatchCalculatedResult::new(None, vec![nan_row()]);
        let b = DataMatchCalculatedResult::new(None, vec![nan_row()]);
        assert_eq!(a, b);

        let a = DataMatchCalculatedResult::new(None, vec![vec![Value::Int(1), Value::Float(0.0)]]);
        let b = DataMatchCalculatedResult::new(None, vec![vec![Value::Int(1), Value::Float(-0.0)]]);
        assert_eq!(a, b);

        let c = DataMatchCalculatedResult::new(None, vec![vec![Value::Int(1), Value::Float(0.5)]]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_checksum_equality_is_structural() {
        let a = ChecksumCalculatedResult {
            records_count: 3,
            column_checksums: vec![11, 22],
        };
        let mut b = a.clone();
        assert_eq!(a, b);
        b.column_checksums[1] = 23;
        assert_ne!(a, b);
        assert!(a.checkpoint().is_none());
    }
}
