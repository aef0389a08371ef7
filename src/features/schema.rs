//! Trained feature schema and the reconciled feature vector.
//!
//! Every column name is resolved to its position once, when the schema is
//! built. Reconciliation is then plain indexing: columns the request did not
//! produce stay at 0, and nothing outside the schema has a slot to write to.

use crate::error::RiskError;
use std::collections::HashMap;

/// Ordered column names the classifier was trained on
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Result<Self, RiskError> {
        if columns.is_empty() {
            return Err(RiskError::SchemaMismatch(
                "feature schema has no columns".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(RiskError::SchemaMismatch(format!(
                    "duplicate column '{}' in feature schema",
                    name
                )));
            }
        }

        Ok(Self { columns, index })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Position of a column the pipeline cannot work without.
    pub fn require(&self, name: &str) -> Result<usize, RiskError> {
        self.index_of(name).ok_or_else(|| {
            RiskError::SchemaMismatch(format!("column '{}' missing from feature schema", name))
        })
    }

    /// All-zero vector in schema shape, ready to be filled by slot.
    pub fn zeroed(&self) -> FeatureVector<'_> {
        FeatureVector {
            schema: self,
            values: vec![0.0; self.columns.len()],
        }
    }
}

impl PartialEq for FeatureSchema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

/// One model-ready row. Always exactly as long as its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector<'s> {
    schema: &'s FeatureSchema,
    values: Vec<f32>,
}

impl<'s> FeatureVector<'s> {
    pub(crate) fn set(&mut self, slot: usize, value: f64) {
        self.values[slot] = value as f32;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.schema.index_of(name).map(|i| self.values[i])
    }

    /// Column name and value pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'s str, f32)> + '_ {
        self.schema
            .columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}
