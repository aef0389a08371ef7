//! Drop-first one-hot encoding for categorical borrower fields.
//!
//! Within each field the categories are sorted alphabetically and the first
//! one is the implied baseline (all indicators 0). Indicator columns are
//! resolved against the trained schema when the encoder is built; a
//! category without a trained column also encodes as the baseline.

use super::schema::FeatureSchema;
use crate::types::borrower::{BorrowerRecord, Category, HomeOwnership, LoanIntent, PriorDefault};
use tracing::debug;

/// Indicator column name for a category, e.g. `loan_intent_MEDICAL`.
pub fn column_name<C: Category>(category: C) -> String {
    format!("{}_{}", C::FIELD, category.as_str())
}

/// Categories that get an indicator column, in column order.
pub fn indicator_categories<C: Category>() -> Vec<C> {
    let mut all = C::ALL.to_vec();
    all.sort_by_key(|c| c.as_str());
    all.into_iter().skip(1).collect()
}

/// Indicator columns produced for one field, in column order.
pub fn indicator_columns<C: Category>() -> Vec<String> {
    indicator_categories::<C>()
        .into_iter()
        .map(column_name)
        .collect()
}

/// Resolved indicator slots for one categorical field
#[derive(Debug, Clone)]
struct FieldSlots<C> {
    slots: Vec<(C, usize)>,
}

impl<C: Category + PartialEq> FieldSlots<C> {
    fn resolve(schema: &FeatureSchema, unmapped: &mut Vec<String>) -> Self {
        let mut slots = Vec::new();
        for category in indicator_categories::<C>() {
            let column = column_name(category);
            match schema.index_of(&column) {
                Some(slot) => slots.push((category, slot)),
                None => unmapped.push(column),
            }
        }
        Self { slots }
    }

    fn slot(&self, value: C) -> Option<usize> {
        self.slots
            .iter()
            .find(|(category, _)| *category == value)
            .map(|&(_, slot)| slot)
    }
}

/// One-hot encoder bound to a trained feature schema
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    home_ownership: FieldSlots<HomeOwnership>,
    loan_intent: FieldSlots<LoanIntent>,
    prior_default: FieldSlots<PriorDefault>,
    unmapped: Vec<String>,
}

impl CategoricalEncoder {
    pub fn new(schema: &FeatureSchema) -> Self {
        let mut unmapped = Vec::new();
        let encoder = Self {
            home_ownership: FieldSlots::resolve(schema, &mut unmapped),
            loan_intent: FieldSlots::resolve(schema, &mut unmapped),
            prior_default: FieldSlots::resolve(schema, &mut unmapped),
            unmapped,
        };

        if !encoder.unmapped.is_empty() {
            debug!(
                columns = ?encoder.unmapped,
                "Indicator columns absent from trained schema, encoding as baseline"
            );
        }

        encoder
    }

    /// Schema slots to set to 1.0 for this record. Baseline categories
    /// contribute nothing.
    pub fn hot_slots(&self, record: &BorrowerRecord) -> impl Iterator<Item = usize> {
        [
            self.home_ownership.slot(record.home_ownership),
            self.loan_intent.slot(record.loan_intent),
            self.prior_default.slot(record.prior_default),
        ]
        .into_iter()
        .flatten()
    }

    /// Indicator columns the encoder would emit but the schema lacks
    pub fn unmapped_columns(&self) -> &[String] {
        &self.unmapped
    }

    /// Number of indicator columns with a trained slot
    pub fn mapped_count(&self) -> usize {
        self.home_ownership.slots.len() + self.loan_intent.slots.len() + self.prior_default.slots.len()
    }
}
