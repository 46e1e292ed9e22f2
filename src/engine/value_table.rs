//! Per-context value estimates for each suggestion category.

use super::category::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Starting estimate for every category in a new context.
pub const DEFAULT_INITIAL_VALUE: f64 = 0.1;

/// `context key -> category -> estimate`.
///
/// Contexts are added lazily with every category at the initial value and
/// are never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTable {
    initial_value: f64,
    entries: BTreeMap<String, BTreeMap<Category, f64>>,
}

impl Default for ValueTable {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_VALUE)
    }
}

impl ValueTable {
    pub fn new(initial_value: f64) -> Self {
        Self {
            initial_value,
            entries: BTreeMap::new(),
        }
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    /// Estimates for `context`, creating them if unseen.
    pub fn context_mut(&mut self, context: &str) -> &mut BTreeMap<Category, f64> {
        let initial = self.initial_value;
        let values = self.entries.entry(context.to_string()).or_default();
        for category in Category::ALL {
            values.entry(category).or_insert(initial);
        }
        values
    }

    pub fn get(&self, context: &str, category: Category) -> Option<f64> {
        self.entries.get(context)?.get(&category).copied()
    }

    pub fn contains(&self, context: &str) -> bool {
        self.entries.contains_key(context)
    }

    /// Highest-valued category for `context`; ties go to the earlier category.
    pub fn best(&mut self, context: &str) -> Category {
        let values = self.context_mut(context);
        let mut best = Category::ALL[0];
        let mut best_value = f64::NEG_INFINITY;
        for category in Category::ALL {
            let value = values.get(&category).copied().unwrap_or(f64::NEG_INFINITY);
            if value > best_value {
                best = category;
                best_value = value;
            }
        }
        best
    }

    /// Add `delta` to one estimate and return the new value.
    pub fn add(&mut self, context: &str, category: Category, delta: f64) -> f64 {
        let initial = self.initial_value;
        let slot = self.context_mut(context).entry(category).or_insert(initial);
        *slot += delta;
        *slot
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fill in categories missing from a restored table.
    pub(crate) fn normalize(&mut self) {
        let keys: Vec<String> = self.entries.keys().cloned().collect();
        for key in keys {
            self.context_mut(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_context_initialised_uniformly() {
        let mut table = ValueTable::default();
        assert!(!table.contains("k"));
        let values = table.context_mut("k");
        assert_eq!(values.len(), Category::ALL.len());
        assert!(values.values().all(|v| *v == DEFAULT_INITIAL_VALUE));
    }

    #[test]
    fn test_best_breaks_ties_by_category_order() {
        let mut table = ValueTable::default();
        assert_eq!(table.best("k"), Category::Productivity);

        table.add("k", Category::Ergonomics, 0.5);
        table.add("k", Category::FocusSuggestions, 0.5);
        assert_eq!(table.best("k"), Category::Ergonomics);
    }

    #[test]
    fn test_add_returns_updated_value() {
        let mut table = ValueTable::new(0.0);
        assert_eq!(table.add("k", Category::Organization, 0.25), 0.25);
        assert_eq!(table.get("k", Category::Organization), Some(0.25));
        assert_eq!(table.get("other", Category::Organization), None);
    }

    #[test]
    fn test_serde_uses_category_names() {
        let mut table = ValueTable::default();
        table.add("k", Category::BreakReminders, 0.1);
        let json = serde_json::to_value(&table).unwrap();
        assert!(json["entries"]["k"]["break_reminders"].is_number());

        let back: ValueTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }
}
