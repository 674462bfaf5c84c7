//! Purpose: Compile and evaluate per-record criteria over record sequences.
//! Exports: `Criterion`, `Criteria`, `filter`, `filter_indexed`.
//! Role: The single filtering primitive every store query builds on.
//! Invariants: Filtering is a pure function of its inputs; no mutation, no side effects.
//! Invariants: Results keep the scanned sequence's order; indices are relative to that sequence.
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::core::codec::Record;

/// One test applied to a record's value for a given property.
///
/// A criterion is either a literal to compare against, an arbitrary predicate
/// over the value, or a bare presence requirement. The tag decides the
/// dispatch; there is no runtime probing of the value.
#[derive(Clone)]
pub enum Criterion {
    /// The record's value must equal this value exactly.
    Equals(Value),
    /// The predicate, applied to the record's value, must return true.
    Check(Arc<dyn Fn(&Value) -> bool + Send + Sync>),
    /// Any value passes; only the key must be present.
    Present,
}

impl Criterion {
    fn passes(&self, value: &Value) -> bool {
        match self {
            Self::Equals(expected) => value == expected,
            Self::Check(predicate) => predicate(value),
            Self::Present => true,
        }
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(expected) => f.debug_tuple("Equals").field(expected).finish(),
            Self::Check(_) => f.debug_tuple("Check").field(&"<predicate>").finish(),
            Self::Present => write!(f, "Present"),
        }
    }
}

/// An ordered conjunction of `(property name, Criterion)` tests.
///
/// A record is accepted when every test's key is present on the record and
/// the criterion passes for the value at that key. Empty criteria accept
/// every record.
#[derive(Clone, Debug, Default)]
pub struct Criteria {
    tests: Vec<(String, Criterion)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to hold exactly `value`.
    pub fn equals(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tests.push((key.into(), Criterion::Equals(value.into())));
        self
    }

    /// Require `predicate` to hold for the value at `key`.
    pub fn check(
        mut self,
        key: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.tests
            .push((key.into(), Criterion::Check(Arc::new(predicate))));
        self
    }

    /// Require `key` to be present, with any value.
    pub fn present(mut self, key: impl Into<String>) -> Self {
        self.tests.push((key.into(), Criterion::Present));
        self
    }

    pub fn push(&mut self, key: impl Into<String>, criterion: Criterion) {
        self.tests.push((key.into(), criterion));
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether `record` satisfies every test.
    pub fn accepts(&self, record: &Record) -> bool {
        self.tests.iter().all(|(key, criterion)| {
            record
                .get(key)
                .map(|value| criterion.passes(value))
                .unwrap_or(false)
        })
    }
}

/// Filter `records`, keeping scan order.
pub fn filter<'a>(records: &'a [Record], criteria: &Criteria) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| criteria.accepts(record))
        .collect()
}

/// Filter `records`, pairing each match with its index in the scanned slice.
///
/// Indices are positions within `records` only; when callers filter a subset
/// they already extracted from a store, the indices do not map back to the
/// store's own sequence.
pub fn filter_indexed<'a>(records: &'a [Record], criteria: &Criteria) -> Vec<(usize, &'a Record)> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| criteria.accepts(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Criteria, filter, filter_indexed};
    use crate::core::codec::Record;
    use serde_json::json;

    fn records() -> Vec<Record> {
        [
            json!({"configuration": "reactant", "method": "b3lyp", "electron_energy": -152.1}),
            json!({"configuration": "ts", "method": "b3lyp"}),
            json!({"configuration": "product", "method": "mp2", "electron_energy": -152.3}),
        ]
        .into_iter()
        .map(|value| match value {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        })
        .collect()
    }

    #[test]
    fn empty_criteria_accept_everything_in_order() {
        let all = records();
        let matched = filter(&all, &Criteria::new());
        assert_eq!(matched.len(), all.len());
        for (got, want) in matched.iter().zip(all.iter()) {
            assert_eq!(*got, want);
        }
    }

    #[test]
    fn equals_compares_values_exactly() {
        let all = records();
        let criteria = Criteria::new().equals("method", "b3lyp");
        let matched = filter(&all, &criteria);
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0]["configuration"], "reactant");
        assert_eq!(matched[1]["configuration"], "ts");
    }

    #[test]
    fn check_runs_the_predicate_on_the_value() {
        let all = records();
        let criteria = Criteria::new().check("electron_energy", |value| {
            value.as_f64().is_some_and(|energy| energy < -152.2)
        });
        let matched = filter(&all, &criteria);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0]["configuration"], "product");
    }

    #[test]
    fn missing_key_never_matches() {
        let all = records();
        // The `ts` record has no electron_energy; a tautological predicate
        // must still skip it.
        let criteria = Criteria::new().check("electron_energy", |_| true);
        assert_eq!(filter(&all, &criteria).len(), 2);

        let criteria = Criteria::new().present("electron_energy");
        assert_eq!(filter(&all, &criteria).len(), 2);
    }

    #[test]
    fn conjunction_requires_all_tests() {
        let all = records();
        let criteria = Criteria::new()
            .equals("method", "b3lyp")
            .equals("configuration", "ts");
        let matched = filter(&all, &criteria);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0]["configuration"], "ts");
    }

    #[test]
    fn indices_are_relative_to_the_scanned_slice() {
        let all = records();
        let criteria = Criteria::new().equals("method", "mp2");
        let matched = filter_indexed(&all, &criteria);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].0, 2);

        // Scanning a subset restarts the indexing.
        let subset = &all[1..];
        let matched = filter_indexed(subset, &criteria);
        assert_eq!(matched[0].0, 1);
    }
}
