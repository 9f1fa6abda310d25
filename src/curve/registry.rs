//! Declared delivery months.

use std::collections::BTreeMap;

use crate::domain::{DeliveryDate, parse_maturity_id};
use crate::error::{CurveError, CurveResult};

/// Owns the set of declared maturities, looked up by `YYYY-MM` id.
///
/// Entries are keyed by `(year, month)` so enumeration is chronological for
/// any positive year, including ones wider than four digits.
#[derive(Debug, Clone, Default)]
pub struct MaturityRegistry {
    entries: BTreeMap<(i32, u32), DeliveryDate>,
}

impl MaturityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a maturity. Fails on an out-of-range month/year or an existing id.
    pub fn add(&mut self, month: u32, year: i32) -> CurveResult<DeliveryDate> {
        let entry = DeliveryDate::new(month, year)?;
        if self.entries.contains_key(&(year, month)) {
            tracing::debug!(id = %entry.id, "maturity already declared");
            return Err(CurveError::DuplicateMaturity { id: entry.id });
        }
        self.entries.insert((year, month), entry.clone());
        Ok(entry)
    }

    /// Declare a maturity from form-style text: month code `"01".."12"` and a year.
    pub fn add_declared(&mut self, month: &str, year: &str) -> CurveResult<DeliveryDate> {
        let (month, year) = (month.trim(), year.trim());
        if month.is_empty() || year.is_empty() {
            return Err(CurveError::invalid_input("Select both a month and a year"));
        }
        let month = month
            .parse::<u32>()
            .map_err(|_| CurveError::invalid_input(format!("Invalid month '{month}'")))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| CurveError::invalid_input(format!("Invalid year '{year}'")))?;
        self.add(month, year)
    }

    /// Declare a maturity from its `YYYY-MM` id.
    pub fn add_id(&mut self, id: &str) -> CurveResult<DeliveryDate> {
        let (year, month) = parse_maturity_id(id)?;
        self.add(month, year)
    }

    /// Remove a maturity; absent ids are a no-op.
    ///
    /// Assignments pointing at the removed id are not touched here; the owner of
    /// those assignments must unassign them (see `Session::remove_maturity`).
    pub fn remove(&mut self, id: &str) -> Option<DeliveryDate> {
        let key = self.get(id).map(|d| (d.year, d.month))?;
        self.entries.remove(&key)
    }

    /// Lookup by canonical id; non-canonical spellings like `2024-1` miss.
    pub fn get(&self, id: &str) -> Option<&DeliveryDate> {
        let key = parse_maturity_id(id).ok()?;
        self.entries.get(&key).filter(|d| d.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Maturities in chronological order.
    pub fn list(&self) -> Vec<DeliveryDate> {
        self.entries.values().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeliveryDate> {
        self.entries.values()
    }

    /// Ids in chronological order.
    pub fn ids(&self) -> Vec<String> {
        self.entries.values().map(|d| d.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_maturity_is_rejected() {
        let mut registry = MaturityRegistry::new();
        registry.add_declared("12", "2024").unwrap();
        let err = registry.add_declared("12", "2024").unwrap_err();
        assert_eq!(err, CurveError::DuplicateMaturity { id: "2024-12".to_string() });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn list_is_ascending_by_id() {
        let mut registry = MaturityRegistry::new();
        registry.add(1, 2025).unwrap();
        registry.add(11, 2024).unwrap();
        registry.add(3, 2024).unwrap();
        let ids: Vec<String> = registry.list().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["2024-03", "2024-11", "2025-01"]);
    }

    #[test]
    fn missing_or_invalid_fields_are_invalid_input() {
        let mut registry = MaturityRegistry::new();
        assert!(matches!(registry.add_declared("", "2024"), Err(CurveError::InvalidInput { .. })));
        assert!(matches!(registry.add_declared("05", ""), Err(CurveError::InvalidInput { .. })));
        assert!(matches!(registry.add_declared("13", "2024"), Err(CurveError::InvalidInput { .. })));
        assert!(matches!(registry.add_declared("xx", "2024"), Err(CurveError::InvalidInput { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn engine_accepts_years_outside_the_form_range() {
        let mut registry = MaturityRegistry::new();
        assert_eq!(registry.add(6, 2041).unwrap().id, "2041-06");
    }

    #[test]
    fn five_digit_years_sort_after_four_digit_ones() {
        let mut registry = MaturityRegistry::new();
        registry.add(1, 10000).unwrap();
        registry.add(12, 2024).unwrap();
        assert_eq!(registry.ids(), vec!["2024-12", "10000-01"]);
        let ids: Vec<String> = registry.list().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["2024-12", "10000-01"]);
        assert!(registry.contains("10000-01"));
    }

    #[test]
    fn lookup_requires_the_canonical_id() {
        let mut registry = MaturityRegistry::new();
        registry.add(1, 2025).unwrap();
        assert!(registry.contains("2025-01"));
        assert!(!registry.contains("2025-1"));
        assert!(registry.remove("2025-1").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = MaturityRegistry::new();
        registry.add_id("2024-12").unwrap();
        assert!(registry.remove("2024-12").is_some());
        assert!(registry.remove("2024-12").is_none());
        assert!(registry.is_empty());
    }
}
