//! Curve-construction session.
//!
//! One session holds everything a single workflow accumulates: declared
//! maturities, parsed series, file assignments, the optional spot series, and
//! the last merged table. Operations that fail leave the session unchanged.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::curve::{Assignments, MaturityRegistry, ThirdFriday, build_curve, merge, unassigned_files};
use crate::domain::{DeliveryDate, ForwardCurve, MergedTable, ProductConfig, Series};
use crate::error::{CurveError, CurveResult};

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub product: ProductConfig,
    registry: MaturityRegistry,
    series: BTreeMap<String, Series>,
    assignments: Assignments,
    spot: Option<Series>,
    merged: Option<MergedTable>,
}

impl Session {
    pub fn new(product: ProductConfig) -> Self {
        Self {
            product,
            ..Self::default()
        }
    }

    pub fn registry(&self) -> &MaturityRegistry {
        &self.registry
    }

    pub fn add_maturity(&mut self, month: u32, year: i32) -> CurveResult<DeliveryDate> {
        self.registry.add(month, year)
    }

    pub fn add_maturity_id(&mut self, id: &str) -> CurveResult<DeliveryDate> {
        self.registry.add_id(id)
    }

    /// Remove a maturity and unassign every file that pointed at it.
    pub fn remove_maturity(&mut self, id: &str) -> Option<DeliveryDate> {
        let removed = self.registry.remove(id)?;
        for (file, maturity) in self.assignments.iter_mut() {
            if maturity.as_deref() == Some(id) {
                tracing::debug!(file = %file, maturity = id, "unassigned file after maturity removal");
                *maturity = None;
            }
        }
        Some(removed)
    }

    /// Add (or replace) a parsed series. New files start unassigned.
    pub fn insert_series(&mut self, name: impl Into<String>, series: Series) {
        let name = name.into();
        self.assignments.entry(name.clone()).or_insert(None);
        self.series.insert(name, series);
    }

    /// Drop a file and its assignment.
    pub fn remove_series(&mut self, name: &str) -> Option<Series> {
        self.assignments.remove(name);
        self.series.remove(name)
    }

    pub fn series(&self, name: &str) -> Option<&Series> {
        self.series.get(name)
    }

    /// File names, ascending.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn set_spot(&mut self, spot: Option<Series>) {
        self.spot = spot;
    }

    pub fn spot(&self) -> Option<&Series> {
        self.spot.as_ref()
    }

    /// Assign a known file to a registered maturity.
    pub fn assign(&mut self, file: &str, maturity_id: &str) -> CurveResult<()> {
        if !self.series.contains_key(file) {
            return Err(CurveError::invalid_input(format!("Unknown file '{file}'")));
        }
        if !self.registry.contains(maturity_id) {
            return Err(CurveError::invalid_input(format!("Unknown maturity '{maturity_id}'")));
        }
        self.assignments
            .insert(file.to_string(), Some(maturity_id.to_string()));
        Ok(())
    }

    pub fn unassign(&mut self, file: &str) {
        if let Some(maturity) = self.assignments.get_mut(file) {
            *maturity = None;
        }
    }

    pub fn assignment(&self, file: &str) -> Option<&str> {
        self.assignments.get(file).and_then(|m| m.as_deref())
    }

    pub fn unassigned_files(&self) -> Vec<String> {
        unassigned_files(&self.registry, &self.assignments, &self.series)
    }

    /// Rebuild the merged table from scratch.
    ///
    /// On failure (unassigned files, or nothing to merge) the previous table is
    /// kept.
    pub fn merge(&mut self) -> CurveResult<&MergedTable> {
        let table = merge(&self.registry, &self.assignments, &self.series, self.spot.as_ref())?;
        if table.is_empty() {
            return Err(CurveError::EmptyMergeResult);
        }
        tracing::info!(
            rows = table.len(),
            maturities = table.maturity_ids.len(),
            spot = table.has_spot,
            "merge complete"
        );
        Ok(self.merged.insert(table))
    }

    pub fn merged(&self) -> Option<&MergedTable> {
        self.merged.as_ref()
    }

    /// Curve on `date` from the last merged table.
    pub fn build_curve(&self, date: NaiveDate) -> CurveResult<ForwardCurve> {
        let table = self
            .merged
            .as_ref()
            .ok_or(CurveError::DateNotFound { date })?;
        build_curve(date, table, &self.registry, &ThirdFriday)
    }

    /// Merged observation dates, most recent first.
    pub fn available_dates(&self) -> Vec<NaiveDate> {
        self.merged
            .as_ref()
            .map(|t| t.dates().collect())
            .unwrap_or_default()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.merged.as_ref().and_then(MergedTable::latest_date)
    }
}
