//! Join per-maturity series (+ optional spot) into one date-indexed table.
//!
//! The join is a full outer join on exact dates: every date seen in any input
//! produces a row, and a maturity without an observation on that date is `None`.
//! There is no nearest-date lookup or forward fill anywhere.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::curve::registry::MaturityRegistry;
use crate::domain::{MergedRow, MergedTable, Series};
use crate::error::{CurveError, CurveResult};

/// File name → assigned maturity id (`None` while unassigned).
pub type Assignments = BTreeMap<String, Option<String>>;

/// Merge every assigned series into a table ordered by date descending.
///
/// All files in `series` must carry an assignment to a registered maturity;
/// otherwise the merge fails before any join work with the full list of
/// offending names. An empty result is returned as-is.
pub fn merge(
    registry: &MaturityRegistry,
    assignments: &Assignments,
    series: &BTreeMap<String, Series>,
    spot: Option<&Series>,
) -> CurveResult<MergedTable> {
    let unassigned = unassigned_files(registry, assignments, series);
    if !unassigned.is_empty() {
        return Err(CurveError::UnassignedFiles { files: unassigned });
    }

    // Only the files we actually have data for take part.
    let mut joined: Vec<(&str, &Series)> = Vec::with_capacity(series.len());
    for (file, maturity) in assignments {
        let Some(maturity) = maturity.as_deref().map(str::trim).filter(|m| !m.is_empty()) else {
            continue;
        };
        match series.get(file) {
            Some(data) => joined.push((maturity, data)),
            None => tracing::warn!(file = %file, "assigned file has no parsed data; skipped"),
        }
    }
    warn_shared_maturities(assignments);

    let spot = spot.filter(|s| !s.is_empty());

    let mut dates: BTreeSet<NaiveDate> = series.values().flat_map(Series::dates).collect();
    if let Some(spot) = spot {
        dates.extend(spot.dates());
    }

    let maturity_ids = registry.ids();
    let template: BTreeMap<String, Option<f64>> = maturity_ids.iter().map(|id| (id.clone(), None)).collect();

    let rows: Vec<MergedRow> = dates
        .into_iter()
        .rev()
        .map(|date| {
            let mut prices = template.clone();
            for &(maturity, data) in &joined {
                if let Some(price) = data.get(date) {
                    prices.insert(maturity.to_string(), Some(price));
                }
            }
            MergedRow {
                date,
                spot: spot.and_then(|s| s.get(date)),
                prices,
            }
        })
        .collect();

    tracing::debug!(
        rows = rows.len(),
        maturities = template.len(),
        spot = spot.is_some(),
        "merged series"
    );

    Ok(MergedTable {
        has_spot: spot.is_some(),
        maturity_ids,
        rows,
    })
}

/// Files in `series` without a usable assignment, in name order.
///
/// An assignment is unusable when missing, blank, or pointing at a maturity
/// that is no longer registered.
pub fn unassigned_files(
    registry: &MaturityRegistry,
    assignments: &Assignments,
    series: &BTreeMap<String, Series>,
) -> Vec<String> {
    series
        .keys()
        .filter(|file| {
            match assignments.get(*file).and_then(|m| m.as_deref()).map(str::trim) {
                Some(id) if !id.is_empty() => !registry.contains(id),
                _ => true,
            }
        })
        .cloned()
        .collect()
}

fn warn_shared_maturities(assignments: &Assignments) {
    let mut by_maturity: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (file, maturity) in assignments {
        if let Some(maturity) = maturity.as_deref() {
            by_maturity.entry(maturity).or_default().push(file);
        }
    }
    for (maturity, files) in by_maturity {
        if files.len() > 1 {
            tracing::warn!(
                maturity,
                files = %files.join(", "),
                "several files assigned to one maturity; observed prices take precedence over gaps"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricePoint;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series(points: &[(NaiveDate, f64)]) -> Series {
        Series::from_points(points.iter().map(|&(date, price)| PricePoint { date, price }))
    }

    fn registry(ids: &[&str]) -> MaturityRegistry {
        let mut registry = MaturityRegistry::new();
        for id in ids {
            registry.add_id(id).unwrap();
        }
        registry
    }

    #[test]
    fn merges_two_files_on_shared_date() {
        let registry = registry(&["2024-12", "2025-01"]);
        let mut data = BTreeMap::new();
        data.insert("dec24.csv".to_string(), series(&[(d(2024, 1, 2), 102.5)]));
        data.insert("jan25.csv".to_string(), series(&[(d(2024, 1, 2), 105.0)]));
        let mut assignments = Assignments::new();
        assignments.insert("dec24.csv".to_string(), Some("2024-12".to_string()));
        assignments.insert("jan25.csv".to_string(), Some("2025-01".to_string()));

        let table = merge(&registry, &assignments, &data, None).unwrap();
        assert!(!table.has_spot);
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.date, d(2024, 1, 2));
        assert_eq!(row.spot, None);
        assert_eq!(row.price("2024-12"), Some(102.5));
        assert_eq!(row.price("2025-01"), Some(105.0));
    }

    #[test]
    fn union_of_dates_descending_with_gaps() {
        let registry = registry(&["2024-12", "2025-01", "2025-02"]);
        let mut data = BTreeMap::new();
        data.insert("a.csv".to_string(), series(&[(d(2024, 1, 2), 1.0), (d(2024, 1, 4), 2.0)]));
        data.insert("b.csv".to_string(), series(&[(d(2024, 1, 3), 3.0)]));
        let mut assignments = Assignments::new();
        assignments.insert("a.csv".to_string(), Some("2024-12".to_string()));
        assignments.insert("b.csv".to_string(), Some("2025-01".to_string()));
        let spot = series(&[(d(2024, 1, 5), 99.0), (d(2024, 1, 2), 98.0)]);

        let table = merge(&registry, &assignments, &data, Some(&spot)).unwrap();
        let dates: Vec<NaiveDate> = table.dates().collect();
        assert_eq!(dates, vec![d(2024, 1, 5), d(2024, 1, 4), d(2024, 1, 3), d(2024, 1, 2)]);
        assert!(table.has_spot);

        let top = &table.rows[0];
        assert_eq!(top.spot, Some(99.0));
        assert_eq!(top.prices.get("2024-12"), Some(&None));
        // Declared maturity without a file is still a key on every row.
        assert!(table.rows.iter().all(|r| r.prices.contains_key("2025-02")));

        let jan3 = table.row(d(2024, 1, 3)).unwrap();
        assert_eq!(jan3.spot, None);
        assert_eq!(jan3.price("2025-01"), Some(3.0));
        assert_eq!(jan3.price("2024-12"), None);
    }

    #[test]
    fn maturity_columns_follow_the_calendar() {
        let registry = registry(&["10000-01", "2024-12"]);
        let mut data = BTreeMap::new();
        data.insert("far.csv".to_string(), series(&[(d(2024, 1, 2), 150.0)]));
        let mut assignments = Assignments::new();
        assignments.insert("far.csv".to_string(), Some("10000-01".to_string()));

        let table = merge(&registry, &assignments, &data, None).unwrap();
        assert_eq!(table.maturity_ids, vec!["2024-12", "10000-01"]);
        assert_eq!(table.rows[0].price("10000-01"), Some(150.0));
    }

    #[test]
    fn unassigned_files_are_all_reported() {
        let registry = registry(&["2024-12"]);
        let mut data = BTreeMap::new();
        data.insert("a.csv".to_string(), series(&[(d(2024, 1, 2), 1.0)]));
        data.insert("b.csv".to_string(), series(&[(d(2024, 1, 2), 1.0)]));
        data.insert("c.csv".to_string(), series(&[(d(2024, 1, 2), 1.0)]));
        let mut assignments = Assignments::new();
        assignments.insert("a.csv".to_string(), Some(String::new()));
        assignments.insert("b.csv".to_string(), Some("2024-12".to_string()));

        let err = merge(&registry, &assignments, &data, None).unwrap_err();
        assert_eq!(
            err,
            CurveError::UnassignedFiles { files: vec!["a.csv".to_string(), "c.csv".to_string()] }
        );
    }

    #[test]
    fn assignment_to_removed_maturity_is_unassigned() {
        let mut registry = registry(&["2024-12"]);
        registry.remove("2024-12");
        let mut data = BTreeMap::new();
        data.insert("a.csv".to_string(), series(&[(d(2024, 1, 2), 1.0)]));
        let mut assignments = Assignments::new();
        assignments.insert("a.csv".to_string(), Some("2024-12".to_string()));
        assert_eq!(unassigned_files(&registry, &assignments, &data), vec!["a.csv".to_string()]);
    }

    #[test]
    fn empty_inputs_yield_empty_table() {
        let registry = registry(&["2024-12"]);
        let mut data = BTreeMap::new();
        data.insert("a.csv".to_string(), Series::new());
        let mut assignments = Assignments::new();
        assignments.insert("a.csv".to_string(), Some("2024-12".to_string()));
        let table = merge(&registry, &assignments, &data, Some(&Series::new())).unwrap();
        assert!(table.is_empty());
        assert!(!table.has_spot);
    }

    #[test]
    fn observed_price_beats_gap_when_files_share_a_maturity() {
        let registry = registry(&["2024-12"]);
        let mut data = BTreeMap::new();
        data.insert("a.csv".to_string(), series(&[(d(2024, 1, 2), 1.0)]));
        data.insert("b.csv".to_string(), series(&[(d(2024, 1, 3), 2.0)]));
        let mut assignments = Assignments::new();
        assignments.insert("a.csv".to_string(), Some("2024-12".to_string()));
        assignments.insert("b.csv".to_string(), Some("2024-12".to_string()));
        let table = merge(&registry, &assignments, &data, None).unwrap();
        assert_eq!(table.row(d(2024, 1, 2)).unwrap().price("2024-12"), Some(1.0));
        assert_eq!(table.row(d(2024, 1, 3)).unwrap().price("2024-12"), Some(2.0));
    }
}
