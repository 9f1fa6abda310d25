//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during merging and curve construction
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CurveError, CurveResult};

/// Key used for the spot entry of a curve (and the spot column of exports).
pub const SPOT_KEY: &str = "spot";

/// Display label of the spot curve point.
pub const SPOT_LABEL: &str = "Spot";

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// English month name for a 1-indexed month.
pub fn month_name(month: u32) -> Option<&'static str> {
    let idx = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(idx).copied()
}

/// Stable maturity identifier: zero-padded `YYYY-MM`.
///
/// Sort maturities by `(year, month)`, not by this string: years past 9999
/// widen the id and break lexicographic order.
pub fn maturity_id(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

/// Parse a `YYYY-MM` maturity id back into `(year, month)`.
pub fn parse_maturity_id(id: &str) -> CurveResult<(i32, u32)> {
    let (year, month) = id
        .trim()
        .split_once('-')
        .ok_or_else(|| CurveError::invalid_input(format!("Maturity '{id}' is not of the form YYYY-MM")))?;
    let year = year
        .parse::<i32>()
        .map_err(|_| CurveError::invalid_input(format!("Invalid year in maturity '{id}'")))?;
    let month = month
        .parse::<u32>()
        .map_err(|_| CurveError::invalid_input(format!("Invalid month in maturity '{id}'")))?;
    Ok((year, month))
}

/// One normalized observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// A date-keyed price series for one source (a contract file or spot).
///
/// At most one price per date; inserting an existing date replaces it, so the
/// last parsed row wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    points: BTreeMap<NaiveDate, f64>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: impl IntoIterator<Item = PricePoint>) -> Self {
        let mut series = Self::new();
        for p in points {
            series.insert(p);
        }
        series
    }

    /// Insert a point, returning the price it replaced (if any).
    pub fn insert(&mut self, point: PricePoint) -> Option<f64> {
        self.points.insert(point.date, point.price)
    }

    /// Exact-date lookup.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.keys().copied()
    }

    /// Points in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = PricePoint> + '_ {
        self.points.iter().map(|(&date, &price)| PricePoint { date, price })
    }
}

/// A declared futures delivery month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDate {
    pub month: u32,
    pub year: i32,
    /// `YYYY-MM`; the join key used everywhere else.
    pub id: String,
    /// `<MonthName> <Year>`.
    pub label: String,
}

impl DeliveryDate {
    pub fn new(month: u32, year: i32) -> CurveResult<Self> {
        let name = month_name(month)
            .ok_or_else(|| CurveError::invalid_input(format!("Month must be between 1 and 12 (got {month})")))?;
        if year <= 0 {
            return Err(CurveError::invalid_input(format!("Year must be positive (got {year})")));
        }
        Ok(Self {
            month,
            year,
            id: maturity_id(year, month),
            label: format!("{name} {year}"),
        })
    }
}

/// One row of the merged wide table.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub date: NaiveDate,
    /// `None` when spot was not supplied, or supplied without a price on `date`.
    pub spot: Option<f64>,
    /// Every declared maturity id, `None` when its series has no price on `date`.
    pub prices: BTreeMap<String, Option<f64>>,
}

impl MergedRow {
    /// Price of a maturity on this row (`None` for unknown ids and gaps alike).
    pub fn price(&self, maturity_id: &str) -> Option<f64> {
        self.prices.get(maturity_id).copied().flatten()
    }
}

/// Merged table: rows ordered by date descending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedTable {
    /// Whether a spot series took part in the merge (controls the `spot` column).
    pub has_spot: bool,
    /// Maturity ids present as keys in every row, in chronological order.
    pub maturity_ids: Vec<String>,
    pub rows: Vec<MergedRow>,
}

impl MergedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact-date row lookup.
    pub fn row(&self, date: NaiveDate) -> Option<&MergedRow> {
        // Rows are sorted descending, so search with a reversed comparator.
        self.rows
            .binary_search_by(|r| date.cmp(&r.date))
            .ok()
            .map(|idx| &self.rows[idx])
    }

    /// Observation dates, most recent first.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.iter().map(|r| r.date)
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }
}

/// One point of a forward curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Maturity id, or `"spot"`.
    pub maturity: String,
    pub display_label: String,
    pub price: f64,
    /// Whole days from the observation date to expiry; `0` for spot.
    pub time_to_maturity_days: i64,
    /// Third-Friday expiry of the resolved contract month (absent for spot).
    pub expiry: Option<NaiveDate>,
}

impl CurvePoint {
    pub fn is_spot(&self) -> bool {
        self.maturity == SPOT_KEY
    }
}

/// The ordered curve for one observation date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardCurve {
    pub observation_date: NaiveDate,
    pub points: Vec<CurvePoint>,
}

/// Product metadata (labels only; no effect on the engine).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductConfig {
    pub commodity: Option<String>,
    pub currency: Option<String>,
}

impl ProductConfig {
    /// `"Wheat (EUR)"`, `"Wheat"`, or `"-"`.
    pub fn display_name(&self) -> String {
        match (self.commodity.as_deref(), self.currency.as_deref()) {
            (Some(c), Some(ccy)) => format!("{c} ({ccy})"),
            (Some(c), None) => c.to_string(),
            (None, Some(ccy)) => format!("- ({ccy})"),
            (None, None) => "-".to_string(),
        }
    }
}

/// A saved curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    #[serde(default)]
    pub product: ProductConfig,
    pub observation_date: NaiveDate,
    pub points: Vec<CurvePoint>,
}

/// Header names of the date and price columns in source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceColumns {
    pub date: String,
    pub price: String,
}

impl Default for SourceColumns {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            price: "Price".to_string(),
        }
    }
}

/// A contract file given on the command line and its maturity (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub path: PathBuf,
    pub maturity: Option<String>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub product: ProductConfig,
    pub files: Vec<FileSpec>,
    /// Maturities declared without a file.
    pub maturities: Vec<String>,
    pub spot: Option<PathBuf>,
    pub columns: SourceColumns,
    /// Observation date; `None` means the latest merged date.
    pub date: Option<NaiveDate>,
    pub preview_rows: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn maturity_ids_are_zero_padded() {
        assert_eq!(maturity_id(2024, 3), "2024-03");
        assert_eq!(parse_maturity_id("2025-01").unwrap(), (2025, 1));
        assert!(parse_maturity_id("2025").is_err());
    }

    #[test]
    fn delivery_date_label_and_validation() {
        let dd = DeliveryDate::new(12, 2024).unwrap();
        assert_eq!(dd.id, "2024-12");
        assert_eq!(dd.label, "December 2024");
        assert!(DeliveryDate::new(13, 2024).is_err());
        assert!(DeliveryDate::new(0, 2024).is_err());
        assert!(DeliveryDate::new(1, 0).is_err());
    }

    #[test]
    fn series_last_insert_wins() {
        let series = Series::from_points([
            PricePoint { date: d(2024, 1, 2), price: 1.0 },
            PricePoint { date: d(2024, 1, 2), price: 2.0 },
        ]);
        assert_eq!(series.len(), 1);
        assert_eq!(series.get(d(2024, 1, 2)), Some(2.0));
    }

    #[test]
    fn merged_table_row_lookup_on_descending_rows() {
        let row = |date| MergedRow { date, spot: None, prices: BTreeMap::new() };
        let table = MergedTable {
            has_spot: false,
            maturity_ids: vec![],
            rows: vec![row(d(2024, 1, 5)), row(d(2024, 1, 3)), row(d(2024, 1, 2))],
        };
        assert_eq!(table.row(d(2024, 1, 3)).map(|r| r.date), Some(d(2024, 1, 3)));
        assert!(table.row(d(2024, 1, 4)).is_none());
        assert_eq!(table.latest_date(), Some(d(2024, 1, 5)));
    }
}
