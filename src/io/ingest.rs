//! CSV ingest and normalization.
//!
//! This module is responsible for turning per-contract price exports into clean
//! date-keyed [`Series`].
//!
//! Design goals:
//! - **Strict schema** for the two required columns (clear file-level errors)
//! - **Row-level leniency** (drop bad rows, but report what happened)
//! - **Isolation**: one broken file never affects its siblings
//! - **Separation of concerns**: no merging logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use rayon::prelude::*;

use crate::domain::{PricePoint, Series, SourceColumns};
use crate::error::{AppError, CurveError, CurveResult};

/// How many dropped rows we keep details for, per file.
const MAX_ROW_ISSUES: usize = 20;

/// A row as read from a source, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line in the source (0 when unknown).
    pub line: usize,
    pub date: Option<String>,
    pub price: Option<String>,
}

impl RawRow {
    pub fn new(date: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            line: 0,
            date: Some(date.into()),
            price: Some(price.into()),
        }
    }
}

/// A dropped row and the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    pub line: usize,
    pub message: String,
}

/// Parser output: the series plus what was dropped on the way.
#[derive(Debug, Clone, Default)]
pub struct ParsedSeries {
    pub series: Series,
    pub rows_read: usize,
    pub rows_dropped: usize,
    /// The first dropped rows (capped).
    pub issues: Vec<RowIssue>,
}

impl ParsedSeries {
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.rows_dropped
    }

    fn drop_row(&mut self, line: usize, message: impl Into<String>) {
        self.rows_dropped += 1;
        if self.issues.len() < MAX_ROW_ISSUES {
            self.issues.push(RowIssue {
                line,
                message: message.into(),
            });
        }
    }
}

/// Normalize raw rows into a series.
///
/// Rows missing either field are dropped first; then the date must parse and
/// the price must yield a finite number after stripping everything except
/// digits, `.` and `-`. Never fails: an empty result is a valid series.
pub fn parse_rows(rows: impl IntoIterator<Item = RawRow>) -> ParsedSeries {
    let mut out = ParsedSeries::default();

    for row in rows {
        out.rows_read += 1;

        let (Some(date_field), Some(price_field)) = (non_empty(row.date.as_deref()), non_empty(row.price.as_deref()))
        else {
            out.drop_row(row.line, "Missing date or price.");
            continue;
        };

        let Some(date) = parse_date(date_field) else {
            out.drop_row(row.line, format!("Invalid date '{date_field}'."));
            continue;
        };

        let Some(price) = parse_price(price_field) else {
            out.drop_row(row.line, format!("Invalid price '{price_field}'."));
            continue;
        };

        out.series.insert(PricePoint { date, price });
    }

    out
}

/// Read the date/price columns of a delimited file with a header line.
///
/// Missing columns are a file-level error. Records the CSV reader cannot decode
/// are returned as rows with no fields so they count as dropped.
pub fn read_price_rows<R: Read>(reader: R, columns: &SourceColumns) -> CurveResult<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| CurveError::invalid_input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let date_idx = column_index(&header_map, &columns.date)?;
    let price_idx = column_index(&header_map, &columns.price)?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records start on the line after the header, and lines are 1-based.
        let line = idx + 2;
        match result {
            Ok(record) => rows.push(RawRow {
                line,
                date: record.get(date_idx).map(str::to_string),
                price: record.get(price_idx).map(str::to_string),
            }),
            Err(e) => {
                tracing::debug!(line, error = %e, "unreadable CSV record");
                rows.push(RawRow {
                    line,
                    ..RawRow::default()
                });
            }
        }
    }
    Ok(rows)
}

/// One source file after parsing.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    /// Source identifier (the file name).
    pub name: String,
    pub path: PathBuf,
    pub parsed: ParsedSeries,
}

/// Per-file load outcome; failures are kept alongside successes.
#[derive(Debug, Clone)]
pub struct FileLoad {
    pub name: String,
    pub path: PathBuf,
    pub result: Result<LoadedFile, AppError>,
}

/// Open, read, and parse one price file.
pub fn load_price_file(path: &Path, columns: &SourceColumns) -> Result<LoadedFile, AppError> {
    let name = source_name(path);
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let rows = read_price_rows(file, columns)
        .map_err(|e| AppError::new(2, format!("{name}: {e}")))?;
    let parsed = parse_rows(rows);

    tracing::info!(
        file = %name,
        rows = parsed.rows_read,
        kept = parsed.rows_kept(),
        dropped = parsed.rows_dropped,
        "parsed price file"
    );

    Ok(LoadedFile {
        name,
        path: path.to_path_buf(),
        parsed,
    })
}

/// Parse many files in parallel and wait for all of them.
///
/// Results come back in input order. A failing file is reported in its own
/// slot and does not stop the others.
pub fn load_price_files(paths: &[PathBuf], columns: &SourceColumns) -> Vec<FileLoad> {
    paths
        .par_iter()
        .map(|path| {
            let result = load_price_file(path, columns);
            if let Err(err) = &result {
                tracing::warn!(file = %path.display(), error = %err, "failed to load price file");
            }
            FileLoad {
                name: source_name(path),
                path: path.clone(),
                result,
            }
        })
        .collect()
}

/// The identifier a file's series is keyed by.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "\u{feff}Date"). If we don't strip it, schema validation
    // will incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn column_index(header_map: &HashMap<String, usize>, name: &str) -> CurveResult<usize> {
    header_map
        .get(&normalize_header_name(name))
        .copied()
        .ok_or_else(|| CurveError::invalid_input(format!("Missing required column: `{name}`")))
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a calendar date (day precision).
///
/// Exports from data vendors disagree on formats, so we accept a small fixed
/// set. Slashed dates are month-first (`MM/DD/YYYY`), as most price exports
/// write them. Dotted dates are day-first (`DD.MM.YYYY`), the European
/// convention, so `05.03.2024` is 5 March.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 6] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%b %d, %Y", "%B %d, %Y", "%d.%m.%Y"];
    let s = s.trim();
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    // ISO date-times: keep the date part.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Normalize a price field.
///
/// Every character other than a digit, `.` or `-` is stripped (currency signs,
/// thousands separators, spaces), then the longest leading number of the form
/// `-?digits[.digits]` is taken. No digits, or a non-finite value, is `None`.
pub fn parse_price(s: &str) -> Option<f64> {
    let stripped: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let number = leading_number(&stripped)?;
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn leading_number(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - frac_start;
        if frac_digits > 0 || digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }
    if digits == 0 { None } else { Some(&s[..end]) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn price_normalization_strips_noise() {
        assert_eq!(parse_price("102.50"), Some(102.5));
        assert_eq!(parse_price("$1,234.50"), Some(1234.5));
        assert_eq!(parse_price(" 99 EUR "), Some(99.0));
        assert_eq!(parse_price("-3.25"), Some(-3.25));
        assert_eq!(parse_price(".5"), Some(0.5));
        assert_eq!(parse_price("7."), Some(7.0));
        // Trailing garbage after the leading number is ignored.
        assert_eq!(parse_price("1.2.3"), Some(1.2));
        assert_eq!(parse_price("12-5"), Some(12.0));
    }

    #[test]
    fn price_without_digits_is_rejected() {
        assert_eq!(parse_price("n/a"), None);
        assert_eq!(parse_price("-"), None);
        assert_eq!(parse_price("."), None);
        assert_eq!(parse_price("--5"), None);
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("2024-01-02"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("2024/01/02"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("01/02/2024"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("Jan 02, 2024"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("02.01.2024"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("2024-01-02T15:30:00Z"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("2024-01-02 15:30:00"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn slashed_is_month_first_dotted_is_day_first() {
        assert_eq!(parse_date("03/05/2024"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("05.03.2024"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("13.01.2024"), Some(d(2024, 1, 13)));
        assert_eq!(parse_date("01.13.2024"), None);
    }

    #[test]
    fn parse_rows_drops_bad_rows_softly() {
        let rows = vec![
            RawRow::new("2024-01-02", "102.50"),
            RawRow { line: 3, date: None, price: Some("1".to_string()) },
            RawRow::new("", "1"),
            RawRow::new("bad", "1"),
            RawRow::new("2024-01-03", "abc"),
            RawRow::new("2024-01-03", "101"),
        ];
        let parsed = parse_rows(rows);
        assert_eq!(parsed.rows_read, 6);
        assert_eq!(parsed.rows_dropped, 4);
        assert_eq!(parsed.rows_kept(), 2);
        assert_eq!(parsed.series.get(d(2024, 1, 2)), Some(102.5));
        assert_eq!(parsed.series.get(d(2024, 1, 3)), Some(101.0));
        assert_eq!(parsed.issues[0].line, 3);
    }

    #[test]
    fn duplicate_dates_keep_last_row() {
        let parsed = parse_rows(vec![RawRow::new("2024-01-02", "1"), RawRow::new("2024-01-02", "2")]);
        assert_eq!(parsed.series.len(), 1);
        assert_eq!(parsed.series.get(d(2024, 1, 2)), Some(2.0));
    }

    #[test]
    fn empty_input_is_an_empty_series() {
        let parsed = parse_rows(Vec::new());
        assert!(parsed.series.is_empty());
        assert_eq!(parsed.rows_read, 0);
    }

    #[test]
    fn read_rows_matches_headers_case_insensitively() {
        let csv = "\u{feff}date,Open,PRICE\n2024-01-02,1,\"1,234.5\"\n2024-01-03,2\n";
        let rows = read_price_rows(csv.as_bytes(), &SourceColumns::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].price.as_deref(), Some("1,234.5"));
        // Short record: the price column is simply absent.
        assert_eq!(rows[1].price, None);

        let parsed = parse_rows(rows);
        assert_eq!(parsed.series.get(d(2024, 1, 2)), Some(1234.5));
        assert_eq!(parsed.rows_dropped, 1);
    }

    #[test]
    fn read_rows_requires_columns() {
        let csv = "Day,Close\n2024-01-02,1\n";
        let err = read_price_rows(csv.as_bytes(), &SourceColumns::default()).unwrap_err();
        assert!(err.to_string().contains("`Date`"));
    }
}
