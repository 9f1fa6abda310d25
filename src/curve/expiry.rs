//! Contract expiry dates and time-to-maturity.
//!
//! Futures on the monthly grid expire on the third Friday of their delivery
//! month. The curve only knows month numbers for its maturities, so absolute
//! years are inferred relative to the observation date (see
//! [`infer_rollover_years`]).

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::{CurveError, CurveResult};

const MS_PER_DAY: i64 = 86_400_000;

/// Maps a contract month to its calendar expiry date.
pub trait ExpiryRule {
    fn expiry_date(&self, year: i32, month: u32) -> CurveResult<NaiveDate>;
}

/// The standard monthly futures/options expiry convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThirdFriday;

impl ExpiryRule for ThirdFriday {
    fn expiry_date(&self, year: i32, month: u32) -> CurveResult<NaiveDate> {
        third_friday(year, month)
    }
}

/// Third Friday of `month` (1-indexed) in `year`.
pub fn third_friday(year: i32, month: u32) -> CurveResult<NaiveDate> {
    nth_weekday_of_month(year, month, Weekday::Fri, 3)
}

/// Nth occurrence of `weekday`, scanning forward day by day from the 1st.
fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u32) -> CurveResult<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CurveError::invalid_input(format!("Invalid contract month {year}-{month:02}")))?;

    let mut count = 0;
    for date in first.iter_days().take_while(|d| d.month() == month) {
        if date.weekday() == weekday {
            count += 1;
            if count == n {
                return Ok(date);
            }
        }
    }

    Err(CurveError::invalid_input(format!(
        "No occurrence {n} of {weekday:?} in {year}-{month:02}"
    )))
}

/// Resolve absolute years for a walk over contract months.
///
/// The running year starts at `base_year` and increments each time a month
/// number is lower than the previous one seen. Only this wrap is inferred: a
/// grid spanning more than twelve months collapses onto consecutive years.
pub fn infer_rollover_years(base_year: i32, months: &[u32]) -> Vec<(u32, i32)> {
    let mut year = base_year;
    let mut prev: Option<u32> = None;
    let mut out = Vec::with_capacity(months.len());
    for &month in months {
        if prev.is_some_and(|p| month < p) {
            year += 1;
        }
        out.push((month, year));
        prev = Some(month);
    }
    out
}

/// Whole days from `observation` to `expiry`, rounded up; negative once expired.
pub fn time_to_maturity(observation: NaiveDate, expiry: NaiveDate) -> i64 {
    let ms = expiry.signed_duration_since(observation).num_milliseconds();
    let days = ms / MS_PER_DAY;
    if ms % MS_PER_DAY > 0 { days + 1 } else { days }
}
