//! Forward curve for one observation date.

use chrono::{Datelike, NaiveDate};

use crate::curve::expiry::{ExpiryRule, infer_rollover_years, time_to_maturity};
use crate::curve::registry::MaturityRegistry;
use crate::domain::{CurvePoint, ForwardCurve, MergedTable, SPOT_KEY, SPOT_LABEL};
use crate::error::{CurveError, CurveResult};

/// Build the observed forward curve on `observation_date`.
///
/// Output order: spot first (when the row has a spot price), then the declared
/// maturities in registry order with years re-resolved from the observation
/// year. Maturities without a price on that date are left out. Nothing is
/// interpolated; a date absent from the table is `DateNotFound`.
pub fn build_curve(
    observation_date: NaiveDate,
    table: &MergedTable,
    registry: &MaturityRegistry,
    rule: &impl ExpiryRule,
) -> CurveResult<ForwardCurve> {
    let row = table
        .row(observation_date)
        .ok_or(CurveError::DateNotFound { date: observation_date })?;

    let mut points = Vec::with_capacity(registry.len() + 1);

    if let Some(price) = row.spot {
        points.push(CurvePoint {
            maturity: SPOT_KEY.to_string(),
            display_label: SPOT_LABEL.to_string(),
            price,
            time_to_maturity_days: 0,
            expiry: None,
        });
    }

    let deliveries = registry.list();
    let months: Vec<u32> = deliveries.iter().map(|d| d.month).collect();
    let resolved = infer_rollover_years(observation_date.year(), &months);

    for (delivery, (month, year)) in deliveries.iter().zip(resolved) {
        let Some(price) = row.price(&delivery.id) else {
            continue;
        };
        let expiry = rule.expiry_date(year, month)?;
        points.push(CurvePoint {
            maturity: delivery.id.clone(),
            display_label: delivery.label.clone(),
            price,
            time_to_maturity_days: time_to_maturity(observation_date, expiry),
            expiry: Some(expiry),
        });
    }

    tracing::debug!(date = %observation_date, points = points.len(), "built forward curve");

    Ok(ForwardCurve {
        observation_date,
        points,
    })
}
