//! Export the merged table and curves to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts, and the merged export can be fed straight back into the ingest
//! parser one column at a time.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{ForwardCurve, MergedTable, SPOT_KEY};
use crate::error::AppError;

/// Write the merged table: `date, spot?, <maturity ids in table order>`.
///
/// Rows keep the table order (most recent first); gaps are empty cells.
pub fn write_merged_csv<W: Write>(writer: W, table: &MergedTable) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);

    let ids = &table.maturity_ids;

    let mut header = vec!["date".to_string()];
    if table.has_spot {
        header.push(SPOT_KEY.to_string());
    }
    header.extend(ids.iter().cloned());
    out.write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write merged CSV header: {e}")))?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.date.to_string());
        if table.has_spot {
            record.push(fmt_price(row.spot));
        }
        for id in ids {
            record.push(fmt_price(row.price(id)));
        }
        out.write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write merged CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush merged CSV: {e}")))?;
    Ok(())
}

/// Write the merged table to a file.
pub fn export_merged_csv(path: &Path, table: &MergedTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_merged_csv(file, table)?;
    tracing::info!(path = %path.display(), rows = table.len(), "exported merged table");
    Ok(())
}

/// Write a curve as `maturity,label,expiry,days_to_expiry,price`.
pub fn write_curve_csv<W: Write>(writer: W, curve: &ForwardCurve) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["maturity", "label", "expiry", "days_to_expiry", "price"])
        .map_err(|e| AppError::new(2, format!("Failed to write curve CSV header: {e}")))?;

    for p in &curve.points {
        out.write_record([
            p.maturity.clone(),
            p.display_label.clone(),
            p.expiry.map(|d| d.to_string()).unwrap_or_default(),
            p.time_to_maturity_days.to_string(),
            p.price.to_string(),
        ])
        .map_err(|e| AppError::new(2, format!("Failed to write curve CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush curve CSV: {e}")))?;
    Ok(())
}

/// Write a curve CSV to a file.
pub fn export_curve_csv(path: &Path, curve: &ForwardCurve) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve CSV '{}': {e}", path.display())))?;
    write_curve_csv(file, curve)
}

// Shortest decimal that round-trips to the same f64.
fn fmt_price(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
