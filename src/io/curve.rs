//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of one observed curve:
//! - product labels (commodity, currency)
//! - the observation date
//! - the ordered points (maturity, label, expiry, days to expiry, price)
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{CurveFile, ForwardCurve, ProductConfig};
use crate::error::AppError;

pub const TOOL_NAME: &str = "fc";

/// Wrap a curve with its product labels.
pub fn curve_file(curve: &ForwardCurve, product: &ProductConfig) -> CurveFile {
    CurveFile {
        tool: TOOL_NAME.to_string(),
        product: product.clone(),
        observation_date: curve.observation_date,
        points: curve.points.clone(),
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &ForwardCurve, product: &ProductConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &curve_file(curve, product))
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;

    tracing::info!(path = %path.display(), date = %curve.observation_date, "exported curve");
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid curve JSON: {e}")))?;
    Ok(curve)
}
