//! Shared "merge pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! declare maturities -> parse files (parallel) -> assign -> merge -> curve
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::app::session::Session;
use crate::domain::{ForwardCurve, RunConfig};
use crate::error::AppError;
use crate::io::ingest::{FileLoad, load_price_files};

/// All computed outputs of a merge run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub session: Session,
    /// Per-file outcomes, in command-line order.
    pub loads: Vec<FileLoad>,
    pub spot: Option<FileLoad>,
}

impl RunOutput {
    pub fn failed_loads(&self) -> impl Iterator<Item = &FileLoad> {
        self.loads
            .iter()
            .chain(self.spot.iter())
            .filter(|l| l.result.is_err())
    }
}

/// Parse every source, build the session, and merge.
pub fn run_merge(config: &RunConfig) -> Result<RunOutput, AppError> {
    let mut session = Session::new(config.product.clone());

    // 1) Declare maturities: explicit ones first, then those named by files.
    for id in &config.maturities {
        session.add_maturity_id(id)?;
    }
    for spec in &config.files {
        if let Some(id) = &spec.maturity {
            if !session.registry().contains(id) {
                session.add_maturity_id(id)?;
            }
        }
    }

    // 2) Parse contract files and spot together; each file fails on its own.
    let mut paths: Vec<PathBuf> = config.files.iter().map(|f| f.path.clone()).collect();
    if let Some(spot) = &config.spot {
        paths.push(spot.clone());
    }
    let mut loads = load_price_files(&paths, &config.columns);
    let spot = if config.spot.is_some() { loads.pop() } else { None };

    // 3) Register parsed series and their assignments.
    for (spec, load) in config.files.iter().zip(&loads) {
        let Ok(loaded) = &load.result else { continue };
        if session.series(&loaded.name).is_some() {
            return Err(AppError::new(
                2,
                format!("Two input files share the name '{}'; rename one of them.", loaded.name),
            ));
        }
        session.insert_series(loaded.name.clone(), loaded.parsed.series.clone());
        if let Some(id) = &spec.maturity {
            session.assign(&loaded.name, id)?;
        }
    }
    if let Some(Ok(loaded)) = spot.as_ref().map(|l| &l.result) {
        session.set_spot(Some(loaded.parsed.series.clone()));
    }

    // 4) Merge.
    session.merge()?;

    Ok(RunOutput { session, loads, spot })
}

/// Run the merge, then build the curve for the configured (or latest) date.
pub fn run_curve(config: &RunConfig) -> Result<(RunOutput, ForwardCurve), AppError> {
    let run = run_merge(config)?;
    let date = resolve_date(&run.session, config.date)?;
    let curve = run.session.build_curve(date)?;
    Ok((run, curve))
}

/// The requested observation date, or the most recent merged one.
pub fn resolve_date(session: &Session, requested: Option<NaiveDate>) -> Result<NaiveDate, AppError> {
    match requested {
        Some(date) => Ok(date),
        None => session
            .latest_date()
            .ok_or_else(|| AppError::new(3, "No merged dates available.")),
    }
}
