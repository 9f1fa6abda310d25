//! Reporting utilities: ingest summaries and formatted terminal output.

pub mod format;

pub use format::{format_curve_table, format_ingest_summary, format_merged_preview};

use crate::app::pipeline::RunOutput;
use crate::io::ingest::FileLoad;

/// One source file's outcome, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    /// Assigned maturity id, `"spot"` for the spot file, `None` when unassigned.
    pub role: Option<String>,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,
    /// Load failure, if the file was skipped.
    pub error: Option<String>,
}

/// Summaries for every contract file (input order), then the spot file.
pub fn summarize_loads(run: &RunOutput) -> Vec<FileSummary> {
    let mut out: Vec<FileSummary> = run
        .loads
        .iter()
        .map(|load| {
            let role = run.session.assignment(&load.name).map(str::to_string);
            summarize(load, role)
        })
        .collect();
    if let Some(spot) = &run.spot {
        out.push(summarize(spot, Some(crate::domain::SPOT_KEY.to_string())));
    }
    out
}

fn summarize(load: &FileLoad, role: Option<String>) -> FileSummary {
    match &load.result {
        Ok(loaded) => FileSummary {
            name: load.name.clone(),
            role,
            rows_read: loaded.parsed.rows_read,
            rows_kept: loaded.parsed.rows_kept(),
            rows_dropped: loaded.parsed.rows_dropped,
            error: None,
        },
        Err(err) => FileSummary {
            name: load.name.clone(),
            role: None,
            rows_read: 0,
            rows_kept: 0,
            rows_dropped: 0,
            error: Some(err.message().to_string()),
        },
    }
}
