//! Command-line parsing for the forward-curve builder.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the merging/curve code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{DeliveryDate, FileSpec, parse_maturity_id};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fc", version, about = "Commodity forward curves from per-contract price files")]
pub struct Cli {
    /// Verbose logging (debug level unless FC_LOG/RUST_LOG says otherwise).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge the price files into one date-indexed table, print a preview, optionally export it.
    Merge(MergeArgs),
    /// Build the forward curve for one observation date.
    Curve(CurveArgs),
    /// List the observation dates available after merging.
    Dates(SourceArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
    /// Browse the curve date by date in a terminal UI.
    Tui(SourceArgs),
    /// Write synthetic price files (spot + monthly contracts) for trying things out.
    Sample(SampleArgs),
}

/// Sources and product labels shared by every data command.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Contract price file and its maturity, as PATH=YYYY-MM (repeatable).
    ///
    /// A bare PATH loads the file unassigned.
    #[arg(short = 'f', long = "file", value_name = "PATH=YYYY-MM", value_parser = parse_file_spec, required = true)]
    pub files: Vec<FileSpec>,

    /// Declare a maturity without a file (repeatable).
    #[arg(short = 'm', long = "maturity", value_name = "YYYY-MM", value_parser = parse_maturity)]
    pub maturities: Vec<String>,

    /// Optional spot price file.
    #[arg(short = 's', long, value_name = "PATH")]
    pub spot: Option<PathBuf>,

    /// Header of the date column.
    #[arg(long, default_value = "Date")]
    pub date_column: String,

    /// Header of the price column.
    #[arg(long, default_value = "Price")]
    pub price_column: String,

    /// Commodity label (defaults to FC_COMMODITY).
    #[arg(long)]
    pub commodity: Option<String>,

    /// Currency label (defaults to FC_CURRENCY).
    #[arg(long)]
    pub currency: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct MergeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of merged rows to preview.
    #[arg(long, default_value_t = 5)]
    pub preview: usize,

    /// Export the merged table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CurveArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Observation date (YYYY-MM-DD); defaults to the most recent merged date.
    #[arg(short, long, value_parser = parse_iso_date)]
    pub date: Option<NaiveDate>,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 18)]
    pub height: usize,

    /// Export the curve points to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Export the curve (with product labels) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

/// Options for plotting a saved curve.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Curve JSON file produced by `fc curve --export-json`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 18)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output directory (created if missing).
    #[arg(short, long, default_value = "sample")]
    pub out: PathBuf,

    /// First trading date.
    #[arg(long, value_parser = parse_iso_date, default_value = "2024-01-02")]
    pub start: NaiveDate,

    /// Number of calendar days to cover.
    #[arg(long, default_value_t = 120)]
    pub days: u32,

    /// Number of monthly contracts, starting the month after `start`.
    #[arg(long, default_value_t = 6)]
    pub contracts: u32,

    /// Spot price on the first date.
    #[arg(long, default_value_t = 100.0)]
    pub spot: f64,

    /// Annualized volatility of daily price shocks.
    #[arg(long, default_value_t = 0.25)]
    pub vol: f64,

    /// Monthly carry added per month of maturity (fraction of spot).
    #[arg(long, default_value_t = 0.005)]
    pub carry: f64,

    /// Probability that a contract misses a given day.
    #[arg(long, default_value_t = 0.05)]
    pub gap_prob: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// `PATH=YYYY-MM` or a bare `PATH`.
fn parse_file_spec(s: &str) -> Result<FileSpec, String> {
    if let Some((path, id)) = s.rsplit_once('=') {
        if path.is_empty() {
            return Err(format!("Missing path in '{s}'"));
        }
        return Ok(FileSpec {
            path: PathBuf::from(path),
            maturity: Some(parse_maturity(id)?),
        });
    }
    Ok(FileSpec {
        path: PathBuf::from(s),
        maturity: None,
    })
}

/// Validate a `YYYY-MM` id and return it in canonical zero-padded form.
fn parse_maturity(s: &str) -> Result<String, String> {
    let (year, month) = parse_maturity_id(s).map_err(|e| e.to_string())?;
    DeliveryDate::new(month, year)
        .map(|d| d.id)
        .map_err(|e| e.to_string())
}

fn parse_iso_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("Invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_spec_with_and_without_maturity() {
        let spec = parse_file_spec("data/dec24.csv=2024-12").unwrap();
        assert_eq!(spec.path, PathBuf::from("data/dec24.csv"));
        assert_eq!(spec.maturity.as_deref(), Some("2024-12"));

        let bare = parse_file_spec("jan25.csv").unwrap();
        assert_eq!(bare.maturity, None);

        assert!(parse_file_spec("x.csv=2024-13").is_err());
        assert!(parse_file_spec("=2024-12").is_err());
    }

    #[test]
    fn maturity_is_canonicalized() {
        assert_eq!(parse_maturity("2025-1").unwrap(), "2025-01");
    }

    #[test]
    fn cli_parses_curve_command() {
        let cli = Cli::try_parse_from([
            "fc", "curve", "-f", "a.csv=2024-12", "--file", "b.csv=2025-01", "--date", "2024-01-02", "--no-plot",
        ])
        .unwrap();
        let Command::Curve(args) = cli.command else {
            panic!("expected curve command");
        };
        assert_eq!(args.source.files.len(), 2);
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert!(args.no_plot);
    }
}
