//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - runs ingest + merge + curve construction
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, CurveArgs, MergeArgs, PlotArgs, SampleArgs, SourceArgs};
use crate::domain::{ProductConfig, RunConfig, SourceColumns};
use crate::error::AppError;

pub mod pipeline;
pub mod session;

/// Env var holding the log filter (falls back to `RUST_LOG`).
pub const LOG_ENV: &str = "FC_LOG";

/// Entry point for the `fc` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();

    // The TUI owns the terminal; only let warnings through to stderr there.
    let quiet = matches!(cli.command, Command::Tui(_));
    init_logging(cli.verbose, quiet);

    match cli.command {
        Command::Merge(args) => handle_merge(args),
        Command::Curve(args) => handle_curve(args),
        Command::Dates(args) => handle_dates(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "warn",
        (false, true) => "fwd_curves=debug",
        (false, false) => "fwd_curves=info",
    };
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    // A second initialization (e.g. from tests) is harmless; ignore it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_merge(args: MergeArgs) -> Result<(), AppError> {
    let mut config = run_config_from_args(&args.source);
    config.preview_rows = args.preview;
    let run = pipeline::run_merge(&config)?;

    println!("{}", crate::report::format_ingest_summary(&run));
    if let Some(table) = run.session.merged() {
        println!(
            "{}",
            crate::report::format_merged_preview(table, run.session.registry(), config.preview_rows)
        );
        if let Some(path) = &args.export {
            crate::io::export::export_merged_csv(path, table)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn handle_curve(args: CurveArgs) -> Result<(), AppError> {
    let mut config = run_config_from_args(&args.source);
    config.date = args.date;
    config.plot = !args.no_plot;
    config.plot_width = args.width;
    config.plot_height = args.height;

    let (run, curve) = pipeline::run_curve(&config)?;

    println!("{}", crate::report::format_ingest_summary(&run));
    println!("{}", crate::report::format_curve_table(&curve, &config.product));

    if config.plot {
        println!(
            "{}",
            crate::plot::render_curve_plot(&curve.points, config.plot_width, config.plot_height)
        );
    }

    // Optional exports.
    if let Some(path) = &args.export_csv {
        crate::io::export::export_curve_csv(path, &curve)?;
        println!("Wrote {}", path.display());
    }
    if let Some(path) = &args.export_json {
        crate::io::curve::write_curve_json(path, &curve, &config.product)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn handle_dates(args: SourceArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let run = pipeline::run_merge(&config)?;
    for date in run.session.available_dates() {
        println!("{date}");
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::curve::read_curve_json(&args.curve)?;
    let plot = crate::plot::render_curve_file_plot(&curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_tui(args: SourceArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let run = pipeline::run_merge(&config)?;
    crate::tui::run(run.session)
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = crate::data::SampleConfig {
        out_dir: args.out,
        start: args.start,
        days: args.days,
        contracts: args.contracts,
        spot: args.spot,
        vol: args.vol,
        carry: args.carry,
        gap_prob: args.gap_prob,
        seed: args.seed,
    };
    let written = crate::data::write_sample(&config)?;
    for file in &written.files {
        println!("{}", file.display());
    }
    println!("\nTry:\n  fc curve {}", written.suggested_args());
    Ok(())
}

pub fn run_config_from_args(args: &SourceArgs) -> RunConfig {
    RunConfig {
        product: product_from_args(args),
        files: args.files.clone(),
        maturities: args.maturities.clone(),
        spot: args.spot.clone(),
        columns: SourceColumns {
            date: args.date_column.clone(),
            price: args.price_column.clone(),
        },
        date: None,
        preview_rows: 5,
        plot: false,
        plot_width: 72,
        plot_height: 18,
    }
}

/// Product labels from flags, falling back to `FC_COMMODITY` / `FC_CURRENCY`.
fn product_from_args(args: &SourceArgs) -> ProductConfig {
    let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
    ProductConfig {
        commodity: args.commodity.clone().or_else(|| env("FC_COMMODITY")),
        currency: args.currency.clone().or_else(|| env("FC_CURRENCY")),
    }
}
