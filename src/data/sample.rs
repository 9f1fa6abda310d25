//! Synthetic spot + monthly contract price files.
//!
//! Spot follows a seeded log-normal random walk over weekdays. Each contract
//! trades at spot plus a per-month carry and a little basis noise, stops after
//! its third-Friday expiry, and misses days at random.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::curve::third_friday;
use crate::domain::maturity_id;
use crate::error::AppError;

/// Trading days per year, for scaling annualized vol to a daily shock.
const TRADING_DAYS: f64 = 252.0;

/// Basis noise as a fraction of the daily spot shock.
const BASIS_NOISE: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub out_dir: PathBuf,
    pub start: NaiveDate,
    /// Calendar days covered (weekends are skipped).
    pub days: u32,
    /// Monthly contracts, starting the month after `start`.
    pub contracts: u32,
    pub spot: f64,
    /// Annualized volatility.
    pub vol: f64,
    /// Carry per month of maturity, as a fraction of spot.
    pub carry: f64,
    pub gap_prob: f64,
    pub seed: u64,
}

/// What a sample run wrote.
#[derive(Debug, Clone)]
pub struct SampleOutput {
    pub spot: PathBuf,
    /// Contract files and their maturity ids, front first.
    pub contracts: Vec<(PathBuf, String)>,
    /// Every file written (spot first).
    pub files: Vec<PathBuf>,
}

impl SampleOutput {
    /// CLI arguments that load this sample.
    pub fn suggested_args(&self) -> String {
        let mut args = format!("-s {}", self.spot.display());
        for (path, id) in &self.contracts {
            args.push_str(&format!(" -f {}={id}", path.display()));
        }
        args
    }
}

/// Generate and write the sample files under `config.out_dir`.
pub fn write_sample(config: &SampleConfig) -> Result<SampleOutput, AppError> {
    validate(config)?;
    fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::new(2, format!("Failed to create '{}': {e}", config.out_dir.display()))
    })?;

    let data = generate(config)?;

    let spot_path = config.out_dir.join("spot.csv");
    write_price_csv(&spot_path, &data.spot)?;
    let mut files = vec![spot_path.clone()];

    let mut contracts = Vec::with_capacity(data.contracts.len());
    for (id, rows) in &data.contracts {
        let path = config.out_dir.join(format!("{id}.csv"));
        write_price_csv(&path, rows)?;
        files.push(path.clone());
        contracts.push((path, id.clone()));
    }

    tracing::info!(
        dir = %config.out_dir.display(),
        files = files.len(),
        days = data.spot.len(),
        "wrote sample price files"
    );

    Ok(SampleOutput {
        spot: spot_path,
        contracts,
        files,
    })
}

/// Generated price rows, before they are written.
#[derive(Debug, Clone)]
struct SampleData {
    spot: Vec<(NaiveDate, f64)>,
    contracts: Vec<(String, Vec<(NaiveDate, f64)>)>,
}

fn validate(config: &SampleConfig) -> Result<(), AppError> {
    if config.days == 0 || config.contracts == 0 {
        return Err(AppError::new(2, "Sample needs at least one day and one contract."));
    }
    if !(config.spot.is_finite() && config.spot > 0.0) {
        return Err(AppError::new(2, "Sample spot must be a positive number."));
    }
    if !(config.vol.is_finite() && config.vol >= 0.0) || !config.carry.is_finite() {
        return Err(AppError::new(2, "Invalid volatility or carry."));
    }
    if !(0.0..1.0).contains(&config.gap_prob) {
        return Err(AppError::new(2, "Gap probability must be in [0, 1)."));
    }
    Ok(())
}

fn generate(config: &SampleConfig) -> Result<SampleData, AppError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    let sigma = config.vol / TRADING_DAYS.sqrt();

    let dates: Vec<NaiveDate> = config
        .start
        .iter_days()
        .take(config.days as usize)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect();

    // (id, months ahead, expiry)
    let mut months = Vec::with_capacity(config.contracts as usize);
    for k in 1..=config.contracts {
        let (year, month) = add_months(config.start.year(), config.start.month(), k);
        let expiry = third_friday(year, month).map_err(|e| AppError::new(4, e.to_string()))?;
        months.push((maturity_id(year, month), k, expiry));
    }

    let mut spot_rows = Vec::with_capacity(dates.len());
    let mut contract_rows: Vec<Vec<(NaiveDate, f64)>> = vec![Vec::new(); months.len()];
    let mut level = config.spot;

    for &date in &dates {
        // Zero-drift log-normal step.
        let z: f64 = normal.sample(&mut rng);
        level *= (sigma * z - 0.5 * sigma * sigma).exp();
        spot_rows.push((date, round2(level)));

        for ((_, k, expiry), rows) in months.iter().zip(contract_rows.iter_mut()) {
            let basis: f64 = normal.sample(&mut rng);
            let gap = rng.r#gen::<f64>() < config.gap_prob;
            if date > *expiry || gap {
                continue;
            }
            let price = level * (1.0 + config.carry * *k as f64) * (sigma * BASIS_NOISE * basis).exp();
            rows.push((date, round2(price)));
        }
    }

    Ok(SampleData {
        spot: spot_rows,
        contracts: months
            .into_iter()
            .map(|(id, _, _)| id)
            .zip(contract_rows)
            .collect(),
    })
}

fn write_price_csv(path: &Path, rows: &[(NaiveDate, f64)]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    let write_err = |e: csv::Error| AppError::new(2, format!("Failed to write '{}': {e}", path.display()));

    writer.write_record(["Date", "Price"]).map_err(write_err)?;
    for (date, price) in rows {
        writer
            .write_record([date.to_string(), format!("{price:.2}")])
            .map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))
}

/// `(year, month)` shifted forward by `k` months.
fn add_months(year: i32, month: u32, k: u32) -> (i32, u32) {
    let total = year * 12 + (month as i32 - 1) + k as i32;
    (total.div_euclid(12), total.rem_euclid(12) as u32 + 1)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
