//! Formatted terminal output for merge and curve runs.
//!
//! We keep formatting code in one place so:
//! - the merge/curve code stays clean and testable
//! - output changes are localized (and covered by snapshot-style tests)

use crate::app::pipeline::RunOutput;
use crate::curve::MaturityRegistry;
use crate::domain::{ForwardCurve, MergedTable, ProductConfig, SPOT_LABEL};
use crate::report::{FileSummary, summarize_loads};

const LABEL_WIDTH: usize = 14;

/// Per-file ingest table plus the dropped-row details.
pub fn format_ingest_summary(run: &RunOutput) -> String {
    let summaries = summarize_loads(run);
    let mut out = String::new();

    out.push_str("=== fc - Forward Curve ===\n");
    out.push_str(&format!("Product: {}\n", run.session.product.display_name()));
    out.push_str(&format!(
        "Files: {} loaded, {} failed | maturities: {}\n\n",
        summaries.iter().filter(|s| s.error.is_none()).count(),
        summaries.iter().filter(|s| s.error.is_some()).count(),
        run.session.registry().len(),
    ));

    out.push_str(&format_files_table(&summaries));

    // Row-level issues, for the files that had some.
    for load in run.loads.iter().chain(run.spot.iter()) {
        let Ok(loaded) = &load.result else { continue };
        if loaded.parsed.issues.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{} dropped rows:\n", loaded.name));
        for issue in &loaded.parsed.issues {
            out.push_str(&format!("  line {}: {}\n", issue.line, issue.message));
        }
        let hidden = loaded.parsed.rows_dropped.saturating_sub(loaded.parsed.issues.len());
        if hidden > 0 {
            out.push_str(&format!("  ... and {hidden} more\n"));
        }
    }

    out
}

fn format_files_table(rows: &[FileSummary]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!("{:<24} {:<10} {:>6} {:>6} {:>7}  {}", "file", "maturity", "read", "kept", "dropped", "status"),
    );
    push_line(
        &mut out,
        format!("{:-<24} {:-<10} {:-<6} {:-<6} {:-<7}  {:-<6}", "", "", "", "", "", ""),
    );
    for r in rows {
        let status = r.error.as_deref().unwrap_or("ok");
        push_line(
            &mut out,
            format!(
                "{:<24} {:<10} {:>6} {:>6} {:>7}  {}",
                truncate(&r.name, 24),
                r.role.as_deref().unwrap_or("-"),
                r.rows_read,
                r.rows_kept,
                r.rows_dropped,
                status,
            ),
        );
    }
    out
}

/// The first `n` merged rows (most recent first), prices at 2 decimals.
pub fn format_merged_preview(table: &MergedTable, registry: &MaturityRegistry, n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Merged: {} rows x {} maturities{}\n",
        table.len(),
        table.maturity_ids.len(),
        if table.has_spot { " + spot" } else { "" },
    ));

    let mut header = format!("{:<10}", "date");
    if table.has_spot {
        header.push_str(&format!(" {:>w$}", SPOT_LABEL, w = LABEL_WIDTH));
    }
    for id in &table.maturity_ids {
        let label = registry.get(id).map(|d| d.label.as_str()).unwrap_or(id);
        header.push_str(&format!(" {:>w$}", truncate(label, LABEL_WIDTH), w = LABEL_WIDTH));
    }
    push_line(&mut out, header);

    for row in table.rows.iter().take(n) {
        let mut line = row.date.to_string();
        if table.has_spot {
            line.push_str(&format!(" {:>w$}", fmt_price(row.spot), w = LABEL_WIDTH));
        }
        for id in &table.maturity_ids {
            line.push_str(&format!(" {:>w$}", fmt_price(row.price(id)), w = LABEL_WIDTH));
        }
        push_line(&mut out, line);
    }

    let hidden = table.len().saturating_sub(n);
    if hidden > 0 {
        out.push_str(&format!("({hidden} more rows)\n"));
    }
    out
}

/// The curve as a table, front to back.
pub fn format_curve_table(curve: &ForwardCurve, product: &ProductConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Forward curve: {} @ {}\n",
        product.display_name(),
        curve.observation_date
    ));

    if curve.points.is_empty() {
        out.push_str("(no prices on this date)\n");
        return out;
    }

    push_line(
        &mut out,
        format!("{:<16} {:<8} {:<10} {:>6} {:>12}", "maturity", "id", "expiry", "days", "price"),
    );
    push_line(
        &mut out,
        format!("{:-<16} {:-<8} {:-<10} {:-<6} {:-<12}", "", "", "", "", ""),
    );
    for p in &curve.points {
        let expiry = p.expiry.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
        push_line(
            &mut out,
            format!(
                "{:<16} {:<8} {:<10} {:>6} {:>12.2}",
                truncate(&p.display_label, 16),
                p.maturity,
                expiry,
                p.time_to_maturity_days,
                p.price,
            ),
        );
    }
    out
}

fn fmt_price(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use crate::domain::{CurvePoint, MergedRow};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn merged_preview_snapshot() {
        let mut registry = MaturityRegistry::new();
        registry.add(12, 2024).unwrap();
        let row = |date, spot, price| MergedRow {
            date,
            spot,
            prices: BTreeMap::from([("2024-12".to_string(), price)]),
        };
        let table = MergedTable {
            has_spot: true,
            maturity_ids: vec!["2024-12".to_string()],
            rows: vec![
                row(d(2024, 1, 3), None, Some(103.0)),
                row(d(2024, 1, 2), Some(100.0), Some(102.5)),
            ],
        };

        let txt = format_merged_preview(&table, &registry, 1);
        let expected = concat!(
            "Merged: 2 rows x 1 maturities + spot\n",
            "date                 Spot  December 2024\n",
            "2024-01-03              -         103.00\n",
            "(1 more rows)\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn curve_table_lists_points_in_order() {
        let curve = ForwardCurve {
            observation_date: d(2024, 1, 2),
            points: vec![
                CurvePoint {
                    maturity: "spot".to_string(),
                    display_label: "Spot".to_string(),
                    price: 100.0,
                    time_to_maturity_days: 0,
                    expiry: None,
                },
                CurvePoint {
                    maturity: "2024-12".to_string(),
                    display_label: "December 2024".to_string(),
                    price: 102.5,
                    time_to_maturity_days: 353,
                    expiry: Some(d(2024, 12, 20)),
                },
            ],
        };
        let product = ProductConfig {
            commodity: Some("Wheat".to_string()),
            currency: Some("EUR".to_string()),
        };

        let txt = format_curve_table(&curve, &product);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "Forward curve: Wheat (EUR) @ 2024-01-02");
        assert!(lines[3].starts_with("Spot"));
        assert!(lines[3].ends_with("100.00"));
        assert!(lines[4].contains("2024-12-20"));
        assert!(lines[4].contains("353"));
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdefgh", 5), "abcd.");
    }
}
