//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - x axis: days to expiry, y axis: price
//! - contract points: `o`, joined front to back by a `-` line
//! - spot: `S`

use crate::domain::{CurveFile, CurvePoint};

/// Render a curve's points.
pub fn render_curve_plot(points: &[CurvePoint], width: usize, height: usize) -> String {
    render_plot(points, width, height)
}

/// Render a saved curve JSON file, with its product and date in the header.
pub fn render_curve_file_plot(curve: &CurveFile, width: usize, height: usize) -> String {
    let mut out = format!(
        "{} @ {}\n",
        curve.product.display_name(),
        curve.observation_date
    );
    out.push_str(&render_plot(&curve.points, width, height));
    out
}

fn render_plot(points: &[CurvePoint], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    if points.is_empty() {
        return "Plot: (no points)\n".to_string();
    }

    let (x_min, x_max) = range(points.iter().map(|p| p.time_to_maturity_days as f64)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(points.iter().map(|p| p.price)).unwrap_or((0.0, 1.0));
    let (x_min, x_max) = widen(x_min, x_max);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let cells: Vec<(usize, usize)> = points
        .iter()
        .map(|p| {
            (
                map_x(p.time_to_maturity_days as f64, x_min, x_max, width),
                map_y(p.price, y_min, y_max, height),
            )
        })
        .collect();

    // Line first so the markers overlay it.
    for w in cells.windows(2) {
        let ((x0, y0), (x1, y1)) = (w[0], w[1]);
        draw_line(&mut grid, x0, y0, x1, y1, '-');
    }
    for (p, &(x, y)) in points.iter().zip(&cells) {
        grid[y][x] = if p.is_spot() { 'S' } else { 'o' };
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: days=[{x_min:.0}, {x_max:.0}] | price=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    (min.is_finite() && max.is_finite()).then_some((min, max))
}

/// A single-point range still needs a span to map onto.
fn widen(min: f64, max: f64) -> (f64, f64) {
    if max > min { (min, max) } else { (min - 1.0, max + 1.0) }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 { span * frac } else { min.abs().max(1.0) * frac };
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y0 as usize)
            .and_then(|row| row.get_mut(x0 as usize))
        {
            if *cell == ' ' {
                *cell = ch;
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
