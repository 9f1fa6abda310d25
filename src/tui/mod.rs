//! Ratatui-based terminal UI.
//!
//! The TUI steps through the merged observation dates and renders the forward
//! curve of the selected date as a chart plus a table.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
};

use crate::app::session::Session;
use crate::domain::ForwardCurve;
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::CurvePlottersChart;

/// Where `e` writes the merged table.
const MERGED_EXPORT: &str = "merged.csv";

/// Start the TUI on a merged session.
pub fn run(session: Session) -> Result<(), AppError> {
    let mut app = App::new(session)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    session: Session,
    /// Merged dates, most recent first.
    dates: Vec<NaiveDate>,
    /// Index into `dates`.
    selected: usize,
    curve: Option<ForwardCurve>,
    status: String,
}

impl App {
    fn new(session: Session) -> Result<Self, AppError> {
        let dates = session.available_dates();
        if dates.is_empty() {
            return Err(AppError::new(3, "Nothing to browse: the merged table is empty."));
        }
        let mut app = Self {
            session,
            dates,
            selected: 0,
            curve: None,
            status: String::new(),
        };
        app.refresh_curve();
        Ok(app)
    }

    fn selected_date(&self) -> NaiveDate {
        self.dates[self.selected]
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            // Dates run newest first: left goes back in time.
            KeyCode::Left => self.select(self.selected.saturating_add(1)),
            KeyCode::Right => self.select(self.selected.saturating_sub(1)),
            KeyCode::Home => self.select(self.dates.len() - 1),
            KeyCode::End => self.select(0),
            KeyCode::Char('e') => self.export_merged(),
            KeyCode::Char('x') => self.export_curve(),
            _ => {}
        }
        false
    }

    fn select(&mut self, idx: usize) {
        let idx = idx.min(self.dates.len() - 1);
        if idx != self.selected {
            self.selected = idx;
            self.refresh_curve();
        }
    }

    fn refresh_curve(&mut self) {
        let date = self.selected_date();
        match self.session.build_curve(date) {
            Ok(curve) => {
                self.status = format!("{date}: {} points", curve.points.len());
                self.curve = Some(curve);
            }
            Err(err) => {
                self.status = err.to_string();
                self.curve = None;
            }
        }
    }

    fn export_merged(&mut self) {
        let Some(table) = self.session.merged() else {
            self.status = "Nothing merged yet.".to_string();
            return;
        };
        let path = PathBuf::from(MERGED_EXPORT);
        self.status = match crate::io::export::export_merged_csv(&path, table) {
            Ok(()) => format!("Wrote {}", path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn export_curve(&mut self) {
        let Some(curve) = &self.curve else {
            self.status = "No curve on this date.".to_string();
            return;
        };
        let path = PathBuf::from(format!("curve_{}.json", curve.observation_date));
        self.status = match crate::io::curve::write_curve_json(&path, curve, &self.session.product) {
            Ok(()) => format!("Wrote {}", path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("fc", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" - forward curve | {}", self.session.product.display_name())),
        ]));

        let rows = self.session.merged().map(|t| t.len()).unwrap_or(0);
        let points = self.curve.as_ref().map(|c| c.points.len()).unwrap_or(0);
        lines.push(Line::from(Span::styled(
            format!(
                "date: {} ({} of {}) | points: {points} | maturities: {} | merged rows: {rows}",
                self.selected_date(),
                self.dates.len() - self.selected,
                self.dates.len(),
                self.session.registry().len(),
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(50)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_table(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Forward Curve").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(curve) = self.curve.as_ref().filter(|c| !c.points.is_empty()) else {
            let msg = Paragraph::new("No prices on this date.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let series = chart_series(curve);
        let (chart_rect, insets) = chart_layout(inner);
        let widget = CurvePlottersChart {
            line: &series.line,
            spot: series.spot,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: "days to expiry",
            y_label: "price".to_string(),
            fmt_x: fmt_axis_x,
            fmt_y: fmt_axis_y,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, series.x_bounds, series.y_bounds);
        }
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Points").borders(Borders::ALL);
        let points = self.curve.as_ref().map(|c| c.points.as_slice()).unwrap_or(&[]);

        let rows = points.iter().map(|p| {
            let style = if p.is_spot() {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(p.display_label.clone()),
                Cell::from(p.expiry.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())),
                Cell::from(p.time_to_maturity_days.to_string()),
                Cell::from(format!("{:.2}", p.price)),
            ])
            .style(style)
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(15),
                Constraint::Length(10),
                Constraint::Length(5),
                Constraint::Min(8),
            ],
        )
        .header(
            Row::new(vec!["maturity", "expiry", "days", "price"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(block);
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ date  Home/End oldest/latest  e export merged  x export curve  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart data for one curve.
#[derive(Debug, Clone, PartialEq)]
struct ChartSeries {
    line: Vec<(f64, f64)>,
    spot: Option<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn chart_series(curve: &ForwardCurve) -> ChartSeries {
    let mut line = Vec::with_capacity(curve.points.len());
    let mut spot = None;
    for p in &curve.points {
        let xy = (p.time_to_maturity_days as f64, p.price);
        if p.is_spot() {
            spot = Some(xy);
        } else {
            line.push(xy);
        }
    }

    let all = line.iter().chain(spot.iter());
    let (mut x_min, mut x_max) = (0.0_f64, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in all {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !x_max.is_finite() || x_max <= x_min {
        x_max = x_min + 30.0;
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    }

    let span = y_max - y_min;
    let pad = if span > 0.0 { span * 0.05 } else { y_min.abs().max(1.0) * 0.05 };

    ChartSeries {
        line,
        spot,
        x_bounds: [x_min, x_max],
        y_bounds: [y_min - pad, y_max + pad],
    }
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.2}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 9,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let label = fmt_axis_x(x_bounds[0] + u * (x_bounds[1] - x_bounds[0]));
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(Paragraph::new(label).style(style), Rect { x: start, y, width, height: 1 });
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let label = fmt_axis_y(y_bounds[0] + u * (y_bounds[1] - y_bounds[0]));
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(Paragraph::new(label).style(style), Rect { x: start, y, width, height: 1 });
    }

    let x_label = Paragraph::new("days to expiry")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("price").style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PricePoint, ProductConfig, Series};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn app() -> App {
        let mut session = Session::new(ProductConfig::default());
        session.add_maturity(12, 2024).unwrap();
        let series = Series::from_points([
            PricePoint { date: d(2024, 1, 2), price: 100.0 },
            PricePoint { date: d(2024, 1, 3), price: 101.0 },
            PricePoint { date: d(2024, 1, 4), price: 102.0 },
        ]);
        session.insert_series("dec24.csv", series);
        session.assign("dec24.csv", "2024-12").unwrap();
        session.set_spot(Some(Series::from_points([PricePoint { date: d(2024, 1, 4), price: 99.0 }])));
        session.merge().unwrap();
        App::new(session).unwrap()
    }

    #[test]
    fn starts_on_latest_date_and_steps_back() {
        let mut app = app();
        assert_eq!(app.selected_date(), d(2024, 1, 4));
        assert_eq!(app.curve.as_ref().map(|c| c.points.len()), Some(2));

        app.handle_key(KeyCode::Left);
        assert_eq!(app.selected_date(), d(2024, 1, 3));
        assert_eq!(app.curve.as_ref().map(|c| c.points.len()), Some(1));

        app.handle_key(KeyCode::Home);
        assert_eq!(app.selected_date(), d(2024, 1, 2));
        // Stepping past the oldest date stays put.
        app.handle_key(KeyCode::Left);
        assert_eq!(app.selected_date(), d(2024, 1, 2));

        app.handle_key(KeyCode::End);
        assert_eq!(app.selected_date(), d(2024, 1, 4));
        app.handle_key(KeyCode::Right);
        assert_eq!(app.selected_date(), d(2024, 1, 4));
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        assert!(app.handle_key(KeyCode::Char('q')));
        assert!(!app.handle_key(KeyCode::Char('z')));
    }

    #[test]
    fn chart_series_splits_spot_from_contracts() {
        let app = app();
        let series = chart_series(app.curve.as_ref().unwrap());
        assert_eq!(series.spot, Some((0.0, 99.0)));
        assert_eq!(series.line.len(), 1);
        assert_eq!(series.x_bounds[0], 0.0);
        assert!(series.y_bounds[0] < 99.0 && series.y_bounds[1] > 102.0);
    }

    #[test]
    fn empty_session_is_rejected() {
        assert!(App::new(Session::default()).is_err());
    }
}
