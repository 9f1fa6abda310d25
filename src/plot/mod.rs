//! Terminal plotting.

pub mod ascii;

pub use ascii::{render_curve_file_plot, render_curve_plot};
