//! `fwd-curves` library crate.
//!
//! The binary (`fc`) is a thin wrapper around this library so that:
//!
//! - the merge and curve logic is testable without spawning processes
//! - the TUI and CLI share one pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod curve;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod tui;
