//! Alignment and forward-curve engine.
//!
//! Responsibilities:
//!
//! - own the declared maturities (`registry`)
//! - join per-maturity series on exact dates (`merge`)
//! - derive third-Friday expiries and day counts (`expiry`)
//! - extract the ordered curve for one observation date (`builder`)

pub mod builder;
pub mod expiry;
pub mod merge;
pub mod registry;

pub use builder::*;
pub use expiry::*;
pub use merge::*;
pub use registry::*;
