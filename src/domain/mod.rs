//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - price observations and series (`PricePoint`, `Series`)
//! - declared maturities (`DeliveryDate`)
//! - the merged wide table (`MergedTable`, `MergedRow`)
//! - curve outputs (`ForwardCurve`, `CurvePoint`, `CurveFile`)
//! - run configuration (`RunConfig`)

pub mod types;

pub use types::*;
