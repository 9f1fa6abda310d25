//! Synthetic input data for trying the tool without real price files.

pub mod sample;

pub use sample::{SampleConfig, SampleOutput, write_sample};
