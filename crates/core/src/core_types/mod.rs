//! Core types shared across the footprint model

pub mod field;
pub mod input;

pub use field::{ClimatologyResult, FieldPeak, FootprintField, SkippedInput};
pub use input::{validate, FootprintInput, RawObservation, WindProfile};
