//! Mathematical utilities: windowed price statistics.

pub mod stats;

pub use stats::*;
