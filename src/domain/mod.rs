//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw inputs (`DroughtMetrics`, `BasinData`)
//! - the structured output (`ForecastResult`, `ForecastSource`)

pub mod types;

pub use types::*;
