//! Seasonal and calendar encodings.
//!
//! The as-of date is an explicit parameter (never the wall clock) so the
//! Feature Engineering Stage stays a pure function and tests can pin
//! arbitrary dates.

use std::f64::consts::TAU;

use chrono::{Datelike, NaiveDate};

use crate::config::{DROUGHT_SEASON_MONTHS, WET_SEASON_MONTHS, trend_epoch};

/// The six temporal/seasonal features plus the time-trend scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalFeatures {
    pub month_sin: f64,
    pub month_cos: f64,
    pub week_sin: f64,
    pub week_cos: f64,
    pub is_drought_season: f64,
    pub is_wet_season: f64,
    pub time_trend: f64,
}

/// Encode a calendar date into cyclical month/week coordinates, season
/// flags, and days elapsed since the training epoch.
pub fn encode(asof: NaiveDate) -> TemporalFeatures {
    let month = asof.month();
    let week = asof.iso_week().week();

    TemporalFeatures {
        month_sin: (TAU * f64::from(month) / 12.0).sin(),
        month_cos: (TAU * f64::from(month) / 12.0).cos(),
        week_sin: (TAU * f64::from(week) / 52.0).sin(),
        week_cos: (TAU * f64::from(week) / 52.0).cos(),
        is_drought_season: flag(DROUGHT_SEASON_MONTHS.contains(&month)),
        is_wet_season: flag(WET_SEASON_MONTHS.contains(&month)),
        time_trend: (asof - trend_epoch()).num_days() as f64,
    }
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}
