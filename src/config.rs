//! Named constant surfaces and environment configuration.
//!
//! Everything the trained ensemble was fit against lives here as an
//! explicit constant rather than an inline magic number: basin default
//! sub-indices, the season calendar, the time-trend epoch, and the
//! fallback heuristic's coefficients.

use std::time::Duration;

use chrono::NaiveDate;

/// Months counted as California drought season (June through October).
pub const DROUGHT_SEASON_MONTHS: [u32; 5] = [6, 7, 8, 9, 10];

/// Months counted as California wet season (December through March).
pub const WET_SEASON_MONTHS: [u32; 4] = [12, 1, 2, 3];

/// Epoch of the `time_trend` feature: the first day of the ensemble's
/// training data. Retraining against a different window means changing
/// this one constant.
pub const TREND_EPOCH_YMD: (i32, u32, u32) = (2019, 1, 1);

/// The `time_trend` epoch as a date.
pub fn trend_epoch() -> NaiveDate {
    let (y, m, d) = TREND_EPOCH_YMD;
    NaiveDate::from_ymd_opt(y, m, d).expect("trend epoch is a valid calendar date")
}

/// Price impact per drought severity point above [`SEVERITY_PIVOT`]
/// in the fallback heuristic (2% per point).
pub const SEVERITY_PRICE_SLOPE: f64 = 0.02;

/// Severity level at and below which drought contributes no fallback
/// price increase.
pub const SEVERITY_PIVOT: u8 = 3;

/// Fixed confidence reported by the fallback path, signaling lower trust
/// than an ensemble prediction.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Confidence reported for an ensemble response that carries no
/// per-sub-model breakdown to derive agreement from.
pub const DEFAULT_ENSEMBLE_CONFIDENCE: f64 = 0.85;

/// Fallback trend-adjustment weights. Drought trends are index trends
/// (more negative = worsening), so the adjustment flips their sign:
/// a worsening composite raises the forecast.
pub const TREND_ADJ_WEIGHT_4W: f64 = 0.01;
pub const TREND_ADJ_WEIGHT_8W: f64 = 0.005;

/// Std dev (index dollars) of the optional fallback noise term.
pub const NOISE_STD: f64 = 2.0;

/// Hard bound on the fallback noise term (dollars either side).
pub const NOISE_BOUND: f64 = 4.0;

/// Model version strings stamped on results.
pub const ENSEMBLE_MODEL_VERSION: &str = "ensemble-1.0";
pub const FALLBACK_MODEL_VERSION: &str = "fallback-1.0";

/// Default remote request timeout. The demo latency target is 3 seconds;
/// on expiry the request counts as a remote failure and the fallback runs.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(3);

/// Basin sub-index values substituted when [`BasinData`](crate::domain::BasinData)
/// is absent or partial.
///
/// These are configuration agreed with the ensemble's training
/// distribution (typical moderate-drought conditions), not values derived
/// at runtime. Override via [`Forecaster::with_basin_defaults`](crate::predict::Forecaster::with_basin_defaults)
/// if the model is retrained.
#[derive(Debug, Clone, PartialEq)]
pub struct BasinDefaults {
    pub chino_eddi90d: f64,
    pub mojave_pdsi: f64,
    pub ca_spi180d: f64,
    pub central_eddi1y: f64,
    pub ca_spi90d: f64,
    pub ca_spei1y: f64,
}

impl Default for BasinDefaults {
    fn default() -> Self {
        Self {
            chino_eddi90d: -0.5,
            mojave_pdsi: -1.0,
            ca_spi180d: -0.8,
            central_eddi1y: -0.6,
            ca_spi90d: -0.7,
            ca_spei1y: -0.9,
        }
    }
}

/// Remote ensemble endpoint configuration.
#[derive(Debug, Clone)]
pub struct EnsembleConfig {
    pub endpoint_url: String,
    pub timeout: Duration,
}

impl EnsembleConfig {
    /// Load endpoint configuration from the environment (`.env` honored).
    ///
    /// Returns `None` when `NQH2O_ENSEMBLE_URL` is unset — an unconfigured
    /// endpoint is a normal condition, not an error: the forecaster then
    /// runs fallback-only.
    pub fn from_env() -> Option<Self> {
        dotenvy::dotenv().ok();
        let endpoint_url = std::env::var("NQH2O_ENSEMBLE_URL").ok()?;
        let timeout = std::env::var("NQH2O_ENSEMBLE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REMOTE_TIMEOUT);
        Some(Self {
            endpoint_url,
            timeout,
        })
    }
}
