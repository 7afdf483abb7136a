//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they
//! can be:
//!
//! - used in-memory during feature engineering and prediction
//! - accepted from / returned to whatever transport layer sits upstream
//! - reloaded later for comparisons

use serde::{Deserialize, Serialize};

/// Snapshot of drought severity for a region.
///
/// The indices (`spi`, `spei`, `pdsi`) have no fixed range but by
/// convention cluster in [-4, +4]; more negative means more severe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroughtMetrics {
    /// Standardized Precipitation Index.
    pub spi: f64,
    /// Standardized Precipitation-Evapotranspiration Index.
    pub spei: f64,
    /// Palmer Drought Severity Index.
    pub pdsi: f64,
    /// Ordinal severity on the 0-4 US Drought Monitor scale
    /// (0 = none, 4 = exceptional).
    ///
    /// [`new`](Self::new) clamps this into [0, 4]; a struct literal or
    /// deserialization can bypass the clamp, so the invariant is
    /// caller-trusted. Downstream thresholds and the fallback multiplier
    /// saturate, so an out-of-scale value degrades like severity 4 plus
    /// linear extrapolation rather than misbehaving.
    pub severity: u8,
    /// Short-term trend in the drought composite (4 weeks); 0.0 if absent.
    #[serde(default)]
    pub trend_4w: Option<f64>,
    /// Medium-term trend in the drought composite (8 weeks); 0.0 if absent.
    #[serde(default)]
    pub trend_8w: Option<f64>,
}

impl DroughtMetrics {
    /// Build metrics with no trend data, clamping `severity` into [0, 4].
    pub fn new(spi: f64, spei: f64, pdsi: f64, severity: u8) -> Self {
        Self {
            spi,
            spei,
            pdsi,
            severity: severity.min(4),
            trend_4w: None,
            trend_8w: None,
        }
    }

    /// Attach composite trend values.
    pub fn with_trends(mut self, trend_4w: f64, trend_8w: f64) -> Self {
        self.trend_4w = Some(trend_4w);
        self.trend_8w = Some(trend_8w);
        self
    }
}

/// Per-basin drought sub-indices, each lagged 12 periods.
///
/// Every field is optional; a missing field (or a missing `BasinData`
/// entirely) is substituted with the matching
/// [`BasinDefaults`](crate::config::BasinDefaults) constant so the
/// feature vector always has exactly 29 defined entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasinData {
    /// Chino Basin EDDI (90-day).
    pub chino_eddi90d: Option<f64>,
    /// Mojave Basin PDSI.
    pub mojave_pdsi: Option<f64>,
    /// California surface water SPI (180-day).
    pub ca_spi180d: Option<f64>,
    /// Central Basin EDDI (1-year).
    pub central_eddi1y: Option<f64>,
    /// California surface water SPI (90-day).
    pub ca_spi90d: Option<f64>,
    /// California surface water SPEI (1-year).
    pub ca_spei1y: Option<f64>,
}

/// Which path produced a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastSource {
    /// Remote ensemble endpoint responded.
    Ensemble,
    /// Remote unavailable; deterministic local heuristic used.
    Fallback,
}

/// Structured forecast returned to the caller. Never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Point prediction for the NQH2O index (dollars).
    pub predicted_price: f64,
    /// Trust in the prediction, in [0, 1].
    pub confidence: f64,
    /// `predicted_price - base_price` (base = most recent observed price).
    pub price_change: f64,
    /// Price change as a percentage of the base price.
    pub price_change_pct: f64,
    /// Severity the forecast was conditioned on (0-4).
    pub drought_severity: u8,
    /// Version stamp of the producing model.
    pub model_version: String,
    /// `"ensemble"` or `"fallback"`.
    pub source: ForecastSource,
}
