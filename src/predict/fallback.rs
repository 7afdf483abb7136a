//! Deterministic fallback forecasting heuristic.
//!
//! Closed form: `base_price * drought_multiplier + trend_adjustment +
//! noise_term`, where the multiplier adds 2% per severity point above 3.
//! The noise term is injectable so the heuristic is exactly reproducible
//! under test and per-seed in demo mode.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::config::{
    FALLBACK_CONFIDENCE, FALLBACK_MODEL_VERSION, NOISE_BOUND, NOISE_STD, SEVERITY_PIVOT,
    SEVERITY_PRICE_SLOPE, TREND_ADJ_WEIGHT_4W, TREND_ADJ_WEIGHT_8W,
};
use crate::domain::{DroughtMetrics, ForecastResult, ForecastSource};

/// Noise policy for the fallback heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseMode {
    /// Noise term is exactly 0.0 (deterministic/test mode).
    Disabled,
    /// Bounded Gaussian perturbation for demo mode. A given seed pins a
    /// single fixed offset for every call (the generator is re-seeded per
    /// call, not held across calls); vary the seed to vary the
    /// perturbation. Forecasts stay reproducible per seed either way.
    Seeded(u64),
}

impl NoiseMode {
    /// Read the noise policy from `NQH2O_FALLBACK_NOISE_SEED`; unset means
    /// disabled.
    pub fn from_env() -> Self {
        match std::env::var("NQH2O_FALLBACK_NOISE_SEED")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(seed) => NoiseMode::Seeded(seed),
            None => NoiseMode::Disabled,
        }
    }
}

/// Produce a fallback forecast from the drought snapshot and the most
/// recent observed price.
pub fn forecast(drought: &DroughtMetrics, base_price: f64, noise: NoiseMode) -> ForecastResult {
    let multiplier =
        1.0 + SEVERITY_PRICE_SLOPE * f64::from(drought.severity.saturating_sub(SEVERITY_PIVOT));
    let predicted_price =
        base_price * multiplier + trend_adjustment(drought, base_price) + noise_term(noise);

    let price_change = predicted_price - base_price;
    let price_change_pct = if base_price != 0.0 {
        price_change / base_price * 100.0
    } else {
        0.0
    };

    ForecastResult {
        predicted_price,
        confidence: FALLBACK_CONFIDENCE,
        price_change,
        price_change_pct,
        drought_severity: drought.severity,
        model_version: FALLBACK_MODEL_VERSION.to_string(),
        source: ForecastSource::Fallback,
    }
}

/// Small deterministic adjustment from the composite trends. The trends
/// are drought-index trends (more negative = worsening), so the sign
/// flips: a worsening composite pushes the forecast up.
fn trend_adjustment(drought: &DroughtMetrics, base_price: f64) -> f64 {
    let t4 = drought.trend_4w.unwrap_or(0.0);
    let t8 = drought.trend_8w.unwrap_or(0.0);
    -base_price * (TREND_ADJ_WEIGHT_4W * t4 + TREND_ADJ_WEIGHT_8W * t8)
}

fn noise_term(mode: NoiseMode) -> f64 {
    match mode {
        NoiseMode::Disabled => 0.0,
        NoiseMode::Seeded(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            Normal::new(0.0, NOISE_STD)
                .map(|dist| dist.sample(&mut rng).clamp(-NOISE_BOUND, NOISE_BOUND))
                .unwrap_or(0.0)
        }
    }
}
