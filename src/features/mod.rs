//! Feature Engineering Stage.
//!
//! Deterministic mapping from raw drought/price inputs to the fixed
//! 29-feature vector the trained ensemble expects. Pure: no I/O, no clock
//! reads, no randomness. The only unrecoverable input is an empty price
//! history; every other missing input degrades via documented defaults.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::BasinDefaults;
use crate::domain::{BasinData, DroughtMetrics};
use crate::error::ForecastError;
use crate::math::{lag, mean, pct_change, population_std, tail};

pub mod temporal;

/// The 29 named features, in the trained model's schema.
///
/// Serde field names match the training column names exactly, so
/// serializing this struct yields the flat key-value map the remote
/// endpoint expects. Constructed fresh per prediction request and
/// immutable once built.
///
/// Grouping: 6 basin lags, 3 drought composites, 2 severity indicators,
/// 2 drought trends, 3 price lags, 6 price-derived, 6 temporal/seasonal,
/// 1 time trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    // Basin-specific lagged drought sub-indices.
    #[serde(rename = "Chino_Basin_eddi90d_lag_12")]
    pub chino_basin_eddi90d_lag_12: f64,
    #[serde(rename = "Mojave_Basin_pdsi_lag_12")]
    pub mojave_basin_pdsi_lag_12: f64,
    #[serde(rename = "California_Surface_Water_spi180d_lag_12")]
    pub california_surface_water_spi180d_lag_12: f64,
    #[serde(rename = "Central_Basin_eddi1y_lag_12")]
    pub central_basin_eddi1y_lag_12: f64,
    #[serde(rename = "California_Surface_Water_spi90d_lag_12")]
    pub california_surface_water_spi90d_lag_12: f64,
    #[serde(rename = "California_Surface_Water_spei1y_lag_12")]
    pub california_surface_water_spei1y_lag_12: f64,

    // Drought composites. Pass-throughs of the point metrics: the field
    // names suggest multi-basin weighted aggregates, but the aggregation
    // inputs are not available here, so the observed pass-through
    // behavior is preserved.
    pub drought_composite_spi: f64,
    pub drought_composite_spei: f64,
    pub drought_composite_pdsi: f64,

    // Binary severity indicators, thresholded on the 0-4 scale.
    pub severe_drought_indicator: f64,
    pub extreme_drought_indicator: f64,

    // Composite trends, 0.0 when not observed.
    pub drought_trend_4w: f64,
    pub drought_trend_8w: f64,

    // Price lags, clamped to the oldest available price on short history.
    pub nqh2o_lag_1: f64,
    pub nqh2o_lag_2: f64,
    pub nqh2o_lag_4: f64,

    // Price-derived features over trailing windows.
    pub price_momentum_4w: f64,
    pub price_momentum_8w: f64,
    pub price_volatility_4w: f64,
    pub price_volatility_8w: f64,
    pub price_vs_ma_4w: f64,
    pub price_vs_ma_12w: f64,

    // Temporal/seasonal encodings of the as-of date.
    pub month_sin: f64,
    pub month_cos: f64,
    pub week_sin: f64,
    pub week_cos: f64,
    pub is_drought_season: f64,
    pub is_wet_season: f64,

    // Days since the training epoch.
    pub time_trend: f64,
}

impl FeatureVector {
    /// Number of fields the trained model expects.
    pub const FIELD_COUNT: usize = 29;

    /// Flat (name, value) view in schema order. This is the authoritative
    /// field enumeration used for validation.
    pub fn to_pairs(&self) -> [(&'static str, f64); Self::FIELD_COUNT] {
        [
            ("Chino_Basin_eddi90d_lag_12", self.chino_basin_eddi90d_lag_12),
            ("Mojave_Basin_pdsi_lag_12", self.mojave_basin_pdsi_lag_12),
            (
                "California_Surface_Water_spi180d_lag_12",
                self.california_surface_water_spi180d_lag_12,
            ),
            ("Central_Basin_eddi1y_lag_12", self.central_basin_eddi1y_lag_12),
            (
                "California_Surface_Water_spi90d_lag_12",
                self.california_surface_water_spi90d_lag_12,
            ),
            (
                "California_Surface_Water_spei1y_lag_12",
                self.california_surface_water_spei1y_lag_12,
            ),
            ("drought_composite_spi", self.drought_composite_spi),
            ("drought_composite_spei", self.drought_composite_spei),
            ("drought_composite_pdsi", self.drought_composite_pdsi),
            ("severe_drought_indicator", self.severe_drought_indicator),
            ("extreme_drought_indicator", self.extreme_drought_indicator),
            ("drought_trend_4w", self.drought_trend_4w),
            ("drought_trend_8w", self.drought_trend_8w),
            ("nqh2o_lag_1", self.nqh2o_lag_1),
            ("nqh2o_lag_2", self.nqh2o_lag_2),
            ("nqh2o_lag_4", self.nqh2o_lag_4),
            ("price_momentum_4w", self.price_momentum_4w),
            ("price_momentum_8w", self.price_momentum_8w),
            ("price_volatility_4w", self.price_volatility_4w),
            ("price_volatility_8w", self.price_volatility_8w),
            ("price_vs_ma_4w", self.price_vs_ma_4w),
            ("price_vs_ma_12w", self.price_vs_ma_12w),
            ("month_sin", self.month_sin),
            ("month_cos", self.month_cos),
            ("week_sin", self.week_sin),
            ("week_cos", self.week_cos),
            ("is_drought_season", self.is_drought_season),
            ("is_wet_season", self.is_wet_season),
            ("time_trend", self.time_trend),
        ]
    }

    /// Check the vector against the model schema: exactly
    /// [`FIELD_COUNT`](Self::FIELD_COUNT) entries, all finite.
    ///
    /// A violation indicates a caller/integration bug (e.g. a NaN drought
    /// index smuggled through), so this fails loudly rather than degrading.
    pub fn validate(&self) -> Result<(), ForecastError> {
        let pairs = self.to_pairs();
        if pairs.len() != Self::FIELD_COUNT {
            return Err(ForecastError::InvalidFeatureVector(format!(
                "expected {} fields, found {}",
                Self::FIELD_COUNT,
                pairs.len()
            )));
        }
        for (name, value) in pairs {
            if !value.is_finite() {
                return Err(ForecastError::InvalidFeatureVector(format!(
                    "field {name} is not finite ({value})"
                )));
            }
        }
        Ok(())
    }
}

/// Build the 29-feature vector for one prediction request.
///
/// `prices` is most-recent-last with minimum length 1; shorter-than-ideal
/// histories degrade by clamping lag lookups to the oldest value and
/// shrinking statistic windows, never by failing. `asof` drives the
/// temporal features.
pub fn build_features(
    drought: &DroughtMetrics,
    prices: &[f64],
    basin: Option<&BasinData>,
    defaults: &BasinDefaults,
    asof: NaiveDate,
) -> Result<FeatureVector, ForecastError> {
    if prices.is_empty() {
        return Err(ForecastError::InvalidInput(
            "price history is empty; at least one observation is required".into(),
        ));
    }

    let pick = |field: fn(&BasinData) -> Option<f64>, default: f64| -> f64 {
        basin.and_then(field).unwrap_or(default)
    };

    let last = lag(prices, 1);
    let t = temporal::encode(asof);

    Ok(FeatureVector {
        chino_basin_eddi90d_lag_12: pick(|b| b.chino_eddi90d, defaults.chino_eddi90d),
        mojave_basin_pdsi_lag_12: pick(|b| b.mojave_pdsi, defaults.mojave_pdsi),
        california_surface_water_spi180d_lag_12: pick(|b| b.ca_spi180d, defaults.ca_spi180d),
        central_basin_eddi1y_lag_12: pick(|b| b.central_eddi1y, defaults.central_eddi1y),
        california_surface_water_spi90d_lag_12: pick(|b| b.ca_spi90d, defaults.ca_spi90d),
        california_surface_water_spei1y_lag_12: pick(|b| b.ca_spei1y, defaults.ca_spei1y),

        drought_composite_spi: drought.spi,
        drought_composite_spei: drought.spei,
        drought_composite_pdsi: drought.pdsi,

        severe_drought_indicator: indicator(drought.severity >= 3),
        extreme_drought_indicator: indicator(drought.severity >= 4),

        drought_trend_4w: drought.trend_4w.unwrap_or(0.0),
        drought_trend_8w: drought.trend_8w.unwrap_or(0.0),

        nqh2o_lag_1: last,
        nqh2o_lag_2: lag(prices, 2),
        nqh2o_lag_4: lag(prices, 4),

        price_momentum_4w: pct_change(last, lag(prices, 4)),
        price_momentum_8w: pct_change(last, lag(prices, 8)),
        price_volatility_4w: population_std(tail(prices, 4)),
        price_volatility_8w: population_std(tail(prices, 8)),
        price_vs_ma_4w: ma_ratio(last, tail(prices, 4)),
        price_vs_ma_12w: ma_ratio(last, tail(prices, 12)),

        month_sin: t.month_sin,
        month_cos: t.month_cos,
        week_sin: t.week_sin,
        week_cos: t.week_cos,
        is_drought_season: t.is_drought_season,
        is_wet_season: t.is_wet_season,

        time_trend: t.time_trend,
    })
}

fn indicator(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Current price relative to the window's moving average, minus 1.
/// 0.0 when the average is zero.
fn ma_ratio(current: f64, window: &[f64]) -> f64 {
    let ma = mean(window);
    if ma == 0.0 {
        return 0.0;
    }
    current / ma - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asof() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 15).unwrap()
    }

    fn drought(severity: u8) -> DroughtMetrics {
        DroughtMetrics::new(-1.2, -0.9, -1.8, severity)
    }

    fn build(drought: &DroughtMetrics, prices: &[f64]) -> FeatureVector {
        build_features(drought, prices, None, &BasinDefaults::default(), asof()).unwrap()
    }

    #[test]
    fn empty_history_is_invalid_input() {
        let err = build_features(&drought(2), &[], None, &BasinDefaults::default(), asof())
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));
    }

    #[test]
    fn builds_exactly_29_finite_fields() {
        let fv = build(&drought(3), &[400.0]);
        let pairs = fv.to_pairs();
        assert_eq!(pairs.len(), FeatureVector::FIELD_COUNT);
        for (name, value) in pairs {
            assert!(value.is_finite(), "{name} not finite: {value}");
        }
        fv.validate().unwrap();
    }

    #[test]
    fn deterministic_for_fixed_inputs() {
        let d = drought(4).with_trends(-0.3, -0.5);
        let prices = [380.0, 385.0, 390.0, 400.0, 395.0, 405.0];
        let a = build(&d, &prices);
        let b = build(&d, &prices);
        assert_eq!(a, b);
    }

    #[test]
    fn length_one_history_clamps_all_lags() {
        let fv = build(&drought(1), &[412.5]);
        assert_eq!(fv.nqh2o_lag_1, 412.5);
        assert_eq!(fv.nqh2o_lag_2, 412.5);
        assert_eq!(fv.nqh2o_lag_4, 412.5);
        // Degenerate windows degrade to zero, not NaN.
        assert_eq!(fv.price_momentum_4w, 0.0);
        assert_eq!(fv.price_volatility_4w, 0.0);
        assert_eq!(fv.price_vs_ma_12w, 0.0);
    }

    #[test]
    fn price_lags_index_from_the_end() {
        let fv = build(&drought(2), &[370.0, 380.0, 390.0, 400.0]);
        assert_eq!(fv.nqh2o_lag_1, 400.0);
        assert_eq!(fv.nqh2o_lag_2, 390.0);
        assert_eq!(fv.nqh2o_lag_4, 370.0);
        // Momentum over the 4-week window: (400 - 370) / 370.
        assert!((fv.price_momentum_4w - 30.0 / 370.0).abs() < 1e-12);
    }

    #[test]
    fn severity_indicators_follow_threshold_table() {
        for severity in 0..=2 {
            let fv = build(&drought(severity), &[400.0]);
            assert_eq!(fv.severe_drought_indicator, 0.0, "severity {severity}");
            assert_eq!(fv.extreme_drought_indicator, 0.0, "severity {severity}");
        }
        let fv = build(&drought(3), &[400.0]);
        assert_eq!(fv.severe_drought_indicator, 1.0);
        assert_eq!(fv.extreme_drought_indicator, 0.0);
        let fv = build(&drought(4), &[400.0]);
        assert_eq!(fv.severe_drought_indicator, 1.0);
        assert_eq!(fv.extreme_drought_indicator, 1.0);
    }

    #[test]
    fn out_of_scale_severity_is_tolerated() {
        // A struct literal can bypass the clamp in DroughtMetrics::new;
        // the indicators must still threshold sanely.
        let d = DroughtMetrics {
            severity: 9,
            ..drought(0)
        };
        let fv = build(&d, &[400.0]);
        assert_eq!(fv.severe_drought_indicator, 1.0);
        assert_eq!(fv.extreme_drought_indicator, 1.0);
    }

    #[test]
    fn composites_pass_through_point_metrics() {
        let fv = build(&drought(2), &[400.0]);
        assert_eq!(fv.drought_composite_spi, -1.2);
        assert_eq!(fv.drought_composite_spei, -0.9);
        assert_eq!(fv.drought_composite_pdsi, -1.8);
    }

    #[test]
    fn missing_basin_uses_defaults_per_field() {
        let fv = build(&drought(2), &[400.0]);
        assert_eq!(fv.chino_basin_eddi90d_lag_12, -0.5);
        assert_eq!(fv.mojave_basin_pdsi_lag_12, -1.0);

        // Partial basin data: provided fields win, missing ones default.
        let basin = BasinData {
            chino_eddi90d: Some(-2.1),
            ..BasinData::default()
        };
        let fv = build_features(
            &drought(2),
            &[400.0],
            Some(&basin),
            &BasinDefaults::default(),
            asof(),
        )
        .unwrap();
        assert_eq!(fv.chino_basin_eddi90d_lag_12, -2.1);
        assert_eq!(fv.mojave_basin_pdsi_lag_12, -1.0);
    }

    #[test]
    fn missing_trends_default_to_zero() {
        let fv = build(&drought(2), &[400.0]);
        assert_eq!(fv.drought_trend_4w, 0.0);
        assert_eq!(fv.drought_trend_8w, 0.0);

        let fv = build(&drought(2).with_trends(-0.3, -0.5), &[400.0]);
        assert_eq!(fv.drought_trend_4w, -0.3);
        assert_eq!(fv.drought_trend_8w, -0.5);
    }

    #[test]
    fn serializes_to_the_model_schema_names() {
        let fv = build(&drought(3), &[400.0]);
        let json = serde_json::to_value(&fv).unwrap();
        let map = json.as_object().unwrap();
        assert_eq!(map.len(), FeatureVector::FIELD_COUNT);
        for (name, _) in fv.to_pairs() {
            assert!(map.contains_key(name), "missing wire field {name}");
        }
    }

    #[test]
    fn validate_rejects_non_finite_fields() {
        let mut fv = build(&drought(3), &[400.0]);
        fv.price_momentum_8w = f64::NAN;
        let err = fv.validate().unwrap_err();
        assert!(matches!(err, ForecastError::InvalidFeatureVector(_)));
    }
}
