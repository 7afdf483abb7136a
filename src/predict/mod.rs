//! Prediction Stage orchestration.
//!
//! Keeping the whole flow in one place:
//! feature build -> schema validation -> remote attempt -> fallback
//!
//! A caller only ever sees a successful [`ForecastResult`] or one of the
//! two input-validation errors; remote failures are converted into the
//! fallback path internally, with a warning logged on every activation.

use chrono::NaiveDate;

use crate::config::{BasinDefaults, ENSEMBLE_MODEL_VERSION, EnsembleConfig};
use crate::domain::{BasinData, DroughtMetrics, ForecastResult, ForecastSource};
use crate::error::ForecastError;
use crate::features::{FeatureVector, build_features};
use crate::remote::{EnsembleClient, RemoteOutcome, RemotePrediction};

pub mod fallback;

pub use fallback::NoiseMode;

/// Stateless forecaster: an optional remote ensemble client plus the
/// fallback noise policy. Fresh inputs in, fresh result out; concurrent
/// use needs no locking.
pub struct Forecaster {
    remote: Option<EnsembleClient>,
    noise: NoiseMode,
    basin_defaults: BasinDefaults,
}

impl Forecaster {
    pub fn new(remote: Option<EnsembleClient>, noise: NoiseMode) -> Self {
        Self {
            remote,
            noise,
            basin_defaults: BasinDefaults::default(),
        }
    }

    /// Forecaster with no remote endpoint: every prediction takes the
    /// fallback path.
    pub fn fallback_only(noise: NoiseMode) -> Self {
        Self::new(None, noise)
    }

    /// Build from the environment: endpoint from `NQH2O_ENSEMBLE_URL`
    /// (fallback-only when unset or when the HTTP client cannot be
    /// built), noise from `NQH2O_FALLBACK_NOISE_SEED`.
    pub fn from_env() -> Self {
        let remote = EnsembleConfig::from_env().and_then(|config| {
            EnsembleClient::new(&config)
                .map_err(|e| {
                    tracing::warn!("could not build ensemble client: {e}; running fallback-only");
                })
                .ok()
        });
        Self::new(remote, NoiseMode::from_env())
    }

    /// Override the basin default constants (e.g. after a retrain).
    pub fn with_basin_defaults(mut self, defaults: BasinDefaults) -> Self {
        self.basin_defaults = defaults;
        self
    }

    /// Produce a forecast for one request.
    ///
    /// `prices` is most-recent-last (minimum length 1); `asof` drives the
    /// temporal features and is explicit so the pipeline never reads the
    /// wall clock. The remote endpoint gets a single best-effort attempt;
    /// any failure routes to the fallback heuristic.
    pub fn predict(
        &self,
        drought: &DroughtMetrics,
        prices: &[f64],
        basin: Option<&BasinData>,
        asof: NaiveDate,
    ) -> Result<ForecastResult, ForecastError> {
        let features = build_features(drought, prices, basin, &self.basin_defaults, asof)?;
        features.validate()?;

        let outcome = match &self.remote {
            Some(client) => client.predict(&features),
            None => RemoteOutcome::Failure("ensemble endpoint not configured".into()),
        };

        Ok(resolve(outcome, &features, drought, self.noise))
    }
}

/// Turn a remote outcome into the final result, invoking the fallback on
/// the failure variant.
fn resolve(
    outcome: RemoteOutcome,
    features: &FeatureVector,
    drought: &DroughtMetrics,
    noise: NoiseMode,
) -> ForecastResult {
    match outcome {
        RemoteOutcome::Success(prediction) => ensemble_result(features, drought, prediction),
        RemoteOutcome::Failure(reason) => {
            tracing::warn!(%reason, "ensemble unavailable, using fallback heuristic");
            fallback::forecast(drought, features.nqh2o_lag_1, noise)
        }
    }
}

fn ensemble_result(
    features: &FeatureVector,
    drought: &DroughtMetrics,
    prediction: RemotePrediction,
) -> ForecastResult {
    let base_price = features.nqh2o_lag_1;
    let price_change = prediction.predicted_price - base_price;
    let price_change_pct = if base_price != 0.0 {
        price_change / base_price * 100.0
    } else {
        0.0
    };

    ForecastResult {
        predicted_price: prediction.predicted_price,
        confidence: prediction.confidence,
        price_change,
        price_change_pct,
        drought_severity: drought.severity,
        model_version: ENSEMBLE_MODEL_VERSION.to_string(),
        source: ForecastSource::Ensemble,
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::config::FALLBACK_CONFIDENCE;

    fn asof() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 15).unwrap()
    }

    fn drought(severity: u8) -> DroughtMetrics {
        DroughtMetrics::new(-1.0, -0.8, -1.5, severity)
    }

    /// Forecaster wired to a live local endpoint with a short timeout.
    fn forecaster_for(endpoint_url: String) -> Forecaster {
        let config = EnsembleConfig {
            endpoint_url,
            timeout: Duration::from_millis(300),
        };
        Forecaster::new(
            Some(EnsembleClient::new(&config).unwrap()),
            NoiseMode::Disabled,
        )
    }

    /// Local endpoint that answers every request with HTTP 500.
    fn spawn_http_500_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 8192];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\n\
                      content-length: 0\r\nconnection: close\r\n\r\n",
                );
            }
        });
        format!("http://{addr}/predict")
    }

    /// Local endpoint that accepts the connection and never responds.
    fn spawn_stalled_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                // Hold the socket open well past the client's timeout.
                thread::sleep(Duration::from_secs(2));
                drop(stream);
            }
        });
        format!("http://{addr}/predict")
    }

    #[test]
    fn http_500_from_remote_degrades_to_fallback() {
        let forecaster = forecaster_for(spawn_http_500_endpoint());
        let result = forecaster
            .predict(&drought(4), &[400.0], None, asof())
            .unwrap();
        assert_eq!(result.source, ForecastSource::Fallback);
        assert!((result.predicted_price - 408.0).abs() < 1e-9);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
    }

    #[test]
    fn remote_timeout_degrades_to_fallback() {
        let forecaster = forecaster_for(spawn_stalled_endpoint());
        let result = forecaster
            .predict(&drought(2), &[400.0], None, asof())
            .unwrap();
        assert_eq!(result.source, ForecastSource::Fallback);
        assert_eq!(result.predicted_price, 400.0);
    }

    #[test]
    fn unconfigured_remote_degrades_to_fallback_without_error() {
        let forecaster = Forecaster::fallback_only(NoiseMode::Disabled);
        let result = forecaster
            .predict(&drought(4), &[400.0], None, asof())
            .unwrap();
        assert_eq!(result.source, ForecastSource::Fallback);
        assert!((result.predicted_price - 408.0).abs() < 1e-9);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(result.drought_severity, 4);
    }

    #[test]
    fn empty_price_history_is_the_one_unrecoverable_input() {
        let forecaster = Forecaster::fallback_only(NoiseMode::Disabled);
        let err = forecaster
            .predict(&drought(2), &[], None, asof())
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));
    }

    #[test]
    fn non_finite_drought_index_fails_schema_validation() {
        let forecaster = Forecaster::fallback_only(NoiseMode::Disabled);
        let bad = DroughtMetrics::new(f64::NAN, -0.8, -1.5, 2);
        let err = forecaster
            .predict(&bad, &[400.0], None, asof())
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidFeatureVector(_)));
    }

    #[test]
    fn remote_failure_outcome_resolves_to_fallback_result() {
        let fv = build_features(
            &drought(2),
            &[400.0],
            None,
            &BasinDefaults::default(),
            asof(),
        )
        .unwrap();
        let result = resolve(
            RemoteOutcome::Failure("simulated timeout".into()),
            &fv,
            &drought(2),
            NoiseMode::Disabled,
        );
        assert_eq!(result.source, ForecastSource::Fallback);
        assert_eq!(result.predicted_price, 400.0);
    }

    #[test]
    fn remote_success_outcome_resolves_to_ensemble_result() {
        let fv = build_features(
            &drought(3),
            &[390.0, 400.0],
            None,
            &BasinDefaults::default(),
            asof(),
        )
        .unwrap();
        let result = resolve(
            RemoteOutcome::Success(RemotePrediction {
                predicted_price: 410.0,
                confidence: 0.9,
            }),
            &fv,
            &drought(3),
            NoiseMode::Disabled,
        );
        assert_eq!(result.source, ForecastSource::Ensemble);
        assert_eq!(result.predicted_price, 410.0);
        assert_eq!(result.confidence, 0.9);
        assert!((result.price_change - 10.0).abs() < 1e-9);
        assert!((result.price_change_pct - 2.5).abs() < 1e-9);
    }

    #[test]
    fn fixed_inputs_give_identical_results_with_noise_disabled() {
        let forecaster = Forecaster::fallback_only(NoiseMode::Disabled);
        let d = drought(4).with_trends(-0.3, -0.5);
        let prices = [380.0, 390.0, 400.0];
        let a = forecaster.predict(&d, &prices, None, asof()).unwrap();
        let b = forecaster.predict(&d, &prices, None, asof()).unwrap();
        assert_eq!(a, b);
    }
}
