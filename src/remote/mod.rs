//! Remote ensemble endpoint client.
//!
//! One synchronous best-effort POST per prediction, bounded by the
//! configured timeout. Every failure mode (connect error, timeout,
//! non-2xx status, unparseable payload, nonsense values) becomes a
//! [`RemoteOutcome::Failure`] value rather than an error, which makes the
//! "always degrade to the fallback" contract visible in the type
//! signature instead of buried in exception handling.

use std::collections::HashMap;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::{DEFAULT_ENSEMBLE_CONFIDENCE, EnsembleConfig};
use crate::features::FeatureVector;
use crate::math::{mean, population_std};

/// Outcome of a single remote attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome {
    Success(RemotePrediction),
    /// Human-readable reason, logged when the fallback activates.
    Failure(String),
}

/// Parsed remote response.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePrediction {
    /// Point prediction: the endpoint's scalar, or the average of the
    /// sub-model breakdown when one is returned.
    pub predicted_price: f64,
    /// Agreement-derived confidence in [0, 1].
    pub confidence: f64,
}

pub struct EnsembleClient {
    client: Client,
    endpoint_url: String,
}

impl EnsembleClient {
    /// Build a client with the configured request timeout baked in.
    pub fn new(config: &EnsembleConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint_url: config.endpoint_url.clone(),
        })
    }

    /// Single best-effort prediction request. No retries: the caller is
    /// on a synchronous request path with a tight latency budget, and the
    /// fallback heuristic is always available.
    pub fn predict(&self, features: &FeatureVector) -> RemoteOutcome {
        let request = PredictRequest {
            instances: [features],
        };

        let resp = match self.client.post(&self.endpoint_url).json(&request).send() {
            Ok(resp) => resp,
            Err(e) => return RemoteOutcome::Failure(format!("ensemble request failed: {e}")),
        };

        let status = resp.status();
        if !status.is_success() {
            return RemoteOutcome::Failure(format!(
                "ensemble endpoint returned status {status}"
            ));
        }

        let body: PredictResponse = match resp.json() {
            Ok(body) => body,
            Err(e) => {
                return RemoteOutcome::Failure(format!("failed to parse ensemble response: {e}"));
            }
        };

        tracing::debug!(endpoint = %self.endpoint_url, "ensemble round-trip ok");
        parse_prediction(&body)
    }
}

#[derive(serde::Serialize)]
struct PredictRequest<'a> {
    instances: [&'a FeatureVector; 1],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<PredictionPayload>,
}

/// The endpoint returns either a bare scalar per instance or a breakdown
/// object carrying the point prediction and/or per-sub-model values.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictionPayload {
    Scalar(f64),
    Breakdown {
        #[serde(default)]
        prediction: Option<f64>,
        #[serde(default)]
        individual_predictions: HashMap<String, f64>,
    },
}

fn parse_prediction(body: &PredictResponse) -> RemoteOutcome {
    let Some(payload) = body.predictions.first() else {
        return RemoteOutcome::Failure("no predictions in ensemble response".into());
    };

    let (point, confidence) = match payload {
        PredictionPayload::Scalar(v) => (*v, DEFAULT_ENSEMBLE_CONFIDENCE),
        PredictionPayload::Breakdown {
            prediction,
            individual_predictions,
        } => {
            let subs: Vec<f64> = individual_predictions.values().copied().collect();
            let point = match (prediction, subs.is_empty()) {
                (Some(p), _) => *p,
                (None, false) => mean(&subs),
                (None, true) => {
                    return RemoteOutcome::Failure(
                        "ensemble breakdown carried no prediction".into(),
                    );
                }
            };
            (point, agreement_confidence(point, &subs))
        }
    };

    if !point.is_finite() {
        return RemoteOutcome::Failure(format!("ensemble returned non-finite prediction {point}"));
    }

    RemoteOutcome::Success(RemotePrediction {
        predicted_price: point,
        confidence,
    })
}

/// Confidence from sub-model agreement: tight spread around the point
/// prediction means high confidence. Without at least two sub-models (or
/// with a zero point) there is nothing to measure, so the fixed default
/// applies.
fn agreement_confidence(point: f64, subs: &[f64]) -> f64 {
    if subs.len() < 2 || point == 0.0 {
        return DEFAULT_ENSEMBLE_CONFIDENCE;
    }
    (1.0 - population_std(subs) / point.abs()).clamp(0.0, 1.0)
}
