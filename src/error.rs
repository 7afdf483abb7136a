//! Error taxonomy for the forecasting core.
//!
//! Only two conditions are surfaced to callers; everything else degrades:
//!
//! - missing/partial drought or basin inputs fall back to documented
//!   defaults inside feature engineering
//! - remote ensemble failures (timeout, bad status, unparseable payload)
//!   are converted into [`RemoteOutcome::Failure`](crate::remote::RemoteOutcome)
//!   and routed to the fallback heuristic, never raised

/// Errors a caller of the forecasting core can observe.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ForecastError {
    /// The one unrecoverable input condition: an empty price history.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The assembled feature vector violates the trained model's schema
    /// (wrong field count or a non-finite value). This indicates an
    /// integration bug upstream, so it fails loudly instead of degrading.
    #[error("invalid feature vector: {0}")]
    InvalidFeatureVector(String),
}
