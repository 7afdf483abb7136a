//! `nqh2o-forecast` library crate.
//!
//! Drought-conditioned price forecasting for the NQH2O California water
//! index. Two stages, composed sequentially:
//!
//! - feature engineering: `(DroughtMetrics, PriceHistory, BasinData?)` is
//!   mapped to the fixed 29-feature vector the trained ensemble expects
//!   (pure function, no I/O)
//! - prediction: a single best-effort call to the remote ensemble
//!   endpoint, falling back to a deterministic closed-form heuristic on
//!   any remote failure
//!
//! The crate is a library on purpose: HTTP routing, UI rendering, and
//! persistence are collaborators, not part of this core.

pub mod config;
pub mod domain;
pub mod error;
pub mod features;
pub mod math;
pub mod predict;
pub mod remote;
pub mod report;
