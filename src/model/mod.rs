//! The three base models. Each is a pure function of a [`Scenario`]
//! (plus read-only venue/menu records for concessions).
//!
//! - **Win probability**: logistic model of home-field advantage with
//!   interaction terms and logit-scale uncertainty
//! - **Noise**: projected sustained decibels with a log-scale fill curve
//! - **Concessions**: revenue, margin, and M/M/s queue metrics per arrival window
//!
//! Coefficients are fixed constants matched to published benchmarks. Nothing
//! here is fitted from data.
//!
//! [`Scenario`]: crate::scenario::Scenario

pub mod assumptions;
pub mod concessions;
pub mod noise;
pub mod queue;
pub mod win_probability;

use serde::Serialize;

pub use assumptions::EngineAssumptions;
pub use concessions::{simulate_concessions, ConcessionsResult, QueueWindowResult, WaitBand};
pub use noise::{predict_loudness, NoisePrediction};
pub use queue::{erlang_c, QueueMetrics};
pub use win_probability::{predict_win_probability, WinProbabilityPrediction, WinTerm};

/// z-score of a two-sided 90% normal interval.
pub const Z_90: f64 = 1.645;
/// Confidence level every model reports.
pub const CI_LEVEL: f64 = 0.90;
/// Version tag carried on every model result.
pub const MODEL_VERSION: &str = "v2";

/// One named piece of an additive decomposition (uncertainty parts, dB drivers).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Component {
    pub name: &'static str,
    pub value: f64,
}

impl Component {
    pub(crate) fn new(name: &'static str, value: f64) -> Self {
        Component { name, value }
    }
}

pub(crate) fn sum_components(parts: &[Component]) -> f64 {
    parts.iter().map(|c| c.value).sum()
}

/// Numerically stable logistic sigmoid.
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// 90% interval on the probability scale from a logit-scale normal.
pub(crate) fn logit_interval(logit: f64, sd_logit: f64) -> (f64, f64) {
    (
        sigmoid(logit - Z_90 * sd_logit),
        sigmoid(logit + Z_90 * sd_logit),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sigmoid_properties() {
        assert_relative_eq!(sigmoid(0.0), 0.5, epsilon = 1e-12);
        assert!(sigmoid(5.0) > 0.99);
        assert!(sigmoid(-5.0) < 0.01);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(800.0) <= 1.0);
        assert_relative_eq!(sigmoid(1.3) + sigmoid(-1.3), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn logit_interval_brackets_point() {
        let (lo, hi) = logit_interval(0.8, 0.3);
        let p = sigmoid(0.8);
        assert!(lo < p && p < hi);
        let (lo0, hi0) = logit_interval(0.8, 0.0);
        assert_relative_eq!(lo0, p, epsilon = 1e-12);
        assert_relative_eq!(hi0, p, epsilon = 1e-12);
    }
}
