//! Orchestrators built on the base models: sensitivity surfaces, Monte Carlo
//! distributions, the lever optimizer, calibration, and the combined
//! game/what-if/lever views.

pub mod calibration;
pub mod monte_carlo;
pub mod optimizer;
pub mod sensitivity;
pub mod simulate;
pub mod stats;

pub use calibration::{run_calibration, CalibrationConfig, CalibrationReport};
pub use monte_carlo::{MonteCarloConfig, MonteCarloEngine, MonteCarloResult};
pub use optimizer::{optimize, OptimizationResult, OptimizeRequest};
pub use sensitivity::{sensitivity_surface, SensitivitySurface, SurfaceRequest};
pub use simulate::{
    evaluate, recommend_levers, simulate_game, what_if, GameSimulation, LeverLimits,
    LeverRecommendations, ModelOutputs, WhatIfResult,
};
pub use stats::{Distribution, Histogram, SummaryStats};
