use thiserror::Error;

/// Requests the engine refuses to evaluate.
///
/// Model inputs are never rejected (they are clamped into range); these
/// variants cover orchestrator requests that are malformed or would blow
/// through an evaluation budget.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid {axis} range: min={min}, max={max}, step={step}")]
    InvalidRange {
        axis: &'static str,
        min: f64,
        max: f64,
        step: f64,
    },

    #[error("search space has {combinations} combinations, above the cap of {limit}")]
    SearchSpaceTooLarge { combinations: u64, limit: u64 },

    #[error("simulation count {requested} outside allowed range 1..={limit}")]
    InvalidTrialCount { requested: usize, limit: usize },

    #[error("calibration sample count {requested} outside allowed range 1..={limit}")]
    InvalidSampleCount { requested: usize, limit: usize },

    #[error("unknown game id '{0}'")]
    UnknownGame(String),

    #[error("unknown venue id '{0}'")]
    UnknownVenue(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
