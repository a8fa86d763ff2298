//! Stadium game-day simulation engine.
//!
//! Three pure models (win probability, crowd noise, concessions queueing)
//! evaluated over a [`Scenario`], plus orchestrators that sweep, sample,
//! search, and calibrate them.

pub mod analysis;
pub mod catalog;
pub mod error;
pub mod model;
pub mod scenario;

pub use catalog::Catalog;
pub use error::{EngineError, Result};
pub use scenario::{PromotionType, Scenario, ScenarioOverrides};
