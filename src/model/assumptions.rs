use chrono::{DateTime, Utc};
use serde::Serialize;

use super::noise::{MAX_DB, MIN_DB};
use super::win_probability as win;
use super::MODEL_VERSION;
use crate::catalog::models::{ConcessionsDefaults, ConcessionsMenu, CrowdDefaults, Venue};
use crate::scenario::PromotionType;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinCoefficients {
    pub fill: f64,
    pub fill_squared: f64,
    pub student: f64,
    pub rivalry: f64,
    pub rank: f64,
    pub rank_compress: f64,
    pub wind: f64,
    pub night: f64,
    pub energy: f64,
    pub energy_exponent: f64,
    pub fill_x_energy: f64,
    pub fill_x_rivalry: f64,
    pub enclosure: f64,
    /// Logit shift per promotion, keyed by its wire name.
    pub promotions: Vec<(&'static str, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinEngineAssumptions {
    pub version: &'static str,
    pub intercept_logit: f64,
    pub coefficients: WinCoefficients,
    pub term_sources: Vec<(&'static str, &'static str)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoiseEngineAssumptions {
    pub version: &'static str,
    pub bounds_db: [f64; 2],
    pub crowd_defaults: CrowdDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcessionsEngineAssumptions {
    pub version: &'static str,
    pub venue_defaults: ConcessionsDefaults,
    pub menu_defaults: ConcessionsMenu,
}

/// The constants and defaults behind every model, for display alongside
/// results. Nothing reads this back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineAssumptions {
    pub venue_name: String,
    pub venue_capacity: u32,
    pub win_engine: WinEngineAssumptions,
    pub noise_engine: NoiseEngineAssumptions,
    pub concessions_engine: ConcessionsEngineAssumptions,
    pub generated_at: DateTime<Utc>,
}

impl EngineAssumptions {
    pub fn snapshot(venue: &Venue, menu: &ConcessionsMenu) -> Self {
        EngineAssumptions {
            venue_name: venue.name.clone(),
            venue_capacity: venue.capacity,
            win_engine: WinEngineAssumptions {
                version: MODEL_VERSION,
                intercept_logit: win::INTERCEPT,
                coefficients: WinCoefficients {
                    fill: win::COEFF_FILL,
                    fill_squared: win::COEFF_FILL_SQ,
                    student: win::COEFF_STUDENT,
                    rivalry: win::COEFF_RIVALRY,
                    rank: win::COEFF_RANK,
                    rank_compress: win::COEFF_RANK_COMPRESS,
                    wind: win::COEFF_WIND,
                    night: win::COEFF_NIGHT,
                    energy: win::COEFF_ENERGY,
                    energy_exponent: win::ENERGY_EXPONENT,
                    fill_x_energy: win::COEFF_FILL_ENERGY,
                    fill_x_rivalry: win::COEFF_FILL_RIVALRY,
                    enclosure: win::COEFF_ENCLOSURE,
                    promotions: PromotionType::ALL
                        .iter()
                        .map(|p| (p.as_str(), win::promotion_logit(*p)))
                        .collect(),
                },
                term_sources: win::WinTerm::ALL
                    .iter()
                    .map(|t| (t.name(), t.provenance()))
                    .collect(),
            },
            noise_engine: NoiseEngineAssumptions {
                version: MODEL_VERSION,
                bounds_db: [MIN_DB, MAX_DB],
                crowd_defaults: venue.crowd.clone(),
            },
            concessions_engine: ConcessionsEngineAssumptions {
                version: MODEL_VERSION,
                venue_defaults: venue.concessions.clone(),
                menu_defaults: menu.clone(),
            },
            generated_at: Utc::now(),
        }
    }
}
