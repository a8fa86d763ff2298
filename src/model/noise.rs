//! Sustained crowd noise in decibels.
//!
//! Fill enters on a log curve (each doubling of the crowd adds a fixed
//! increment), the remaining drivers are flat or power-law bonuses. Output is
//! held to the 82–125 dB band measured across FBS stadiums; the interval is
//! held to a wider 70–135 dB safety band.

use serde::Serialize;

use super::{sum_components, Component, CI_LEVEL, MODEL_VERSION, Z_90};
use crate::scenario::Scenario;

pub const MIN_DB: f64 = 82.0;
pub const MAX_DB: f64 = 125.0;
const CI_FLOOR_DB: f64 = 70.0;
const CI_CEIL_DB: f64 = 135.0;

/// Sparse-crowd ambient level.
const BASE_DB: f64 = 88.0;
/// dB range of the fill curve from empty to full.
const FILL_RANGE_DB: f64 = 15.0;
const STUDENT_AMP_DB: f64 = 3.5;
/// Student share above which the density bonus starts.
const STUDENT_BASELINE: f64 = 0.12;
const RIVALRY_DB: f64 = 3.0;
const NIGHT_DB: f64 = 1.5;
const ENCLOSURE_DB: f64 = 4.0;
const ENERGY_RANGE_DB: f64 = 10.0;
const ENERGY_EXPONENT: f64 = 0.6;
/// Organised chanting bonus at full energy.
const CHANT_DB: f64 = 2.0;
const CHANT_ENERGY_THRESHOLD: f64 = 0.70;
const COLD_BONUS_DB: f64 = 0.8;
const COLD_THRESHOLD_F: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoiseUncertainty {
    pub ci_level: f64,
    pub sd_db: f64,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoisePrediction {
    pub projected_decibels: f64,
    pub projected_decibels_ci_low: f64,
    pub projected_decibels_ci_high: f64,
    pub uncertainty: NoiseUncertainty,
    /// Unclamped dB contribution of each driver.
    pub drivers: Vec<Component>,
    pub fill_factor: f64,
    /// Crowd energy on a 0–100 scale after clamping.
    pub energy_score: u8,
    pub model_version: &'static str,
}

/// `log2(1 + 7·fill) / log2(8)`: 0 at empty, 1 at full.
fn fill_curve(fill: f64) -> f64 {
    if fill <= 0.0 {
        0.0
    } else {
        (1.0 + fill * 7.0).log2() / 8f64.log2()
    }
}

pub fn predict_loudness(scenario: &Scenario) -> NoisePrediction {
    let cap = f64::from(scenario.venue_capacity.max(1));
    let fill = (f64::from(scenario.attendance) / cap).clamp(0.0, 1.0);
    let energy = f64::from(scenario.crowd_energy.min(100)) / 100.0;
    let student_ratio = scenario.student_ratio.clamp(0.0, 0.5);
    let night = scenario.is_night();
    let outdoor = !scenario.is_indoor;
    let temp = f64::from(scenario.weather_temp_f);

    let fill_db = FILL_RANGE_DB * fill_curve(fill);
    let student_db = STUDENT_AMP_DB * (student_ratio - STUDENT_BASELINE).max(0.0) / 0.18;
    let rivalry_db = if scenario.rivalry_flag { RIVALRY_DB } else { 0.0 };
    let night_db = if night { NIGHT_DB } else { 0.0 };
    let enclosure_db = if scenario.is_indoor { ENCLOSURE_DB } else { 0.0 };
    let energy_db = energy.powf(ENERGY_EXPONENT) * ENERGY_RANGE_DB;
    let chant_db = if energy > CHANT_ENERGY_THRESHOLD {
        CHANT_DB * (energy - CHANT_ENERGY_THRESHOLD) / (1.0 - CHANT_ENERGY_THRESHOLD)
    } else {
        0.0
    };
    let cold_db = if outdoor {
        COLD_BONUS_DB * ((COLD_THRESHOLD_F - temp) / 30.0).max(0.0)
    } else {
        0.0
    };

    let drivers = vec![
        Component::new("fill", fill_db),
        Component::new("student_density", student_db),
        Component::new("rivalry", rivalry_db),
        Component::new("night", night_db),
        Component::new("enclosure", enclosure_db),
        Component::new("energy", energy_db),
        Component::new("coordination", chant_db),
        Component::new("cold_weather", cold_db),
    ];
    let db = (BASE_DB + sum_components(&drivers)).clamp(MIN_DB, MAX_DB);

    let components = vec![
        Component::new("base", 1.2),
        Component::new("fill", 1.5 * (1.0 - fill)),
        Component::new("energy", 0.8 * (1.0 - energy)),
        Component::new("rivalry", if scenario.rivalry_flag { 0.6 } else { 0.0 }),
        Component::new("weather", if outdoor && temp < 40.0 { 0.4 } else { 0.0 }),
    ];
    let sd_db = sum_components(&components);

    NoisePrediction {
        projected_decibels: db,
        projected_decibels_ci_low: (db - Z_90 * sd_db).max(CI_FLOOR_DB),
        projected_decibels_ci_high: (db + Z_90 * sd_db).min(CI_CEIL_DB),
        uncertainty: NoiseUncertainty {
            ci_level: CI_LEVEL,
            sd_db,
            components,
        },
        drivers,
        fill_factor: fill,
        energy_score: scenario.crowd_energy.min(100),
        model_version: MODEL_VERSION,
    }
}
