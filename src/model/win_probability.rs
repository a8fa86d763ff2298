//! Home-field win probability.
//!
//! A logistic model on a log-odds score built from named terms. The crowd
//! terms (fill, student mix, energy, and their interactions) are what an
//! operations team can move; rank edge and weather set the context.
//!
//! Coefficient anchors:
//! - Intercept: FBS home win rate ≈ 57% → logit 0.28
//! - Fill: ≈1 pt suppressed per 38,875 fans, ≈1 pt lost per 21,211 empty seats
//!   (McMahon & Quintanar 2024), mapped to ≈3 pp per 15% fill
//! - Sellout premium and fill×energy: ghost-game natural experiment
//!   (Bryson et al. 2021), convex above ≈90% fill
//! - Rank edge: Elo-style tanh compression so a huge mismatch saturates
//!
//! Each term's contribution is reported leave-one-out: drop the term from the
//! score and measure the probability change. Contributions do not sum to the
//! total when terms interact through the sigmoid; they are not renormalised.

use serde::Serialize;

use super::{logit_interval, sigmoid, sum_components, Component, CI_LEVEL, MODEL_VERSION};
use crate::scenario::{PromotionType, Scenario, UNRANKED};

/// Baseline home win rate on the logit scale.
pub const INTERCEPT: f64 = 0.28;

/// Fill the centred fill terms pivot around (typical FBS occupancy).
const REFERENCE_FILL: f64 = 0.85;
/// Student share the student term pivots around.
const REFERENCE_STUDENT_RATIO: f64 = 0.18;
/// Wind speed below which outdoor wind has no effect.
const WIND_THRESHOLD_MPH: f64 = 10.0;

pub const COEFF_FILL: f64 = 1.20;
pub const COEFF_FILL_SQ: f64 = 0.45;
pub const COEFF_STUDENT: f64 = 1.00;
pub const COEFF_RIVALRY: f64 = 0.30;
pub const COEFF_RANK: f64 = 0.90;
pub const COEFF_RANK_COMPRESS: f64 = 0.85;
pub const COEFF_WIND: f64 = -0.18;
pub const COEFF_NIGHT: f64 = 0.12;
pub const COEFF_ENERGY: f64 = 0.40;
pub const ENERGY_EXPONENT: f64 = 0.7;
pub const COEFF_FILL_ENERGY: f64 = 0.25;
pub const COEFF_FILL_RIVALRY: f64 = 0.15;
pub const COEFF_ENCLOSURE: f64 = 0.08;

/// Logit shift of each promotion on the home crowd's pressure.
pub fn promotion_logit(promotion: PromotionType) -> f64 {
    match promotion {
        PromotionType::None => 0.0,
        // More students in the bowl.
        PromotionType::StudentPush => 0.18,
        // Older crowd, quieter but present early.
        PromotionType::AlumniNight => 0.10,
        // Families are quieter.
        PromotionType::FamilyBundle => -0.06,
        PromotionType::RivalryHype => 0.22,
    }
}

/// Named terms of the log-odds score, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WinTerm {
    AttendanceFill,
    FillSquared,
    StudentRatio,
    Rivalry,
    RankEdge,
    WindPenalty,
    NightKick,
    Promotion,
    CrowdEnergy,
    FillXEnergy,
    FillXRivalry,
    Enclosure,
}

impl WinTerm {
    pub const ALL: [WinTerm; 12] = [
        WinTerm::AttendanceFill,
        WinTerm::FillSquared,
        WinTerm::StudentRatio,
        WinTerm::Rivalry,
        WinTerm::RankEdge,
        WinTerm::WindPenalty,
        WinTerm::NightKick,
        WinTerm::Promotion,
        WinTerm::CrowdEnergy,
        WinTerm::FillXEnergy,
        WinTerm::FillXRivalry,
        WinTerm::Enclosure,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WinTerm::AttendanceFill => "attendance_fill",
            WinTerm::FillSquared => "fill_squared",
            WinTerm::StudentRatio => "student_ratio",
            WinTerm::Rivalry => "rivalry",
            WinTerm::RankEdge => "rank_edge",
            WinTerm::WindPenalty => "wind_penalty",
            WinTerm::NightKick => "night_kick",
            WinTerm::Promotion => "promotion",
            WinTerm::CrowdEnergy => "crowd_energy",
            WinTerm::FillXEnergy => "fill_x_energy",
            WinTerm::FillXRivalry => "fill_x_rivalry",
            WinTerm::Enclosure => "enclosure",
        }
    }

    /// Where the coefficient comes from. Display only.
    pub fn provenance(&self) -> &'static str {
        match self {
            WinTerm::AttendanceFill => {
                "McMahon & Quintanar 2024: 1 pt per 38,875 fans, 1 pt per 21,211 empty seats"
            }
            WinTerm::FillSquared => {
                "Bryson et al. 2021: convex sellout premium from ghost-game natural experiment"
            }
            WinTerm::StudentRatio => {
                "Moskowitz & Wertheim 2011: student sections 1.5-2.5x louder, more referee bias"
            }
            WinTerm::Rivalry => "Estimated: 2-4 pp quality-controlled rivalry boost",
            WinTerm::RankEdge => "Elo-style tanh compression calibrated to SP+/FPI spreads",
            WinTerm::WindPenalty => "McMahon & Quintanar 2024: weather channel, outdoor only",
            WinTerm::NightKick => "Estimated: 3-5 pp raw, discounted for selection bias",
            WinTerm::Promotion => "Estimated per promotion category",
            WinTerm::CrowdEnergy => "Estimated: energy as noise proxy for referee bias",
            WinTerm::FillXEnergy => "Bryson et al. 2021: crowd presence x intensity",
            WinTerm::FillXRivalry => "McMahon & Quintanar 2024: rivalry x attendance",
            WinTerm::Enclosure => "Acoustic literature: enclosed venues amplify crowd ~1.3x",
        }
    }
}

/// One row of the term table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TermContribution {
    pub term: WinTerm,
    /// Raw value of the term on the logit scale.
    pub logit: f64,
    /// Leave-one-out effect in percentage points.
    pub contribution_pp: f64,
    pub provenance: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogitUncertainty {
    pub ci_level: f64,
    pub sd_logit: f64,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinProbabilityPrediction {
    pub predicted_win_probability: f64,
    pub predicted_win_probability_ci_low: f64,
    pub predicted_win_probability_ci_high: f64,
    pub uncertainty: LogitUncertainty,
    pub intercept_logit: f64,
    /// Full log-odds score (intercept + all terms).
    pub logit: f64,
    pub terms: Vec<TermContribution>,
    pub model_version: &'static str,
}

impl WinProbabilityPrediction {
    pub fn contribution(&self, term: WinTerm) -> Option<&TermContribution> {
        self.terms.iter().find(|t| t.term == term)
    }
}

/// Derived inputs shared by the score and the uncertainty model.
struct Drivers {
    fill: f64,
    fill_centered: f64,
    student_ratio: f64,
    rank_edge: f64,
    rivalry: f64,
    energy: f64,
}

impl Drivers {
    fn from_scenario(s: &Scenario) -> Self {
        let cap = f64::from(s.effective_capacity().max(1));
        let fill = (f64::from(s.attendance) / cap).clamp(0.0, 1.2).clamp(0.0, 1.0);
        let student_ratio = if s.student_ratio.is_finite() {
            s.student_ratio.clamp(0.0, 1.0)
        } else {
            REFERENCE_STUDENT_RATIO
        };
        let opponent = f64::from(s.opponent_rank.clamp(1, UNRANKED));
        let home = f64::from(s.home_team_rank.clamp(1, UNRANKED));
        Drivers {
            fill,
            fill_centered: fill - REFERENCE_FILL,
            student_ratio,
            rank_edge: (opponent - home) / 25.0,
            rivalry: if s.rivalry_flag { 1.0 } else { 0.0 },
            energy: f64::from(s.crowd_energy.min(100)) / 100.0,
        }
    }
}

fn term_values(s: &Scenario, d: &Drivers) -> [(WinTerm, f64); 12] {
    let c = d.fill_centered;
    let energy_effect = d.energy.powf(ENERGY_EXPONENT);
    let rank_compressed = (d.rank_edge * COEFF_RANK_COMPRESS).tanh();
    let wind_penalty = if s.is_indoor {
        0.0
    } else {
        COEFF_WIND * ((f64::from(s.weather_wind_mph) - WIND_THRESHOLD_MPH) / 10.0).max(0.0)
    };
    let sellout_sign = if c > 0.0 { 1.0 } else { -1.0 };
    let night = if s.is_night() { 1.0 } else { 0.0 };
    let enclosure = if s.is_indoor { 1.0 } else { 0.0 };

    [
        (WinTerm::AttendanceFill, COEFF_FILL * c),
        (WinTerm::FillSquared, COEFF_FILL_SQ * c * c * sellout_sign),
        (
            WinTerm::StudentRatio,
            COEFF_STUDENT * (d.student_ratio - REFERENCE_STUDENT_RATIO),
        ),
        (WinTerm::Rivalry, COEFF_RIVALRY * d.rivalry),
        (WinTerm::RankEdge, COEFF_RANK * rank_compressed),
        (WinTerm::WindPenalty, wind_penalty),
        (WinTerm::NightKick, COEFF_NIGHT * night),
        (WinTerm::Promotion, promotion_logit(s.promotion_type)),
        (WinTerm::CrowdEnergy, COEFF_ENERGY * energy_effect),
        (WinTerm::FillXEnergy, COEFF_FILL_ENERGY * c * energy_effect),
        (WinTerm::FillXRivalry, COEFF_FILL_RIVALRY * c * d.rivalry),
        (WinTerm::Enclosure, COEFF_ENCLOSURE * enclosure),
    ]
}

fn uncertainty_components(s: &Scenario, d: &Drivers) -> Vec<Component> {
    let weather = if s.is_indoor {
        0.0
    } else {
        0.05 * (f64::from(s.weather_wind_mph) / 25.0).clamp(0.0, 1.0)
    };
    vec![
        Component::new("base_model_noise", 0.18),
        Component::new("rank_uncertainty", 0.07 * d.rank_edge.abs()),
        Component::new("weather_uncertainty", weather),
        Component::new("crowd_uncertainty", 0.04 * (1.0 - d.fill)),
        Component::new("rivalry_variance", 0.05 * d.rivalry),
        Component::new("energy_uncertainty", 0.02 * (1.0 - d.energy)),
    ]
}

/// Win probability for the home team, with a 90% interval and term table.
pub fn predict_win_probability(scenario: &Scenario) -> WinProbabilityPrediction {
    let drivers = Drivers::from_scenario(scenario);
    let terms = term_values(scenario, &drivers);

    let logit = INTERCEPT + terms.iter().map(|(_, v)| v).sum::<f64>();
    let p = sigmoid(logit);

    let components = uncertainty_components(scenario, &drivers);
    let sd_logit = sum_components(&components);
    let (ci_low, ci_high) = logit_interval(logit, sd_logit);

    let terms = terms
        .iter()
        .map(|&(term, value)| TermContribution {
            term,
            logit: value,
            contribution_pp: (p - sigmoid(logit - value)) * 100.0,
            provenance: term.provenance(),
        })
        .collect();

    WinProbabilityPrediction {
        predicted_win_probability: p,
        predicted_win_probability_ci_low: ci_low,
        predicted_win_probability_ci_high: ci_high,
        uncertainty: LogitUncertainty {
            ci_level: CI_LEVEL,
            sd_logit,
            components,
        },
        intercept_logit: INTERCEPT,
        logit,
        terms,
        model_version: MODEL_VERSION,
    }
}
