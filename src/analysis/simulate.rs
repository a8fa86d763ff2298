use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::models::{ConcessionsMenu, Game, Venue};
use crate::model::{
    predict_loudness, predict_win_probability, simulate_concessions, ConcessionsResult,
    NoisePrediction, WinProbabilityPrediction,
};
use crate::scenario::{Scenario, ScenarioOverrides};

/// Energy added by the crowd-energy lever.
const ENERGY_BUMP: u8 = 15;

/// All three model results for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelOutputs {
    pub win_probability: WinProbabilityPrediction,
    pub noise: NoisePrediction,
    pub concessions: ConcessionsResult,
}

pub fn evaluate(scenario: &Scenario, venue: &Venue, menu: &ConcessionsMenu) -> ModelOutputs {
    ModelOutputs {
        win_probability: predict_win_probability(scenario),
        noise: predict_loudness(scenario),
        concessions: simulate_concessions(scenario, venue, menu),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSimulation {
    pub game_id: String,
    pub baseline_scenario: Scenario,
    pub counterfactual_scenario: Scenario,
    pub baseline: ModelOutputs,
    pub counterfactual: ModelOutputs,
    pub delta_win_probability: f64,
}

/// Baseline versus `baseline + overrides` for a catalog game.
pub fn simulate_game(
    game: &Game,
    venue: &Venue,
    menu: &ConcessionsMenu,
    overrides: &ScenarioOverrides,
) -> GameSimulation {
    let baseline_scenario = Scenario::baseline(game, venue);
    let counterfactual_scenario = baseline_scenario.with_overrides(overrides);
    let baseline = evaluate(&baseline_scenario, venue, menu);
    let counterfactual = evaluate(&counterfactual_scenario, venue, menu);
    let delta = counterfactual.win_probability.predicted_win_probability
        - baseline.win_probability.predicted_win_probability;
    info!(
        "Simulated {}: win {:.3} -> {:.3} ({:+.2}pp), {:.1} dB, revenue ${:.0}",
        game.game_id,
        baseline.win_probability.predicted_win_probability,
        counterfactual.win_probability.predicted_win_probability,
        delta * 100.0,
        counterfactual.noise.projected_decibels,
        counterfactual.concessions.revenue_total_usd
    );
    GameSimulation {
        game_id: game.game_id.clone(),
        baseline_scenario,
        counterfactual_scenario,
        baseline,
        counterfactual,
        delta_win_probability: delta,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatIfResult {
    pub baseline_win_prob: f64,
    pub counterfactual_win_prob: f64,
    pub delta_win_prob: f64,
    pub changes_applied: ScenarioOverrides,
}

/// Win probability of `base` with and without `changes`.
pub fn what_if(base: &Scenario, changes: &ScenarioOverrides) -> WhatIfResult {
    let baseline = predict_win_probability(base).predicted_win_probability;
    let counter = predict_win_probability(&base.with_overrides(changes)).predicted_win_probability;
    WhatIfResult {
        baseline_win_prob: baseline,
        counterfactual_win_prob: counter,
        delta_win_prob: counter - baseline,
        changes_applied: changes.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeverLimits {
    pub max_attendance_increase: u32,
    pub max_student_ratio_increase: f64,
}

impl Default for LeverLimits {
    fn default() -> Self {
        LeverLimits {
            max_attendance_increase: 5_000,
            max_student_ratio_increase: 0.03,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lever {
    Attendance,
    StudentRatio,
    CrowdEnergy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeverMove {
    pub lever: Lever,
    pub change: String,
    pub delta_pp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeverRecommendations {
    pub baseline_win_prob: f64,
    pub recommendations: Vec<LeverMove>,
}

/// Try each single-lever move on its own and rank by win gain.
pub fn recommend_levers(base: &Scenario, limits: &LeverLimits) -> LeverRecommendations {
    let baseline = predict_win_probability(base).predicted_win_probability;
    let delta_pp = |s: &Scenario| (predict_win_probability(s).predicted_win_probability - baseline) * 100.0;
    let mut moves = Vec::with_capacity(3);

    if limits.max_attendance_increase > 0 {
        let mut s = base.clone();
        s.attendance = s.attendance.saturating_add(limits.max_attendance_increase);
        moves.push(LeverMove {
            lever: Lever::Attendance,
            change: format!("+{}", limits.max_attendance_increase),
            delta_pp: delta_pp(&s),
        });
    }
    if limits.max_student_ratio_increase > 0.0 {
        let mut s = base.clone();
        s.student_ratio = (s.student_ratio + limits.max_student_ratio_increase).min(1.0);
        moves.push(LeverMove {
            lever: Lever::StudentRatio,
            change: format!("+{:.3}", limits.max_student_ratio_increase),
            delta_pp: delta_pp(&s),
        });
    }
    if base.crowd_energy < 100 {
        let mut s = base.clone();
        s.crowd_energy = s.crowd_energy.saturating_add(ENERGY_BUMP).min(100);
        moves.push(LeverMove {
            lever: Lever::CrowdEnergy,
            change: format!("+{ENERGY_BUMP}"),
            delta_pp: delta_pp(&s),
        });
    }

    moves.sort_by(|a, b| b.delta_pp.total_cmp(&a.delta_pp));
    LeverRecommendations {
        baseline_win_prob: baseline,
        recommendations: moves,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::scenario::tests::reference_scenario;

    #[test]
    fn empty_overrides_leave_game_unchanged() {
        let catalog = Catalog::builtin();
        let game = catalog.game("michigan_at_osu_2026").unwrap();
        let venue = catalog.venue_for(game);
        let sim = simulate_game(game, venue, &catalog.menu, &ScenarioOverrides::default());
        assert_eq!(sim.delta_win_probability, 0.0);
        assert_eq!(sim.baseline, sim.counterfactual);
        assert!(sim.baseline_scenario.rivalry_flag);
    }

    #[test]
    fn louder_crowd_raises_win_probability() {
        let catalog = Catalog::builtin();
        let game = catalog.game("michigan_at_osu_2026").unwrap();
        let overrides = ScenarioOverrides {
            crowd_energy: Some(100),
            ..ScenarioOverrides::default()
        };
        let sim = simulate_game(game, catalog.venue_for(game), &catalog.menu, &overrides);
        assert!(sim.delta_win_probability > 0.0);
        assert!(
            sim.counterfactual.noise.projected_decibels > sim.baseline.noise.projected_decibels
        );
        assert_eq!(sim.counterfactual_scenario.crowd_energy, 100);
    }

    #[test]
    fn what_if_reports_delta() {
        let base = reference_scenario();
        let none = what_if(&base, &ScenarioOverrides::default());
        assert_eq!(none.delta_win_prob, 0.0);

        let changes = ScenarioOverrides {
            rivalry_flag: Some(true),
            ..ScenarioOverrides::default()
        };
        let r = what_if(&base, &changes);
        assert!(r.delta_win_prob > 0.0);
        assert_eq!(r.counterfactual_win_prob - r.baseline_win_prob, r.delta_win_prob);
        assert_eq!(r.changes_applied, changes);
    }

    #[test]
    fn levers_ranked_by_gain() {
        let r = recommend_levers(&reference_scenario(), &LeverLimits::default());
        assert_eq!(r.recommendations.len(), 3);
        assert!(r
            .recommendations
            .windows(2)
            .all(|w| w[0].delta_pp >= w[1].delta_pp));
        assert!(r.recommendations.iter().all(|m| m.delta_pp > 0.0));
    }

    #[test]
    fn maxed_energy_and_zero_limits_skip_levers() {
        let mut s = reference_scenario();
        s.crowd_energy = 100;
        let r = recommend_levers(&s, &LeverLimits::default());
        assert!(r.recommendations.iter().all(|m| m.lever != Lever::CrowdEnergy));
        assert_eq!(r.recommendations.len(), 2);

        let limits = LeverLimits {
            max_attendance_increase: 0,
            max_student_ratio_increase: 0.0,
        };
        let r = recommend_levers(&reference_scenario(), &limits);
        assert_eq!(r.recommendations.len(), 1);
        assert_eq!(r.recommendations[0].lever, Lever::CrowdEnergy);
        assert_eq!(r.recommendations[0].change, "+15");
    }
}
