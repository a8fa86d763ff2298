//! Exhaustive lever search.
//!
//! Six levers are discretised into axes and every point of their Cartesian
//! product is scored. Points are generated lazily from a flat index, and the
//! product size is checked against the evaluation cap before anything runs.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::models::{ConcessionsMenu, Venue};
use crate::error::{EngineError, Result};
use crate::model::{predict_win_probability, simulate_concessions};
use crate::scenario::{Scenario, ScenarioOverrides};

pub const ATTENDANCE_STEP: u32 = 500;
pub const STUDENT_RATIO_STEP: f64 = 0.005;
/// Student share the search never pushes past.
pub const STUDENT_RATIO_CEILING: f64 = 0.30;
pub const ENERGY_STEP: u8 = 5;
pub const STANDS_STEP: u8 = 5;
pub const DEFAULT_MAX_EVALUATIONS: u64 = 250_000;
/// Recommended plus alternatives.
const KEEP_TOP: usize = 6;

/// Utilisation above which the score is penalised.
const OVERLOAD_THRESHOLD: f64 = 0.90;
const OVERLOAD_PENALTY: f64 = 6.0;
const REVENUE_TIEBREAK: f64 = 1e-6;
const TARGET_WEIGHT: f64 = 2.0;
const TARGET_BONUS: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeRequest {
    /// Starting point on top of the game baseline.
    pub current_overrides: ScenarioOverrides,
    pub max_attendance_increase: u32,
    pub max_student_ratio_increase: f64,
    pub max_crowd_energy_increase: u8,
    pub max_staff_per_stand: u8,
    pub min_stands_open_pct: u8,
    /// Desired win-probability gain in percentage points.
    pub target_delta_win_pp: Option<f64>,
    pub max_evaluations: u64,
}

impl Default for OptimizeRequest {
    fn default() -> Self {
        OptimizeRequest {
            current_overrides: ScenarioOverrides::default(),
            max_attendance_increase: 5_000,
            max_student_ratio_increase: 0.03,
            max_crowd_energy_increase: 25,
            max_staff_per_stand: 12,
            min_stands_open_pct: 80,
            target_delta_win_pp: None,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
        }
    }
}

/// One point of the discretised lever space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPoint {
    pub attendance: u32,
    pub student_ratio: f64,
    pub crowd_energy: u8,
    pub stands_open_pct: u8,
    pub staff_per_stand: u8,
    pub express_lanes: bool,
}

impl GridPoint {
    pub fn apply_to(&self, scenario: &Scenario) -> Scenario {
        let mut s = scenario.clone();
        s.attendance = self.attendance;
        s.student_ratio = self.student_ratio;
        s.crowd_energy = self.crowd_energy;
        s.stands_open_pct = self.stands_open_pct;
        s.staff_per_stand = self.staff_per_stand;
        s.express_lanes = self.express_lanes;
        s
    }

    pub fn to_overrides(&self) -> ScenarioOverrides {
        ScenarioOverrides {
            attendance: Some(self.attendance),
            student_ratio: Some(self.student_ratio),
            crowd_energy: Some(self.crowd_energy),
            stands_open_pct: Some(self.stands_open_pct),
            staff_per_stand: Some(self.staff_per_stand),
            express_lanes: Some(self.express_lanes),
            ..ScenarioOverrides::default()
        }
    }
}

/// Discretised axes. Every axis holds at least one value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchGrid {
    pub attendance: Vec<u32>,
    pub student_ratio: Vec<f64>,
    pub crowd_energy: Vec<u8>,
    pub stands_open_pct: Vec<u8>,
    pub staff_per_stand: Vec<u8>,
    pub express_lanes: [bool; 2],
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

impl SearchGrid {
    pub fn build(current: &Scenario, req: &OptimizeRequest) -> Self {
        let att0 = current.attendance;
        let attendance = (att0..=att0.saturating_add(req.max_attendance_increase))
            .step_by(ATTENDANCE_STEP as usize)
            .collect();

        let sr0 = current.student_ratio;
        let sr_inc = req.max_student_ratio_increase.clamp(0.0, 1.0);
        let sr_upper = sr0.max((sr0 + sr_inc).min(STUDENT_RATIO_CEILING));
        let sr_steps = ((sr_upper - sr0) / STUDENT_RATIO_STEP + 1e-9).floor() as usize;
        let student_ratio = (0..=sr_steps)
            .map(|i| round3(sr0 + STUDENT_RATIO_STEP * i as f64))
            .collect();

        let en0 = current.crowd_energy.min(100);
        let en_max = en0.saturating_add(req.max_crowd_energy_increase).min(100);
        let crowd_energy = (en0..=en_max).step_by(ENERGY_STEP as usize).collect();

        let stands_min = req.min_stands_open_pct.clamp(10, 100);
        let stands_open_pct = (stands_min..=100).step_by(STANDS_STEP as usize).collect();

        let staff_max = req.max_staff_per_stand.clamp(1, 20);
        let staff_min = current.staff_per_stand.clamp(1, 20).min(staff_max);
        let staff_per_stand = (staff_min..=staff_max).collect();

        SearchGrid {
            attendance,
            student_ratio,
            crowd_energy,
            stands_open_pct,
            staff_per_stand,
            express_lanes: [false, true],
        }
    }

    fn radices(&self) -> [u64; 6] {
        [
            self.attendance.len() as u64,
            self.student_ratio.len() as u64,
            self.crowd_energy.len() as u64,
            self.stands_open_pct.len() as u64,
            self.staff_per_stand.len() as u64,
            self.express_lanes.len() as u64,
        ]
    }

    /// Size of the Cartesian product, saturating at `u64::MAX`.
    pub fn combinations(&self) -> u64 {
        self.radices()
            .iter()
            .fold(1u64, |acc, r| acc.saturating_mul(*r))
    }

    /// The point at flat index `idx`, attendance varying slowest and express
    /// lanes fastest.
    fn point(&self, mut idx: u64) -> GridPoint {
        let r = self.radices();
        let mut digit = [0usize; 6];
        for axis in (0..6).rev() {
            digit[axis] = (idx % r[axis]) as usize;
            idx /= r[axis];
        }
        GridPoint {
            attendance: self.attendance[digit[0]],
            student_ratio: self.student_ratio[digit[1]],
            crowd_energy: self.crowd_energy[digit[2]],
            stands_open_pct: self.stands_open_pct[digit[3]],
            staff_per_stand: self.staff_per_stand[digit[4]],
            express_lanes: self.express_lanes[digit[5]],
        }
    }

    pub fn points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        (0..self.combinations()).map(move |i| self.point(i))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationCandidate {
    pub overrides: GridPoint,
    pub delta_win_probability: f64,
    pub ops_worst_utilization: f64,
    pub revenue_total_usd: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub baseline_win_probability: f64,
    pub evaluated: u64,
    /// Full override set that reproduces `recommended` on the game baseline.
    pub recommended_overrides: ScenarioOverrides,
    pub recommended: OptimizationCandidate,
    pub alternatives: Vec<OptimizationCandidate>,
}

/// Higher is better: win gain in points, minus an overload penalty, plus a
/// revenue tie-breaker and target rewards.
pub fn score_candidate(delta_win: f64, worst_util: f64, revenue: f64, target_pp: Option<f64>) -> f64 {
    let delta_pp = delta_win * 100.0;
    let mut score = delta_pp - OVERLOAD_PENALTY * (worst_util - OVERLOAD_THRESHOLD).max(0.0)
        + REVENUE_TIEBREAK * revenue;
    if let Some(target) = target_pp {
        score += TARGET_WEIGHT * delta_pp.min(target);
        if delta_pp >= target {
            score += TARGET_BONUS;
        }
    }
    score
}

pub fn evaluate_point(
    current: &Scenario,
    point: &GridPoint,
    baseline_p: f64,
    venue: &Venue,
    menu: &ConcessionsMenu,
    target_pp: Option<f64>,
) -> OptimizationCandidate {
    let s = point.apply_to(current);
    let p = predict_win_probability(&s).predicted_win_probability;
    let c = simulate_concessions(&s, venue, menu);
    let delta = p - baseline_p;
    OptimizationCandidate {
        overrides: *point,
        delta_win_probability: delta,
        ops_worst_utilization: c.ops.worst_utilization,
        revenue_total_usd: c.revenue_total_usd,
        score: score_candidate(
            delta,
            c.ops.worst_utilization,
            c.revenue_total_usd,
            target_pp,
        ),
    }
}

/// Insert into a descending top list, after any equal scores.
fn push_top(top: &mut Vec<OptimizationCandidate>, cand: OptimizationCandidate) {
    let pos = top.partition_point(|c| c.score >= cand.score);
    if pos < KEEP_TOP {
        top.insert(pos, cand);
        top.truncate(KEEP_TOP);
    }
}

/// Score every grid point around `baseline + req.current_overrides` and
/// return the best one plus up to five runners-up.
pub fn optimize(
    baseline: &Scenario,
    venue: &Venue,
    menu: &ConcessionsMenu,
    req: &OptimizeRequest,
) -> Result<OptimizationResult> {
    let current = baseline.with_overrides(&req.current_overrides);
    let grid = SearchGrid::build(&current, req);
    let combinations = grid.combinations();
    if combinations > req.max_evaluations {
        return Err(EngineError::SearchSpaceTooLarge {
            combinations,
            limit: req.max_evaluations,
        });
    }
    debug!(
        "Optimizer grid: {} attendance x {} student ratio x {} energy x {} stands x {} staff x 2 express",
        grid.attendance.len(),
        grid.student_ratio.len(),
        grid.crowd_energy.len(),
        grid.stands_open_pct.len(),
        grid.staff_per_stand.len()
    );

    let baseline_p = predict_win_probability(baseline).predicted_win_probability;
    let score = |point: &GridPoint| {
        evaluate_point(
            &current,
            point,
            baseline_p,
            venue,
            menu,
            req.target_delta_win_pp,
        )
    };
    // Index 0 always exists, so the top list is never empty.
    let mut top = Vec::with_capacity(KEEP_TOP + 1);
    top.push(score(&grid.point(0)));
    for point in grid.points().skip(1) {
        push_top(&mut top, score(&point));
    }

    let recommended = top.remove(0);
    info!(
        "Optimizer: {} candidates, best score {:.3} (delta {:+.2}pp, util {:.2})",
        combinations,
        recommended.score,
        recommended.delta_win_probability * 100.0,
        recommended.ops_worst_utilization
    );
    Ok(OptimizationResult {
        baseline_win_probability: baseline_p,
        evaluated: combinations,
        recommended_overrides: req
            .current_overrides
            .merged_with(&recommended.overrides.to_overrides()),
        recommended,
        alternatives: top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::tests::reference_scenario;
    use approx::assert_relative_eq;

    fn small_request() -> OptimizeRequest {
        OptimizeRequest {
            max_attendance_increase: 1_000,
            max_student_ratio_increase: 0.01,
            max_crowd_energy_increase: 10,
            max_staff_per_stand: 8,
            min_stands_open_pct: 90,
            ..OptimizeRequest::default()
        }
    }

    #[test]
    fn grid_axes_follow_bounds() {
        let g = SearchGrid::build(&reference_scenario(), &small_request());
        assert_eq!(g.attendance, vec![100_000, 100_500, 101_000]);
        assert_eq!(g.student_ratio, vec![0.2, 0.205, 0.21]);
        assert_eq!(g.crowd_energy, vec![75, 80, 85]);
        assert_eq!(g.stands_open_pct, vec![90, 95, 100]);
        assert_eq!(g.staff_per_stand, vec![6, 7, 8]);
        assert_eq!(g.combinations(), 3 * 3 * 3 * 3 * 3 * 2);
    }

    #[test]
    fn student_ratio_axis_respects_ceiling() {
        let mut s = reference_scenario();
        s.student_ratio = 0.29;
        let mut req = small_request();
        req.max_student_ratio_increase = 0.05;
        assert_eq!(SearchGrid::build(&s, &req).student_ratio, vec![0.29, 0.295, 0.3]);
        s.student_ratio = 0.35;
        assert_eq!(SearchGrid::build(&s, &req).student_ratio, vec![0.35]);
    }

    #[test]
    fn points_enumerate_every_combination_once() {
        let g = SearchGrid::build(&reference_scenario(), &small_request());
        let pts: Vec<GridPoint> = g.points().collect();
        assert_eq!(pts.len() as u64, g.combinations());
        for (i, a) in pts.iter().enumerate() {
            assert!(pts[i + 1..].iter().all(|b| b != a));
        }
        assert_eq!(pts[0].attendance, 100_000);
        assert!(!pts[0].express_lanes);
        assert!(pts[1].express_lanes);
        assert_eq!(pts.last().map(|p| p.attendance), Some(101_000));
    }

    #[test]
    fn recommended_beats_every_grid_point() {
        let base = reference_scenario();
        let venue = Venue::default();
        let menu = ConcessionsMenu::default();
        let req = small_request();
        let r = optimize(&base, &venue, &menu, &req).unwrap();
        assert_eq!(r.alternatives.len(), 5);
        assert!(r
            .alternatives
            .iter()
            .all(|a| a.score <= r.recommended.score));
        assert!(r.alternatives.windows(2).all(|w| w[0].score >= w[1].score));

        let grid = SearchGrid::build(&base, &req);
        let base_p = predict_win_probability(&base).predicted_win_probability;
        for pt in grid.points() {
            let c = evaluate_point(&base, &pt, base_p, &venue, &menu, None);
            assert!(c.score <= r.recommended.score);
        }
    }

    #[test]
    fn target_rewards_reaching_goal() {
        let below = score_candidate(0.01, 0.5, 0.0, Some(2.0));
        let at = score_candidate(0.02, 0.5, 0.0, Some(2.0));
        assert!((below - (1.0 + 2.0)).abs() < 1e-9);
        assert!((at - (2.0 + 4.0 + 3.0)).abs() < 1e-9);
        let overloaded = score_candidate(0.02, 1.4, 0.0, None);
        assert!((overloaded - (2.0 - 3.0)).abs() < 1e-9);
    }

    #[test]
    fn starts_from_current_overrides() {
        let mut req = small_request();
        req.current_overrides.attendance = Some(90_000);
        let r = optimize(
            &reference_scenario(),
            &Venue::default(),
            &ConcessionsMenu::default(),
            &req,
        )
        .unwrap();
        assert!((90_000..=91_000).contains(&r.recommended.overrides.attendance));
        assert_eq!(
            r.recommended_overrides.attendance,
            Some(r.recommended.overrides.attendance)
        );
        let base_p = predict_win_probability(&reference_scenario()).predicted_win_probability;
        assert_eq!(r.baseline_win_probability, base_p);
    }

    #[test]
    fn recommended_point_replays_as_overrides() {
        let base = reference_scenario();
        let venue = Venue::default();
        let menu = ConcessionsMenu::default();
        let r = optimize(&base, &venue, &menu, &small_request()).unwrap();
        let replay = base.with_overrides(&r.recommended_overrides);
        assert_eq!(replay, r.recommended.overrides.apply_to(&base));
        let p = predict_win_probability(&replay).predicted_win_probability;
        let base_p = predict_win_probability(&base).predicted_win_probability;
        assert_relative_eq!(p - base_p, r.recommended.delta_win_probability, epsilon = 1e-12);
    }

    #[test]
    fn oversized_grid_rejected_before_evaluation() {
        let req = OptimizeRequest {
            max_attendance_increase: 100_000,
            max_evaluations: 1_000,
            ..OptimizeRequest::default()
        };
        let err = optimize(
            &reference_scenario(),
            &Venue::default(),
            &ConcessionsMenu::default(),
            &req,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::SearchSpaceTooLarge { limit: 1_000, .. }));
    }

    #[test]
    fn top_list_is_stable_for_ties() {
        let mk = |att: u32, score: f64| OptimizationCandidate {
            overrides: GridPoint {
                attendance: att,
                student_ratio: 0.2,
                crowd_energy: 75,
                stands_open_pct: 85,
                staff_per_stand: 6,
                express_lanes: false,
            },
            delta_win_probability: 0.0,
            ops_worst_utilization: 0.0,
            revenue_total_usd: 0.0,
            score,
        };
        let mut top = Vec::new();
        for (i, s) in [1.0, 3.0, 3.0, 2.0, 0.5, 0.1, 4.0, 0.0].iter().enumerate() {
            push_top(&mut top, mk(i as u32, *s));
        }
        let order: Vec<u32> = top.iter().map(|c| c.overrides.attendance).collect();
        assert_eq!(order, vec![6, 1, 2, 3, 0, 4]);
    }
}
