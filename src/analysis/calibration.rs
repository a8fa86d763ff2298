//! Internal-consistency calibration of the win model.
//!
//! Synthetic games are drawn from plausible ranges, the model predicts each,
//! and an outcome is drawn from that same prediction. A well-formed model
//! should then sit on the diagonal of its own reliability diagram.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::models::Venue;
use crate::error::{EngineError, Result};
use crate::model::{predict_win_probability, MODEL_VERSION};
use crate::scenario::{PromotionType, Scenario, UNRANKED};

pub const DEFAULT_POINTS: usize = 240;
pub const DEFAULT_BINS: usize = 10;
pub const DEFAULT_SEED: u64 = 42;
pub const MIN_BINS: usize = 5;
pub const MAX_BINS: usize = 20;
pub const MAX_POINTS: usize = 100_000;

const KICKOFFS: [&str; 3] = ["12:00", "15:30", "19:30"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub n: usize,
    pub bins: usize,
    pub seed: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        CalibrationConfig {
            n: DEFAULT_POINTS,
            bins: DEFAULT_BINS,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationPoint {
    pub p: f64,
    /// 1 = home win.
    pub y: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationBucket {
    pub bin_lo: f64,
    pub bin_hi: f64,
    pub count: usize,
    /// Bucket midpoint when empty.
    pub avg_pred: f64,
    pub avg_obs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub model: String,
    pub n: usize,
    pub bins: usize,
    pub seed: u64,
    pub brier: f64,
    /// Reliability plus within-bucket uncertainty, from the buckets alone.
    pub brier_from_buckets: f64,
    pub buckets: Vec<CalibrationBucket>,
}

/// One synthetic home game at `venue`, loosely modelled on big-stadium
/// college football.
fn synthetic_scenario<R: Rng>(rng: &mut R, venue: &Venue) -> Scenario {
    let cap = venue.capacity.max(1);
    let lo = (f64::from(cap) * 0.86) as u32;
    let hi = ((f64::from(cap) * 1.02) as u32).max(lo + 1);
    let slots = (hi - lo).div_ceil(250);
    let attendance = lo + 250 * rng.gen_range(0..slots);

    let student_ratio = rng.gen_range(0.14..0.26);
    let rivalry_flag = rng.gen_bool(0.18);
    let ranked_opponent = rng.gen_range(1..=15);
    let opponent_rank = *[ranked_opponent, UNRANKED, UNRANKED, UNRANKED]
        .choose(rng)
        .unwrap_or(&UNRANKED);
    let home_options = [rng.gen_range(1..=6), rng.gen_range(1..=10)];
    let home_team_rank = *home_options.choose(rng).unwrap_or(&UNRANKED);
    let weather_wind_mph = rng.gen_range(2..=22);
    let kickoff = KICKOFFS.choose(rng).copied().unwrap_or(KICKOFFS[0]);
    let promotion_type = PromotionType::ALL
        .choose(rng)
        .copied()
        .unwrap_or_default();
    let crowd_energy = rng.gen_range(40..=100);

    Scenario {
        attendance,
        venue_capacity: cap,
        seats_open_pct: 100,
        student_ratio,
        rivalry_flag,
        opponent_rank,
        home_team_rank,
        weather_wind_mph,
        weather_temp_f: 60,
        kickoff_time_local: kickoff.to_string(),
        promotion_type,
        crowd_energy,
        is_indoor: venue.is_indoor,
        stands_open_pct: venue.concessions.default_stands_open_pct,
        staff_per_stand: venue.concessions.default_staff_per_stand,
        express_lanes: false,
        early_arrival_promo: false,
    }
}

/// Predict each synthetic game and draw its outcome from the prediction.
pub fn synthetic_points<R: Rng>(rng: &mut R, venue: &Venue, n: usize) -> Vec<CalibrationPoint> {
    (0..n)
        .map(|_| {
            let s = synthetic_scenario(rng, venue);
            let p = predict_win_probability(&s).predicted_win_probability;
            let y = u8::from(rng.gen_bool(p.clamp(0.0, 1.0)));
            CalibrationPoint { p, y }
        })
        .collect()
}

/// Equal-width buckets over [0, 1]; `[lo, hi)` except the last, which
/// includes 1.0. `bins` is clamped to 5..=20.
pub fn reliability_buckets(points: &[CalibrationPoint], bins: usize) -> Vec<CalibrationBucket> {
    let bins = bins.clamp(MIN_BINS, MAX_BINS);
    (0..bins)
        .map(|i| {
            let lo = i as f64 / bins as f64;
            let hi = (i + 1) as f64 / bins as f64;
            let last = i == bins - 1;
            let members: Vec<&CalibrationPoint> = points
                .iter()
                .filter(|pt| pt.p >= lo && (pt.p < hi || (last && pt.p <= hi)))
                .collect();
            if members.is_empty() {
                return CalibrationBucket {
                    bin_lo: lo,
                    bin_hi: hi,
                    count: 0,
                    avg_pred: (lo + hi) / 2.0,
                    avg_obs: None,
                };
            }
            let n = members.len() as f64;
            CalibrationBucket {
                bin_lo: lo,
                bin_hi: hi,
                count: members.len(),
                avg_pred: members.iter().map(|pt| pt.p).sum::<f64>() / n,
                avg_obs: Some(members.iter().map(|pt| f64::from(pt.y)).sum::<f64>() / n),
            }
        })
        .collect()
}

pub fn brier_score(points: &[CalibrationPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points
        .iter()
        .map(|pt| (pt.p - f64::from(pt.y)).powi(2))
        .sum::<f64>()
        / points.len() as f64
}

/// Count-weighted `(p̄ − ȳ)² + ȳ(1 − ȳ)` over buckets. Equals the Brier
/// score up to within-bucket spread of the predictions.
pub fn brier_from_buckets(buckets: &[CalibrationBucket]) -> f64 {
    let mut total = 0usize;
    let mut acc = 0.0;
    for b in buckets {
        if let Some(obs) = b.avg_obs {
            acc += b.count as f64 * ((b.avg_pred - obs).powi(2) + obs * (1.0 - obs));
            total += b.count;
        }
    }
    if total == 0 {
        0.0
    } else {
        acc / total as f64
    }
}

pub fn run_calibration(venue: &Venue, config: &CalibrationConfig) -> Result<CalibrationReport> {
    if config.n == 0 || config.n > MAX_POINTS {
        return Err(EngineError::InvalidSampleCount {
            requested: config.n,
            limit: MAX_POINTS,
        });
    }
    let mut rng = StdRng::seed_from_u64(config.seed);
    let points = synthetic_points(&mut rng, venue, config.n);
    let buckets = reliability_buckets(&points, config.bins);
    let brier = brier_score(&points);
    let report = CalibrationReport {
        model: format!("win_probability_{MODEL_VERSION}"),
        n: points.len(),
        bins: buckets.len(),
        seed: config.seed,
        brier,
        brier_from_buckets: brier_from_buckets(&buckets),
        buckets,
    };
    info!(
        "Calibration: n={} bins={} seed={} brier={:.4}",
        report.n, report.bins, report.seed, report.brier
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pt(p: f64, y: u8) -> CalibrationPoint {
        CalibrationPoint { p, y }
    }

    #[test]
    fn default_report_is_reproducible() {
        let venue = Venue::default();
        let a = run_calibration(&venue, &CalibrationConfig::default()).unwrap();
        let b = run_calibration(&venue, &CalibrationConfig::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.model, "win_probability_v2");
        assert_eq!(a.n, 240);
        assert_eq!(a.bins, 10);
        assert_eq!(a.buckets.iter().map(|b| b.count).sum::<usize>(), 240);
        assert!((0.0..=1.0).contains(&a.brier));
    }

    #[test]
    fn bucket_decomposition_tracks_brier() {
        let venue = Venue::default();
        for seed in [1, 42, 2024] {
            let cfg = CalibrationConfig {
                seed,
                ..CalibrationConfig::default()
            };
            let r = run_calibration(&venue, &cfg).unwrap();
            assert!(
                (r.brier - r.brier_from_buckets).abs() < 0.01,
                "seed {}: brier {:.4} vs buckets {:.4}",
                seed,
                r.brier,
                r.brier_from_buckets
            );
        }
    }

    #[test]
    fn decomposition_exact_when_predictions_share_a_bucket_value() {
        // Identical p within each bucket leaves no within-bucket spread.
        let points = [pt(0.15, 0), pt(0.15, 1), pt(0.15, 0), pt(0.85, 1), pt(0.85, 1)];
        let buckets = reliability_buckets(&points, 10);
        assert_relative_eq!(
            brier_from_buckets(&buckets),
            brier_score(&points),
            epsilon = 1e-12
        );
    }

    #[test]
    fn empty_buckets_report_midpoint_and_no_observation() {
        let buckets = reliability_buckets(&[pt(0.55, 1)], 10);
        let empty = &buckets[0];
        assert_eq!(empty.count, 0);
        assert_relative_eq!(empty.avg_pred, 0.05, epsilon = 1e-12);
        assert_eq!(empty.avg_obs, None);
        assert_eq!(buckets[5].count, 1);
        assert_eq!(buckets[5].avg_obs, Some(1.0));
    }

    #[test]
    fn last_bucket_includes_one() {
        let buckets = reliability_buckets(&[pt(1.0, 1), pt(0.0, 0)], 5);
        assert_eq!(buckets[4].count, 1);
        assert_eq!(buckets[0].count, 1);
    }

    #[test]
    fn bins_are_clamped() {
        assert_eq!(reliability_buckets(&[], 2).len(), MIN_BINS);
        assert_eq!(reliability_buckets(&[], 50).len(), MAX_BINS);
    }

    #[test]
    fn sample_count_outside_budget_rejected() {
        for n in [0, MAX_POINTS + 1, usize::MAX] {
            let cfg = CalibrationConfig {
                n,
                ..CalibrationConfig::default()
            };
            assert_eq!(
                run_calibration(&Venue::default(), &cfg).unwrap_err(),
                EngineError::InvalidSampleCount {
                    requested: n,
                    limit: MAX_POINTS
                }
            );
        }
    }

    #[test]
    fn synthetic_scenarios_stay_in_ranges() {
        let venue = Venue::default();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..500 {
            let s = synthetic_scenario(&mut rng, &venue);
            assert!(s.attendance >= 88_390 && s.attendance < 104_835);
            assert_eq!((s.attendance - 88_390) % 250, 0);
            assert!((0.14..0.26).contains(&s.student_ratio));
            assert!(s.opponent_rank <= 15 || s.opponent_rank == UNRANKED);
            assert!((1..=10).contains(&s.home_team_rank));
            assert!((2..=22).contains(&s.weather_wind_mph));
            assert!((40..=100).contains(&s.crowd_energy));
        }
    }
}
