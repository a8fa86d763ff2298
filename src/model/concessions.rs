//! Concessions revenue, margin, and stand queueing.
//!
//! Revenue is attendance split into student and non-student segments times
//! per-capita spend, scaled by a composite of sport, weather, night, and
//! promotion factors. Queueing treats each open stand as one server of an
//! M/M/s queue across three fixed arrival windows; long waits feed back into
//! revenue through an abandonment loss.

use serde::Serialize;

use super::queue::{erlang_c, QueueMetrics};
use super::{CI_LEVEL, MODEL_VERSION, Z_90};
use crate::catalog::models::{ConcessionsMenu, MenuAdjustments, Venue};
use crate::scenario::{PromotionType, Scenario};

/// Utilisation the staffing recommendation keeps each window under.
pub const TARGET_UTILIZATION: f64 = 0.90;
pub const MAX_STAFF_PER_STAND: u8 = 20;

/// Wait past which customers start abandoning lines.
const ABANDON_THRESHOLD_MIN: f64 = 12.0;
const ABANDON_LOSS_PER_MIN: f64 = 0.015;
const ABANDON_LOSS_CAP: f64 = 0.25;

const SD_REVENUE_BASE: f64 = 0.06;
const SD_REVENUE_MIN: f64 = 0.05;
const SD_REVENUE_MAX: f64 = 0.14;
/// Student share the revenue uncertainty is centred on.
const SD_STUDENT_CENTER: f64 = 0.18;

// ── Arrival windows ─────────────────────────────────────────────────────────

/// A slice of the game during which a share of the crowd visits stands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArrivalWindow {
    pub window: &'static str,
    pub minutes: f64,
    /// Share of attendance that buys during the window.
    pub demand_pct: f64,
}

/// NASC 2023 venue benchmarks. Early-arrival promotions pull two more points
/// of the crowd into the pre-kick window.
pub fn arrival_windows(early_arrival_promo: bool) -> [ArrivalWindow; 3] {
    let pre_kick = if early_arrival_promo { 0.14 } else { 0.12 };
    [
        ArrivalWindow {
            window: "pre_kick",
            minutes: 60.0,
            demand_pct: pre_kick,
        },
        ArrivalWindow {
            window: "halftime",
            minutes: 20.0,
            demand_pct: 0.22,
        },
        ArrivalWindow {
            window: "q4",
            minutes: 15.0,
            demand_pct: 0.06,
        },
    ]
}

/// Expected line wait, bucketed by utilisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitBand {
    /// 3–8 minutes
    Short,
    /// 8–15 minutes
    Moderate,
    /// 15–28 minutes
    Long,
    /// 28–45 minutes
    Severe,
}

impl WaitBand {
    pub fn from_utilization(util: f64) -> Self {
        if util <= 0.75 {
            WaitBand::Short
        } else if util <= 0.90 {
            WaitBand::Moderate
        } else if util <= 1.05 {
            WaitBand::Long
        } else {
            WaitBand::Severe
        }
    }

    pub fn minutes(&self) -> [u32; 2] {
        match self {
            WaitBand::Short => [3, 8],
            WaitBand::Moderate => [8, 15],
            WaitBand::Long => [15, 28],
            WaitBand::Severe => [28, 45],
        }
    }

    pub fn midpoint(&self) -> f64 {
        let [lo, hi] = self.minutes();
        f64::from(lo + hi) / 2.0
    }

    /// Share of a window's revenue lost to customers leaving the line.
    pub fn abandonment_fraction(&self) -> f64 {
        let mid = self.midpoint();
        if mid > ABANDON_THRESHOLD_MIN {
            ((mid - ABANDON_THRESHOLD_MIN) * ABANDON_LOSS_PER_MIN).min(ABANDON_LOSS_CAP)
        } else {
            0.0
        }
    }
}

// ── Results ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueWindowResult {
    pub window: &'static str,
    pub arrivals_per_min: f64,
    pub capacity_per_min: f64,
    pub utilization: f64,
    pub wait_band: WaitBand,
    pub wait_minutes_band: [u32; 2],
    pub queue: QueueMetrics,
    pub abandonment_loss_usd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StaffingTarget {
    pub window: &'static str,
    pub recommended_staff_per_stand: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcessionsOps {
    pub stands_total: u32,
    pub stands_open: u32,
    pub stands_open_pct: u8,
    pub staff_per_stand: u8,
    pub capacity_per_min: f64,
    pub wait_time_windows: Vec<QueueWindowResult>,
    pub worst_utilization: f64,
    pub worst_p_wait_gt_15: f64,
    /// Halftime staffing, the binding window.
    pub recommended_staff_per_stand: u8,
    pub staffing_plan: Vec<StaffingTarget>,
    pub arrival_windows: [ArrivalWindow; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueUncertainty {
    pub ci_level: f64,
    pub sd_revenue_pct: f64,
    pub cold_weather: bool,
    pub night_game: bool,
    pub queue_abandonment_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcessionsResult {
    /// Gross revenue less abandonment loss.
    pub revenue_total_usd: f64,
    pub revenue_total_usd_ci_low: f64,
    pub revenue_total_usd_ci_high: f64,
    pub revenue_gross_usd: f64,
    pub revenue_abandonment_loss_usd: f64,
    pub revenue_students_usd: f64,
    pub revenue_nonstudents_usd: f64,
    pub gross_margin_usd: f64,
    pub per_cap_spend_usd: f64,
    pub ops: ConcessionsOps,
    pub uncertainty: RevenueUncertainty,
    pub model_version: &'static str,
}

impl ConcessionsResult {
    pub fn window(&self, name: &str) -> Option<&QueueWindowResult> {
        self.ops.wait_time_windows.iter().find(|w| w.window == name)
    }
}

// ── Spend ───────────────────────────────────────────────────────────────────

fn promotion_spend_factor(promo: PromotionType, adj: &MenuAdjustments) -> f64 {
    match promo {
        PromotionType::None => 1.0,
        PromotionType::StudentPush => 1.0 - adj.student_push_spend_drop_pct / 100.0,
        PromotionType::FamilyBundle => 1.0 - adj.family_bundle_spend_drop_pct / 100.0,
        PromotionType::AlumniNight => 1.0 + adj.alumni_night_spend_boost_pct / 100.0,
        PromotionType::RivalryHype => 1.0 + adj.rivalry_hype_spend_boost_pct / 100.0,
    }
}

/// Outdoor temperature tiers: colder crowds buy more hot food and drink, hot
/// crowds buy more beverages.
fn weather_spend_factor(temp_f: i32, is_indoor: bool, adj: &MenuAdjustments) -> f64 {
    if is_indoor {
        return 1.0;
    }
    let cold = adj.cold_weather_spend_boost_pct / 100.0;
    match temp_f {
        t if t <= 35 => 1.0 + cold * 1.3,
        t if t <= 45 => 1.0 + cold,
        t if t <= 55 => 1.0 + cold * 0.4,
        t if t >= 90 => 1.05,
        _ => 1.0,
    }
}

fn spend_multiplier(scenario: &Scenario, sport: &str, menu: &ConcessionsMenu) -> f64 {
    let adj = &menu.adjustments;
    let night = if scenario.is_night() {
        1.0 + adj.night_game_spend_boost_pct / 100.0
    } else {
        1.0
    };
    menu.sport_multiplier(sport)
        * weather_spend_factor(scenario.weather_temp_f, scenario.is_indoor, adj)
        * night
        * promotion_spend_factor(scenario.promotion_type, adj)
}

fn revenue_sd_pct(scenario: &Scenario, student_ratio: f64) -> f64 {
    let mut sd = SD_REVENUE_BASE + 0.04 * (student_ratio - SD_STUDENT_CENTER).abs();
    if !scenario.is_indoor && scenario.weather_temp_f <= 45 {
        sd += 0.02;
    }
    if scenario.is_night() {
        sd += 0.01;
    }
    sd.clamp(SD_REVENUE_MIN, SD_REVENUE_MAX)
}

// ── Staffing ────────────────────────────────────────────────────────────────

/// Smallest staff per stand keeping `arrivals_per_min` under the target
/// utilisation, in `[1, 20]`.
fn staff_needed(arrivals_per_min: f64, stands_open: u32, service_rate: f64, boost: f64) -> u8 {
    let per_staff = service_rate.max(1e-6) * (TARGET_UTILIZATION * (1.0 + boost)).max(1e-6);
    let needed = (arrivals_per_min / f64::from(stands_open.max(1)) / per_staff).ceil();
    needed.clamp(1.0, f64::from(MAX_STAFF_PER_STAND)) as u8
}

// ── Model ───────────────────────────────────────────────────────────────────

pub fn simulate_concessions(
    scenario: &Scenario,
    venue: &Venue,
    menu: &ConcessionsMenu,
) -> ConcessionsResult {
    let attendance = f64::from(scenario.attendance);
    let student_ratio = scenario.student_ratio.clamp(0.0, 1.0);
    let student_count = (attendance * student_ratio).round().min(attendance);
    let nonstudent_count = attendance - student_count;

    let mult = spend_multiplier(scenario, &venue.sport, menu);
    let seg = &menu.segments;
    let revenue_students = student_count * seg.student.per_cap_spend_usd * mult;
    let revenue_non = nonstudent_count * seg.nonstudent.per_cap_spend_usd * mult;
    let gross = revenue_students + revenue_non;
    let margin_student = seg.student.gross_margin_pct / 100.0;
    let margin_non = seg.nonstudent.gross_margin_pct / 100.0;
    let margin = revenue_students * margin_student + revenue_non * margin_non;

    // Stand capacity
    let conc = &venue.concessions;
    let stands_pct = f64::from(scenario.stands_open_pct.clamp(10, 100));
    let stands_open = ((f64::from(conc.stands_total) * stands_pct / 100.0).round() as u32).max(1);
    let staff = scenario.staff_per_stand.clamp(1, MAX_STAFF_PER_STAND);
    let service_rate = conc.service_rate_customers_per_staff_per_min.max(1e-6);
    let boost = if scenario.express_lanes {
        conc.express_lane_service_boost_pct / 100.0
    } else {
        0.0
    };
    let mu_per_stand = f64::from(staff) * service_rate * (1.0 + boost);
    let capacity_per_min = f64::from(stands_open) * mu_per_stand;

    let windows = arrival_windows(scenario.early_arrival_promo);
    let mut results = Vec::with_capacity(windows.len());
    let mut staffing_plan = Vec::with_capacity(windows.len());
    let mut worst_util = 0.0_f64;
    let mut worst_p_gt_15 = 0.0_f64;
    let mut total_loss = 0.0;

    for w in &windows {
        let arrivals_per_min = attendance * w.demand_pct / w.minutes;
        let utilization = arrivals_per_min / capacity_per_min.max(1e-6);
        let queue = erlang_c(arrivals_per_min, stands_open, mu_per_stand);
        let band = WaitBand::from_utilization(utilization);
        let loss = gross * w.demand_pct * band.abandonment_fraction();

        worst_util = worst_util.max(utilization);
        worst_p_gt_15 = worst_p_gt_15.max(queue.p_wait_gt_15);
        total_loss += loss;

        staffing_plan.push(StaffingTarget {
            window: w.window,
            recommended_staff_per_stand: staff_needed(
                arrivals_per_min,
                stands_open,
                service_rate,
                boost,
            ),
        });
        results.push(QueueWindowResult {
            window: w.window,
            arrivals_per_min,
            capacity_per_min,
            utilization,
            wait_band: band,
            wait_minutes_band: band.minutes(),
            queue,
            abandonment_loss_usd: loss,
        });
    }

    let recommended = staffing_plan
        .iter()
        .find(|t| t.window == "halftime")
        .map(|t| t.recommended_staff_per_stand)
        .unwrap_or(1);

    let revenue_total = gross - total_loss;
    let sd_pct = revenue_sd_pct(scenario, student_ratio);

    ConcessionsResult {
        revenue_total_usd: revenue_total,
        revenue_total_usd_ci_low: gross * (1.0 - Z_90 * sd_pct) - total_loss,
        revenue_total_usd_ci_high: gross * (1.0 + Z_90 * sd_pct),
        revenue_gross_usd: gross,
        revenue_abandonment_loss_usd: total_loss,
        revenue_students_usd: revenue_students,
        revenue_nonstudents_usd: revenue_non,
        gross_margin_usd: margin - total_loss * margin_non,
        per_cap_spend_usd: if scenario.attendance > 0 {
            revenue_total / attendance
        } else {
            0.0
        },
        ops: ConcessionsOps {
            stands_total: conc.stands_total,
            stands_open,
            stands_open_pct: scenario.stands_open_pct.clamp(10, 100),
            staff_per_stand: staff,
            capacity_per_min,
            wait_time_windows: results,
            worst_utilization: worst_util,
            worst_p_wait_gt_15: worst_p_gt_15,
            recommended_staff_per_stand: recommended,
            staffing_plan,
            arrival_windows: windows,
        },
        uncertainty: RevenueUncertainty {
            ci_level: CI_LEVEL,
            sd_revenue_pct: sd_pct,
            cold_weather: !scenario.is_indoor && scenario.weather_temp_f <= 45,
            night_game: scenario.is_night(),
            queue_abandonment_active: total_loss > 0.0,
        },
        model_version: MODEL_VERSION,
    }
}
