//! Scenario inputs shared by every model.
//!
//! A [`Scenario`] is the fully-resolved, normalised input set for one
//! evaluation. It is built from a game's baseline (plus venue defaults) and an
//! optional set of [`ScenarioOverrides`]. Every numeric lever is clamped into
//! its valid domain here so the models never see out-of-range values.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::catalog::models::{Game, Venue};

/// Rank used for unranked teams.
pub const UNRANKED: u8 = 25;

/// Kickoff hour (local, 24h) from which a game counts as a night game.
const NIGHT_KICKOFF_HOUR: u32 = 18;

/// Game-day promotion run by the athletics department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionType {
    #[default]
    None,
    StudentPush,
    AlumniNight,
    FamilyBundle,
    RivalryHype,
}

impl PromotionType {
    pub const ALL: [PromotionType; 5] = [
        PromotionType::None,
        PromotionType::StudentPush,
        PromotionType::AlumniNight,
        PromotionType::FamilyBundle,
        PromotionType::RivalryHype,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionType::None => "none",
            PromotionType::StudentPush => "student_push",
            PromotionType::AlumniNight => "alumni_night",
            PromotionType::FamilyBundle => "family_bundle",
            PromotionType::RivalryHype => "rivalry_hype",
        }
    }
}

/// True when the kickoff is at or after 18:00 local.
///
/// Accepts `HH:MM` or `HH:MM:SS`. Anything unparseable counts as a day game.
pub fn is_night_kickoff(kickoff_time_local: &str) -> bool {
    let s = kickoff_time_local.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map(|t| t.hour() >= NIGHT_KICKOFF_HOUR)
        .unwrap_or(false)
}

/// Fully-resolved inputs for one evaluation of the models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub attendance: u32,
    /// Physical seating capacity (always ≥ 1).
    pub venue_capacity: u32,
    /// Share of seats sold/open, 1–100. Shrinks the capacity the win model
    /// measures fill against.
    pub seats_open_pct: u8,
    /// Student share of attendance, 0.0–1.0.
    pub student_ratio: f64,
    pub rivalry_flag: bool,
    /// 1 = best, 25 = unranked.
    pub opponent_rank: u8,
    pub home_team_rank: u8,
    pub weather_wind_mph: u32,
    pub weather_temp_f: i32,
    /// "HH:MM" (24h)
    pub kickoff_time_local: String,
    pub promotion_type: PromotionType,
    /// 0–100
    pub crowd_energy: u8,
    pub is_indoor: bool,
    /// 10–100
    pub stands_open_pct: u8,
    /// 1–20
    pub staff_per_stand: u8,
    pub express_lanes: bool,
    pub early_arrival_promo: bool,
}

impl Scenario {
    /// Baseline scenario for a game played at `venue`.
    pub fn baseline(game: &Game, venue: &Venue) -> Self {
        Scenario {
            attendance: game.baseline_attendance,
            venue_capacity: venue.capacity.max(1),
            seats_open_pct: 100,
            student_ratio: game.baseline_student_ratio.clamp(0.0, 1.0),
            rivalry_flag: game.rivalry_flag,
            opponent_rank: clamp_rank(game.opponent_rank),
            home_team_rank: clamp_rank(game.home_team_rank),
            weather_wind_mph: game.baseline_weather_wind_mph,
            weather_temp_f: game.baseline_weather_temp_f,
            kickoff_time_local: game.kickoff_time_local.clone(),
            promotion_type: game.baseline_promotion_type,
            crowd_energy: venue.crowd.default_crowd_energy.min(100),
            is_indoor: venue.is_indoor,
            stands_open_pct: venue.concessions.default_stands_open_pct.clamp(10, 100),
            staff_per_stand: venue.concessions.default_staff_per_stand.clamp(1, 20),
            express_lanes: false,
            early_arrival_promo: false,
        }
    }

    /// Return a copy with `overrides` merged on top.
    pub fn with_overrides(&self, overrides: &ScenarioOverrides) -> Self {
        let mut s = self.clone();
        overrides.apply_to(&mut s);
        s
    }

    /// Occupancy denominator for the win-probability model.
    pub fn effective_capacity(&self) -> u32 {
        let pct = u64::from(self.seats_open_pct.clamp(1, 100));
        let cap = u64::from(self.venue_capacity.max(1)) * pct / 100;
        (cap as u32).max(1)
    }

    pub fn is_night(&self) -> bool {
        is_night_kickoff(&self.kickoff_time_local)
    }
}

fn clamp_rank(rank: Option<u8>) -> u8 {
    rank.unwrap_or(UNRANKED).clamp(1, UNRANKED)
}

/// Caller-supplied changes to a baseline scenario. `None` keeps the baseline.
///
/// Values are clamped into range when applied rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOverrides {
    pub attendance: Option<u32>,
    pub venue_capacity: Option<u32>,
    pub seats_open_pct: Option<u8>,
    pub student_ratio: Option<f64>,
    pub rivalry_flag: Option<bool>,
    pub opponent_rank: Option<u8>,
    pub home_team_rank: Option<u8>,
    pub weather_wind_mph: Option<u32>,
    pub weather_temp_f: Option<i32>,
    pub kickoff_time_local: Option<String>,
    pub promotion_type: Option<PromotionType>,
    pub crowd_energy: Option<u8>,
    pub stands_open_pct: Option<u8>,
    pub staff_per_stand: Option<u8>,
    pub express_lanes: Option<bool>,
    pub early_arrival_promo: Option<bool>,
}

impl ScenarioOverrides {
    pub fn is_empty(&self) -> bool {
        *self == ScenarioOverrides::default()
    }

    /// Merge `other` over `self`; fields set in `other` win.
    pub fn merged_with(&self, other: &ScenarioOverrides) -> ScenarioOverrides {
        ScenarioOverrides {
            attendance: other.attendance.or(self.attendance),
            venue_capacity: other.venue_capacity.or(self.venue_capacity),
            seats_open_pct: other.seats_open_pct.or(self.seats_open_pct),
            student_ratio: other.student_ratio.or(self.student_ratio),
            rivalry_flag: other.rivalry_flag.or(self.rivalry_flag),
            opponent_rank: other.opponent_rank.or(self.opponent_rank),
            home_team_rank: other.home_team_rank.or(self.home_team_rank),
            weather_wind_mph: other.weather_wind_mph.or(self.weather_wind_mph),
            weather_temp_f: other.weather_temp_f.or(self.weather_temp_f),
            kickoff_time_local: other
                .kickoff_time_local
                .clone()
                .or_else(|| self.kickoff_time_local.clone()),
            promotion_type: other.promotion_type.or(self.promotion_type),
            crowd_energy: other.crowd_energy.or(self.crowd_energy),
            stands_open_pct: other.stands_open_pct.or(self.stands_open_pct),
            staff_per_stand: other.staff_per_stand.or(self.staff_per_stand),
            express_lanes: other.express_lanes.or(self.express_lanes),
            early_arrival_promo: other.early_arrival_promo.or(self.early_arrival_promo),
        }
    }

    fn apply_to(&self, s: &mut Scenario) {
        if let Some(v) = self.attendance {
            s.attendance = v;
        }
        if let Some(v) = self.venue_capacity {
            s.venue_capacity = v.max(1);
        }
        if let Some(v) = self.seats_open_pct {
            s.seats_open_pct = v.clamp(1, 100);
        }
        if let Some(v) = self.student_ratio {
            s.student_ratio = if v.is_finite() { v.clamp(0.0, 1.0) } else { s.student_ratio };
        }
        if let Some(v) = self.rivalry_flag {
            s.rivalry_flag = v;
        }
        if let Some(v) = self.opponent_rank {
            s.opponent_rank = v.clamp(1, UNRANKED);
        }
        if let Some(v) = self.home_team_rank {
            s.home_team_rank = v.clamp(1, UNRANKED);
        }
        if let Some(v) = self.weather_wind_mph {
            s.weather_wind_mph = v;
        }
        if let Some(v) = self.weather_temp_f {
            s.weather_temp_f = v;
        }
        if let Some(v) = &self.kickoff_time_local {
            s.kickoff_time_local = v.clone();
        }
        if let Some(v) = self.promotion_type {
            s.promotion_type = v;
        }
        if let Some(v) = self.crowd_energy {
            s.crowd_energy = v.min(100);
        }
        if let Some(v) = self.stands_open_pct {
            s.stands_open_pct = v.clamp(10, 100);
        }
        if let Some(v) = self.staff_per_stand {
            s.staff_per_stand = v.clamp(1, 20);
        }
        if let Some(v) = self.express_lanes {
            s.express_lanes = v;
        }
        if let Some(v) = self.early_arrival_promo {
            s.early_arrival_promo = v;
        }
    }
}
