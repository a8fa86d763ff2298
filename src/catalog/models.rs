use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scenario::PromotionType;

fn default_sport() -> String {
    "football".to_string()
}

/// A scheduled home game with its baseline crowd and weather assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub game_id: String,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    #[serde(default = "default_sport")]
    pub sport: String,
    pub venue_name: String,
    /// Catalog venue id; `None` means the default venue.
    #[serde(default)]
    pub venue_id: Option<String>,
    pub venue_capacity: u32,
    /// "HH:MM" (24h) local time
    pub kickoff_time_local: String,
    #[serde(default)]
    pub rivalry_flag: bool,
    /// 1–25; `None` = unranked
    #[serde(default)]
    pub opponent_rank: Option<u8>,
    #[serde(default)]
    pub home_team_rank: Option<u8>,
    pub baseline_attendance: u32,
    pub baseline_student_ratio: f64,
    pub baseline_weather_temp_f: i32,
    pub baseline_weather_wind_mph: u32,
    /// 0–100, informational only
    #[serde(default)]
    pub baseline_weather_precip_chance: u8,
    #[serde(default)]
    pub baseline_promotion_type: PromotionType,
}

/// Stadium record: capacity, roof, and operating defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub is_indoor: bool,
    /// Key into [`ConcessionsMenu::sport_multipliers`].
    #[serde(default = "default_sport")]
    pub sport: String,
    #[serde(default)]
    pub concessions: ConcessionsDefaults,
    #[serde(default)]
    pub crowd: CrowdDefaults,
}

impl Default for Venue {
    fn default() -> Self {
        Venue {
            name: "Ohio Stadium".to_string(),
            capacity: 102_780,
            is_indoor: false,
            sport: default_sport(),
            concessions: ConcessionsDefaults::default(),
            crowd: CrowdDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcessionsDefaults {
    /// Points of sale in the building.
    pub stands_total: u32,
    /// NASC benchmark throughput of one staffer.
    pub service_rate_customers_per_staff_per_min: f64,
    /// Throughput gain when express lanes are open.
    pub express_lane_service_boost_pct: f64,
    pub default_stands_open_pct: u8,
    pub default_staff_per_stand: u8,
}

impl Default for ConcessionsDefaults {
    fn default() -> Self {
        ConcessionsDefaults {
            stands_total: 360,
            service_rate_customers_per_staff_per_min: 0.55,
            express_lane_service_boost_pct: 20.0,
            default_stands_open_pct: 85,
            default_staff_per_stand: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrowdDefaults {
    pub default_crowd_energy: u8,
}

impl Default for CrowdDefaults {
    fn default() -> Self {
        CrowdDefaults {
            default_crowd_energy: 78,
        }
    }
}

/// Spend and margin for one fan segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentEconomics {
    pub per_cap_spend_usd: f64,
    pub gross_margin_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MenuSegments {
    pub student: SegmentEconomics,
    pub nonstudent: SegmentEconomics,
}

/// Percentage spend adjustments applied on top of per-capita spend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuAdjustments {
    pub cold_weather_spend_boost_pct: f64,
    pub night_game_spend_boost_pct: f64,
    pub student_push_spend_drop_pct: f64,
    pub family_bundle_spend_drop_pct: f64,
    pub alumni_night_spend_boost_pct: f64,
    pub rivalry_hype_spend_boost_pct: f64,
}

impl Default for MenuAdjustments {
    fn default() -> Self {
        MenuAdjustments {
            cold_weather_spend_boost_pct: 15.0,
            night_game_spend_boost_pct: 8.0,
            student_push_spend_drop_pct: 6.0,
            family_bundle_spend_drop_pct: 10.0,
            alumni_night_spend_boost_pct: 12.0,
            rivalry_hype_spend_boost_pct: 8.0,
        }
    }
}

/// Concessions price book: segment economics, adjustments, sport multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcessionsMenu {
    pub segments: MenuSegments,
    #[serde(default)]
    pub adjustments: MenuAdjustments,
    #[serde(default)]
    pub sport_multipliers: BTreeMap<String, f64>,
}

impl ConcessionsMenu {
    /// Multiplier for `sport`; 1.0 when the menu has no entry.
    pub fn sport_multiplier(&self, sport: &str) -> f64 {
        self.sport_multipliers.get(sport).copied().unwrap_or(1.0)
    }
}

impl Default for ConcessionsMenu {
    /// NASC/Technomic 2023 per-caps and Aramark segment margins.
    fn default() -> Self {
        let sport_multipliers = [
            ("football", 1.0),
            ("basketball", 0.62),
            ("hockey", 0.70),
            ("volleyball", 0.45),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        ConcessionsMenu {
            segments: MenuSegments {
                student: SegmentEconomics {
                    per_cap_spend_usd: 7.50,
                    gross_margin_pct: 59.0,
                },
                nonstudent: SegmentEconomics {
                    per_cap_spend_usd: 15.50,
                    gross_margin_pct: 66.0,
                },
            },
            adjustments: MenuAdjustments::default(),
            sport_multipliers,
        }
    }
}
