pub mod models;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::scenario::PromotionType;
use models::{ConcessionsDefaults, ConcessionsMenu, CrowdDefaults, Game, Venue};

/// Static game/venue/menu records, loaded once and shared read-only.
///
/// Directory layout for [`Catalog::load`]:
/// - `games.json`            – array of [`Game`] (required)
/// - `venue.json`            – default [`Venue`] (optional)
/// - `venues.json`           – object of venue id → [`Venue`] (optional)
/// - `concessions_menu.json` – [`ConcessionsMenu`] (optional)
#[derive(Debug, Clone)]
pub struct Catalog {
    pub games: Vec<Game>,
    pub default_venue: Venue,
    pub venues: BTreeMap<String, Venue>,
    pub menu: ConcessionsMenu,
}

impl Catalog {
    pub fn load(dir: &Path) -> Result<Self> {
        let games: Vec<Game> = read_json(&dir.join("games.json"))?;
        let default_venue: Venue = read_optional_json(&dir.join("venue.json"))?.unwrap_or_default();
        let venues: BTreeMap<String, Venue> =
            read_optional_json(&dir.join("venues.json"))?.unwrap_or_default();
        let menu: ConcessionsMenu =
            read_optional_json(&dir.join("concessions_menu.json"))?.unwrap_or_default();

        let mut catalog = Catalog {
            games,
            default_venue,
            venues,
            menu,
        };
        catalog.normalize_capacities();
        info!(
            "Catalog loaded from {}: {} game(s), {} venue(s)",
            dir.display(),
            catalog.games.len(),
            catalog.venues.len() + 1
        );
        Ok(catalog)
    }

    /// Built-in catalog: the reference stadium, an indoor arena, and two games.
    pub fn builtin() -> Self {
        let arena = Venue {
            name: "Schottenstein Center".to_string(),
            capacity: 18_809,
            is_indoor: true,
            sport: "basketball".to_string(),
            concessions: ConcessionsDefaults {
                stands_total: 70,
                default_stands_open_pct: 80,
                default_staff_per_stand: 4,
                ..ConcessionsDefaults::default()
            },
            crowd: CrowdDefaults {
                default_crowd_energy: 72,
            },
        };
        let mut venues = BTreeMap::new();
        venues.insert("schottenstein".to_string(), arena);

        let games = vec![
            Game {
                game_id: "michigan_at_osu_2026".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 11, 28).unwrap_or(NaiveDate::MIN),
                home_team: "Ohio State".to_string(),
                away_team: "Michigan".to_string(),
                sport: "football".to_string(),
                venue_name: "Ohio Stadium".to_string(),
                venue_id: None,
                venue_capacity: 102_780,
                kickoff_time_local: "12:00".to_string(),
                rivalry_flag: true,
                opponent_rank: Some(9),
                home_team_rank: Some(2),
                baseline_attendance: 102_000,
                baseline_student_ratio: 0.19,
                baseline_weather_temp_f: 38,
                baseline_weather_wind_mph: 11,
                baseline_weather_precip_chance: 20,
                baseline_promotion_type: PromotionType::RivalryHype,
            },
            Game {
                game_id: "purdue_at_osu_mbb_2027".to_string(),
                date: NaiveDate::from_ymd_opt(2027, 1, 21).unwrap_or(NaiveDate::MIN),
                home_team: "Ohio State".to_string(),
                away_team: "Purdue".to_string(),
                sport: "basketball".to_string(),
                venue_name: "Schottenstein Center".to_string(),
                venue_id: Some("schottenstein".to_string()),
                venue_capacity: 18_809,
                kickoff_time_local: "19:00".to_string(),
                rivalry_flag: false,
                opponent_rank: Some(12),
                home_team_rank: None,
                baseline_attendance: 16_500,
                baseline_student_ratio: 0.22,
                baseline_weather_temp_f: 25,
                baseline_weather_wind_mph: 14,
                baseline_weather_precip_chance: 40,
                baseline_promotion_type: PromotionType::StudentPush,
            },
        ];

        Catalog {
            games,
            default_venue: Venue::default(),
            venues,
            menu: ConcessionsMenu::default(),
        }
    }

    pub fn game(&self, game_id: &str) -> std::result::Result<&Game, EngineError> {
        self.games
            .iter()
            .find(|g| g.game_id == game_id)
            .ok_or_else(|| EngineError::UnknownGame(game_id.to_string()))
    }

    pub fn venue(&self, venue_id: &str) -> std::result::Result<&Venue, EngineError> {
        self.venues
            .get(venue_id)
            .ok_or_else(|| EngineError::UnknownVenue(venue_id.to_string()))
    }

    /// Venue a game is played at. Unknown or missing ids fall back to the
    /// default venue.
    pub fn venue_for(&self, game: &Game) -> &Venue {
        match game.venue_id.as_deref() {
            None => &self.default_venue,
            Some(id) => self.venues.get(id).unwrap_or_else(|| {
                warn!(
                    "Game {} references unknown venue '{}', using default venue",
                    game.game_id, id
                );
                &self.default_venue
            }),
        }
    }

    /// Game records carry a capacity copy; the venue record is authoritative.
    fn normalize_capacities(&mut self) {
        let capacities: Vec<u32> = self
            .games
            .iter()
            .map(|g| self.venue_for(g).capacity)
            .collect();
        for (game, cap) in self.games.iter_mut().zip(capacities) {
            if game.venue_capacity != cap {
                debug!(
                    "Game {}: capacity {} replaced by venue capacity {}",
                    game.game_id, game.venue_capacity, cap
                );
                game.venue_capacity = cap;
            }
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_optional_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        debug!("{} not present, using built-in defaults", path.display());
        return Ok(None);
    }
    read_json(path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_resolves_venues() {
        let c = Catalog::builtin();
        let football = c.game("michigan_at_osu_2026").unwrap();
        assert_eq!(c.venue_for(football).capacity, 102_780);
        let hoops = c.game("purdue_at_osu_mbb_2027").unwrap();
        let arena = c.venue_for(hoops);
        assert!(arena.is_indoor);
        assert_eq!(arena.sport, "basketball");
    }

    #[test]
    fn unknown_game_is_an_error() {
        let c = Catalog::builtin();
        assert_eq!(
            c.game("nope").unwrap_err(),
            EngineError::UnknownGame("nope".into())
        );
        assert_eq!(
            c.venue("nope").unwrap_err(),
            EngineError::UnknownVenue("nope".into())
        );
    }

    #[test]
    fn venue_lookup_by_id() {
        let c = Catalog::builtin();
        let arena = c.venue("schottenstein").unwrap();
        assert!(arena.is_indoor);
        assert_eq!(arena.capacity, 18_809);
    }

    #[test]
    fn unknown_venue_id_falls_back_to_default() {
        let c = Catalog::builtin();
        let mut g = c.games[0].clone();
        g.venue_id = Some("missing".into());
        assert_eq!(c.venue_for(&g), &c.default_venue);
    }

    #[test]
    fn game_json_fills_defaults() {
        let raw = r#"{
            "game_id": "g1",
            "date": "2026-09-05",
            "home_team": "Ohio State",
            "away_team": "Texas",
            "venue_name": "Ohio Stadium",
            "venue_capacity": 100000,
            "kickoff_time_local": "19:30",
            "baseline_attendance": 98000,
            "baseline_student_ratio": 0.18,
            "baseline_weather_temp_f": 78,
            "baseline_weather_wind_mph": 6
        }"#;
        let g: Game = serde_json::from_str(raw).unwrap();
        assert_eq!(g.sport, "football");
        assert_eq!(g.opponent_rank, None);
        assert_eq!(g.baseline_promotion_type, PromotionType::None);
        assert!(!g.rivalry_flag);
    }

    #[test]
    fn load_normalizes_capacity_from_venue() {
        let dir = std::env::temp_dir().join(format!("fan-impact-catalog-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let games = r#"[{
            "game_id": "g1",
            "date": "2026-09-05",
            "home_team": "Ohio State",
            "away_team": "Texas",
            "venue_name": "Ohio Stadium",
            "venue_capacity": 1,
            "kickoff_time_local": "19:30",
            "baseline_attendance": 98000,
            "baseline_student_ratio": 0.18,
            "baseline_weather_temp_f": 78,
            "baseline_weather_wind_mph": 6
        }]"#;
        std::fs::write(dir.join("games.json"), games).unwrap();
        let c = Catalog::load(&dir).unwrap();
        assert_eq!(c.games[0].venue_capacity, 102_780);
        assert_eq!(c.menu, ConcessionsMenu::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_missing_games_file_fails_with_context() {
        let dir = std::env::temp_dir().join("fan-impact-catalog-does-not-exist");
        let err = Catalog::load(&dir).unwrap_err();
        assert!(err.to_string().contains("games.json"));
    }
}
