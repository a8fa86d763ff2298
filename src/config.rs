use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fan_impact_engine::analysis::calibration::MAX_POINTS;
use fan_impact_engine::analysis::monte_carlo::MAX_SIMULATIONS;
use fan_impact_engine::scenario::ScenarioOverrides;

/// Stadium-operations simulation engine
#[derive(Parser, Debug, Clone)]
#[command(name = "fan-impact-engine", version, about)]
pub struct Config {
    /// Directory holding games.json (and optional venue/menu files).
    /// Built-in catalog when omitted.
    #[arg(long, env = "CATALOG_DIR")]
    pub catalog_dir: Option<PathBuf>,

    /// Game to evaluate
    #[arg(long, env = "GAME_ID", default_value = "michigan_at_osu_2026")]
    pub game: String,

    /// Venue id from the catalog; the game's own venue when omitted
    #[arg(long, env = "VENUE_ID")]
    pub venue: Option<String>,

    /// Scenario overrides as JSON, e.g. '{"crowd_energy": 95}'
    #[arg(long, env = "SCENARIO_OVERRIDES")]
    pub overrides: Option<String>,

    /// RNG seed for Monte Carlo; OS entropy when omitted
    #[arg(long, env = "RNG_SEED")]
    pub seed: Option<u64>,

    /// Monte Carlo trial count
    #[arg(long, env = "MC_SIMULATIONS", default_value = "200")]
    pub simulations: usize,

    /// Monte Carlo relative input variation (0.08 = ±8%)
    #[arg(long, env = "MC_VARIATION_PCT", default_value = "0.08")]
    pub variation_pct: f64,

    /// Optimizer cap on grid points evaluated
    #[arg(long, env = "OPT_MAX_EVALUATIONS", default_value = "250000")]
    pub max_evaluations: u64,

    /// Synthetic games drawn for calibration
    #[arg(long, env = "CALIBRATION_POINTS", default_value = "240")]
    pub calibration_points: usize,

    /// Reliability diagram bins (5–20)
    #[arg(long, env = "CALIBRATION_BINS", default_value = "10")]
    pub calibration_bins: usize,

    /// Calibration RNG seed
    #[arg(long, env = "CALIBRATION_SEED", default_value = "42")]
    pub calibration_seed: u64,

    /// Pretty-print JSON output
    #[arg(long, env = "PRETTY", default_value = "false")]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List catalog games
    Games,
    /// Run all three models on the baseline and on baseline + overrides
    Simulate,
    /// Win probability with and without the overrides
    WhatIf,
    /// Rank single-lever moves
    Levers {
        #[arg(long, default_value = "5000")]
        max_attendance_increase: u32,
        #[arg(long, default_value = "0.03")]
        max_student_ratio_increase: f64,
    },
    /// Win probability over attendance × student ratio
    Sensitivity {
        #[arg(long, default_value = "80000")]
        attendance_min: u32,
        #[arg(long, default_value = "105000")]
        attendance_max: u32,
        #[arg(long, default_value = "2500")]
        attendance_step: u32,
        #[arg(long, default_value = "0.10")]
        student_ratio_min: f64,
        #[arg(long, default_value = "0.30")]
        student_ratio_max: f64,
        #[arg(long, default_value = "0.02")]
        student_ratio_step: f64,
        #[arg(long)]
        crowd_energy: Option<u8>,
    },
    /// Distribution of outputs under jittered inputs
    MonteCarlo,
    /// Exhaustive lever search
    Optimize {
        #[arg(long, default_value = "5000")]
        max_attendance_increase: u32,
        #[arg(long, default_value = "0.03")]
        max_student_ratio_increase: f64,
        #[arg(long, default_value = "25")]
        max_crowd_energy_increase: u8,
        #[arg(long, default_value = "12")]
        max_staff_per_stand: u8,
        #[arg(long, default_value = "80")]
        min_stands_open_pct: u8,
        /// Desired win-probability gain in percentage points
        #[arg(long)]
        target_delta_win_pp: Option<f64>,
    },
    /// Reliability diagram and Brier score on synthetic games
    Calibrate,
    /// Model constants and venue/menu defaults in use
    Assumptions,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.simulations == 0 || self.simulations > MAX_SIMULATIONS {
            anyhow::bail!("simulations must be between 1 and {}", MAX_SIMULATIONS);
        }
        if !(0.0..=1.0).contains(&self.variation_pct) {
            anyhow::bail!("variation_pct must be between 0.0 and 1.0");
        }
        if self.max_evaluations == 0 {
            anyhow::bail!("max_evaluations must be positive");
        }
        if self.calibration_points == 0 || self.calibration_points > MAX_POINTS {
            anyhow::bail!("calibration_points must be between 1 and {}", MAX_POINTS);
        }
        if !(5..=20).contains(&self.calibration_bins) {
            anyhow::bail!("calibration_bins must be between 5 and 20");
        }
        if let Command::Optimize {
            max_student_ratio_increase,
            max_staff_per_stand,
            min_stands_open_pct,
            ..
        } = &self.command
        {
            if !(0.0..=0.25).contains(max_student_ratio_increase) {
                anyhow::bail!("max_student_ratio_increase must be between 0.0 and 0.25");
            }
            if !(1..=20).contains(max_staff_per_stand) {
                anyhow::bail!("max_staff_per_stand must be between 1 and 20");
            }
            if !(10..=100).contains(min_stands_open_pct) {
                anyhow::bail!("min_stands_open_pct must be between 10 and 100");
            }
        }
        self.scenario_overrides()?;
        Ok(())
    }

    pub fn scenario_overrides(&self) -> anyhow::Result<ScenarioOverrides> {
        match &self.overrides {
            None => Ok(ScenarioOverrides::default()),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("invalid --overrides JSON: {}", e)),
        }
    }
}
