use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tracing::info;

mod config;

use config::{Command, Config};
use fan_impact_engine::analysis::{
    optimize, recommend_levers, run_calibration, sensitivity_surface, simulate_game, what_if,
    CalibrationConfig, LeverLimits, MonteCarloConfig, MonteCarloEngine, OptimizeRequest,
    SurfaceRequest,
};
use fan_impact_engine::model::EngineAssumptions;
use fan_impact_engine::{Catalog, Scenario};

fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    let catalog = match &config.catalog_dir {
        Some(dir) => Catalog::load(dir)?,
        None => {
            info!("No catalog directory given, using built-in catalog");
            Catalog::builtin()
        }
    };

    if let Command::Games = config.command {
        return emit(&config, &catalog.games);
    }

    let game = catalog.game(&config.game)?;
    let venue = match config.venue.as_deref() {
        Some(id) => catalog.venue(id)?,
        None => catalog.venue_for(game),
    };
    let menu = &catalog.menu;
    let overrides = config.scenario_overrides()?;
    let baseline = Scenario::baseline(game, venue);
    info!(
        "Game {}: {} vs {} at {} ({} seats)",
        game.game_id, game.home_team, game.away_team, venue.name, venue.capacity
    );

    match &config.command {
        Command::Games => Ok(()),
        Command::Simulate => emit(&config, &simulate_game(game, venue, menu, &overrides)),
        Command::WhatIf => emit(&config, &what_if(&baseline, &overrides)),
        Command::Levers {
            max_attendance_increase,
            max_student_ratio_increase,
        } => {
            let limits = LeverLimits {
                max_attendance_increase: *max_attendance_increase,
                max_student_ratio_increase: *max_student_ratio_increase,
            };
            emit(
                &config,
                &recommend_levers(&baseline.with_overrides(&overrides), &limits),
            )
        }
        Command::Sensitivity {
            attendance_min,
            attendance_max,
            attendance_step,
            student_ratio_min,
            student_ratio_max,
            student_ratio_step,
            crowd_energy,
        } => {
            let req = SurfaceRequest {
                attendance_min: *attendance_min,
                attendance_max: *attendance_max,
                attendance_step: *attendance_step,
                student_ratio_min: *student_ratio_min,
                student_ratio_max: *student_ratio_max,
                student_ratio_step: *student_ratio_step,
                crowd_energy: *crowd_energy,
            };
            let surface = sensitivity_surface(&baseline.with_overrides(&overrides), &req)?;
            emit(&config, &surface)
        }
        Command::MonteCarlo => {
            let mc = MonteCarloConfig {
                n_simulations: config.simulations,
                variation_pct: config.variation_pct,
            };
            let result = MonteCarloEngine::with_seed(config.seed).run(
                &baseline.with_overrides(&overrides),
                venue,
                menu,
                &mc,
            )?;
            emit(&config, &result)
        }
        Command::Optimize {
            max_attendance_increase,
            max_student_ratio_increase,
            max_crowd_energy_increase,
            max_staff_per_stand,
            min_stands_open_pct,
            target_delta_win_pp,
        } => {
            let req = OptimizeRequest {
                current_overrides: overrides,
                max_attendance_increase: *max_attendance_increase,
                max_student_ratio_increase: *max_student_ratio_increase,
                max_crowd_energy_increase: *max_crowd_energy_increase,
                max_staff_per_stand: *max_staff_per_stand,
                min_stands_open_pct: *min_stands_open_pct,
                target_delta_win_pp: *target_delta_win_pp,
                max_evaluations: config.max_evaluations,
            };
            emit(&config, &optimize(&baseline, venue, menu, &req)?)
        }
        Command::Calibrate => {
            let cal = CalibrationConfig {
                n: config.calibration_points,
                bins: config.calibration_bins,
                seed: config.calibration_seed,
            };
            emit(&config, &run_calibration(venue, &cal)?)
        }
        Command::Assumptions => emit(&config, &EngineAssumptions::snapshot(venue, menu)),
    }
}

fn emit<T: Serialize>(config: &Config, value: &T) -> Result<()> {
    let json = if config.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
