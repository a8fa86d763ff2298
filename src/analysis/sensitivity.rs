use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::model::predict_win_probability;
use crate::scenario::Scenario;

/// Upper bound on surface cells per request.
pub const MAX_SURFACE_CELLS: u64 = 250_000;
/// Crowd energy held for the surface when the caller gives none.
pub const DEFAULT_SURFACE_ENERGY: u8 = 78;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRequest {
    pub attendance_min: u32,
    pub attendance_max: u32,
    pub attendance_step: u32,
    pub student_ratio_min: f64,
    pub student_ratio_max: f64,
    pub student_ratio_step: f64,
    #[serde(default)]
    pub crowd_energy: Option<u8>,
}

/// Win probability over attendance × student ratio, all else at baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivitySurface {
    pub attendance: Vec<u32>,
    pub student_ratio: Vec<f64>,
    /// Indexed `[student_ratio][attendance]`.
    pub win_probability: Vec<Vec<f64>>,
    pub crowd_energy: u8,
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn attendance_axis(req: &SurfaceRequest) -> Result<Vec<u32>> {
    if req.attendance_step == 0 || req.attendance_min > req.attendance_max {
        return Err(EngineError::InvalidRange {
            axis: "attendance",
            min: f64::from(req.attendance_min),
            max: f64::from(req.attendance_max),
            step: f64::from(req.attendance_step),
        });
    }
    let count = u64::from((req.attendance_max - req.attendance_min) / req.attendance_step) + 1;
    if count > MAX_SURFACE_CELLS {
        return Err(EngineError::SearchSpaceTooLarge {
            combinations: count,
            limit: MAX_SURFACE_CELLS,
        });
    }
    Ok((req.attendance_min..=req.attendance_max)
        .step_by(req.attendance_step as usize)
        .collect())
}

fn student_ratio_axis(req: &SurfaceRequest) -> Result<Vec<f64>> {
    let (min, max, step) = (
        req.student_ratio_min,
        req.student_ratio_max,
        req.student_ratio_step,
    );
    if !step.is_finite() || step <= 0.0 || !min.is_finite() || !max.is_finite() || min > max {
        return Err(EngineError::InvalidRange {
            axis: "student_ratio",
            min,
            max,
            step,
        });
    }
    let count = ((max - min) / step + 1e-9).floor() + 1.0;
    if count > MAX_SURFACE_CELLS as f64 {
        return Err(EngineError::SearchSpaceTooLarge {
            combinations: count as u64,
            limit: MAX_SURFACE_CELLS,
        });
    }
    let count = count as u64;
    Ok((0..count)
        .map(|i| min + step * i as f64)
        .take_while(|x| *x <= max + 1e-9)
        .map(round3)
        .collect())
}

/// Evaluate the win model on every (student ratio, attendance) pair.
///
/// `base` supplies every other input; its crowd energy is replaced by the
/// requested one (or 78).
pub fn sensitivity_surface(base: &Scenario, req: &SurfaceRequest) -> Result<SensitivitySurface> {
    let student_ratio = student_ratio_axis(req)?;
    let attendance = attendance_axis(req)?;
    let cells = attendance.len() as u64 * student_ratio.len() as u64;
    if cells > MAX_SURFACE_CELLS {
        return Err(EngineError::SearchSpaceTooLarge {
            combinations: cells,
            limit: MAX_SURFACE_CELLS,
        });
    }

    let crowd_energy = req.crowd_energy.unwrap_or(DEFAULT_SURFACE_ENERGY).min(100);
    let mut scenario = base.clone();
    scenario.crowd_energy = crowd_energy;

    let mut grid = Vec::with_capacity(student_ratio.len());
    for &sr in &student_ratio {
        scenario.student_ratio = sr;
        let mut row = Vec::with_capacity(attendance.len());
        for &att in &attendance {
            scenario.attendance = att;
            row.push(predict_win_probability(&scenario).predicted_win_probability);
        }
        grid.push(row);
    }

    debug!(
        "Sensitivity surface: {} student ratios x {} attendance values",
        student_ratio.len(),
        attendance.len()
    );
    Ok(SensitivitySurface {
        attendance,
        student_ratio,
        win_probability: grid,
        crowd_energy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::tests::reference_scenario;

    fn request() -> SurfaceRequest {
        SurfaceRequest {
            attendance_min: 80_000,
            attendance_max: 102_000,
            attendance_step: 5_000,
            student_ratio_min: 0.10,
            student_ratio_max: 0.30,
            student_ratio_step: 0.05,
            crowd_energy: None,
        }
    }

    #[test]
    fn dimensions_and_axes() {
        let s = sensitivity_surface(&reference_scenario(), &request()).unwrap();
        assert_eq!(s.attendance, vec![80_000, 85_000, 90_000, 95_000, 100_000]);
        assert_eq!(s.student_ratio, vec![0.10, 0.15, 0.20, 0.25, 0.30]);
        assert_eq!(s.win_probability.len(), s.student_ratio.len());
        assert!(s
            .win_probability
            .iter()
            .all(|row| row.len() == s.attendance.len()));
        assert_eq!(s.crowd_energy, DEFAULT_SURFACE_ENERGY);
    }

    #[test]
    fn every_cell_matches_direct_call() {
        let mut req = request();
        req.crowd_energy = Some(90);
        let base = reference_scenario();
        let s = sensitivity_surface(&base, &req).unwrap();
        for (i, &sr) in s.student_ratio.iter().enumerate() {
            for (j, &att) in s.attendance.iter().enumerate() {
                let mut direct = base.clone();
                direct.student_ratio = sr;
                direct.attendance = att;
                direct.crowd_energy = 90;
                let p = predict_win_probability(&direct).predicted_win_probability;
                assert_eq!(s.win_probability[i][j], p);
            }
        }
    }

    #[test]
    fn single_point_range() {
        let mut req = request();
        req.attendance_max = req.attendance_min;
        req.student_ratio_max = req.student_ratio_min;
        let s = sensitivity_surface(&reference_scenario(), &req).unwrap();
        assert_eq!(s.win_probability, vec![vec![s.win_probability[0][0]]]);
    }

    #[test]
    fn rejects_bad_ranges() {
        let base = reference_scenario();
        let mut req = request();
        req.attendance_step = 0;
        assert!(matches!(
            sensitivity_surface(&base, &req),
            Err(EngineError::InvalidRange { axis: "attendance", .. })
        ));
        let mut req = request();
        req.student_ratio_min = 0.4;
        assert!(matches!(
            sensitivity_surface(&base, &req),
            Err(EngineError::InvalidRange { axis: "student_ratio", .. })
        ));
        let mut req = request();
        req.student_ratio_step = 0.0;
        assert!(sensitivity_surface(&base, &req).is_err());
    }

    #[test]
    fn rejects_oversized_surface() {
        let mut req = request();
        req.attendance_min = 0;
        req.attendance_max = 1_000_000;
        req.attendance_step = 1;
        assert!(matches!(
            sensitivity_surface(&reference_scenario(), &req),
            Err(EngineError::SearchSpaceTooLarge { .. })
        ));
    }

    #[test]
    fn tiny_student_ratio_step_is_rejected_not_overflowed() {
        let mut req = request();
        req.student_ratio_min = 0.0;
        req.student_ratio_max = 1.0;
        req.student_ratio_step = 1e-300;
        assert!(matches!(
            sensitivity_surface(&reference_scenario(), &req),
            Err(EngineError::SearchSpaceTooLarge {
                combinations: u64::MAX,
                ..
            })
        ));
    }

    #[test]
    fn ratios_past_one_flatten_out() {
        let mut req = request();
        req.student_ratio_min = 1.0;
        req.student_ratio_max = 3.0;
        req.student_ratio_step = 1.0;
        let s = sensitivity_surface(&reference_scenario(), &req).unwrap();
        assert_eq!(s.student_ratio, vec![1.0, 2.0, 3.0]);
        assert_eq!(s.win_probability[0], s.win_probability[1]);
        assert_eq!(s.win_probability[0], s.win_probability[2]);
    }
}
