//! Staged unlock schedules.
//!
//! Each model family has a fixed stage sequence that progressively releases
//! parameter blocks, every stage starting from the previous stage's solution.
//! The first stage of every schedule is a line-only prefit. The tables are
//! data; [`run_schedule_lines`] and [`run_schedule_point_pairs`] drive them
//! through the two residual modes.

use anyhow::{Context, Result};
use lenscal_core::{Distortion, DistortionKind, LineWithPoints, PinholeCamera, PointPair, Statistics};

use crate::estimate::{estimate_lines, estimate_point_pairs, EstimateOptions};
use crate::problem::SolveOptions;

/// One stage of a staged unlock schedule.
#[derive(Debug, Clone)]
pub struct Stage {
    pub lock_distortions: Vec<bool>,
    pub lock_offset: bool,
    pub lock_lines: bool,
}

impl Stage {
    fn to_options(&self, solve: SolveOptions) -> EstimateOptions {
        EstimateOptions {
            lock_scale: true,
            lock_offset: self.lock_offset,
            lock_distortions: self.lock_distortions.clone(),
            lock_lines: self.lock_lines,
            solve,
        }
    }
}

/// Staged unlock schedule for one model family.
#[derive(Debug, Clone)]
pub struct ModelSchedule {
    /// Reset the distortion parameters to the family seed before stage 1.
    pub reseed: bool,
    pub stages: Vec<Stage>,
}

/// Lock vector of length `n` with the listed indices released.
fn released(n: usize, free: &[usize]) -> Vec<bool> {
    let mut locks = vec![true; n];
    for &i in free {
        locks[i] = false;
    }
    locks
}

fn stage(lock_distortions: Vec<bool>, lock_offset: bool, lock_lines: bool) -> Stage {
    Stage {
        lock_distortions,
        lock_offset,
        lock_lines,
    }
}

/// The staged unlock table of a model family.
pub fn model_schedule(kind: DistortionKind) -> ModelSchedule {
    match kind {
        DistortionKind::RadialK1 => ModelSchedule {
            reseed: false,
            stages: vec![
                stage(released(1, &[]), true, false),
                stage(released(1, &[0]), true, false),
                stage(released(1, &[0]), false, false),
            ],
        },
        DistortionKind::RadialK3 => ModelSchedule {
            reseed: false,
            stages: vec![
                stage(released(3, &[]), true, false),
                stage(released(3, &[0]), true, false),
                stage(released(3, &[0]), false, false),
                stage(released(3, &[0, 1, 2]), false, false),
            ],
        },
        DistortionKind::Radial4 => ModelSchedule {
            reseed: false,
            stages: vec![
                stage(released(6, &[]), true, false),
                stage(released(6, &[0]), true, false),
                stage(released(6, &[0]), false, false),
                stage(released(6, &[0, 1, 2, 3, 4, 5]), false, false),
            ],
        },
        DistortionKind::Anamorphic4 => ModelSchedule {
            reseed: true,
            stages: vec![
                stage(released(14, &[]), true, false),
                stage(released(14, &[]), false, false),
                stage(released(14, &[0, 1, 2, 3]), false, true),
                stage(released(14, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]), false, true),
                // The unit-seeded squeeze entries 12 and 13 stay locked.
                stage(
                    released(14, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]),
                    false,
                    true,
                ),
            ],
        },
        DistortionKind::ClassicLd => ModelSchedule {
            reseed: true,
            stages: vec![
                stage(released(5, &[]), true, false),
                stage(released(5, &[0]), true, false),
                stage(released(5, &[0]), false, false),
                // Squeeze angle (1) and quartic term (4) stay coupled-locked.
                stage(released(5, &[0, 2, 3]), false, false),
                stage(released(5, &[0, 1, 2, 3, 4]), false, true),
            ],
        },
    }
}

fn reseed_if_required(camera: &mut PinholeCamera, schedule: &ModelSchedule) {
    if schedule.reseed {
        camera.distortion = Distortion::seeded(camera.distortion.kind());
    }
}

/// Run the full staged schedule in line mode, mutating the camera and the
/// line parameters in place. Returns the terminal-stage statistics.
pub fn run_schedule_lines(
    camera: &mut PinholeCamera,
    lines: &mut [LineWithPoints],
    solve: &SolveOptions,
) -> Result<Statistics> {
    let schedule = model_schedule(camera.distortion.kind());
    reseed_if_required(camera, &schedule);

    let mut stats = Statistics::default();
    for (idx, stage) in schedule.stages.iter().enumerate() {
        stats = estimate_lines(camera, lines, &stage.to_options(solve.clone()))
            .with_context(|| format!("failed to calibrate at stage {}", idx + 1))?;
        log::debug!(
            "line stage {}: mean {:.6e} stddev {:.6e} median {:.6e}",
            idx + 1,
            stats.mean,
            stats.stddev,
            stats.median
        );
    }
    Ok(stats)
}

/// Run the full staged schedule in point-pair mode.
pub fn run_schedule_point_pairs(
    camera: &mut PinholeCamera,
    pairs: &[PointPair],
    solve: &SolveOptions,
) -> Result<Statistics> {
    let schedule = model_schedule(camera.distortion.kind());
    reseed_if_required(camera, &schedule);

    let mut stats = Statistics::default();
    for (idx, stage) in schedule.stages.iter().enumerate() {
        stats = estimate_point_pairs(camera, pairs, &stage.to_options(solve.clone()))
            .with_context(|| format!("failed to invert at stage {}", idx + 1))?;
        log::debug!(
            "point stage {}: mean {:.6e} stddev {:.6e} median {:.6e}",
            idx + 1,
            stats.mean,
            stats.stddev,
            stats.median
        );
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_indices(stage: &Stage) -> Vec<usize> {
        stage
            .lock_distortions
            .iter()
            .enumerate()
            .filter_map(|(i, locked)| (!locked).then_some(i))
            .collect()
    }

    #[test]
    fn every_schedule_starts_with_a_line_prefit() {
        for kind in [
            DistortionKind::RadialK1,
            DistortionKind::RadialK3,
            DistortionKind::Radial4,
            DistortionKind::Anamorphic4,
            DistortionKind::ClassicLd,
        ] {
            let schedule = model_schedule(kind);
            let first = &schedule.stages[0];
            assert!(first.lock_distortions.iter().all(|&l| l), "{kind:?}");
            assert!(first.lock_offset, "{kind:?}");
            assert!(!first.lock_lines, "{kind:?}");
        }
    }

    #[test]
    fn stage_counts_match_model_table() {
        assert_eq!(model_schedule(DistortionKind::RadialK1).stages.len(), 3);
        assert_eq!(model_schedule(DistortionKind::RadialK3).stages.len(), 4);
        assert_eq!(model_schedule(DistortionKind::Radial4).stages.len(), 4);
        assert_eq!(model_schedule(DistortionKind::Anamorphic4).stages.len(), 5);
        assert_eq!(model_schedule(DistortionKind::ClassicLd).stages.len(), 5);
    }

    #[test]
    fn classic_ld_stage_four_keeps_angle_and_quartic_locked() {
        let schedule = model_schedule(DistortionKind::ClassicLd);
        assert_eq!(free_indices(&schedule.stages[3]), vec![0, 2, 3]);
        assert_eq!(free_indices(&schedule.stages[4]), vec![0, 1, 2, 3, 4]);
        assert!(schedule.stages[4].lock_lines);
        assert!(schedule.reseed);
    }

    #[test]
    fn anamorphic_schedule_never_releases_trailing_squeezes() {
        let schedule = model_schedule(DistortionKind::Anamorphic4);
        for stage in &schedule.stages {
            assert!(stage.lock_distortions[12]);
            assert!(stage.lock_distortions[13]);
        }
        assert_eq!(
            free_indices(&schedule.stages[4]),
            (0..=11).collect::<Vec<_>>()
        );
        assert!(!schedule.stages[1].lock_offset);
        assert!(schedule.stages[2].lock_lines);
    }

    #[test]
    fn radial_schedules_release_progressively() {
        let k3 = model_schedule(DistortionKind::RadialK3);
        assert_eq!(free_indices(&k3.stages[1]), vec![0]);
        assert!(k3.stages[1].lock_offset);
        assert_eq!(free_indices(&k3.stages[2]), vec![0]);
        assert!(!k3.stages[2].lock_offset);
        assert_eq!(free_indices(&k3.stages[3]), vec![0, 1, 2]);

        let r4 = model_schedule(DistortionKind::Radial4);
        assert_eq!(free_indices(&r4.stages[3]), (0..6).collect::<Vec<_>>());
    }
}
