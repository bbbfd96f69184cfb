//! Per-intrinsic lens distortion calibration pipeline.
//!
//! The pipeline consumes a scene-data descriptor (views + intrinsics) and a
//! directory of checkerboard detector outputs, groups detected corners into
//! line hypotheses, fits the intrinsic's distortion model through the staged
//! schedules of `lenscal-optim`, refits the family in the opposite direction
//! from sampled point pairs, and writes the inverse-map parameters back into
//! the scene.

pub mod calibrate;
pub mod detector;
pub mod lines;
pub mod scene;

pub use calibrate::{
    calibrate_camera, generate_point_pairs, CalibrationError, CalibrationOptions,
    CalibrationOutcome,
};
pub use detector::{detector_file_name, load_detector, load_detectors, CheckerDetector};
pub use lines::{extract_lines, ExtractionOptions, MIN_LINES_PER_VIEW, MIN_POINTS_PER_LINE};
pub use scene::{IntrinsicDesc, ProjectionKind, SceneData, ViewDesc};

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

/// Per-run accounting, used to derive the process exit status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Intrinsics with a pinhole projection.
    pub pinhole_intrinsics: usize,
    /// Intrinsics whose full schedule (including inversion) succeeded.
    pub calibrated: usize,
    /// Intrinsics skipped because too few lines survived extraction.
    pub skipped_insufficient: usize,
    /// Intrinsics skipped because their projection is not pinhole.
    pub skipped_unsupported: usize,
    /// Intrinsics that reached the solver and failed.
    pub failed: usize,
}

impl RunSummary {
    /// The run succeeds when the scene has pinhole intrinsics and no
    /// solver-reaching intrinsic failed without another one succeeding.
    pub fn succeeded(&self) -> bool {
        self.pinhole_intrinsics > 0 && (self.calibrated > 0 || self.failed == 0)
    }
}

/// Calibrate every pinhole intrinsic of the scene in place.
pub fn calibrate_scene(
    scene: &mut SceneData,
    detectors: &BTreeMap<u32, CheckerDetector>,
    opts: &CalibrationOptions,
) -> RunSummary {
    let mut summary = RunSummary::default();
    let intrinsic_ids: Vec<u32> = scene.intrinsics.keys().copied().collect();

    for id in intrinsic_ids {
        let Some(desc) = scene.intrinsics.get(&id) else {
            continue;
        };
        if desc.projection != ProjectionKind::Pinhole {
            log::error!("{}", CalibrationError::UnsupportedModel);
            summary.skipped_unsupported += 1;
            continue;
        }
        summary.pinhole_intrinsics += 1;
        log::info!("Processing intrinsic {id}");

        let mut camera = match desc.to_camera() {
            Ok(camera) => camera,
            Err(err) => {
                log::error!("Intrinsic {id} is unusable: {err:#}");
                summary.failed += 1;
                continue;
            }
        };

        let detections: Vec<&CheckerDetector> = scene
            .views
            .iter()
            .filter(|(_, view)| view.intrinsic_id == id)
            .filter_map(|(view_id, _)| detectors.get(view_id))
            .collect();

        match calibrate_camera(&mut camera, &detections, opts) {
            Ok(outcome) => {
                if let Some(desc) = scene.intrinsics.get_mut(&id) {
                    desc.update_from(&camera);
                }
                log::info!(
                    "Intrinsic {id} calibrated from {} lines and {} point pairs",
                    outcome.lines,
                    outcome.point_pairs
                );
                summary.calibrated += 1;
            }
            Err(CalibrationError::InsufficientData { found }) => {
                log::warn!("Not enough lines for intrinsic {id} ({found} found), skipping");
                summary.skipped_insufficient += 1;
            }
            Err(err) => {
                log::error!("Error estimating distortion for intrinsic {id}: {err}");
                summary.failed += 1;
            }
        }
    }

    summary
}

/// File-to-file entry point: load the scene and its detector outputs,
/// calibrate, and save the updated scene. I/O failures are fatal.
pub fn run_distortion_calibration(
    input: &Path,
    checkers_dir: &Path,
    output: &Path,
) -> Result<RunSummary> {
    let mut scene = SceneData::load(input)?;
    let detectors = load_detectors(checkers_dir, &scene)?;
    let summary = calibrate_scene(&mut scene, &detectors, &CalibrationOptions::default());
    scene.save(output)?;
    Ok(summary)
}
