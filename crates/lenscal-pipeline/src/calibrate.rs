//! Per-intrinsic calibration orchestration.
//!
//! The camera is rescaled so the model sees unit-normalized radii, fitted
//! through the staged line schedule, then refitted in point-pair mode so the
//! closed form describes the opposite direction. The pixel scale is restored
//! before the inversion fit, matching the established pipeline.

use anyhow::anyhow;
use thiserror::Error;

use lenscal_core::{LineWithPoints, PinholeCamera, PointPair, Real, Statistics, Vec2};
use lenscal_optim::{run_schedule_lines, run_schedule_point_pairs, SolveOptions};

use crate::detector::CheckerDetector;
use crate::lines::{extract_lines, ExtractionOptions, MIN_LINES_PER_VIEW};

/// Maximum round-trip error for a point pair to enter the inversion fit.
const INVERSION_TOLERANCE: Real = 1e-3;

#[derive(Clone, Debug, Default)]
pub struct CalibrationOptions {
    pub extraction: ExtractionOptions,
    pub solve: SolveOptions,
}

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("only work for pinhole cameras")]
    UnsupportedModel,
    #[error("not enough lines survived extraction ({found})")]
    InsufficientData { found: usize },
    #[error("failed to calibrate: {0:#}")]
    Estimation(#[source] anyhow::Error),
    #[error("failed to estimate reverse distortion: {0:#}")]
    Inversion(#[source] anyhow::Error),
}

/// Result of one intrinsic's calibration.
#[derive(Clone, Copy, Debug)]
pub struct CalibrationOutcome {
    /// Terminal statistics of the line fit.
    pub calibration: Statistics,
    /// Terminal statistics of the inversion fit.
    pub inversion: Statistics,
    pub lines: usize,
    pub point_pairs: usize,
}

/// Sample the fitted forward map into point pairs for the inversion fit.
///
/// The fitted model acts in the reverse direction: its closed form maps an
/// observed corner to its straightened position. Pairs whose round trip
/// through the Newton inverse misses the corner by more than
/// [`INVERSION_TOLERANCE`] pixels are dropped.
pub fn generate_point_pairs(camera: &PinholeCamera, lines: &[LineWithPoints]) -> Vec<PointPair> {
    let mut pairs = Vec::new();
    for line in lines {
        for point in &line.points {
            let undistorted = camera.distort_pixel(point);
            let roundtrip = (camera.undistort_pixel(&undistorted) - point).norm();
            if roundtrip > INVERSION_TOLERANCE {
                continue;
            }
            pairs.push(PointPair {
                distorted: *point,
                undistorted,
            });
        }
    }
    pairs
}

/// Calibrate one camera from the detector outputs of its views.
///
/// On success the camera carries the inverse-map parameters; on failure the
/// camera may carry a partial fit but its pixel scale is always restored.
pub fn calibrate_camera(
    camera: &mut PinholeCamera,
    detections: &[&CheckerDetector],
    opts: &CalibrationOptions,
) -> Result<CalibrationOutcome, CalibrationError> {
    let mut all_lines: Vec<LineWithPoints> = Vec::new();
    for detector in detections {
        let lines = extract_lines(detector, &opts.extraction);
        if lines.len() < MIN_LINES_PER_VIEW {
            continue;
        }
        all_lines.extend(lines);
    }
    if all_lines.len() < MIN_LINES_PER_VIEW {
        return Err(CalibrationError::InsufficientData {
            found: all_lines.len(),
        });
    }

    let original_scale = camera.scale;
    let diag = camera.half_diagonal();
    camera.scale = Vec2::new(diag, diag);

    let calibration = run_schedule_lines(camera, &mut all_lines, &opts.solve);
    camera.scale = original_scale;
    let calibration = calibration.map_err(CalibrationError::Estimation)?;

    log::info!("Result quality of calibration:");
    log::info!(
        "Mean of error (stddev): {} ({})",
        calibration.mean,
        calibration.stddev
    );
    log::info!("Median of error: {}", calibration.median);

    let pairs = generate_point_pairs(camera, &all_lines);
    if pairs.is_empty() {
        return Err(CalibrationError::Inversion(anyhow!(
            "no point pair survived the round-trip check"
        )));
    }

    let inversion = run_schedule_point_pairs(camera, &pairs, &opts.solve)
        .map_err(CalibrationError::Inversion)?;

    log::info!("Result quality of inversion:");
    log::info!(
        "Mean of error (stddev): {} ({})",
        inversion.mean,
        inversion.stddev
    );
    log::info!("Median of error: {}", inversion.median);

    Ok(CalibrationOutcome {
        calibration,
        inversion,
        lines: all_lines.len(),
        point_pairs: pairs.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lenscal_core::synthetic::{full_board, pixel_grid};
    use lenscal_core::{CheckerBoardCorner, Distortion, DistortionKind, RadialK1};

    fn detector_from_points(rows: usize, cols: usize, points: &[Vec2]) -> CheckerDetector {
        CheckerDetector {
            corners: points
                .iter()
                .map(|p| CheckerBoardCorner {
                    center: [p.x, p.y],
                    ..CheckerBoardCorner::default()
                })
                .collect(),
            boards: vec![full_board(rows, cols)],
        }
    }

    fn straight_grid_detector() -> CheckerDetector {
        let points = pixel_grid(10, 10, Vec2::new(140.0, 140.0), 80.0);
        detector_from_points(10, 10, &points)
    }

    #[test]
    fn too_small_board_is_insufficient() {
        let points = pixel_grid(3, 3, Vec2::new(100.0, 100.0), 50.0);
        let det = detector_from_points(3, 3, &points);
        let mut camera = PinholeCamera::new(
            1000,
            1000,
            Vec2::new(1000.0, 1000.0),
            Vec2::zeros(),
            Distortion::seeded(DistortionKind::RadialK3),
        );
        match calibrate_camera(&mut camera, &[&det], &CalibrationOptions::default()) {
            Err(CalibrationError::InsufficientData { found: 0 }) => {}
            other => panic!("expected insufficient data, got {other:?}"),
        }
    }

    #[test]
    fn identity_scene_restores_scale_bit_for_bit() {
        let det = straight_grid_detector();
        let mut camera = PinholeCamera::new(
            1000,
            1000,
            Vec2::new(123.25, 456.75),
            Vec2::zeros(),
            Distortion::seeded(DistortionKind::RadialK3),
        );
        let scale_before = camera.scale;
        let outcome =
            calibrate_camera(&mut camera, &[&det], &CalibrationOptions::default()).unwrap();
        assert_eq!(camera.scale, scale_before);
        assert!(outcome.calibration.mean < 1e-6);
        for value in camera.distortion.params() {
            assert!(value.abs() < 1e-6, "distortion drifted: {value}");
        }
    }

    #[test]
    fn point_pairs_respect_roundtrip_invariant() {
        let mut camera = PinholeCamera::new(
            1000,
            1000,
            Vec2::new(707.1, 707.1),
            Vec2::zeros(),
            Distortion::RadialK1(RadialK1 { k1: 0.1 }),
        );
        let diag = camera.half_diagonal();
        camera.scale = Vec2::new(diag, diag);

        let mut line = LineWithPoints::new(true, 0, 0);
        line.points = pixel_grid(1, 10, Vec2::new(150.0, 400.0), 75.0);
        let pairs = generate_point_pairs(&camera, &[line]);
        assert!(!pairs.is_empty());
        for pair in &pairs {
            let err = (camera.undistort_pixel(&pair.undistorted) - pair.distorted).norm();
            assert!(err <= INVERSION_TOLERANCE);
        }
    }
}
