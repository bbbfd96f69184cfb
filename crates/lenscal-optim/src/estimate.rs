//! Single-stage estimation drivers.

use anyhow::{ensure, Result};
use lenscal_core::{LineWithPoints, PinholeCamera, PointPair, Real, Statistics};
use nalgebra::DVector;

use crate::line_fit::LineFitProblem;
use crate::point_fit::PointFitProblem;
use crate::problem::{minimize, NllsProblem, SolveOptions};

/// Parameter-block locks for one estimation stage.
#[derive(Debug, Clone)]
pub struct EstimateOptions {
    /// Pixel scale is never optimized by this core; must stay `true`.
    pub lock_scale: bool,
    /// Freeze the principal-point offset.
    pub lock_offset: bool,
    /// Per-index distortion parameter locks.
    pub lock_distortions: Vec<bool>,
    /// Freeze the per-line `(angle, dist)` parameters (line mode only).
    pub lock_lines: bool,
    pub solve: SolveOptions,
}

fn check_locks(camera: &PinholeCamera, opts: &EstimateOptions) -> Result<()> {
    ensure!(opts.lock_scale, "pixel scale estimation is not supported");
    ensure!(
        opts.lock_distortions.len() == camera.distortion.num_params(),
        "distortion lock vector length {} does not match the model ({} parameters)",
        opts.lock_distortions.len(),
        camera.distortion.num_params()
    );
    Ok(())
}

fn run<P: NllsProblem>(
    problem: &P,
    x0: DVector<Real>,
    solve: &SolveOptions,
) -> Result<DVector<Real>> {
    let initial_cost = 0.5 * problem.residuals(&x0).norm_squared();
    let (x_opt, report) = minimize(problem, x0, solve);
    let final_cost = 0.5 * problem.residuals(&x_opt).norm_squared();
    ensure!(
        report.converged || final_cost <= initial_cost,
        "optimization diverged (cost {initial_cost:.6e} -> {final_cost:.6e})"
    );
    Ok(x_opt)
}

/// Fit the free parameter blocks to the line-collinearity constraint.
///
/// On success the camera and the line parameters are updated in place and the
/// statistics of the terminal residuals are returned. Locked blocks are
/// untouched.
pub fn estimate_lines(
    camera: &mut PinholeCamera,
    lines: &mut [LineWithPoints],
    opts: &EstimateOptions,
) -> Result<Statistics> {
    check_locks(camera, opts)?;
    ensure!(!lines.is_empty(), "no lines to fit");

    let problem = LineFitProblem::new(camera, lines, opts);
    let x0 = problem.x0();
    let x_opt = if problem.num_free() == 0 {
        x0
    } else {
        run(&problem, x0, &opts.solve)?
    };

    let residuals = problem.residuals(&x_opt);
    problem.apply(&x_opt, camera, lines);
    Ok(Statistics::from_residuals(residuals.as_slice()))
}

/// Fit the free parameter blocks to point-pair correspondences.
pub fn estimate_point_pairs(
    camera: &mut PinholeCamera,
    pairs: &[PointPair],
    opts: &EstimateOptions,
) -> Result<Statistics> {
    check_locks(camera, opts)?;
    ensure!(!pairs.is_empty(), "no point pairs to fit");

    let problem = PointFitProblem::new(camera, pairs, opts);
    let x0 = problem.x0();
    let x_opt = if problem.num_free() == 0 {
        x0
    } else {
        run(&problem, x0, &opts.solve)?
    };

    let residuals = problem.residuals(&x_opt);
    problem.apply(&x_opt, camera);
    Ok(Statistics::from_residuals(residuals.as_slice()))
}
