//! Point-pair residual engine for the inversion fit.
//!
//! Each [`PointPair`] contributes the 2D residual
//! `r = distort_pixel(undistorted) - distorted`, so the solved parameters
//! make the closed form reproduce the pair targets.

use lenscal_core::{PinholeCamera, PointPair, Real, Vec2};
use nalgebra::{DMatrix, DVector};

use crate::estimate::EstimateOptions;
use crate::layout::ParamLayout;
use crate::problem::NllsProblem;

pub struct PointFitProblem {
    camera: PinholeCamera,
    pairs: Vec<PointPair>,
    layout: ParamLayout,
    x_base: DVector<Real>,
}

impl PointFitProblem {
    pub fn new(camera: &PinholeCamera, pairs: &[PointPair], opts: &EstimateOptions) -> Self {
        let n_dist = camera.distortion.num_params();
        // No line block in this mode; `lock_lines` has nothing to freeze.
        let layout = ParamLayout::new(n_dist, 0, &opts.lock_distortions, opts.lock_offset, true);

        let mut x_base = DVector::zeros(layout.full_len());
        for (i, value) in camera.distortion.params().into_iter().enumerate() {
            x_base[i] = value;
        }
        x_base[layout.offset_x_index()] = camera.offset.x;
        x_base[layout.offset_y_index()] = camera.offset.y;

        Self {
            camera: camera.clone(),
            pairs: pairs.to_vec(),
            layout,
            x_base,
        }
    }

    pub fn num_free(&self) -> usize {
        self.layout.num_free()
    }

    pub fn num_residuals(&self) -> usize {
        2 * self.pairs.len()
    }

    pub fn x0(&self) -> DVector<Real> {
        self.layout.reduce(&self.x_base)
    }

    fn camera_at(&self, full: &DVector<Real>) -> PinholeCamera {
        let mut camera = self.camera.clone();
        camera
            .distortion
            .set_params(&full.as_slice()[..self.layout.n_dist()]);
        camera.offset = Vec2::new(
            full[self.layout.offset_x_index()],
            full[self.layout.offset_y_index()],
        );
        camera
    }

    pub fn apply(&self, x_free: &DVector<Real>, camera: &mut PinholeCamera) {
        let full = self.layout.expand(x_free, &self.x_base);
        camera
            .distortion
            .set_params(&full.as_slice()[..self.layout.n_dist()]);
        camera.offset = Vec2::new(
            full[self.layout.offset_x_index()],
            full[self.layout.offset_y_index()],
        );
    }
}

impl NllsProblem for PointFitProblem {
    fn residuals(&self, x: &DVector<Real>) -> DVector<Real> {
        let full = self.layout.expand(x, &self.x_base);
        let camera = self.camera_at(&full);

        let mut r = DVector::zeros(self.num_residuals());
        for (k, pair) in self.pairs.iter().enumerate() {
            let q = camera.distort_pixel(&pair.undistorted);
            r[2 * k] = q.x - pair.distorted.x;
            r[2 * k + 1] = q.y - pair.distorted.y;
        }
        r
    }

    fn jacobian(&self, x: &DVector<Real>) -> DMatrix<Real> {
        let full = self.layout.expand(x, &self.x_base);
        let camera = self.camera_at(&full);
        let scale = camera.scale;
        let n_dist = self.layout.n_dist();

        let mut j = DMatrix::zeros(self.num_residuals(), self.layout.num_free());
        for (k, pair) in self.pairs.iter().enumerate() {
            let z = camera.pixel_to_cam(&pair.undistorted);
            let j_params = camera.distortion.jacobian_params(&z);
            let j_point = camera.distortion.jacobian_point(&z);

            for (col, &full_idx) in self.layout.free_indices().iter().enumerate() {
                let (dq_x, dq_y) = if full_idx < n_dist {
                    (
                        scale.x * j_params[(0, full_idx)],
                        scale.y * j_params[(1, full_idx)],
                    )
                } else if full_idx == self.layout.offset_x_index() {
                    (
                        1.0 - j_point[(0, 0)],
                        -(scale.y / scale.x) * j_point[(1, 0)],
                    )
                } else {
                    (
                        -(scale.x / scale.y) * j_point[(0, 1)],
                        1.0 - j_point[(1, 1)],
                    )
                };
                j[(2 * k, col)] = dq_x;
                j[(2 * k + 1, col)] = dq_y;
            }
        }
        j
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::SolveOptions;
    use lenscal_core::synthetic::pixel_grid;
    use lenscal_core::{Distortion, RadialK1};

    fn test_camera(k1: Real) -> PinholeCamera {
        let mut camera = PinholeCamera::new(
            1000,
            1000,
            Vec2::new(1.0, 1.0),
            Vec2::new(-4.0, 6.0),
            Distortion::RadialK1(RadialK1 { k1 }),
        );
        let diag = camera.half_diagonal();
        camera.scale = Vec2::new(diag, diag);
        camera
    }

    fn pairs_from(camera: &PinholeCamera) -> Vec<PointPair> {
        pixel_grid(6, 6, Vec2::new(150.0, 150.0), 140.0)
            .into_iter()
            .map(|p| PointPair {
                distorted: camera.distort_pixel(&p),
                undistorted: p,
            })
            .collect()
    }

    #[test]
    fn residuals_vanish_at_generating_parameters() {
        let camera = test_camera(0.1);
        let pairs = pairs_from(&camera);
        let opts = EstimateOptions {
            lock_scale: true,
            lock_offset: true,
            lock_distortions: vec![false],
            lock_lines: true,
            solve: SolveOptions::default(),
        };
        let problem = PointFitProblem::new(&camera, &pairs, &opts);
        let r = problem.residuals(&problem.x0());
        assert!(r.amax() < 1e-9);
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let camera = test_camera(0.07);
        let pairs = pairs_from(&camera);
        let opts = EstimateOptions {
            lock_scale: true,
            lock_offset: false,
            lock_distortions: vec![false],
            lock_lines: true,
            solve: SolveOptions::default(),
        };
        let problem = PointFitProblem::new(&camera, &pairs, &opts);
        let x0 = problem.x0();

        let analytic = problem.jacobian(&x0);
        let eps = 1e-6;
        for col in 0..problem.num_free() {
            let mut plus = x0.clone();
            let mut minus = x0.clone();
            plus[col] += eps;
            minus[col] -= eps;
            let numeric = (problem.residuals(&plus) - problem.residuals(&minus)) / (2.0 * eps);
            for row in 0..problem.num_residuals() {
                assert!(
                    (analytic[(row, col)] - numeric[row]).abs() < 1e-4,
                    "row {row} col {col}: analytic {} vs numeric {}",
                    analytic[(row, col)],
                    numeric[row]
                );
            }
        }
    }
}
