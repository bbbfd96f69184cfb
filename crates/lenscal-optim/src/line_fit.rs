//! Line-constraint residual engine.
//!
//! For every corner `p` of every line, the residual is the signed distance
//! of the distortion-mapped corner `q` to the line in normal form:
//! `r = q.x cos(angle) + q.y sin(angle) - dist`. The distortion closed form
//! is applied to the observed corners, so the fitted parameters describe the
//! map that straightens them.

use lenscal_core::{LineWithPoints, PinholeCamera, Real, Vec2};
use nalgebra::{DMatrix, DVector};

use crate::estimate::EstimateOptions;
use crate::layout::ParamLayout;
use crate::problem::NllsProblem;

pub struct LineFitProblem {
    camera: PinholeCamera,
    line_points: Vec<Vec<Vec2>>,
    layout: ParamLayout,
    x_base: DVector<Real>,
}

impl LineFitProblem {
    pub fn new(camera: &PinholeCamera, lines: &[LineWithPoints], opts: &EstimateOptions) -> Self {
        let n_dist = camera.distortion.num_params();
        let layout = ParamLayout::new(
            n_dist,
            lines.len(),
            &opts.lock_distortions,
            opts.lock_offset,
            opts.lock_lines,
        );

        let mut x_base = DVector::zeros(layout.full_len());
        for (i, value) in camera.distortion.params().into_iter().enumerate() {
            x_base[i] = value;
        }
        x_base[layout.offset_x_index()] = camera.offset.x;
        x_base[layout.offset_y_index()] = camera.offset.y;
        for (j, line) in lines.iter().enumerate() {
            x_base[layout.line_angle_index(j)] = line.angle;
            x_base[layout.line_angle_index(j) + 1] = line.dist;
        }

        Self {
            camera: camera.clone(),
            line_points: lines.iter().map(|l| l.points.clone()).collect(),
            layout,
            x_base,
        }
    }

    pub fn num_free(&self) -> usize {
        self.layout.num_free()
    }

    pub fn num_residuals(&self) -> usize {
        self.line_points.iter().map(Vec::len).sum()
    }

    /// Initial free parameter vector.
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

    /// Write a solution back into the camera and line parameters.
    pub fn apply(
        &self,
        x_free: &DVector<Real>,
        camera: &mut PinholeCamera,
        lines: &mut [LineWithPoints],
    ) {
        let full = self.layout.expand(x_free, &self.x_base);
        camera
            .distortion
            .set_params(&full.as_slice()[..self.layout.n_dist()]);
        camera.offset = Vec2::new(
            full[self.layout.offset_x_index()],
            full[self.layout.offset_y_index()],
        );
        for (j, line) in lines.iter_mut().enumerate() {
            line.angle = full[self.layout.line_angle_index(j)];
            line.dist = full[self.layout.line_angle_index(j) + 1];
        }
    }
}

impl NllsProblem for LineFitProblem {
    fn residuals(&self, x: &DVector<Real>) -> DVector<Real> {
        let full = self.layout.expand(x, &self.x_base);
        let camera = self.camera_at(&full);

        let mut r = DVector::zeros(self.num_residuals());
        let mut row = 0;
        for (j, points) in self.line_points.iter().enumerate() {
            let angle = full[self.layout.line_angle_index(j)];
            let dist = full[self.layout.line_angle_index(j) + 1];
            let (sa, ca) = angle.sin_cos();
            for p in points {
                let q = camera.distort_pixel(p);
                r[row] = ca * q.x + sa * q.y - dist;
                row += 1;
            }
        }
        r
    }

    fn jacobian(&self, x: &DVector<Real>) -> DMatrix<Real> {
        let full = self.layout.expand(x, &self.x_base);
        let camera = self.camera_at(&full);
        let scale = camera.scale;
        let n_dist = self.layout.n_dist();

        let mut j = DMatrix::zeros(self.num_residuals(), self.layout.num_free());
        let mut row = 0;
        for (line_idx, points) in self.line_points.iter().enumerate() {
            let angle = full[self.layout.line_angle_index(line_idx)];
            let (sa, ca) = angle.sin_cos();
            for p in points {
                let z = camera.pixel_to_cam(p);
                let q = camera.cam_to_pixel(&camera.distortion.distort(&z));
                let j_params = camera.distortion.jacobian_params(&z);
                let j_point = camera.distortion.jacobian_point(&z);

                for (col, &full_idx) in self.layout.free_indices().iter().enumerate() {
                    let value = if full_idx < n_dist {
                        let dq_x = scale.x * j_params[(0, full_idx)];
                        let dq_y = scale.y * j_params[(1, full_idx)];
                        ca * dq_x + sa * dq_y
                    } else if full_idx == self.layout.offset_x_index() {
                        // q = s∘D((p - c - o)/s) + c + o
                        let dq_x = 1.0 - j_point[(0, 0)];
                        let dq_y = -(scale.y / scale.x) * j_point[(1, 0)];
                        ca * dq_x + sa * dq_y
                    } else if full_idx == self.layout.offset_y_index() {
                        let dq_x = -(scale.x / scale.y) * j_point[(0, 1)];
                        let dq_y = 1.0 - j_point[(1, 1)];
                        ca * dq_x + sa * dq_y
                    } else {
                        let owner = (full_idx - n_dist - 2) / 2;
                        if owner != line_idx {
                            continue;
                        }
                        if (full_idx - n_dist - 2) % 2 == 0 {
                            -sa * q.x + ca * q.y
                        } else {
                            -1.0
                        }
                    };
                    j[(row, col)] = value;
                }
                row += 1;
            }
        }
        j
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::EstimateOptions;
    use crate::problem::SolveOptions;
    use lenscal_core::synthetic::pixel_grid;
    use lenscal_core::{Distortion, DistortionKind, RadialK3};

    fn test_camera() -> PinholeCamera {
        let mut camera = PinholeCamera::new(
            1000,
            1000,
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, -3.0),
            Distortion::RadialK3(RadialK3 {
                k1: 0.08,
                k2: -0.01,
                k3: 0.002,
            }),
        );
        let diag = camera.half_diagonal();
        camera.scale = Vec2::new(diag, diag);
        camera
    }

    fn grid_lines(rows: usize, cols: usize) -> Vec<LineWithPoints> {
        let corners = pixel_grid(rows, cols, Vec2::new(140.0, 140.0), 80.0);
        let mut lines = Vec::new();
        for i in 0..rows {
            let mut line = LineWithPoints::new(true, 0, i);
            line.points = (0..cols).map(|j| corners[i * cols + j]).collect();
            lines.push(line);
        }
        for jc in 0..cols {
            let mut line = LineWithPoints::new(false, 0, jc);
            line.points = (0..rows).map(|i| corners[i * cols + jc]).collect();
            lines.push(line);
        }
        lines
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let camera = test_camera();
        let lines = grid_lines(4, 5);
        let opts = EstimateOptions {
            lock_scale: true,
            lock_offset: false,
            lock_distortions: vec![false, false, true],
            lock_lines: false,
            solve: SolveOptions::default(),
        };
        let problem = LineFitProblem::new(&camera, &lines, &opts);
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

    #[test]
    fn apply_keeps_locked_blocks_at_base_values() {
        let camera = test_camera();
        let lines = grid_lines(3, 4);
        let opts = EstimateOptions {
            lock_scale: true,
            lock_offset: true,
            lock_distortions: vec![false, true, true],
            lock_lines: false,
            solve: SolveOptions::default(),
        };
        let problem = LineFitProblem::new(&camera, &lines, &opts);

        let mut x = problem.x0();
        for v in x.iter_mut() {
            *v += 0.5;
        }

        let mut cam_out = camera.clone();
        let mut lines_out = lines.clone();
        problem.apply(&x, &mut cam_out, &mut lines_out);

        let before = camera.distortion.params();
        let after = cam_out.distortion.params();
        assert!((after[0] - (before[0] + 0.5)).abs() < 1e-12);
        assert_eq!(after[1], before[1]);
        assert_eq!(after[2], before[2]);
        assert_eq!(cam_out.offset, camera.offset);
        assert!((lines_out[0].angle - (lines[0].angle + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn identity_distortion_on_straight_lines_has_zero_optimum() {
        let mut camera = test_camera();
        camera.distortion = Distortion::seeded(DistortionKind::RadialK3);
        camera.offset = Vec2::zeros();
        let mut lines = grid_lines(3, 12);
        // A horizontal line y = d is (angle = π/2, dist = d).
        for (i, line) in lines.iter_mut().take(3).enumerate() {
            line.angle = std::f64::consts::FRAC_PI_2;
            line.dist = 140.0 + 80.0 * i as Real;
        }
        for (j, line) in lines.iter_mut().skip(3).enumerate() {
            line.angle = 0.0;
            line.dist = 140.0 + 80.0 * j as Real;
        }

        let opts = EstimateOptions {
            lock_scale: true,
            lock_offset: true,
            lock_distortions: vec![true, true, true],
            lock_lines: false,
            solve: SolveOptions::default(),
        };
        let problem = LineFitProblem::new(&camera, &lines, &opts);
        let r = problem.residuals(&problem.x0());
        assert!(r.amax() < 1e-9, "max residual {}", r.amax());
    }
}
