//! Polynomial radial distortion models.

use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

use crate::math::{Mat2, Real, Vec2};

/// Single-coefficient radial distortion.
///
/// `distort(p) = p * (1 + k1 * r²)` with `r² = x² + y²`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RadialK1 {
    pub k1: Real,
}

impl RadialK1 {
    pub const NUM_PARAMS: usize = 1;

    pub fn params(&self) -> [Real; 1] {
        [self.k1]
    }

    pub fn set_params(&mut self, p: &[Real]) {
        assert_eq!(p.len(), Self::NUM_PARAMS);
        self.k1 = p[0];
    }

    pub fn distort(&self, p: &Vec2) -> Vec2 {
        let r2 = p.norm_squared();
        p * (1.0 + self.k1 * r2)
    }

    pub fn jacobian_params(&self, p: &Vec2) -> SMatrix<Real, 2, 1> {
        let r2 = p.norm_squared();
        SMatrix::<Real, 2, 1>::new(p.x * r2, p.y * r2)
    }

    pub fn jacobian_point(&self, p: &Vec2) -> Mat2 {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let cross = 2.0 * self.k1 * x * y;
        Mat2::new(
            1.0 + self.k1 * (r2 + 2.0 * x * x),
            cross,
            cross,
            1.0 + self.k1 * (r2 + 2.0 * y * y),
        )
    }
}

/// Three-coefficient radial distortion.
///
/// `distort(p) = p * (1 + k1 r² + k2 r⁴ + k3 r⁶)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RadialK3 {
    pub k1: Real,
    pub k2: Real,
    pub k3: Real,
}

impl RadialK3 {
    pub const NUM_PARAMS: usize = 3;

    pub fn params(&self) -> [Real; 3] {
        [self.k1, self.k2, self.k3]
    }

    pub fn set_params(&mut self, p: &[Real]) {
        assert_eq!(p.len(), Self::NUM_PARAMS);
        self.k1 = p[0];
        self.k2 = p[1];
        self.k3 = p[2];
    }

    pub fn distort(&self, p: &Vec2) -> Vec2 {
        let r2 = p.norm_squared();
        let r4 = r2 * r2;
        p * (1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r4 * r2)
    }

    pub fn jacobian_params(&self, p: &Vec2) -> SMatrix<Real, 2, 3> {
        let r2 = p.norm_squared();
        let r4 = r2 * r2;
        let r6 = r4 * r2;
        SMatrix::<Real, 2, 3>::new(
            p.x * r2, p.x * r4, p.x * r6, //
            p.y * r2, p.y * r4, p.y * r6,
        )
    }

    pub fn jacobian_point(&self, p: &Vec2) -> Mat2 {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let d = 1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r4 * r2;
        // g = d(d)/d(r²)
        let g = self.k1 + 2.0 * self.k2 * r2 + 3.0 * self.k3 * r4;
        Mat2::new(
            d + 2.0 * g * x * x,
            2.0 * g * x * y,
            2.0 * g * x * y,
            d + 2.0 * g * y * y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{check_jacobian_params, check_jacobian_point};
    use crate::Distortion;

    #[test]
    fn radial_k1_zero_is_identity() {
        let d = RadialK1::default();
        let p = Vec2::new(0.3, -0.2);
        assert_eq!(d.distort(&p), p);
    }

    #[test]
    fn radial_k1_jacobians_match_finite_differences() {
        let d = Distortion::RadialK1(RadialK1 { k1: 0.12 });
        let p = Vec2::new(0.4, -0.25);
        check_jacobian_params(&d, &p);
        check_jacobian_point(&d, &p);
    }

    #[test]
    fn radial_k3_jacobians_match_finite_differences() {
        let d = Distortion::RadialK3(RadialK3 {
            k1: -0.08,
            k2: 0.015,
            k3: -0.002,
        });
        let p = Vec2::new(-0.35, 0.5);
        check_jacobian_params(&d, &p);
        check_jacobian_point(&d, &p);
    }

    #[test]
    fn radial_k3_undistort_inverts_distort() {
        let d = Distortion::RadialK3(RadialK3 {
            k1: 0.1,
            k2: -0.02,
            k3: 0.003,
        });
        let p = Vec2::new(0.45, -0.3);
        let q = d.distort(&p);
        let back = d.undistort(&q);
        assert!((back - p).norm() < 1e-10, "roundtrip error: {:?}", back - p);
    }
}
