//! 3DEqualizer distortion model families.
//!
//! Parameter counts, seed values and lock schedules for these families are
//! fixed by the calibration pipeline; the closed forms follow the published
//! 3DE formulations:
//!
//! - [`Radial4`] — "Radial - Standard, Degree 4": radial terms `c2`, `c4`
//!   plus degree-2 (`u1`, `v1`) and degree-4 (`u3`, `v3`) decentering.
//! - [`Anamorphic4`] — "Anamorphic - Standard, Degree 4": per-axis polynomials
//!   in the `cos 2φ` / `cos 4φ` harmonics expressed in a lens frame rotated by
//!   `phi`, followed by the squeezes `sqx`/`sqy` and the anamorphic pixel
//!   scale `ps`.
//! - [`ClassicLd`] — "Classic LD Model": degree-2 cylindric plus degree-4
//!   radial distortion with an anamorphic squeeze parameterized as
//!   `sq = sin(squeeze)`, so the seed `squeeze = π/2` is the identity.

use std::f64::consts::FRAC_PI_2;

use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

use crate::math::{Mat2, Real, Vec2};

/// 3DE radial distortion of degree 4 with decentering terms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Radial4 {
    pub c2: Real,
    pub c4: Real,
    pub u1: Real,
    pub v1: Real,
    pub u3: Real,
    pub v3: Real,
}

impl Radial4 {
    pub const NUM_PARAMS: usize = 6;

    pub fn params(&self) -> [Real; 6] {
        [self.c2, self.c4, self.u1, self.v1, self.u3, self.v3]
    }

    pub fn set_params(&mut self, p: &[Real]) {
        assert_eq!(p.len(), Self::NUM_PARAMS);
        self.c2 = p[0];
        self.c4 = p[1];
        self.u1 = p[2];
        self.v1 = p[3];
        self.u3 = p[4];
        self.v3 = p[5];
    }

    pub fn distort(&self, p: &Vec2) -> Vec2 {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let d = 1.0 + self.c2 * r2 + self.c4 * r4;
        let tx1 = self.u1 * (r2 + 2.0 * x * x) + 2.0 * self.v1 * x * y;
        let ty1 = self.v1 * (r2 + 2.0 * y * y) + 2.0 * self.u1 * x * y;
        let tx3 = self.u3 * (r2 + 2.0 * x * x) + 2.0 * self.v3 * x * y;
        let ty3 = self.v3 * (r2 + 2.0 * y * y) + 2.0 * self.u3 * x * y;
        Vec2::new(x * d + tx1 + tx3 * r2, y * d + ty1 + ty3 * r2)
    }

    pub fn jacobian_params(&self, p: &Vec2) -> SMatrix<Real, 2, 6> {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let xx2 = r2 + 2.0 * x * x;
        let yy2 = r2 + 2.0 * y * y;
        let xy2 = 2.0 * x * y;
        SMatrix::<Real, 2, 6>::new(
            x * r2, x * r4, xx2, xy2, xx2 * r2, xy2 * r2, //
            y * r2, y * r4, xy2, yy2, xy2 * r2, yy2 * r2,
        )
    }

    pub fn jacobian_point(&self, p: &Vec2) -> Mat2 {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let d = 1.0 + self.c2 * r2 + self.c4 * r4;
        let g = self.c2 + 2.0 * self.c4 * r2;
        let tx3 = self.u3 * (r2 + 2.0 * x * x) + 2.0 * self.v3 * x * y;
        let ty3 = self.v3 * (r2 + 2.0 * y * y) + 2.0 * self.u3 * x * y;

        let a11 = d
            + 2.0 * g * x * x
            + 6.0 * self.u1 * x
            + 2.0 * self.v1 * y
            + (6.0 * self.u3 * x + 2.0 * self.v3 * y) * r2
            + 2.0 * x * tx3;
        let a12 = 2.0 * g * x * y
            + 2.0 * self.u1 * y
            + 2.0 * self.v1 * x
            + (2.0 * self.u3 * y + 2.0 * self.v3 * x) * r2
            + 2.0 * y * tx3;
        let a21 = 2.0 * g * x * y
            + 2.0 * self.v1 * x
            + 2.0 * self.u1 * y
            + (2.0 * self.v3 * x + 2.0 * self.u3 * y) * r2
            + 2.0 * x * ty3;
        let a22 = d
            + 2.0 * g * y * y
            + 6.0 * self.v1 * y
            + 2.0 * self.u1 * x
            + (6.0 * self.v3 * y + 2.0 * self.u3 * x) * r2
            + 2.0 * y * ty3;
        Mat2::new(a11, a12, a21, a22)
    }
}

/// 3DE anamorphic distortion of degree 4.
///
/// Layout: ten polynomial coefficients (`cx02..cy44`), the lens rotation
/// `phi`, the squeezes `sqx`/`sqy` and the anamorphic pixel scale `ps`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anamorphic4 {
    pub cx02: Real,
    pub cy02: Real,
    pub cx22: Real,
    pub cy22: Real,
    pub cx04: Real,
    pub cy04: Real,
    pub cx24: Real,
    pub cy24: Real,
    pub cx44: Real,
    pub cy44: Real,
    pub phi: Real,
    pub sqx: Real,
    pub sqy: Real,
    pub ps: Real,
}

impl Default for Anamorphic4 {
    fn default() -> Self {
        Self {
            cx02: 0.0,
            cy02: 0.0,
            cx22: 0.0,
            cy22: 0.0,
            cx04: 0.0,
            cy04: 0.0,
            cx24: 0.0,
            cy24: 0.0,
            cx44: 0.0,
            cy44: 0.0,
            phi: 0.0,
            sqx: 1.0,
            sqy: 1.0,
            ps: 1.0,
        }
    }
}

/// Intermediate quantities of the anamorphic evaluation in the lens frame.
struct AnamorphicFrame {
    c: Real,
    s: Real,
    xr: Real,
    yr: Real,
    r2: Real,
    c2h: Real,
    /// Basis `[r², r²cos2φ, r⁴, r⁴cos2φ, r⁴cos4φ]` in Cartesian form.
    basis: [Real; 5],
    px: Real,
    py: Real,
    xd: Real,
    yd: Real,
}

impl Anamorphic4 {
    pub const NUM_PARAMS: usize = 14;

    pub fn params(&self) -> [Real; 14] {
        [
            self.cx02, self.cy02, self.cx22, self.cy22, self.cx04, self.cy04, self.cx24, self.cy24,
            self.cx44, self.cy44, self.phi, self.sqx, self.sqy, self.ps,
        ]
    }

    pub fn set_params(&mut self, p: &[Real]) {
        assert_eq!(p.len(), Self::NUM_PARAMS);
        self.cx02 = p[0];
        self.cy02 = p[1];
        self.cx22 = p[2];
        self.cy22 = p[3];
        self.cx04 = p[4];
        self.cy04 = p[5];
        self.cx24 = p[6];
        self.cy24 = p[7];
        self.cx44 = p[8];
        self.cy44 = p[9];
        self.phi = p[10];
        self.sqx = p[11];
        self.sqy = p[12];
        self.ps = p[13];
    }

    fn frame(&self, p: &Vec2) -> AnamorphicFrame {
        let (c, s) = (self.phi.cos(), self.phi.sin());
        let xr = c * p.x + s * p.y;
        let yr = -s * p.x + c * p.y;
        let r2 = xr * xr + yr * yr;
        let r4 = r2 * r2;
        let c2h = xr * xr - yr * yr;
        let basis = [r2, c2h, r4, r2 * c2h, 2.0 * c2h * c2h - r4];
        let px = 1.0
            + self.cx02 * basis[0]
            + self.cx22 * basis[1]
            + self.cx04 * basis[2]
            + self.cx24 * basis[3]
            + self.cx44 * basis[4];
        let py = 1.0
            + self.cy02 * basis[0]
            + self.cy22 * basis[1]
            + self.cy04 * basis[2]
            + self.cy24 * basis[3]
            + self.cy44 * basis[4];
        AnamorphicFrame {
            c,
            s,
            xr,
            yr,
            r2,
            c2h,
            basis,
            px,
            py,
            xd: xr * px,
            yd: yr * py,
        }
    }

    pub fn distort(&self, p: &Vec2) -> Vec2 {
        let f = self.frame(p);
        let xs = self.sqx * f.xd;
        let ys = self.sqy * f.yd;
        Vec2::new(f.c * xs - f.s * ys, self.ps * (f.s * xs + f.c * ys))
    }

    pub fn jacobian_params(&self, p: &Vec2) -> SMatrix<Real, 2, 14> {
        let f = self.frame(p);
        let xs = self.sqx * f.xd;
        let ys = self.sqy * f.yd;
        let mut j = SMatrix::<Real, 2, 14>::zeros();

        // Polynomial coefficients: columns 2m (x-axis) and 2m+1 (y-axis).
        for (m, b) in f.basis.iter().enumerate() {
            let dx = self.sqx * f.xr * b;
            let dy = self.sqy * f.yr * b;
            j[(0, 2 * m)] = f.c * dx;
            j[(1, 2 * m)] = self.ps * f.s * dx;
            j[(0, 2 * m + 1)] = -f.s * dy;
            j[(1, 2 * m + 1)] = self.ps * f.c * dy;
        }

        // Lens rotation: d(xr)/dφ = yr, d(yr)/dφ = -xr; r² is invariant.
        let dc2h = 4.0 * f.xr * f.yr;
        let dpx = (self.cx22 + self.cx24 * f.r2 + 4.0 * self.cx44 * f.c2h) * dc2h;
        let dpy = (self.cy22 + self.cy24 * f.r2 + 4.0 * self.cy44 * f.c2h) * dc2h;
        let dxd = f.yr * f.px + f.xr * dpx;
        let dyd = -f.xr * f.py + f.yr * dpy;
        let dxs = self.sqx * dxd;
        let dys = self.sqy * dyd;
        j[(0, 10)] = -f.s * xs - f.c * ys + f.c * dxs - f.s * dys;
        j[(1, 10)] = self.ps * (f.c * xs - f.s * ys + f.s * dxs + f.c * dys);

        // Squeezes and pixel scale.
        j[(0, 11)] = f.c * f.xd;
        j[(1, 11)] = self.ps * f.s * f.xd;
        j[(0, 12)] = -f.s * f.yd;
        j[(1, 12)] = self.ps * f.c * f.yd;
        j[(1, 13)] = f.s * xs + f.c * ys;
        j
    }

    pub fn jacobian_point(&self, p: &Vec2) -> Mat2 {
        let f = self.frame(p);
        let dpx_dxr = 2.0
            * f.xr
            * (self.cx02
                + self.cx22
                + 2.0 * self.cx04 * f.r2
                + self.cx24 * (f.c2h + f.r2)
                + self.cx44 * (4.0 * f.c2h - 2.0 * f.r2));
        let dpx_dyr = 2.0
            * f.yr
            * (self.cx02 - self.cx22 + 2.0 * self.cx04 * f.r2 + self.cx24 * (f.c2h - f.r2)
                - self.cx44 * (4.0 * f.c2h + 2.0 * f.r2));
        let dpy_dxr = 2.0
            * f.xr
            * (self.cy02
                + self.cy22
                + 2.0 * self.cy04 * f.r2
                + self.cy24 * (f.c2h + f.r2)
                + self.cy44 * (4.0 * f.c2h - 2.0 * f.r2));
        let dpy_dyr = 2.0
            * f.yr
            * (self.cy02 - self.cy22 + 2.0 * self.cy04 * f.r2 + self.cy24 * (f.c2h - f.r2)
                - self.cy44 * (4.0 * f.c2h + 2.0 * f.r2));

        let a = Mat2::new(
            f.px + f.xr * dpx_dxr,
            f.xr * dpx_dyr,
            f.yr * dpy_dxr,
            f.py + f.yr * dpy_dyr,
        );
        let to_lens = Mat2::new(f.c, f.s, -f.s, f.c);
        let from_lens = Mat2::new(f.c, -f.s, f.s, f.c);
        let squeeze = Mat2::new(self.sqx, 0.0, 0.0, self.sqy);
        let pixel = Mat2::new(1.0, 0.0, 0.0, self.ps);
        pixel * from_lens * squeeze * a * to_lens
    }
}

/// 3DE classic LD model.
///
/// The anamorphic squeeze is carried as the angle `squeeze` with
/// `sq = sin(squeeze)`; the seed `π/2` therefore leaves the map untouched.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassicLd {
    pub delta: Real,
    pub squeeze: Real,
    pub mux: Real,
    pub muy: Real,
    pub q: Real,
}

impl Default for ClassicLd {
    fn default() -> Self {
        Self {
            delta: 0.0,
            squeeze: FRAC_PI_2,
            mux: 0.0,
            muy: 0.0,
            q: 0.0,
        }
    }
}

impl ClassicLd {
    pub const NUM_PARAMS: usize = 5;

    pub fn params(&self) -> [Real; 5] {
        [self.delta, self.squeeze, self.mux, self.muy, self.q]
    }

    pub fn set_params(&mut self, p: &[Real]) {
        assert_eq!(p.len(), Self::NUM_PARAMS);
        self.delta = p[0];
        self.squeeze = p[1];
        self.mux = p[2];
        self.muy = p[3];
        self.q = p[4];
    }

    // The squeeze must stay invertible even if the optimizer wanders.
    fn sq(&self) -> Real {
        let sq = self.squeeze.sin();
        if sq.abs() < 1e-9 {
            1e-9
        } else {
            sq
        }
    }

    pub fn distort(&self, p: &Vec2) -> Vec2 {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let cxy = self.delta + self.mux;
        let cyx = self.delta + self.muy;
        let xd = x * (1.0 + self.delta * x * x + cxy * y * y + self.q * r4);
        let yd = y * (1.0 + cyx * x * x + self.delta * y * y + self.q * r4) / self.sq();
        Vec2::new(xd, yd)
    }

    pub fn jacobian_params(&self, p: &Vec2) -> SMatrix<Real, 2, 5> {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let sq = self.sq();
        let cyx = self.delta + self.muy;
        let yd_num = y * (1.0 + cyx * x * x + self.delta * y * y + self.q * r4);
        SMatrix::<Real, 2, 5>::new(
            x * r2,
            0.0,
            x * y * y,
            0.0,
            x * r4,
            y * r2 / sq,
            -yd_num * self.squeeze.cos() / (sq * sq),
            0.0,
            y * x * x / sq,
            y * r4 / sq,
        )
    }

    pub fn jacobian_point(&self, p: &Vec2) -> Mat2 {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let sq = self.sq();
        let cxy = self.delta + self.mux;
        let cyx = self.delta + self.muy;
        let a11 = 1.0 + 3.0 * self.delta * x * x + cxy * y * y + self.q * (r4 + 4.0 * x * x * r2);
        let a12 = x * (2.0 * cxy * y + 4.0 * self.q * r2 * y);
        let a21 = y * (2.0 * cyx * x + 4.0 * self.q * r2 * x) / sq;
        let a22 =
            (1.0 + cyx * x * x + 3.0 * self.delta * y * y + self.q * (r4 + 4.0 * y * y * r2)) / sq;
        Mat2::new(a11, a12, a21, a22)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{check_jacobian_params, check_jacobian_point};
    use crate::Distortion;

    #[test]
    fn radial4_jacobians_match_finite_differences() {
        let d = Distortion::Radial4(Radial4 {
            c2: 0.08,
            c4: -0.01,
            u1: 0.002,
            v1: -0.003,
            u3: 0.001,
            v3: 0.0015,
        });
        let p = Vec2::new(0.4, -0.3);
        check_jacobian_params(&d, &p);
        check_jacobian_point(&d, &p);
    }

    #[test]
    fn anamorphic4_default_is_identity() {
        let d = Anamorphic4::default();
        let p = Vec2::new(0.3, 0.7);
        assert!((d.distort(&p) - p).norm() < 1e-15);
    }

    #[test]
    fn anamorphic4_jacobians_match_finite_differences() {
        let d = Distortion::Anamorphic4(Anamorphic4 {
            cx02: 0.05,
            cy02: -0.04,
            cx22: 0.01,
            cy22: 0.02,
            cx04: -0.008,
            cy04: 0.006,
            cx24: 0.004,
            cy24: -0.005,
            cx44: 0.002,
            cy44: 0.001,
            phi: 0.2,
            sqx: 1.05,
            sqy: 0.95,
            ps: 1.1,
        });
        let p = Vec2::new(0.35, -0.45);
        check_jacobian_params(&d, &p);
        check_jacobian_point(&d, &p);
    }

    #[test]
    fn anamorphic4_undistort_inverts_distort() {
        let d = Distortion::Anamorphic4(Anamorphic4 {
            cx02: 0.06,
            cy02: -0.03,
            phi: 0.1,
            sqx: 1.02,
            ..Anamorphic4::default()
        });
        let p = Vec2::new(0.4, 0.25);
        let q = d.distort(&p);
        assert!((d.undistort(&q) - p).norm() < 1e-9);
    }

    #[test]
    fn classic_ld_seed_is_identity() {
        let d = ClassicLd::default();
        let p = Vec2::new(-0.6, 0.4);
        assert!((d.distort(&p) - p).norm() < 1e-15);
    }

    #[test]
    fn classic_ld_jacobians_match_finite_differences() {
        let d = Distortion::ClassicLd(ClassicLd {
            delta: 0.07,
            squeeze: 1.3,
            mux: 0.01,
            muy: -0.02,
            q: 0.004,
        });
        let p = Vec2::new(0.3, 0.45);
        check_jacobian_params(&d, &p);
        check_jacobian_point(&d, &p);
    }

    #[test]
    fn classic_ld_squeeze_scales_y() {
        let d = ClassicLd {
            squeeze: 0.5,
            ..ClassicLd::default()
        };
        let p = Vec2::new(0.2, 0.3);
        let q = d.distort(&p);
        assert!((q.x - p.x).abs() < 1e-15);
        assert!((q.y - p.y / 0.5_f64.sin()).abs() < 1e-12);
    }
}
