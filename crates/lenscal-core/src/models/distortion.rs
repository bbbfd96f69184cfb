//! The distortion model family as a tagged variant.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::math::{Mat2, Real, Vec2};
use crate::models::{Anamorphic4, ClassicLd, Radial4, RadialK1, RadialK3};

/// Identifies a distortion model family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistortionKind {
    RadialK1,
    RadialK3,
    Radial4,
    Anamorphic4,
    ClassicLd,
}

/// A parametric image-plane distortion map.
///
/// `distort` is the closed-form polynomial map of the family; `undistort`
/// inverts it by Newton iteration. Both operate on normalized camera-plane
/// coordinates. During calibration the closed form is fitted so that it
/// straightens observed corners, i.e. the estimated parameter vector
/// describes the map in the reverse of its nominal direction; the inversion
/// stage of the pipeline refits the family the other way around.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Distortion {
    RadialK1(RadialK1),
    RadialK3(RadialK3),
    Radial4(Radial4),
    Anamorphic4(Anamorphic4),
    ClassicLd(ClassicLd),
}

const UNDISTORT_ITERS: usize = 32;
const UNDISTORT_TOL: Real = 1e-24;

impl Distortion {
    /// The family seed: identity map for every family.
    pub fn seeded(kind: DistortionKind) -> Self {
        match kind {
            DistortionKind::RadialK1 => Self::RadialK1(RadialK1::default()),
            DistortionKind::RadialK3 => Self::RadialK3(RadialK3::default()),
            DistortionKind::Radial4 => Self::Radial4(Radial4::default()),
            DistortionKind::Anamorphic4 => Self::Anamorphic4(Anamorphic4::default()),
            DistortionKind::ClassicLd => Self::ClassicLd(ClassicLd::default()),
        }
    }

    /// Build a model from a raw parameter vector; `None` on arity mismatch.
    pub fn from_params(kind: DistortionKind, params: &[Real]) -> Option<Self> {
        let mut model = Self::seeded(kind);
        if params.len() != model.num_params() {
            return None;
        }
        model.set_params(params);
        Some(model)
    }

    pub fn kind(&self) -> DistortionKind {
        match self {
            Self::RadialK1(_) => DistortionKind::RadialK1,
            Self::RadialK3(_) => DistortionKind::RadialK3,
            Self::Radial4(_) => DistortionKind::Radial4,
            Self::Anamorphic4(_) => DistortionKind::Anamorphic4,
            Self::ClassicLd(_) => DistortionKind::ClassicLd,
        }
    }

    pub fn num_params(&self) -> usize {
        match self {
            Self::RadialK1(_) => RadialK1::NUM_PARAMS,
            Self::RadialK3(_) => RadialK3::NUM_PARAMS,
            Self::Radial4(_) => Radial4::NUM_PARAMS,
            Self::Anamorphic4(_) => Anamorphic4::NUM_PARAMS,
            Self::ClassicLd(_) => ClassicLd::NUM_PARAMS,
        }
    }

    pub fn params(&self) -> Vec<Real> {
        match self {
            Self::RadialK1(m) => m.params().to_vec(),
            Self::RadialK3(m) => m.params().to_vec(),
            Self::Radial4(m) => m.params().to_vec(),
            Self::Anamorphic4(m) => m.params().to_vec(),
            Self::ClassicLd(m) => m.params().to_vec(),
        }
    }

    pub fn set_params(&mut self, p: &[Real]) {
        match self {
            Self::RadialK1(m) => m.set_params(p),
            Self::RadialK3(m) => m.set_params(p),
            Self::Radial4(m) => m.set_params(p),
            Self::Anamorphic4(m) => m.set_params(p),
            Self::ClassicLd(m) => m.set_params(p),
        }
    }

    /// Closed-form map of the family.
    pub fn distort(&self, p: &Vec2) -> Vec2 {
        match self {
            Self::RadialK1(m) => m.distort(p),
            Self::RadialK3(m) => m.distort(p),
            Self::Radial4(m) => m.distort(p),
            Self::Anamorphic4(m) => m.distort(p),
            Self::ClassicLd(m) => m.distort(p),
        }
    }

    /// Inverse of [`Self::distort`] by Newton iteration, seeded at `p`.
    pub fn undistort(&self, p: &Vec2) -> Vec2 {
        let mut q = *p;
        for _ in 0..UNDISTORT_ITERS {
            let f = self.distort(&q) - p;
            if f.norm_squared() < UNDISTORT_TOL {
                break;
            }
            let Some(j_inv) = self.jacobian_point(&q).try_inverse() else {
                break;
            };
            q -= j_inv * f;
        }
        q
    }

    /// Jacobian of the closed form with respect to the parameter vector.
    pub fn jacobian_params(&self, p: &Vec2) -> DMatrix<Real> {
        let n = self.num_params();
        match self {
            Self::RadialK1(m) => to_dynamic(&m.jacobian_params(p), n),
            Self::RadialK3(m) => to_dynamic(&m.jacobian_params(p), n),
            Self::Radial4(m) => to_dynamic(&m.jacobian_params(p), n),
            Self::Anamorphic4(m) => to_dynamic(&m.jacobian_params(p), n),
            Self::ClassicLd(m) => to_dynamic(&m.jacobian_params(p), n),
        }
    }

    /// Jacobian of the closed form with respect to the input point.
    pub fn jacobian_point(&self, p: &Vec2) -> Mat2 {
        match self {
            Self::RadialK1(m) => m.jacobian_point(p),
            Self::RadialK3(m) => m.jacobian_point(p),
            Self::Radial4(m) => m.jacobian_point(p),
            Self::Anamorphic4(m) => m.jacobian_point(p),
            Self::ClassicLd(m) => m.jacobian_point(p),
        }
    }
}

fn to_dynamic<const N: usize>(j: &nalgebra::SMatrix<Real, 2, N>, n: usize) -> DMatrix<Real> {
    DMatrix::from_iterator(2, n, j.iter().copied())
}
