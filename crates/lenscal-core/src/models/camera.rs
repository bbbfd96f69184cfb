//! Pinhole camera with a parametric distortion model.

use crate::math::{Real, Vec2};
use crate::models::Distortion;

/// Pinhole camera: sensor size, per-axis pixel scale, principal-point offset
/// relative to the image center, and a distortion model.
///
/// The distortion operates on camera-plane coordinates
/// `z = (p - center - offset) / scale`; pixel maps compose the distortion
/// with this normalization and its inverse.
#[derive(Clone, Debug, PartialEq)]
pub struct PinholeCamera {
    pub width: u32,
    pub height: u32,
    pub scale: Vec2,
    pub offset: Vec2,
    pub distortion: Distortion,
}

impl PinholeCamera {
    pub fn new(width: u32, height: u32, scale: Vec2, offset: Vec2, distortion: Distortion) -> Self {
        Self {
            width,
            height,
            scale,
            offset,
            distortion,
        }
    }

    /// Image center plus the principal-point offset, in pixels.
    pub fn principal_point(&self) -> Vec2 {
        Vec2::new(
            0.5 * self.width as Real + self.offset.x,
            0.5 * self.height as Real + self.offset.y,
        )
    }

    /// Half-diagonal of the sensor, used to normalize radii before fitting.
    pub fn half_diagonal(&self) -> Real {
        let hw = 0.5 * self.width as Real;
        let hh = 0.5 * self.height as Real;
        (hw * hw + hh * hh).sqrt()
    }

    pub fn pixel_to_cam(&self, p: &Vec2) -> Vec2 {
        (p - self.principal_point()).component_div(&self.scale)
    }

    pub fn cam_to_pixel(&self, z: &Vec2) -> Vec2 {
        z.component_mul(&self.scale) + self.principal_point()
    }

    /// Apply the distortion closed form in pixel coordinates.
    pub fn distort_pixel(&self, p: &Vec2) -> Vec2 {
        self.cam_to_pixel(&self.distortion.distort(&self.pixel_to_cam(p)))
    }

    /// Apply the Newton inverse of the closed form in pixel coordinates.
    pub fn undistort_pixel(&self, p: &Vec2) -> Vec2 {
        self.cam_to_pixel(&self.distortion.undistort(&self.pixel_to_cam(p)))
    }
}
