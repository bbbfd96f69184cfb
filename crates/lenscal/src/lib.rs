//! High-level entry crate for the `lenscal` toolbox.
//!
//! `lenscal` estimates parametric lens distortion from detected checkerboard
//! corners using a single geometric invariant: collinear world points stay
//! collinear under an ideal pinhole projection, so any bending observed in
//! the image is attributable to the lens. After the forward fit, the same
//! model family is refitted against samples of the fitted map to obtain an
//! undistorting approximation of comparable residual.
//!
//! ```ignore
//! use std::path::Path;
//! use lenscal::pipeline::run_distortion_calibration;
//!
//! let summary = run_distortion_calibration(
//!     Path::new("scene.json"),
//!     Path::new("checkerboards/"),
//!     Path::new("scene_calibrated.json"),
//! )?;
//! println!("calibrated {} intrinsics", summary.calibrated);
//! ```
//!
//! ## Module organization
//!
//! - **[`core`]**: math types, camera and the five distortion families
//! - **[`optim`]**: lock-aware Levenberg-Marquardt fits and the staged
//!   unlock schedules
//! - **[`pipeline`]**: scene/detector file formats and the per-intrinsic
//!   orchestration

/// Core math types, camera and distortion models.
pub mod core {
    pub use lenscal_core::*;
}

/// Nonlinear least-squares estimation and staged schedules.
pub mod optim {
    pub use lenscal_optim::*;
}

/// File formats and the per-intrinsic calibration pipeline.
pub mod pipeline {
    pub use lenscal_pipeline::*;
}

// Re-exports for common use.
pub use lenscal_core::{
    Distortion, DistortionKind, LineWithPoints, PinholeCamera, PointPair, Real, Statistics, Vec2,
};
pub use lenscal_optim::{model_schedule, EstimateOptions, SolveOptions};
pub use lenscal_pipeline::{
    calibrate_scene, run_distortion_calibration, CalibrationOptions, RunSummary, SceneData,
};
