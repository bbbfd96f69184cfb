//! Core math and data types for `lenscal`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec2`, ...),
//! - the pinhole camera with principal-point offset and pixel scale,
//! - the five parametric distortion families (`Distortion`),
//! - observation types (`CheckerBoard`, `LineWithPoints`, `PointPair`),
//! - residual summary statistics.
//!
//! The estimation algorithms live in `lenscal-optim`, the per-intrinsic
//! pipeline and file formats in `lenscal-pipeline`.

/// Linear algebra type aliases.
pub mod math;
/// Camera and distortion models.
pub mod models;
/// Residual summary statistics.
pub mod stats;
/// Deterministic synthetic data helpers for tests.
pub mod synthetic;
/// Observation data types.
pub mod types;

pub use math::*;
pub use models::*;
pub use stats::*;
pub use types::*;
