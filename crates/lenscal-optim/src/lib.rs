//! Nonlinear least-squares estimation of lens distortion parameters.
//!
//! Two residual modes drive the same Levenberg-Marquardt driver
//! ([`minimize`]):
//!
//! - **Line mode** ([`estimate_lines`]): for every corner of every
//!   [`lenscal_core::LineWithPoints`], the signed distance of the
//!   distortion-mapped corner to the line `(angle, dist)`. Free parameters
//!   are the distortion vector, optionally the principal-point offset, and
//!   the per-line `(angle, dist)` pairs.
//! - **Point-pair mode** ([`estimate_point_pairs`]): the 2D difference
//!   between the mapped `undistorted` point of a
//!   [`lenscal_core::PointPair`] and its `distorted` target. Used to refit
//!   the family in the opposite direction.
//!
//! Any parameter block can be frozen through [`EstimateOptions`];
//! [`schedule`] provides the per-model staged unlock tables and the driver
//! that runs them.

pub mod estimate;
mod layout;
pub mod line_fit;
pub mod point_fit;
pub mod problem;
pub mod schedule;

pub use estimate::{estimate_lines, estimate_point_pairs, EstimateOptions};
pub use problem::{minimize, NllsProblem, SolveOptions, SolveReport};
pub use schedule::{
    model_schedule, run_schedule_lines, run_schedule_point_pairs, ModelSchedule, Stage,
};
