//! Nonlinear least-squares problem interface and the Levenberg-Marquardt
//! driver.
//!
//! Both residual engines implement [`NllsProblem`] over their free parameter
//! vector; [`minimize`] hands such a problem to the `levenberg-marquardt`
//! crate and translates its report.

use lenscal_core::Real;
use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{storage::Owned, DMatrix, DVector, Dyn};

/// Dense nonlinear least-squares problem over a free parameter vector.
pub trait NllsProblem {
    fn residuals(&self, x: &DVector<Real>) -> DVector<Real>;
    fn jacobian(&self, x: &DVector<Real>) -> DMatrix<Real>;
}

/// Solver options.
///
/// The defaults encode the staged-fit stopping rule: stop when the relative
/// cost decrease drops below `1e-10` or after 100 iterations.
#[derive(Debug, Clone)]
pub struct SolveOptions {
    pub ftol: Real,
    pub gtol: Real,
    pub max_iters: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            ftol: 1e-10,
            gtol: 1e-12,
            max_iters: 100,
        }
    }
}

/// Outcome of a [`minimize`] call.
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Number of residual evaluations spent by the solver.
    pub evaluations: usize,
    pub final_cost: Real,
    pub converged: bool,
}

/// Adapter owning the free parameter vector while the solver iterates on it.
struct FreeVector<'a, P> {
    x: DVector<Real>,
    problem: &'a P,
}

impl<P: NllsProblem> LeastSquaresProblem<Real, Dyn, Dyn> for FreeVector<'_, P> {
    type ParameterStorage = Owned<Real, Dyn>;
    type ResidualStorage = Owned<Real, Dyn>;
    type JacobianStorage = Owned<Real, Dyn, Dyn>;

    fn set_params(&mut self, x: &DVector<Real>) {
        self.x.copy_from(x);
    }

    fn params(&self) -> DVector<Real> {
        self.x.clone()
    }

    fn residuals(&self) -> Option<DVector<Real>> {
        Some(self.problem.residuals(&self.x))
    }

    fn jacobian(&self) -> Option<DMatrix<Real>> {
        Some(self.problem.jacobian(&self.x))
    }
}

/// Minimize `problem` from `x0` with Levenberg-Marquardt.
pub fn minimize<P: NllsProblem>(
    problem: &P,
    x0: DVector<Real>,
    opts: &SolveOptions,
) -> (DVector<Real>, SolveReport) {
    let driver = LevenbergMarquardt::new()
        .with_patience(opts.max_iters.max(1))
        .with_ftol(opts.ftol)
        .with_xtol(opts.ftol)
        .with_gtol(opts.gtol);

    let (state, report) = driver.minimize(FreeVector { x: x0, problem });

    let solve_report = SolveReport {
        evaluations: report.number_of_evaluations,
        final_cost: report.objective_function,
        converged: report.termination.was_successful(),
    };
    (state.x, solve_report)
}
