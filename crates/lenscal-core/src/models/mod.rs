pub mod camera;
pub mod distortion;
pub mod radial;
pub mod three_de;

pub use camera::*;
pub use distortion::*;
pub use radial::*;
pub use three_de::*;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::math::{Real, Vec2};
    use crate::models::Distortion;

    const EPS: Real = 1e-7;
    const TOL: Real = 1e-5;

    /// Compare the analytic parameter Jacobian against central differences.
    pub fn check_jacobian_params(model: &Distortion, p: &Vec2) {
        let analytic = model.jacobian_params(p);
        let params = model.params();
        for i in 0..params.len() {
            let mut plus = params.clone();
            let mut minus = params.clone();
            plus[i] += EPS;
            minus[i] -= EPS;
            let mut m_plus = *model;
            let mut m_minus = *model;
            m_plus.set_params(&plus);
            m_minus.set_params(&minus);
            let numeric = (m_plus.distort(p) - m_minus.distort(p)) / (2.0 * EPS);
            for row in 0..2 {
                assert!(
                    (analytic[(row, i)] - numeric[row]).abs() < TOL,
                    "param {i} row {row}: analytic {} vs numeric {}",
                    analytic[(row, i)],
                    numeric[row]
                );
            }
        }
    }

    /// Compare the analytic point Jacobian against central differences.
    pub fn check_jacobian_point(model: &Distortion, p: &Vec2) {
        let analytic = model.jacobian_point(p);
        for col in 0..2 {
            let mut dp = Vec2::zeros();
            dp[col] = EPS;
            let numeric = (model.distort(&(p + dp)) - model.distort(&(p - dp))) / (2.0 * EPS);
            for row in 0..2 {
                assert!(
                    (analytic[(row, col)] - numeric[row]).abs() < TOL,
                    "point col {col} row {row}: analytic {} vs numeric {}",
                    analytic[(row, col)],
                    numeric[row]
                );
            }
        }
    }
}
