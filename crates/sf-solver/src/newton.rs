//! Newton update for the fully coupled system.

use crate::error::{SolverError, SolverResult};
use crate::jacobian::finite_difference_jacobian;
use nalgebra::DVector;
use sf_core::timing::{self, Stage};

/// Relative perturbation used for the finite-difference Jacobian.
pub const JACOBIAN_EPSILON: f64 = 1e-7;

/// One Newton direction.
pub struct NewtonStep {
    /// Solution of `J dx = -F(x)`.
    pub dx: DVector<f64>,
    /// `||F(x)||` at the linearization point.
    pub residual_norm: f64,
}

/// Compute the Newton direction of `residual_fn` at `x`.
pub fn newton_direction<F>(x: &DVector<f64>, residual_fn: F) -> SolverResult<NewtonStep>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let r = residual_fn(x)?;
    if r.len() != x.len() {
        return Err(SolverError::ProblemSetup {
            what: format!("Residual has {} entries for {} unknowns", r.len(), x.len()),
        });
    }
    let residual_norm = r.norm();
    if !residual_norm.is_finite() {
        return Err(SolverError::NonFinite {
            what: "Newton residual".to_string(),
        });
    }

    let jac = timing::timed(Stage::Jacobian, || {
        finite_difference_jacobian(x, &r, &residual_fn, JACOBIAN_EPSILON)
    })?;

    let dx = timing::timed(Stage::LinearSolve, || jac.lu().solve(&(-r))).ok_or_else(|| {
        SolverError::SingularSystem {
            what: "Jacobian solve failed".to_string(),
        }
    })?;
    if !dx.iter().all(|v| v.is_finite()) {
        return Err(SolverError::NonFinite {
            what: "Newton direction".to_string(),
        });
    }

    Ok(NewtonStep { dx, residual_norm })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_quadratic() {
        // Solve x^2 - 4 = 0 from x = 3
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0] - 4.0))
        };

        let mut x = DVector::from_element(1, 3.0);
        for _ in 0..10 {
            let step = newton_direction(&x, residual).unwrap();
            x += step.dx;
        }
        assert!((x[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn non_finite_residual_reported() {
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0].ln()))
        };
        let x = DVector::from_element(1, -1.0);
        assert!(matches!(
            newton_direction(&x, residual),
            Err(SolverError::NonFinite { .. })
        ));
    }

    #[test]
    fn singular_jacobian_reported() {
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_vec(vec![x[0] + x[1] - 1.0, 2.0 * x[0] + 2.0 * x[1]]))
        };
        let x = DVector::from_vec(vec![0.0, 0.0]);
        assert!(matches!(
            newton_direction(&x, residual),
            Err(SolverError::SingularSystem { .. })
        ));
    }
}
