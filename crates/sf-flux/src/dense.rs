//! Dense local solve.

use nalgebra::{DMatrix, DVector};

use crate::error::{FluxError, FluxResult};

/// Solve `m x = b` through nalgebra's LU with partial pivoting.
///
/// A pivot of `U` with magnitude `<= n * EPS * max|m_ij|` is treated as zero
/// and the system is reported singular. There is no regularized fallback.
pub fn solve_dense(m: &DMatrix<f64>, b: &DVector<f64>) -> FluxResult<DVector<f64>> {
    let n = m.nrows();
    if m.ncols() != n {
        return Err(FluxError::DimensionMismatch {
            expected: n,
            actual: m.ncols(),
        });
    }
    if b.len() != n {
        return Err(FluxError::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }
    if n == 0 {
        return Ok(DVector::zeros(0));
    }

    let scale = m.amax();
    if !(scale.is_finite() && scale > 0.0) {
        return Err(FluxError::SingularSystem { cell: None });
    }
    let tol = n as f64 * f64::EPSILON * scale;

    let lu = m.clone().lu();
    if lu.u().diagonal().iter().any(|pivot| pivot.abs() <= tol) {
        return Err(FluxError::SingularSystem { cell: None });
    }
    lu.solve(b).ok_or(FluxError::SingularSystem { cell: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn solves_permuted_system() {
        let m = DMatrix::from_row_slice(3, 3, &[0.0, 2.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 4.0]);
        let b = DVector::from_vec(vec![4.0, 3.0, 8.0]);
        let x = solve_dense(&m, &b).unwrap();
        assert_eq!(x.as_slice(), &[3.0, 2.0, 2.0]);
    }

    #[test]
    fn rank_deficient_is_singular() {
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 0.0]);
        let b = DVector::from_vec(vec![1.0, 0.0]);
        assert_eq!(
            solve_dense(&m, &b),
            Err(FluxError::SingularSystem { cell: None })
        );

        let zero = DMatrix::zeros(3, 3);
        assert!(solve_dense(&zero, &DVector::zeros(3)).is_err());
    }

    #[test]
    fn nearly_dependent_rows_are_singular() {
        // rows differ by one ulp, below the relative pivot tolerance
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0 + f64::EPSILON]);
        let b = DVector::from_vec(vec![1.0, 2.0]);
        assert_eq!(
            solve_dense(&m, &b),
            Err(FluxError::SingularSystem { cell: None })
        );
    }

    #[test]
    fn shape_checked() {
        let m = DMatrix::<f64>::identity(2, 2);
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(
            solve_dense(&m, &b),
            Err(FluxError::DimensionMismatch { expected: 2, actual: 3 })
        );
    }

    proptest! {
        #[test]
        fn diagonally_dominant_systems_solve(
            entries in prop::collection::vec(-1.0..1.0_f64, 9),
            rhs in prop::collection::vec(-10.0..10.0_f64, 3),
        ) {
            let mut m = DMatrix::from_row_slice(3, 3, &entries);
            for i in 0..3 {
                m[(i, i)] += 4.0;
            }
            let b = DVector::from_vec(rhs);
            let x = solve_dense(&m, &b).unwrap();
            let r = &m * &x - &b;
            prop_assert!(r.amax() < 1e-12);
        }
    }
}
