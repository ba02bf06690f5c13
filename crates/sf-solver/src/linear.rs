//! Linear solve service.
//!
//! The driver only needs `solve(matrix, rhs) -> x` that either succeeds or
//! fails explicitly; the implementation is chosen from the configuration.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use sf_config::{LinearDef, LinearKind};

use crate::error::{SolverError, SolverResult};
use crate::system::matvec;

pub trait LinearSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> SolverResult<DVector<f64>>;
}

/// Build the solver described by the configuration.
pub fn solver_for(def: &LinearDef) -> Box<dyn LinearSolver> {
    match def.kind {
        LinearKind::DenseLu => Box::new(DenseLu),
        LinearKind::BiCgStab => Box::new(BiCgStab {
            max_iterations: def.max_iterations,
            tolerance: def.tolerance,
        }),
    }
}

fn check_shape(matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> SolverResult<()> {
    if matrix.nrows() != matrix.ncols() || matrix.nrows() != rhs.len() {
        return Err(SolverError::ProblemSetup {
            what: format!(
                "Linear system shape mismatch: {}x{} matrix, rhs of length {}",
                matrix.nrows(),
                matrix.ncols(),
                rhs.len()
            ),
        });
    }
    Ok(())
}

/// Direct solve through a dense LU factorization.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseLu;

impl LinearSolver for DenseLu {
    fn name(&self) -> &'static str {
        "dense-lu"
    }

    fn solve(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> SolverResult<DVector<f64>> {
        check_shape(matrix, rhs)?;
        let n = matrix.nrows();
        let mut dense = DMatrix::zeros(n, n);
        for (i, j, v) in matrix.triplet_iter() {
            dense[(i, j)] += *v;
        }
        let mut rhs = rhs.clone();
        balance_fixed_rows(&mut dense, &mut rhs);

        let x = dense
            .lu()
            .solve(&rhs)
            .ok_or_else(|| SolverError::SingularSystem {
                what: format!("LU factorization of {n}x{n} system has a zero pivot"),
            })?;

        if x.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NonFinite {
                what: format!("LU solution of {n}x{n} system"),
            });
        }
        Ok(x)
    }
}

/// Rescale rows that only fix their own unknown (`a_ii x_i = b_i`) to
/// `|a_ii| + Σ_r |a_ri|` over the rest of the column.
///
/// A unit Dirichlet row next to rows of much larger magnitude otherwise
/// wins no pivot search in its column, and the resulting row swaps smear the
/// large entries over unknowns that are many decades smaller. All other rows
/// are left as assembled.
fn balance_fixed_rows(dense: &mut DMatrix<f64>, rhs: &mut DVector<f64>) {
    let n = dense.nrows();
    for i in 0..n {
        let diag = dense[(i, i)].abs();
        if diag == 0.0 || (0..n).any(|j| j != i && dense[(i, j)] != 0.0) {
            continue;
        }
        let column: f64 = (0..n).filter(|&r| r != i).map(|r| dense[(r, i)].abs()).sum();
        if column > 0.0 {
            let scale = (diag + column) / diag;
            dense[(i, i)] *= scale;
            rhs[i] *= scale;
        }
    }
}

/// BiCGSTAB with a Jacobi (diagonal) preconditioner.
#[derive(Debug, Clone, Copy)]
pub struct BiCgStab {
    pub max_iterations: usize,
    /// Relative tolerance on `||b - Ax|| / ||b||`.
    pub tolerance: f64,
}

impl Default for BiCgStab {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-12,
        }
    }
}

const BREAKDOWN: f64 = 1e-300;

impl LinearSolver for BiCgStab {
    fn name(&self) -> &'static str {
        "bicgstab"
    }

    fn solve(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> SolverResult<DVector<f64>> {
        check_shape(matrix, rhs)?;
        let n = matrix.nrows();

        let mut inv_diag = DVector::from_element(n, 1.0);
        for (i, j, v) in matrix.triplet_iter() {
            if i == j && *v != 0.0 {
                inv_diag[i] = 1.0 / *v;
            }
        }
        let precondition = |v: &DVector<f64>| v.component_mul(&inv_diag);

        let rhs_norm = rhs.norm();
        let mut x = DVector::zeros(n);
        if rhs_norm == 0.0 {
            return Ok(x);
        }
        let target = self.tolerance * rhs_norm;

        let mut r = rhs.clone();
        let r_hat = r.clone();
        let mut rho = 1.0;
        let mut alpha = 1.0;
        let mut omega = 1.0;
        let mut p = DVector::zeros(n);
        let mut v = DVector::zeros(n);
        let mut res_norm = rhs_norm;

        for iter in 0..self.max_iterations {
            let rho_new = r_hat.dot(&r);
            if rho_new.abs() < BREAKDOWN {
                return Err(SolverError::Numeric {
                    what: format!("BiCGSTAB breakdown (rho) at iteration {iter}"),
                });
            }

            let beta = (rho_new / rho) * (alpha / omega);
            rho = rho_new;
            p = &r + (&p - &v * omega) * beta;

            let y = precondition(&p);
            v = matvec(matrix, &y);

            let r_hat_v = r_hat.dot(&v);
            if r_hat_v.abs() < BREAKDOWN {
                return Err(SolverError::Numeric {
                    what: format!("BiCGSTAB breakdown (r_hat.v) at iteration {iter}"),
                });
            }
            alpha = rho / r_hat_v;

            let s = &r - &v * alpha;
            let s_norm = s.norm();
            if s_norm <= target {
                x += &y * alpha;
                return Ok(x);
            }

            let z = precondition(&s);
            let t = matvec(matrix, &z);
            let t_t = t.dot(&t);
            if t_t < BREAKDOWN {
                return Err(SolverError::Numeric {
                    what: format!("BiCGSTAB breakdown (t.t) at iteration {iter}"),
                });
            }
            omega = t.dot(&s) / t_t;

            x += &y * alpha + &z * omega;
            r = s - &t * omega;

            res_norm = r.norm();
            if !res_norm.is_finite() {
                return Err(SolverError::NonFinite {
                    what: format!("BiCGSTAB residual at iteration {iter}"),
                });
            }
            if res_norm <= target {
                return Ok(x);
            }
            if omega.abs() < BREAKDOWN {
                return Err(SolverError::Numeric {
                    what: format!("BiCGSTAB stagnated (omega) at iteration {iter}"),
                });
            }
        }

        Err(SolverError::NotConverged {
            iterations: self.max_iterations,
            residual: res_norm / rhs_norm,
        })
    }
}
