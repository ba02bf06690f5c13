//! Global sparse linear systems.

use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::prelude::*;

use crate::error::{SolverError, SolverResult};

/// One assembled row: sparse coefficients plus right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub index: usize,
    pub entries: Vec<(usize, f64)>,
    pub rhs: f64,
}

impl Row {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            entries: Vec::new(),
            rhs: 0.0,
        }
    }

    /// A row fixing the unknown to `value`.
    pub fn fixed(index: usize, value: f64) -> Self {
        Self {
            index,
            entries: vec![(index, 1.0)],
            rhs: value,
        }
    }

    /// Add `value` to column `col` (duplicates are summed on assembly).
    pub fn add(&mut self, col: usize, value: f64) {
        self.entries.push((col, value));
    }
}

/// `matrix * x = rhs`.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub matrix: CsrMatrix<f64>,
    pub rhs: DVector<f64>,
}

impl LinearSystem {
    /// Build an `n x n` system. Every row index must appear exactly once.
    pub fn from_rows<I>(n: usize, rows: I) -> SolverResult<Self>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut coo = CooMatrix::new(n, n);
        let mut rhs = DVector::zeros(n);
        let mut seen = vec![false; n];

        for row in rows {
            if row.index >= n {
                return Err(SolverError::ProblemSetup {
                    what: format!("Row {} outside system of size {}", row.index, n),
                });
            }
            if std::mem::replace(&mut seen[row.index], true) {
                return Err(SolverError::ProblemSetup {
                    what: format!("Row {} assembled twice", row.index),
                });
            }
            for &(col, value) in &row.entries {
                if col >= n {
                    return Err(SolverError::ProblemSetup {
                        what: format!("Column {} outside system of size {}", col, n),
                    });
                }
                coo.push(row.index, col, value);
            }
            rhs[row.index] = row.rhs;
        }

        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(SolverError::ProblemSetup {
                what: format!("Row {} was never assembled", missing),
            });
        }

        Ok(Self {
            matrix: CsrMatrix::from(&coo),
            rhs,
        })
    }

    /// Assemble an `n x n` system from independent blocks of rows.
    ///
    /// `block(i)` for `i in 0..blocks` runs in parallel; each block must
    /// produce a disjoint set of rows. Rows are merged in block order, so the
    /// result does not depend on scheduling.
    pub fn assemble_par<F>(n: usize, blocks: usize, block: F) -> SolverResult<Self>
    where
        F: Fn(usize) -> SolverResult<Vec<Row>> + Sync + Send,
    {
        let parts: Vec<SolverResult<Vec<Row>>> = (0..blocks).into_par_iter().map(&block).collect();
        let mut rows = Vec::with_capacity(n);
        for part in parts {
            rows.extend(part?);
        }
        Self::from_rows(n, rows)
    }

    pub fn dimension(&self) -> usize {
        self.rhs.len()
    }

    /// `matrix * x`.
    pub fn apply(&self, x: &DVector<f64>) -> DVector<f64> {
        matvec(&self.matrix, x)
    }

    /// `matrix * x - rhs`.
    pub fn residual(&self, x: &DVector<f64>) -> DVector<f64> {
        self.apply(x) - &self.rhs
    }

    /// True when every coefficient and right-hand side entry is finite.
    pub fn is_finite(&self) -> bool {
        self.matrix.values().iter().all(|v| v.is_finite()) && self.rhs.iter().all(|v| v.is_finite())
    }
}

/// Sparse matrix-vector product.
pub(crate) fn matvec(matrix: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let mut y = DVector::zeros(matrix.nrows());
    for (i, row) in matrix.row_iter().enumerate() {
        let mut sum = 0.0;
        for (&j, &v) in row.col_indices().iter().zip(row.values()) {
            sum += v * x[j];
        }
        y[i] = sum;
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_summed() {
        let mut r0 = Row::new(0);
        r0.add(0, 1.0);
        r0.add(0, 2.0);
        r0.add(1, -1.0);
        r0.rhs = 4.0;
        let r1 = Row::fixed(1, 7.0);
        let sys = LinearSystem::from_rows(2, vec![r1, r0]).unwrap();

        let x = DVector::from_vec(vec![1.0, 1.0]);
        assert_eq!(sys.apply(&x).as_slice(), &[2.0, 1.0]);
        assert_eq!(sys.residual(&x).as_slice(), &[-2.0, -6.0]);
    }

    #[test]
    fn non_finite_entries_detected() {
        let good = LinearSystem::from_rows(1, vec![Row::fixed(0, 1.0)]).unwrap();
        assert!(good.is_finite());
        let bad_rhs = LinearSystem::from_rows(1, vec![Row::fixed(0, f64::NAN)]).unwrap();
        assert!(!bad_rhs.is_finite());
        let mut r = Row::new(0);
        r.add(0, f64::INFINITY);
        let bad_matrix = LinearSystem::from_rows(1, vec![r]).unwrap();
        assert!(!bad_matrix.is_finite());
    }

    #[test]
    fn rows_must_cover_system_once() {
        assert!(LinearSystem::from_rows(2, vec![Row::fixed(0, 1.0)]).is_err());
        assert!(LinearSystem::from_rows(1, vec![Row::fixed(0, 1.0), Row::fixed(0, 1.0)]).is_err());
        assert!(LinearSystem::from_rows(1, vec![Row::fixed(3, 1.0)]).is_err());
    }

    #[test]
    fn parallel_assembly_matches_sequential() {
        let n = 40;
        let row = |i: usize| {
            let mut r = Row::new(i);
            r.add(i, 2.0);
            if i > 0 {
                r.add(i - 1, -1.0);
            }
            if i + 1 < n {
                r.add(i + 1, -1.0);
            }
            r.rhs = i as f64;
            r
        };
        let seq = LinearSystem::from_rows(n, (0..n).map(row)).unwrap();
        // blocks of four rows each
        let par = LinearSystem::assemble_par(n, n / 4, |b| Ok((4 * b..4 * b + 4).map(row).collect())).unwrap();
        assert_eq!(seq.matrix, par.matrix);
        assert_eq!(seq.rhs, par.rhs);
    }
}
