//! Incomplete Cholesky (LLT) preconditioner
//!
//! IC(0): A ≈ L * L^T with L restricted to the lower pattern of A. Only valid
//! for numerically symmetric positive definite matrices; a non-positive pivot
//! is reported instead of producing NaNs.

use super::lower_row_product;
use crate::error::{FactorizationError, Result};
use crate::sparse::{MatrixPortrait, SymmetricSparseMatrix};
use crate::traits::{Factorization, Preconditioner, RealField};
use ndarray::Array1;
use std::sync::Arc;

/// IC(0) preconditioner
#[derive(Debug, Clone)]
pub struct LltPreconditioner<T: RealField> {
    portrait: Arc<MatrixPortrait>,
    /// Strict lower values of L
    l_values: Vec<T>,
    /// Diagonal of L
    diag: Vec<T>,
}

impl<T: RealField> LltPreconditioner<T> {
    /// Factor a symmetric positive definite sparse matrix
    pub fn from_symmetric(matrix: &SymmetricSparseMatrix<T>) -> Result<Self> {
        let portrait = Arc::clone(matrix.portrait());
        let n = matrix.dim();
        let col_indices = portrait.col_indices();
        let a_diag = matrix.diagonal();

        let mut l_values = matrix.lower_values().to_vec();
        let mut diag = vec![T::zero(); n];

        for i in 0..n {
            let range = portrait.row_range(i);
            for idx in range.clone() {
                let j = col_indices[idx];
                let correction =
                    lower_row_product(&portrait, &l_values, range.start..idx, j, |_| T::one());
                l_values[idx] = (l_values[idx] - correction) / diag[j];
            }

            let mut s = a_diag[i];
            for idx in range {
                s -= l_values[idx] * l_values[idx];
            }
            if s <= T::zero() {
                return Err(FactorizationError::NonPositivePivot {
                    row: i,
                    value: s.to_f64().unwrap_or(f64::NAN),
                });
            }
            diag[i] = s.sqrt();
        }

        Ok(Self {
            portrait,
            l_values,
            diag,
        })
    }

    /// Diagonal of the Cholesky factor
    pub fn diagonal(&self) -> &[T] {
        &self.diag
    }
}

impl<T: RealField> Factorization<T> for LltPreconditioner<T> {
    fn dim(&self) -> usize {
        self.diag.len()
    }

    fn forward(&self, r: &Array1<T>) -> Array1<T> {
        super::forward_substitution(&self.portrait, &self.l_values, &self.diag, r)
    }

    fn backward(&self, y: &Array1<T>) -> Array1<T> {
        let col_indices = self.portrait.col_indices();
        let mut x = y.clone();
        for i in (0..self.diag.len()).rev() {
            x[i] /= self.diag[i];
            let xi = x[i];
            for idx in self.portrait.row_range(i) {
                x[col_indices[idx]] -= self.l_values[idx] * xi;
            }
        }
        x
    }
}

impl<T: RealField> Preconditioner<T> for LltPreconditioner<T> {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        self.backward(&self.forward(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_llt_exact_on_tridiagonal() {
        let dense = array![[4.0, -1.0, 0.0], [-1.0, 4.0, -1.0], [0.0, -1.0, 4.0]];
        let matrix = SymmetricSparseMatrix::from_dense(&dense, 1e-15);
        let precond = LltPreconditioner::from_symmetric(&matrix).unwrap();

        assert_relative_eq!(precond.diagonal()[0], 2.0);
        assert_relative_eq!(precond.diagonal()[1], 3.75_f64.sqrt(), epsilon = 1e-14);

        let r = array![1.0, 2.0, 3.0];
        let x = precond.apply(&r);
        let check = matrix.matvec(&x);
        for i in 0..3 {
            assert_relative_eq!(check[i], r[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_llt_rejects_indefinite() {
        let dense = array![[1.0, 2.0], [2.0, 1.0]];
        let matrix = SymmetricSparseMatrix::from_dense(&dense, 1e-15);
        let err = LltPreconditioner::from_symmetric(&matrix).unwrap_err();
        assert!(err.is_not_spd());
        assert!(matches!(err, FactorizationError::NonPositivePivot { row: 1, .. }));
    }

    #[test]
    fn test_llt_and_ilu_precondition_alike() {
        // On SPD input both factorizations describe the same M = L D L^T
        let dense = array![
            [4.0, -1.0, -1.0, 0.0],
            [-1.0, 4.0, 0.0, -1.0],
            [-1.0, 0.0, 4.0, -1.0],
            [0.0, -1.0, -1.0, 4.0]
        ];
        let matrix = SymmetricSparseMatrix::from_dense(&dense, 1e-15);
        let llt = LltPreconditioner::from_symmetric(&matrix).unwrap();
        let ilu = crate::preconditioners::IluPreconditioner::from_symmetric(&matrix).unwrap();

        let r = array![1.0, -1.0, 0.5, 2.0];
        let a = llt.apply(&r);
        let b = ilu.apply(&r);
        for i in 0..4 {
            assert_relative_eq!(a[i], b[i], epsilon = 1e-12);
        }
    }
}
