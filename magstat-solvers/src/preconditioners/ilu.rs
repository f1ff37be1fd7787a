//! ILU(0) preconditioner on symmetric storage
//!
//! Incomplete LU factorization with no fill-in. For a symmetric matrix the
//! factors share one pattern: L is lower triangular with diagonal `d`, and U
//! is unit upper triangular with `U[j][i] = L[i][j] / d[j]`, so only the lower
//! values and the diagonal are stored.

use super::lower_row_product;
use crate::error::{FactorizationError, Result};
use crate::sparse::{MatrixPortrait, SymmetricSparseMatrix};
use crate::traits::{Factorization, Preconditioner, RealField};
use ndarray::Array1;
use std::sync::Arc;

/// ILU(0) preconditioner
#[derive(Debug, Clone)]
pub struct IluPreconditioner<T: RealField> {
    /// Structure shared with the factored matrix
    portrait: Arc<MatrixPortrait>,
    /// Strict lower values of L
    l_values: Vec<T>,
    /// Diagonal of L
    diag: Vec<T>,
}

impl<T: RealField> IluPreconditioner<T> {
    /// Factor a symmetric sparse matrix
    pub fn from_symmetric(matrix: &SymmetricSparseMatrix<T>) -> Result<Self> {
        let portrait = Arc::clone(matrix.portrait());
        let n = matrix.dim();
        let col_indices = portrait.col_indices();
        let a_diag = matrix.diagonal();

        let mut l_values = matrix.lower_values().to_vec();
        let mut diag = vec![T::zero(); n];
        let tiny = T::from_f64_lossy(1e-300);

        for i in 0..n {
            let range = portrait.row_range(i);
            for idx in range.clone() {
                let j = col_indices[idx];
                // L_ij = a_ij - sum_{k<j} L_ik * L_jk / d_k
                let correction = lower_row_product(
                    &portrait,
                    &l_values,
                    range.start..idx,
                    j,
                    |k| diag[k],
                );
                l_values[idx] -= correction;
            }

            let mut d = a_diag[i];
            for idx in range {
                let k = col_indices[idx];
                d -= l_values[idx] * l_values[idx] / diag[k];
            }
            if d.abs() < tiny {
                return Err(FactorizationError::ZeroPivot { row: i });
            }
            diag[i] = d;
        }

        Ok(Self {
            portrait,
            l_values,
            diag,
        })
    }

    /// Diagonal of the lower factor
    pub fn diagonal(&self) -> &[T] {
        &self.diag
    }
}

impl<T: RealField> Factorization<T> for IluPreconditioner<T> {
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
            let xi = x[i];
            for idx in self.portrait.row_range(i) {
                let j = col_indices[idx];
                x[j] -= self.l_values[idx] / self.diag[j] * xi;
            }
        }
        x
    }
}

impl<T: RealField> Preconditioner<T> for IluPreconditioner<T> {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        self.backward(&self.forward(r))
    }
}
