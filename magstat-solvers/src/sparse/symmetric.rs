//! Symmetric sparse matrix stored as diagonal + strict lower triangle
//!
//! Values of the lower triangle are aligned with the column index array of a
//! shared [`MatrixPortrait`]. The structure is allocated once and reused: a
//! nonlinear loop calls [`SymmetricSparseMatrix::clear`] and refills the same
//! slots on every pass.

use super::portrait::MatrixPortrait;
use crate::traits::{LinearOperator, RealField};
use ndarray::{Array1, Array2};
use std::sync::Arc;

/// Symmetric sparse matrix in lower-triangle row storage
#[derive(Debug, Clone)]
pub struct SymmetricSparseMatrix<T: RealField> {
    /// Shared nonzero structure
    portrait: Arc<MatrixPortrait>,
    /// Diagonal values (length = dimension)
    diag: Vec<T>,
    /// Strict lower triangle values, aligned with portrait.col_indices()
    lower: Vec<T>,
}

impl<T: RealField> SymmetricSparseMatrix<T> {
    /// Allocate a zero matrix with the given structure
    pub fn new(portrait: Arc<MatrixPortrait>) -> Self {
        let n = portrait.num_rows();
        let nnz = portrait.nnz_lower();
        Self {
            portrait,
            diag: vec![T::zero(); n],
            lower: vec![T::zero(); nnz],
        }
    }

    /// Allocate from an owned portrait
    pub fn from_portrait(portrait: MatrixPortrait) -> Self {
        Self::new(Arc::new(portrait))
    }

    /// Build from a dense symmetric matrix, keeping entries with |a_ij| > threshold
    ///
    /// Only the lower triangle of `dense` is read.
    pub fn from_dense(dense: &Array2<T>, threshold: T) -> Self {
        let n = dense.nrows();
        assert_eq!(n, dense.ncols(), "Matrix must be square");

        let pairs: Vec<[usize; 2]> = (0..n)
            .flat_map(|i| (0..i).map(move |j| [i, j]))
            .filter(|&[i, j]| dense[[i, j]].abs() > threshold)
            .collect();
        let mut matrix = Self::from_portrait(MatrixPortrait::from_connectivity(n, pairs));

        for i in 0..n {
            matrix.diag[i] = dense[[i, i]];
        }
        let portrait = Arc::clone(&matrix.portrait);
        for (idx, (i, j)) in portrait.lower_entries().enumerate() {
            matrix.lower[idx] = dense[[i, j]];
        }
        matrix
    }

    /// Matrix dimension
    pub fn dim(&self) -> usize {
        self.diag.len()
    }

    /// Shared structure
    pub fn portrait(&self) -> &Arc<MatrixPortrait> {
        &self.portrait
    }

    /// Diagonal values
    pub fn diagonal(&self) -> &[T] {
        &self.diag
    }

    /// Strict lower triangle values, aligned with the portrait's column indices
    pub fn lower_values(&self) -> &[T] {
        &self.lower
    }

    /// Zero all stored values; the structure is retained
    pub fn clear(&mut self) {
        self.diag.fill(T::zero());
        self.lower.fill(T::zero());
    }

    /// Accumulate `value` into entry (i, j)
    ///
    /// Off-diagonal entries address the shared slot of (max(i,j), min(i,j)),
    /// so a symmetric local matrix must only scatter one triangle.
    ///
    /// # Panics
    ///
    /// Panics if (i, j) is not part of the portrait.
    pub fn add_at(&mut self, i: usize, j: usize, value: T) {
        if i == j {
            self.diag[i] += value;
            return;
        }
        match self.portrait.position(i, j) {
            Some(idx) => self.lower[idx] += value,
            None => panic!("entry ({i}, {j}) is not in the matrix portrait"),
        }
    }

    /// Overwrite a diagonal value
    pub fn set_diagonal(&mut self, i: usize, value: T) {
        self.diag[i] = value;
    }

    /// Entry (i, j), zero when not stored
    pub fn get(&self, i: usize, j: usize) -> T {
        if i == j {
            return self.diag[i];
        }
        self.portrait
            .position(i, j)
            .map_or_else(T::zero, |idx| self.lower[idx])
    }

    /// Visit every stored strictly-lower entry as (row, col, &mut value)
    pub fn for_each_lower_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, usize, &mut T),
    {
        let portrait = &self.portrait;
        for row in 0..portrait.num_rows() {
            for idx in portrait.row_range(row) {
                f(row, portrait.col_indices()[idx], &mut self.lower[idx]);
            }
        }
    }

    /// Matrix-vector product y = A * x exploiting symmetry
    ///
    /// Each stored off-diagonal contributes to both y[row] and y[col].
    pub fn multiply(&self, x: &Array1<T>, y: &mut Array1<T>) {
        let n = self.dim();
        assert_eq!(x.len(), n, "Input vector size mismatch");
        assert_eq!(y.len(), n, "Output vector size mismatch");

        let col_indices = self.portrait.col_indices();
        for i in 0..n {
            y[i] = self.diag[i] * x[i];
        }
        for i in 0..n {
            for idx in self.portrait.row_range(i) {
                let j = col_indices[idx];
                let a = self.lower[idx];
                y[i] += a * x[j];
                y[j] += a * x[i];
            }
        }
    }

    /// Matrix-vector product returning a new vector
    pub fn matvec(&self, x: &Array1<T>) -> Array1<T> {
        let mut y = Array1::from_elem(self.dim(), T::zero());
        self.multiply(x, &mut y);
        y
    }

    /// Convert to a dense matrix (for debugging/small matrices)
    pub fn to_dense(&self) -> Array2<T> {
        let n = self.dim();
        let mut dense = Array2::from_elem((n, n), T::zero());
        for i in 0..n {
            dense[[i, i]] = self.diag[i];
        }
        for (idx, (i, j)) in self.portrait.lower_entries().enumerate() {
            dense[[i, j]] = self.lower[idx];
            dense[[j, i]] = self.lower[idx];
        }
        dense
    }
}

impl<T: RealField> LinearOperator<T> for SymmetricSparseMatrix<T> {
    fn num_rows(&self) -> usize {
        self.dim()
    }

    fn num_cols(&self) -> usize {
        self.dim()
    }

    fn apply(&self, x: &Array1<T>) -> Array1<T> {
        self.matvec(x)
    }
}
