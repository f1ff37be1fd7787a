//! Sparse matrix storage
//!
//! Symmetric matrices keep only the diagonal and the strict lower triangle,
//! with the nonzero structure described by a [`MatrixPortrait`].

mod portrait;
mod symmetric;

pub use portrait::MatrixPortrait;
pub use symmetric::SymmetricSparseMatrix;
