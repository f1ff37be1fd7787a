//! Error types for incomplete factorizations.

use thiserror::Error;

/// Errors that can occur while building an incomplete factorization.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FactorizationError {
    /// A pivot of the LU factorization vanished.
    #[error("zero pivot in incomplete LU factorization at row {row}")]
    ZeroPivot {
        /// Row of the vanishing pivot
        row: usize,
    },

    /// The matrix is not numerically positive definite.
    #[error("non-positive pivot {value:.6e} in incomplete Cholesky factorization at row {row}")]
    NonPositivePivot {
        /// Row of the offending pivot
        row: usize,
        /// Value under the square root
        value: f64,
    },

    /// Vector and matrix sizes disagree.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// A specialized `Result` type for factorization operations.
pub type Result<T> = std::result::Result<T, FactorizationError>;

impl FactorizationError {
    /// Returns `true` if the failure indicates a matrix that is not SPD.
    pub fn is_not_spd(&self) -> bool {
        matches!(self, FactorizationError::NonPositivePivot { .. })
    }
}
