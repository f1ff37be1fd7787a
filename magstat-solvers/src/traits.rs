//! Core traits for linear algebra operations
//!
//! This module defines the abstractions shared by the sparse storage, the
//! incomplete factorizations and the iterative solver:
//! - [`RealField`]: Trait for real scalar types
//! - [`LinearOperator`]: Trait for matrix-like objects that can perform matrix-vector products
//! - [`Preconditioner`]: Trait for preconditioning operations
//! - [`Factorization`]: Trait for split (two triangular sweeps) preconditioners

use ndarray::Array1;
use num_traits::{Float, FromPrimitive, NumAssign, ToPrimitive};
use std::fmt::Debug;

/// Trait for real scalar types that can be used in the solvers.
///
/// Provided for `f64` (the default for field problems) and `f32`.
pub trait RealField:
    Float + NumAssign + FromPrimitive + ToPrimitive + Send + Sync + Debug + 'static
{
    /// Convert an `f64` constant into this type
    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        <Self as FromPrimitive>::from_f64(value).unwrap_or_else(Self::zero)
    }

    /// Check if this is approximately zero
    #[inline]
    fn is_zero_approx(&self, tol: Self) -> bool {
        self.abs() < tol
    }
}

impl RealField for f64 {}

impl RealField for f32 {}

/// Trait for linear operators (matrices) that can perform matrix-vector products.
pub trait LinearOperator<T: RealField> {
    /// Number of rows in the operator
    fn num_rows(&self) -> usize;

    /// Number of columns in the operator
    fn num_cols(&self) -> usize;

    /// Apply the operator: y = A * x
    fn apply(&self, x: &Array1<T>) -> Array1<T>;

    /// Check if the operator is square
    fn is_square(&self) -> bool {
        self.num_rows() == self.num_cols()
    }
}

/// Trait for preconditioners used in iterative solvers.
///
/// A preconditioner M approximates A^(-1), so that M*A is better conditioned
/// than A alone.
pub trait Preconditioner<T: RealField> {
    /// Apply the preconditioner: y = M * r
    ///
    /// This should approximate solving A * y = r
    fn apply(&self, r: &Array1<T>) -> Array1<T>;
}

/// An approximate factorization A ≈ L * U applied as two triangular sweeps.
///
/// Split preconditioning (as used by LOS) needs the two sweeps separately.
pub trait Factorization<T: RealField> {
    /// Dimension of the factored matrix
    fn dim(&self) -> usize;

    /// Solve L * y = r
    fn forward(&self, r: &Array1<T>) -> Array1<T>;

    /// Solve U * x = y
    fn backward(&self, y: &Array1<T>) -> Array1<T>;
}

/// Identity factorization (no preconditioning)
#[derive(Clone, Debug)]
pub struct IdentityPreconditioner {
    n: usize,
}

impl IdentityPreconditioner {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl<T: RealField> Preconditioner<T> for IdentityPreconditioner {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        r.clone()
    }
}

impl<T: RealField> Factorization<T> for IdentityPreconditioner {
    fn dim(&self) -> usize {
        self.n
    }

    fn forward(&self, r: &Array1<T>) -> Array1<T> {
        r.clone()
    }

    fn backward(&self, y: &Array1<T>) -> Array1<T> {
        y.clone()
    }
}

#[inline]
pub(crate) fn dot<T: RealField>(x: &Array1<T>, y: &Array1<T>) -> T {
    x.iter()
        .zip(y.iter())
        .fold(T::zero(), |acc, (&xi, &yi)| acc + xi * yi)
}

#[inline]
pub(crate) fn norm<T: RealField>(x: &Array1<T>) -> T {
    dot(x, x).sqrt()
}
