//! Sparse symmetric linear algebra for finite-element field problems
//!
//! This crate provides the storage and solvers used by the magnetostatic FEM
//! pipeline: a matrix portrait describing the nonzero structure, a symmetric
//! sparse matrix storing only the diagonal and the lower triangle, two
//! incomplete factorizations and the LOS Krylov iteration.
//!
//! # Features
//!
//! - **Sparse storage**: portrait built from element connectivity, values
//!   cleared and refilled without reallocation
//! - **Preconditioners**: ILU(0) and IC(0) (LLT) on the symmetric pattern
//! - **Iterative solver**: LOS with split preconditioning and an iteration
//!   and wall-clock budget
//! - **Generic scalar types**: works with f64 and f32
//!
//! # Example
//!
//! ```
//! use magstat_solvers::{IluPreconditioner, LosConfig, MatrixPortrait, SymmetricSparseMatrix, los};
//! use ndarray::array;
//!
//! let portrait = MatrixPortrait::from_connectivity(2, [[0, 1]]);
//! let mut a = SymmetricSparseMatrix::from_portrait(portrait);
//! a.add_at(0, 0, 4.0);
//! a.add_at(1, 1, 3.0);
//! a.add_at(1, 0, 1.0);
//!
//! let b = array![1.0, 2.0];
//! let ilu = IluPreconditioner::from_symmetric(&a).unwrap();
//! let solution = los(&a, &ilu, &b, None, &LosConfig::default());
//! assert!(solution.converged);
//! ```

pub mod error;
pub mod iterative;
pub mod preconditioners;
pub mod sparse;
pub mod traits;

// Re-export main types
pub use error::FactorizationError;
pub use sparse::{MatrixPortrait, SymmetricSparseMatrix};
pub use traits::{Factorization, LinearOperator, Preconditioner, RealField};

// Re-export iterative solvers
pub use iterative::{LosConfig, LosSolution, los};

// Re-export preconditioners
pub use preconditioners::{IdentityPreconditioner, IluPreconditioner, LltPreconditioner};
