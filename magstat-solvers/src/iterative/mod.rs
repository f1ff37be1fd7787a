//! Iterative solvers for linear systems
//!
//! - [`los`]: locally optimal scheme with split preconditioning, for the
//!   symmetric systems produced by finite-element assembly

mod los;

pub use los::{LosConfig, LosSolution, los};
