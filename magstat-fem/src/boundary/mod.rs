//! Boundary conditions
//!
//! - First kind (Dirichlet): A = g on the boundary, imposed by symmetric
//!   elimination after assembly
//! - Second kind (Neumann): prescribed normal flux, added to the RHS

mod dirichlet;
mod neumann;

pub use dirichlet::*;
pub use neumann::*;
