//! Axisymmetric magnetostatic FEM solver
//!
//! This crate solves for the azimuthal vector potential A on meshes of
//! axis-aligned bilinear rectangles in the (R, Z) half-plane, and derives the
//! flux density magnitude |B| at arbitrary points.
//!
//! # Features
//!
//! - **Structured meshes**: uniform and geometrically graded tensor grids,
//!   two-layer domains with per-side boundary conditions
//! - **Materials**: constant permeability or tabulated B-H curves
//! - **Boundary conditions**: first kind (prescribed A), second kind (flux)
//! - **Solvers**: LOS with ILU(0) or IC(0) preconditioning
//! - **Nonlinear iteration**: under-relaxed fixed point on the reluctivity,
//!   with iteration and wall-clock caps
//!
//! # Example
//!
//! ```
//! use magstat_fem::mesh::{Side, rectangular_mesh};
//! use magstat_fem::{Material, Point, Problem, SolverConfig};
//!
//! let (mut mesh, grid) =
//!     rectangular_mesh((0.0, 1.0), (0.0, 1.0), 4, 4, Material::linear(1.0)).unwrap();
//! for side in [Side::Left, Side::Right, Side::Bottom, Side::Top] {
//!     for (a, b) in grid.side_edges(side) {
//!         mesh.add_first_kind(a, b, |x, _| x);
//!     }
//! }
//!
//! let mut problem = Problem::new(mesh, SolverConfig::default()).unwrap();
//! problem.solve().unwrap();
//! let a = problem.value_a(Point::new(0.25, 0.5)).unwrap();
//! assert!((a - 0.25).abs() < 1e-8);
//! ```

pub mod assembly;
pub mod basis;
pub mod boundary;
pub mod config;
pub mod error;
pub mod material;
pub mod mesh;
pub mod problem;
pub mod solver;

pub use config::ProblemConfig;
pub use error::{ConfigError, FemError, MeshError, Result};
pub use material::{BhCurve, MU0, Material, Permeability};
pub use mesh::{Mesh, Point};
pub use problem::{
    Field, IterationReport, NonlinearConfig, NonlinearOutcome, NonlinearProblem, NonlinearState,
    Problem,
};
pub use solver::{SolverConfig, SolverError, SolverType};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
