//! Linear magnetostatic problem

use super::field::Field;
use crate::assembly::{PortraitBuilder, SlaeBuilder};
use crate::error::{FemError, Result};
use crate::mesh::{Mesh, Point};
use crate::solver::{LinearSolver, Solution, SolverConfig, SolverType, create_solver};
use ndarray::Array1;
use solvers::SymmetricSparseMatrix;
use std::sync::Arc;

/// One assemble + solve pass with constant material coefficients
pub struct Problem {
    mesh: Arc<Mesh>,
    builder: SlaeBuilder,
    solver: Box<dyn LinearSolver + Send + Sync>,
    q: Option<Array1<f64>>,
}

impl std::fmt::Debug for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Problem")
            .field("num_nodes", &self.mesh.num_nodes())
            .field("solver_type", &self.solver.solver_type())
            .field("solved", &self.q.is_some())
            .finish()
    }
}

impl Problem {
    /// Validate the mesh and select the solver
    pub fn new(mesh: Mesh, config: SolverConfig) -> Result<Self> {
        Self::from_shared(Arc::new(mesh), config)
    }

    pub fn from_shared(mesh: Arc<Mesh>, config: SolverConfig) -> Result<Self> {
        mesh.validate()?;
        config.validate()?;
        Ok(Self {
            builder: SlaeBuilder::new(Arc::clone(&mesh)),
            solver: create_solver(&config),
            mesh,
            q: None,
        })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn solver_type(&self) -> SolverType {
        self.solver.solver_type()
    }

    /// Build the portrait, assemble and solve
    pub fn solve(&mut self) -> Result<Solution> {
        let portrait = PortraitBuilder::new(&self.mesh).build();
        let mut matrix = SymmetricSparseMatrix::from_portrait(portrait);
        let mut rhs = Array1::zeros(self.mesh.num_nodes());
        self.builder.build(&mut matrix, &mut rhs);

        let solution = self.solver.solve(&matrix, &rhs, None)?;
        log::info!(
            "linear problem solved: {} nodes, {} iterations, residual {:.3e}",
            self.mesh.num_nodes(),
            solution.iterations,
            solution.residual
        );
        self.q = Some(solution.values.clone());
        Ok(solution)
    }

    /// Nodal values of the last successful solve
    pub fn solution(&self) -> Option<&Array1<f64>> {
        self.q.as_ref()
    }

    pub fn field(&self) -> Result<Field<'_>> {
        let q = self.q.as_ref().ok_or(FemError::NotSolved)?;
        Ok(Field::new(&self.mesh, q))
    }

    /// Vector potential at `p`
    pub fn value_a(&self, p: Point) -> Result<f64> {
        self.field()?.value_a(&p)
    }

    /// Flux density magnitude at `p`
    pub fn value_b(&self, p: Point) -> Result<f64> {
        self.field()?.value_b(&p)
    }

    /// Flux density magnitude of element `index`, `None` past the last element
    pub fn flux_at_element(&self, index: usize) -> Result<Option<f64>> {
        Ok(self.field()?.flux_at_element(index))
    }
}
