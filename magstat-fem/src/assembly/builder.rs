//! Linear system assembly

use super::assemble_system;
use crate::mesh::Mesh;
use ndarray::Array1;
use solvers::SymmetricSparseMatrix;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Assembles K A = F with every material at its initial reluctivity
#[derive(Debug, Clone)]
pub struct SlaeBuilder {
    mesh: Arc<Mesh>,
    first_kind: BTreeMap<usize, f64>,
}

impl SlaeBuilder {
    pub fn new(mesh: Arc<Mesh>) -> Self {
        let first_kind = mesh.first_kind_values();
        Self { mesh, first_kind }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Prescribed first-kind values by node
    pub fn first_kind(&self) -> &BTreeMap<usize, f64> {
        &self.first_kind
    }

    /// Clear and refill `matrix` and `rhs`
    pub fn build(&self, matrix: &mut SymmetricSparseMatrix<f64>, rhs: &mut Array1<f64>) {
        let mesh = &*self.mesh;
        assemble_system(mesh, &self.first_kind, matrix, rhs, |element, _| {
            mesh.material_of(element).initial_reluctivity()
        });
    }
}
