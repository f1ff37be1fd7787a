//! Solution-dependent system assembly
//!
//! Each element's reluctivity is evaluated at the element-averaged flux
//! density of the current estimate Q, so the matrix changes between outer
//! iterations while the portrait stays fixed.

use super::assemble_system;
use crate::basis::flux_density;
use crate::mesh::Mesh;
use ndarray::Array1;
use solvers::SymmetricSparseMatrix;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Assembles K(Q) A = F for the current estimate Q
#[derive(Debug, Clone)]
pub struct NonlinearSlaeBuilder {
    mesh: Arc<Mesh>,
    first_kind: BTreeMap<usize, f64>,
}

impl NonlinearSlaeBuilder {
    pub fn new(mesh: Arc<Mesh>) -> Self {
        let first_kind = mesh.first_kind_values();
        Self { mesh, first_kind }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn first_kind(&self) -> &BTreeMap<usize, f64> {
        &self.first_kind
    }

    /// Clear and refill `matrix` and `rhs` around the estimate `q`
    ///
    /// # Panics
    ///
    /// Panics if `q` does not have one value per node.
    pub fn build(
        &self,
        matrix: &mut SymmetricSparseMatrix<f64>,
        rhs: &mut Array1<f64>,
        q: &Array1<f64>,
    ) {
        let mesh = &*self.mesh;
        assert_eq!(q.len(), mesh.num_nodes(), "Estimate size mismatch");
        assemble_system(mesh, &self.first_kind, matrix, rhs, |element, rect| {
            let material = mesh.material_of(element);
            if material.is_nonlinear() {
                material.reluctivity(flux_density(rect, &element.gather(q)))
            } else {
                material.initial_reluctivity()
            }
        });
    }

    /// Reluctivity of every element at the estimate `q`
    pub fn element_reluctivities(&self, q: &Array1<f64>) -> Vec<f64> {
        self.mesh
            .elements
            .iter()
            .map(|element| {
                let rect = self.mesh.element_bounds(element);
                let b = flux_density(&rect, &element.gather(q));
                self.mesh.material_of(element).reluctivity(b)
            })
            .collect()
    }
}
