//! Global system assembly
//!
//! Builds the matrix portrait from element connectivity, then fills the
//! symmetric sparse matrix and RHS from the bilinear local matrices. The
//! linear builder uses each material's initial reluctivity; the nonlinear
//! builder re-evaluates it from the flux density of the current solution.

mod builder;
mod nonlinear;
mod portrait;

pub use builder::*;
pub use nonlinear::*;
pub use portrait::*;

use crate::basis::{BASIS_SIZE, local_load, local_stiffness};
use crate::boundary::{apply_first_kind, apply_second_kind};
use crate::mesh::{FiniteElement, Mesh, Rectangle};
use ndarray::Array1;
use solvers::SymmetricSparseMatrix;
use std::collections::BTreeMap;

/// Clear the system, scatter every element with the coefficient returned by
/// `reluctivity`, then apply second- and first-kind conditions
fn assemble_system<F>(
    mesh: &Mesh,
    first_kind: &BTreeMap<usize, f64>,
    matrix: &mut SymmetricSparseMatrix<f64>,
    rhs: &mut Array1<f64>,
    mut reluctivity: F,
) where
    F: FnMut(&FiniteElement, &Rectangle) -> f64,
{
    assert_eq!(matrix.dim(), mesh.num_nodes(), "Matrix size mismatch");
    assert_eq!(rhs.len(), mesh.num_nodes(), "RHS size mismatch");

    matrix.clear();
    rhs.fill(0.0);

    for element in &mesh.elements {
        let rect = mesh.element_bounds(element);
        let nu = reluctivity(element, &rect);
        let g = local_stiffness(&rect, nu);

        // Only the local lower triangle: add_at folds (i, j) and (j, i) into
        // one slot
        for i in 0..BASIS_SIZE {
            for j in 0..=i {
                matrix.add_at(element[i], element[j], g[i][j]);
            }
        }

        let density = mesh.material_of(element).current_density;
        if density != 0.0 {
            let load = local_load(&rect, density);
            for i in 0..BASIS_SIZE {
                rhs[element[i]] += load[i];
            }
        }
    }

    apply_second_kind(mesh, rhs);
    apply_first_kind(matrix, rhs, first_kind);
}
