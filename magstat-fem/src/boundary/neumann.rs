//! Second-kind (Neumann) boundary conditions

use crate::mesh::Mesh;
use ndarray::Array1;

/// Add the prescribed edge fluxes to the RHS
///
/// A constant flux h on a straight edge of length L integrates against each
/// endpoint's linear hat function to h * L / 2. Zero-flux edges are skipped.
pub fn apply_second_kind(mesh: &Mesh, rhs: &mut Array1<f64>) {
    for edge in mesh.second_kind.iter().filter(|e| e.flux != 0.0) {
        let (a, b) = edge.nodes;
        let length = mesh.nodes[a].distance(&mesh.nodes[b]);
        let share = 0.5 * edge.flux * length;
        rhs[a] += share;
        rhs[b] += share;
    }
}
