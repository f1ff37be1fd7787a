//! Sparse structure of the global matrix

use crate::mesh::Mesh;
use solvers::MatrixPortrait;

/// Derives the matrix portrait from element connectivity
///
/// Two nodes are connected when they share an element; each connected pair
/// is stored once as (max, min), rows sorted ascending.
#[derive(Debug, Clone, Copy)]
pub struct PortraitBuilder<'a> {
    mesh: &'a Mesh,
}

impl<'a> PortraitBuilder<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        Self { mesh }
    }

    pub fn build(&self) -> MatrixPortrait {
        let portrait = MatrixPortrait::from_connectivity(
            self.mesh.num_nodes(),
            self.mesh.elements.iter().map(|e| e.vertices),
        );
        log::debug!(
            "matrix portrait: {} rows, {} lower entries",
            portrait.num_rows(),
            portrait.nnz_lower()
        );
        portrait
    }
}
