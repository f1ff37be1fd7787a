//! First-kind (Dirichlet) boundary conditions
//!
//! Implements A = g by modifying the assembled matrix and RHS in place.

use ndarray::Array1;
use solvers::SymmetricSparseMatrix;
use std::collections::BTreeMap;

/// Apply prescribed nodal values using symmetric elimination
///
/// For each prescribed node k with value g_k:
/// - b[i] -= A[i, k] * g_k for every free node i
/// - A[k, :] = A[:, k] = 0
/// - A[k, k] = 1, b[k] = g_k
///
/// The column is eliminated along with the row, so the matrix stays
/// symmetric. Must run after all element contributions have been scattered.
pub fn apply_first_kind(
    matrix: &mut SymmetricSparseMatrix<f64>,
    rhs: &mut Array1<f64>,
    values: &BTreeMap<usize, f64>,
) {
    if values.is_empty() {
        return;
    }

    let mut prescribed: Vec<Option<f64>> = vec![None; matrix.dim()];
    for (&node, &g) in values {
        prescribed[node] = Some(g);
    }

    matrix.for_each_lower_mut(|row, col, a| match (prescribed[row], prescribed[col]) {
        (None, None) => {}
        (Some(g), None) => {
            rhs[col] -= *a * g;
            *a = 0.0;
        }
        (None, Some(g)) => {
            rhs[row] -= *a * g;
            *a = 0.0;
        }
        (Some(_), Some(_)) => *a = 0.0,
    });

    for (&node, &g) in values {
        matrix.set_diagonal(node, 1.0);
        rhs[node] = g;
    }
}
