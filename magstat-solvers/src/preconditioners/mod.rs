//! Preconditioners for iterative solvers
//!
//! Both factorizations keep the pattern of the symmetric input (no fill-in)
//! and expose the two triangular sweeps separately through
//! [`Factorization`](crate::traits::Factorization).
//!
//! # Available Preconditioners
//!
//! - **IluPreconditioner**: ILU(0), works for any nonsingular pivots
//! - **LltPreconditioner**: IC(0), requires a numerically SPD matrix

mod ilu;
mod llt;

pub use ilu::IluPreconditioner;
pub use llt::LltPreconditioner;

// Re-export IdentityPreconditioner from traits
pub use crate::traits::IdentityPreconditioner;

use crate::sparse::MatrixPortrait;
use crate::traits::RealField;
use ndarray::Array1;
use std::ops::Range;

/// Sum over k of L[i][k] * L[j][k] / weight(k)
///
/// `i_entries` indexes the leading part of row i (columns below j); row j is
/// scanned in full. Both rows are sorted, so a merge finds the common columns.
fn lower_row_product<T, W>(
    portrait: &MatrixPortrait,
    l_values: &[T],
    i_entries: Range<usize>,
    j: usize,
    weight: W,
) -> T
where
    T: RealField,
    W: Fn(usize) -> T,
{
    let col_indices = portrait.col_indices();
    let j_entries = portrait.row_range(j);

    let mut sum = T::zero();
    let (mut a, mut b) = (i_entries.start, j_entries.start);
    while a < i_entries.end && b < j_entries.end {
        let (ka, kb) = (col_indices[a], col_indices[b]);
        if ka == kb {
            sum += l_values[a] * l_values[b] / weight(ka);
            a += 1;
            b += 1;
        } else if ka < kb {
            a += 1;
        } else {
            b += 1;
        }
    }
    sum
}

/// Solve L * y = r for a lower factor with explicit diagonal
fn forward_substitution<T: RealField>(
    portrait: &MatrixPortrait,
    l_values: &[T],
    diag: &[T],
    r: &Array1<T>,
) -> Array1<T> {
    assert_eq!(r.len(), diag.len(), "Input vector size mismatch");
    let col_indices = portrait.col_indices();
    let mut y = r.clone();
    for i in 0..diag.len() {
        let mut s = y[i];
        for idx in portrait.row_range(i) {
            s -= l_values[idx] * y[col_indices[idx]];
        }
        y[i] = s / diag[i];
    }
    y
}
