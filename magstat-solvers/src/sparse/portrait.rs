//! Matrix portrait (nonzero structure) of a symmetric sparse matrix
//!
//! Only the strict lower triangle is described; the diagonal is always
//! present. For row `i`, `col_indices[row_ptrs[i]..row_ptrs[i + 1]]` lists the
//! columns `j < i` holding a structural nonzero, sorted ascending.

use std::collections::BTreeSet;
use std::ops::Range;

/// Nonzero structure of the strict lower triangle of a symmetric matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixPortrait {
    /// Number of rows (and columns)
    num_rows: usize,
    /// Row pointers: row_ptrs[i] is the start index in col_indices for row i
    row_ptrs: Vec<usize>,
    /// Column indices, sorted within each row
    col_indices: Vec<usize>,
}

impl MatrixPortrait {
    /// Portrait of a diagonal matrix
    pub fn diagonal(num_rows: usize) -> Self {
        Self {
            num_rows,
            row_ptrs: vec![0; num_rows + 1],
            col_indices: Vec::new(),
        }
    }

    /// Build a portrait from groups of mutually connected nodes
    ///
    /// Every pair of distinct indices sharing a group becomes a structural
    /// nonzero. Pairs shared by several groups are stored once.
    ///
    /// # Panics
    ///
    /// Panics if a group references an index `>= num_rows`.
    pub fn from_connectivity<I, G>(num_rows: usize, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: AsRef<[usize]>,
    {
        let mut rows: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); num_rows];

        for group in groups {
            let nodes = group.as_ref();
            for &a in nodes {
                assert!(a < num_rows, "node index {a} out of range ({num_rows} rows)");
                for &b in nodes {
                    if b < a {
                        rows[a].insert(b);
                    }
                }
            }
        }

        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        let mut col_indices = Vec::with_capacity(rows.iter().map(BTreeSet::len).sum());
        row_ptrs.push(0);
        for row in rows {
            col_indices.extend(row);
            row_ptrs.push(col_indices.len());
        }

        Self {
            num_rows,
            row_ptrs,
            col_indices,
        }
    }

    /// Number of rows (and columns)
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of stored strictly-lower entries
    pub fn nnz_lower(&self) -> usize {
        self.col_indices.len()
    }

    /// Row pointer array (length `num_rows + 1`)
    pub fn row_ptrs(&self) -> &[usize] {
        &self.row_ptrs
    }

    /// Column index array
    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    /// Range of indices into the column array for a given row
    #[inline]
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    /// Columns of the strict lower part of a row
    #[inline]
    pub fn row(&self, row: usize) -> &[usize] {
        &self.col_indices[self.row_range(row)]
    }

    /// Storage slot of the off-diagonal entry (i, j), using symmetry
    ///
    /// Returns `None` for diagonal entries and for pairs outside the portrait.
    pub fn position(&self, i: usize, j: usize) -> Option<usize> {
        if i == j || i >= self.num_rows || j >= self.num_rows {
            return None;
        }
        let (row, col) = if i > j { (i, j) } else { (j, i) };
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .binary_search(&col)
            .ok()
            .map(|offset| range.start + offset)
    }

    /// Whether (i, j) is a structural nonzero (diagonal always is)
    pub fn contains(&self, i: usize, j: usize) -> bool {
        (i == j && i < self.num_rows) || self.position(i, j).is_some()
    }

    /// Iterate over all stored (row, col) pairs with row > col
    pub fn lower_entries(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.num_rows).flat_map(move |row| self.row(row).iter().map(move |&col| (row, col)))
    }
}
