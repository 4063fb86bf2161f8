// Copyright 2025 The unboxing authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sparse binary matrices over GF(2).
//!
//! Each matrix stores the positions of its 1-entries twice, ordered along
//! rows and along columns, so both directions iterate in O(entries).

use super::mod2dense::Mod2Dense;

/// A sparse M x N binary matrix.
#[derive(Debug, Clone)]
pub struct Mod2Sparse {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<Vec<usize>>, // column indices per row, ascending
    cols: Vec<Vec<usize>>, // row indices per column, ascending
}

impl Mod2Sparse {
    /// Creates an all-zero matrix.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: vec![Vec::new(); n_rows],
            cols: vec![Vec::new(); n_cols],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.n_cols
    }

    /// Sets the entry at `(i, j)` to 1. Setting an existing 1 is a no-op.
    pub fn insert(&mut self, i: usize, j: usize) {
        debug_assert!(i < self.n_rows && j < self.n_cols);
        if let Err(pos) = self.rows[i].binary_search(&j) {
            self.rows[i].insert(pos, j);
        }
        if let Err(pos) = self.cols[j].binary_search(&i) {
            self.cols[j].insert(pos, i);
        }
    }

    /// Clears the entry at `(i, j)`. Returns whether it was set.
    pub fn delete(&mut self, i: usize, j: usize) -> bool {
        let deleted = match self.rows[i].binary_search(&j) {
            Ok(pos) => {
                self.rows[i].remove(pos);
                true
            }
            Err(_) => false,
        };
        if deleted {
            if let Ok(pos) = self.cols[j].binary_search(&i) {
                self.cols[j].remove(pos);
            }
        }
        deleted
    }

    /// Whether the entry at `(i, j)` is set.
    pub fn find(&self, i: usize, j: usize) -> bool {
        self.rows[i].binary_search(&j).is_ok()
    }

    /// The ascending column indices of the 1-entries in row `i`.
    pub fn row(&self, i: usize) -> &[usize] {
        &self.rows[i]
    }

    /// The ascending row indices of the 1-entries in column `j`.
    pub fn col(&self, j: usize) -> &[usize] {
        &self.cols[j]
    }

    /// Number of 1-entries in column `j`.
    pub fn count_col(&self, j: usize) -> usize {
        self.cols[j].len()
    }

    /// Number of 1-entries in row `i`.
    pub fn count_row(&self, i: usize) -> usize {
        self.rows[i].len()
    }

    /// Total number of 1-entries.
    pub fn entry_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Expands the matrix into a dense representation.
    pub fn to_dense(&self) -> Mod2Dense {
        let mut dense = Mod2Dense::new(self.n_rows, self.n_cols);
        for (i, row) in self.rows.iter().enumerate() {
            for &j in row {
                dense.set(i, j, true);
            }
        }
        dense
    }

    /// Builds a sparse matrix from a dense representation.
    pub fn from_dense(dense: &Mod2Dense) -> Self {
        let mut sparse = Self::new(dense.rows(), dense.cols());
        for i in 0..dense.rows() {
            for j in 0..dense.cols() {
                if dense.get(i, j) {
                    sparse.rows[i].push(j);
                    sparse.cols[j].push(i);
                }
            }
        }
        sparse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_find_delete() {
        let mut m = Mod2Sparse::new(3, 4);
        m.insert(1, 2);
        m.insert(1, 0);
        m.insert(2, 2);

        assert!(m.find(1, 2));
        assert!(!m.find(0, 2));
        assert_eq!(m.row(1), &[0, 2]);
        assert_eq!(m.col(2), &[1, 2]);
        assert_eq!(m.count_col(2), 2);
        assert_eq!(m.entry_count(), 3);

        assert!(m.delete(1, 2));
        assert!(!m.delete(1, 2));
        assert!(!m.find(1, 2));
        assert_eq!(m.col(2), &[2]);
    }

    #[test]
    fn test_duplicate_insert_is_noop() {
        let mut m = Mod2Sparse::new(2, 2);
        m.insert(0, 1);
        m.insert(0, 1);
        assert_eq!(m.entry_count(), 1);
    }

    #[test]
    fn test_dense_conversion_round_trip() {
        let mut m = Mod2Sparse::new(3, 3);
        m.insert(0, 0);
        m.insert(1, 2);
        m.insert(2, 1);

        let dense = m.to_dense();
        assert!(dense.get(1, 2));
        assert!(!dense.get(2, 2));

        let back = Mod2Sparse::from_dense(&dense);
        assert_eq!(back.row(1), m.row(1));
        assert_eq!(back.col(1), m.col(1));
        assert_eq!(back.entry_count(), 3);
    }
}
