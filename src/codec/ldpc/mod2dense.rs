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

//! Dense binary matrices over GF(2), bit-packed into 64-bit words.

/// A dense M x N binary matrix stored row-major, 64 bits per word.
#[derive(Debug, Clone)]
pub struct Mod2Dense {
    n_rows: usize,
    n_cols: usize,
    words_per_row: usize,
    bits: Vec<u64>,
}

impl Mod2Dense {
    /// Creates an all-zero matrix.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        let words_per_row = n_cols.div_ceil(64);
        Self {
            n_rows,
            n_cols,
            words_per_row,
            bits: vec![0; n_rows * words_per_row],
        }
    }

    /// Creates the N x N identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::new(n, n);
        for i in 0..n {
            m.set(i, i, true);
        }
        m
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.n_cols
    }

    /// Reads the bit at `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> bool {
        debug_assert!(i < self.n_rows && j < self.n_cols);
        let word = self.bits[i * self.words_per_row + j / 64];
        word >> (j % 64) & 1 != 0
    }

    /// Writes the bit at `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize, bit: bool) {
        debug_assert!(i < self.n_rows && j < self.n_cols);
        let word = &mut self.bits[i * self.words_per_row + j / 64];
        if bit {
            *word |= 1 << (j % 64);
        } else {
            *word &= !(1 << (j % 64));
        }
    }

    /// Adds (XORs) row `src` into row `dst`.
    pub fn row_xor(&mut self, dst: usize, src: usize) {
        debug_assert!(dst != src);
        let w = self.words_per_row;
        let (dst_off, src_off) = (dst * w, src * w);
        for k in 0..w {
            let bits = self.bits[src_off + k];
            self.bits[dst_off + k] ^= bits;
        }
    }

    /// Copies row `src` of `other` into row `dst` of `self`.
    pub fn copy_row_from(&mut self, dst: usize, other: &Self, src: usize) {
        debug_assert_eq!(self.words_per_row, other.words_per_row);
        let w = self.words_per_row;
        self.bits[dst * w..(dst + 1) * w]
            .copy_from_slice(&other.bits[src * w..(src + 1) * w]);
    }

    /// Computes `r = a * b` over GF(2).
    ///
    /// Panics in debug builds when the shapes do not line up; `r` must be
    /// zeroed by the caller or freshly allocated.
    pub fn multiply(a: &Self, b: &Self, r: &mut Self) {
        debug_assert_eq!(a.n_cols, b.n_rows);
        debug_assert_eq!(r.n_rows, a.n_rows);
        debug_assert_eq!(r.n_cols, b.n_cols);

        for i in 0..a.n_rows {
            for k in 0..a.n_cols {
                if a.get(i, k) {
                    r.row_xor_from(i, b, k);
                }
            }
        }
    }

    fn row_xor_from(&mut self, dst: usize, other: &Self, src: usize) {
        let w = self.words_per_row;
        for k in 0..w {
            self.bits[dst * w + k] ^= other.bits[src * w + k];
        }
    }

    /// Number of 1-bits in the whole matrix.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Inverts a square submatrix of `m` chosen by greedy column pivoting.
///
/// Reorders `cols` in place so that the columns `cols[0..M)` of the original
/// matrix form an invertible M x M submatrix `A` (when the matrix has full
/// row rank), writes the pivot row of each elimination step to `rows`, and
/// returns `inv(A)` together with the number of redundant rows that never
/// received a pivot. `m` is consumed by the elimination.
///
/// With `r` redundant rows the returned matrix inverts only the pivoted
/// part; the caller decides whether that is fatal.
pub fn invert_selected(
    m: &mut Mod2Dense,
    rows: &mut [usize],
    cols: &mut [usize],
) -> (Mod2Dense, usize) {
    let n_rows = m.rows();
    let n_cols = m.cols();
    debug_assert_eq!(rows.len(), n_rows);
    debug_assert_eq!(cols.len(), n_cols);

    for (j, c) in cols.iter_mut().enumerate() {
        *c = j;
    }

    // Row operations are mirrored into an identity accumulator; once the
    // selected columns are reduced to a permutation, reordering the
    // accumulator rows by pivot row yields the inverse.
    let mut ops = Mod2Dense::identity(n_rows);
    let mut pivot_used = vec![false; n_rows];
    let mut found = 0;

    for step in 0..n_rows {
        let mut pivot = None;
        'search: for jj in step..n_cols {
            let c = cols[jj];
            for (r, used) in pivot_used.iter().enumerate() {
                if !*used && m.get(r, c) {
                    pivot = Some((jj, r));
                    break 'search;
                }
            }
        }

        let Some((jj, r)) = pivot else {
            break;
        };

        cols.swap(step, jj);
        pivot_used[r] = true;
        rows[step] = r;
        found += 1;

        let c = cols[step];
        for r2 in 0..n_rows {
            if r2 != r && m.get(r2, c) {
                m.row_xor(r2, r);
                ops.row_xor(r2, r);
            }
        }
    }

    // Steps without a pivot take the leftover rows in ascending order so
    // that `rows` stays a permutation.
    let mut leftover = (0..n_rows).filter(|&r| !pivot_used[r]);
    for row in rows.iter_mut().skip(found) {
        if let Some(r) = leftover.next() {
            *row = r;
        }
    }

    let mut inverse = Mod2Dense::new(n_rows, n_rows);
    for i in 0..n_rows {
        inverse.copy_row_from(i, &ops, rows[i]);
    }

    (inverse, n_rows - found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_across_word_boundaries() {
        let mut m = Mod2Dense::new(2, 130);
        m.set(0, 63, true);
        m.set(0, 64, true);
        m.set(1, 129, true);

        assert!(m.get(0, 63));
        assert!(m.get(0, 64));
        assert!(!m.get(0, 65));
        assert!(m.get(1, 129));
        assert_eq!(m.count_ones(), 3);

        m.set(0, 64, false);
        assert!(!m.get(0, 64));
    }

    #[test]
    fn test_multiply_matches_hand_result() {
        // a = [1 1; 0 1], b = [1 0; 1 1] => a*b = [0 1; 1 1] over GF(2)
        let mut a = Mod2Dense::new(2, 2);
        a.set(0, 0, true);
        a.set(0, 1, true);
        a.set(1, 1, true);
        let mut b = Mod2Dense::new(2, 2);
        b.set(0, 0, true);
        b.set(1, 0, true);
        b.set(1, 1, true);

        let mut r = Mod2Dense::new(2, 2);
        Mod2Dense::multiply(&a, &b, &mut r);

        assert!(!r.get(0, 0));
        assert!(r.get(0, 1));
        assert!(r.get(1, 0));
        assert!(r.get(1, 1));
    }

    #[test]
    fn test_invert_selected_produces_an_inverse() {
        // A 3x5 matrix whose first three columns are dependent, forcing the
        // pivoting to reorder.
        let mut m = Mod2Dense::new(3, 5);
        for (i, j) in [(0, 0), (1, 0), (0, 1), (1, 1), (1, 2), (2, 3), (0, 4)] {
            m.set(i, j, true);
        }
        let original = m.clone();

        let mut rows = vec![0; 3];
        let mut cols = vec![0; 5];
        let (inverse, redundant) = invert_selected(&mut m, &mut rows, &mut cols);
        assert_eq!(redundant, 0);

        // inv(A) * A must be the identity, with A read from the original
        // matrix through the column selection.
        let mut a = Mod2Dense::new(3, 3);
        for (jj, &c) in cols[..3].iter().enumerate() {
            for i in 0..3 {
                a.set(i, jj, original.get(i, c));
            }
        }
        let mut product = Mod2Dense::new(3, 3);
        Mod2Dense::multiply(&inverse, &a, &mut product);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(product.get(i, j), i == j);
            }
        }
    }

    #[test]
    fn test_invert_selected_counts_redundant_rows() {
        // Two identical rows: rank 1, so one row is redundant.
        let mut m = Mod2Dense::new(2, 3);
        m.set(0, 0, true);
        m.set(1, 0, true);

        let mut rows = vec![0; 2];
        let mut cols = vec![0; 3];
        let (_, redundant) = invert_selected(&mut m, &mut rows, &mut cols);
        assert_eq!(redundant, 1);

        let mut sorted = rows.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1]);
    }
}
