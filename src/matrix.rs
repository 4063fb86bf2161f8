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

//! Float matrices and filter coefficient grids used by the equalizer.

/// A rows x cols grid of `f32` filter coefficients in row-major order.
///
/// The grid is square with an odd side so that it has a central cell.
#[derive(Debug, Clone)]
pub struct FilterCoeff2d {
    rows: usize,
    cols: usize,
    coeff: Vec<f32>,
}

impl FilterCoeff2d {
    /// Creates the all-pass filter: 1 at the central cell, 0 elsewhere.
    pub fn identity(size: usize) -> Self {
        debug_assert!(size % 2 == 1, "filter side must be odd");
        let mut coeff = vec![0.0; size * size];
        coeff[(size / 2) * size + size / 2] = 1.0;
        Self {
            rows: size,
            cols: size,
            coeff,
        }
    }

    /// Number of coefficient rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of coefficient columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The coefficients in row-major order.
    pub fn as_slice(&self) -> &[f32] {
        &self.coeff
    }

    /// Mutable access to the coefficients in row-major order.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.coeff
    }
}

/// A rectangular array of `f32` values.
#[derive(Debug, Clone)]
pub struct FloatMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl FloatMatrix {
    /// Creates a zero-filled rows x cols matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The values of row `r`.
    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Mutable access to the values of row `r`.
    pub fn row_mut(&mut self, r: usize) -> &mut [f32] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }
}

/// An array of identically shaped [`FloatMatrix`] pages, indexed by
/// `(page, row, col)`.
///
/// The equalizer stores per-tile symbol means here: one page per tile row,
/// one matrix row per tile column, one column per symbol.
#[derive(Debug, Clone)]
pub struct MultipageFloatMatrix {
    pages: Vec<FloatMatrix>,
}

impl MultipageFloatMatrix {
    /// Creates `pages` zero-filled rows x cols matrices.
    pub fn new(pages: usize, rows: usize, cols: usize) -> Self {
        Self {
            pages: (0..pages).map(|_| FloatMatrix::new(rows, cols)).collect(),
        }
    }

    /// Number of pages.
    pub fn pages(&self) -> usize {
        self.pages.len()
    }

    /// Page `p`.
    pub fn page(&self, p: usize) -> &FloatMatrix {
        &self.pages[p]
    }

    /// Mutable access to page `p`.
    pub fn page_mut(&mut self, p: usize) -> &mut FloatMatrix {
        &mut self.pages[p]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_filter_has_central_one() {
        let filter = FilterCoeff2d::identity(5);
        let coeff = filter.as_slice();
        assert_eq!(coeff.len(), 25);
        assert_eq!(coeff[12], 1.0);
        assert_eq!(coeff.iter().sum::<f32>(), 1.0);
    }

    #[test]
    fn test_float_matrix_rows_are_disjoint() {
        let mut m = FloatMatrix::new(2, 3);
        m.row_mut(1).copy_from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(m.row(0), &[0.0, 0.0, 0.0]);
        assert_eq!(m.row(1), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_multipage_shapes() {
        let m = MultipageFloatMatrix::new(2, 3, 4);
        assert_eq!(m.pages(), 2);
        assert_eq!(m.page(1).rows(), 3);
        assert_eq!(m.page(1).cols(), 4);
    }
}
