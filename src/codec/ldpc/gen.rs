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

//! Generator matrices derived from a parity-check matrix.
//!
//! Splitting the parity-check matrix `H` into an invertible M x M block `A`
//! (columns `cols[0..M)`) and the remainder `B` (columns `cols[M..N)`)
//! turns encoding into `parity = inv(A) * B * message`. The product
//! `inv(A) * B` can be kept dense, or `inv(A)` alone with `B` read back
//! from `H` (mixed). A sparse LU form exists in the tag space for
//! compatibility but is never built here.

use super::mod2dense::{invert_selected, Mod2Dense};
use super::mod2sparse::Mod2Sparse;
use crate::error::{Result, UnboxError};
use log::{debug, warn};

/// Representation-specific payload of a generator matrix.
#[derive(Debug, Clone)]
pub enum GeneratorData {
    /// Sparse LU factorization, tag `'s'`. Not produced by this crate.
    Sparse {
        /// Lower factor.
        l: Mod2Sparse,
        /// Upper factor.
        u: Mod2Sparse,
    },
    /// Dense `inv(A) * B`, tag `'d'`.
    Dense {
        /// The M x (N - M) product `inv(A) * B`.
        g: Mod2Dense,
    },
    /// Dense `inv(A)` with `B` recovered from the parity-check matrix,
    /// tag `'m'`.
    Mixed {
        /// The M x M inverse `inv(A)`.
        g: Mod2Dense,
    },
}

/// A generator matrix together with the row and column permutations chosen
/// while selecting the invertible block.
#[derive(Debug, Clone)]
pub struct GeneratorMatrix {
    m: usize,
    n: usize,
    cols: Vec<usize>,
    rows: Vec<usize>,
    data: GeneratorData,
}

impl GeneratorMatrix {
    /// Builds the dense representation from a parity-check matrix.
    pub fn make_dense(h: &Mod2Sparse) -> Self {
        Self::make_dense_or_mixed(h, false)
    }

    /// Builds the mixed representation from a parity-check matrix.
    pub fn make_mixed(h: &Mod2Sparse) -> Self {
        Self::make_dense_or_mixed(h, true)
    }

    fn make_dense_or_mixed(h: &Mod2Sparse, mixed: bool) -> Self {
        let m = h.rows();
        let n = h.cols();

        let mut dh = h.to_dense();
        let mut rows = vec![0; m];
        let mut cols = vec![0; n];
        let (inv_a, redundant) = invert_selected(&mut dh, &mut rows, &mut cols);
        if redundant > 0 {
            warn!("parity check matrix has {redundant} redundant checks");
        }

        let data = if mixed {
            let ones = inv_a.count_ones();
            let b_ones: usize = cols[m..].iter().map(|&c| h.count_col(c)).sum();
            debug!(
                "number of 1s per check in inv(A) is {:.1}, in B is {:.1}, total is {:.1}",
                ones as f64 / m as f64,
                b_ones as f64 / m as f64,
                (ones + b_ones) as f64 / m as f64
            );
            GeneratorData::Mixed { g: inv_a }
        } else {
            // B collects the message columns of H in selection order.
            let dh = h.to_dense();
            let mut b = Mod2Dense::new(m, n - m);
            for (jj, &c) in cols[m..].iter().enumerate() {
                for i in 0..m {
                    if dh.get(i, c) {
                        b.set(i, jj, true);
                    }
                }
            }

            let mut g = Mod2Dense::new(m, n - m);
            Mod2Dense::multiply(&inv_a, &b, &mut g);
            debug!(
                "number of 1s per check in inv(A) x B is {:.1}",
                g.count_ones() as f64 / m as f64
            );
            GeneratorData::Dense { g }
        };

        Self {
            m,
            n,
            cols,
            rows,
            data,
        }
    }

    /// Number of parity bits M.
    pub fn m(&self) -> usize {
        self.m
    }

    /// Codeword length N in bits.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Column permutation; `cols[0..M)` selects the parity block of `H`,
    /// `cols[M..N)` the message positions of the codeword.
    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    /// Row permutation chosen while pivoting.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// The representation tag: `'s'`, `'d'` or `'m'`.
    pub fn type_tag(&self) -> char {
        match self.data {
            GeneratorData::Sparse { .. } => 's',
            GeneratorData::Dense { .. } => 'd',
            GeneratorData::Mixed { .. } => 'm',
        }
    }

    /// Encodes one codeword.
    ///
    /// `sblk` holds the N - M message bits as 0/1 bytes; the N codeword
    /// bits are written to `cblk` at the positions given by the column
    /// permutation.
    pub fn encode(&self, h: &Mod2Sparse, sblk: &[u8], cblk: &mut [u8]) -> Result<()> {
        debug_assert_eq!(sblk.len(), self.n - self.m);
        debug_assert_eq!(cblk.len(), self.n);

        match &self.data {
            GeneratorData::Dense { g } => {
                self.systematic_copy(sblk, cblk);

                // parity = G * message
                let mut u = Mod2Dense::new(self.n - self.m, 1);
                for (j, &bit) in sblk.iter().enumerate() {
                    if bit != 0 {
                        u.set(j, 0, true);
                    }
                }
                let mut v = Mod2Dense::new(self.m, 1);
                Mod2Dense::multiply(g, &u, &mut v);
                for j in 0..self.m {
                    cblk[self.cols[j]] = u8::from(v.get(j, 0));
                }
                Ok(())
            }
            GeneratorData::Mixed { g } => {
                self.systematic_copy(sblk, cblk);

                // u = B * message, read through the sparse parity-check
                // columns; parity = inv(A) * u.
                let mut u = Mod2Dense::new(self.m, 1);
                for (j, &bit) in sblk.iter().enumerate() {
                    if bit != 0 {
                        for &r in h.col(self.cols[self.m + j]) {
                            u.set(r, 0, !u.get(r, 0));
                        }
                    }
                }
                let mut v = Mod2Dense::new(self.m, 1);
                Mod2Dense::multiply(g, &u, &mut v);
                for j in 0..self.m {
                    cblk[self.cols[j]] = u8::from(v.get(j, 0));
                }
                Ok(())
            }
            GeneratorData::Sparse { .. } => Err(UnboxError::Construction(
                "sparse generator representation is not supported".to_owned(),
            )),
        }
    }

    fn systematic_copy(&self, sblk: &[u8], cblk: &mut [u8]) {
        for (j, &bit) in sblk.iter().enumerate() {
            cblk[self.cols[self.m + j]] = bit;
        }
    }
}
