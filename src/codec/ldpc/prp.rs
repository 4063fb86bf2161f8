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

//! Probability propagation over the Tanner graph of a parity-check matrix.
//!
//! Messages live on the edges of the graph. The parity-check matrix stays
//! read-only; [`Graph`] assigns every 1-entry a stable edge index and the
//! per-edge probability and likelihood ratios are kept in caller-owned
//! scratch vectors, so one code can decode any number of blocks, on any
//! number of threads, without shared mutable state.

use super::mod2sparse::Mod2Sparse;

/// Edge-indexed view of a parity-check matrix.
#[derive(Debug, Clone)]
pub struct Graph {
    /// Per check node: `(bit index, edge index)` in column order.
    row_edges: Vec<Vec<(usize, usize)>>,
    /// Per bit node: `(check index, edge index)` in row order.
    col_edges: Vec<Vec<(usize, usize)>>,
    edges: usize,
}

impl Graph {
    /// Indexes the edges of `h`, row-major.
    ///
    /// Walking the rows in order leaves every column's edge list sorted by
    /// check index, matching the matrix's own column ordering.
    pub fn new(h: &Mod2Sparse) -> Self {
        let mut row_edges: Vec<Vec<(usize, usize)>> = Vec::with_capacity(h.rows());
        let mut col_edges: Vec<Vec<(usize, usize)>> = vec![Vec::new(); h.cols()];

        let mut edges = 0;
        for i in 0..h.rows() {
            let mut row = Vec::with_capacity(h.count_row(i));
            for &j in h.row(i) {
                row.push((j, edges));
                col_edges[j].push((i, edges));
                edges += 1;
            }
            row_edges.push(row);
        }

        Self {
            row_edges,
            col_edges,
            edges,
        }
    }

    /// Number of check nodes (rows of `H`).
    pub fn checks(&self) -> usize {
        self.row_edges.len()
    }

    /// Number of bit nodes (columns of `H`).
    pub fn bits(&self) -> usize {
        self.col_edges.len()
    }

    /// Number of edges (1-entries of `H`).
    pub fn edges(&self) -> usize {
        self.edges
    }
}

/// Initializes the edge messages and the first bit guess from the
/// likelihood ratios.
pub fn initprp(
    graph: &Graph,
    lratio: &[f64],
    dblk: &mut [u8],
    bprb: &mut [f64],
    pr: &mut [f64],
    lr: &mut [f64],
) {
    for j in 0..graph.bits() {
        for &(_, e) in &graph.col_edges[j] {
            pr[e] = lratio[j];
            lr[e] = 1.0;
        }
        bprb[j] = 1.0 - 1.0 / (1.0 + lratio[j]);
        // Strict comparison: a ratio of exactly 1 carries no evidence and
        // guesses 0, like the codec-level hard decision.
        dblk[j] = u8::from(lratio[j] > 1.0);
    }
}

/// One pass of probability propagation.
///
/// Recomputes the check-to-bit likelihood ratios with a forward and a
/// backward product over each check, then the bit-to-check probability
/// ratios the same way over each bit, refreshing the bit guesses.
pub fn iterprp(
    graph: &Graph,
    lratio: &[f64],
    dblk: &mut [u8],
    bprb: &mut [f64],
    pr: &mut [f64],
    lr: &mut [f64],
) {
    for row in &graph.row_edges {
        let mut dl = 1.0;
        for &(_, e) in row {
            lr[e] = dl;
            dl *= 2.0 / (1.0 + pr[e]) - 1.0;
        }
        dl = 1.0;
        for &(_, e) in row.iter().rev() {
            let t = lr[e] * dl;
            lr[e] = (1.0 - t) / (1.0 + t);
            dl *= 2.0 / (1.0 + pr[e]) - 1.0;
        }
    }

    for j in 0..graph.bits() {
        let col = &graph.col_edges[j];
        let mut p = lratio[j];
        for &(_, e) in col {
            pr[e] = p;
            p *= lr[e];
        }
        if p.is_nan() {
            p = 1.0;
        }
        bprb[j] = 1.0 - 1.0 / (1.0 + p);
        dblk[j] = u8::from(p > 1.0);

        p = 1.0;
        for &(_, e) in col.iter().rev() {
            pr[e] *= p;
            if pr[e].is_nan() {
                pr[e] = 1.0;
            }
            p *= lr[e];
        }
    }
}

/// Computes the syndrome of the current guess.
///
/// Writes each check's parity to `pchk` and returns the number of
/// unsatisfied checks.
pub fn check(graph: &Graph, dblk: &[u8], pchk: &mut [u8]) -> u32 {
    let mut unsatisfied = 0;
    for (i, row) in graph.row_edges.iter().enumerate() {
        let mut parity = 0;
        for &(j, _) in row {
            parity ^= dblk[j] & 1;
        }
        pchk[i] = parity;
        unsatisfied += u32::from(parity);
    }
    unsatisfied
}

/// Scratch buffers for one decoding run.
#[derive(Debug)]
pub struct Workspace {
    /// Decoded bit guesses.
    pub dblk: Vec<u8>,
    /// Per-check parities of the final guess.
    pub pchk: Vec<u8>,
    /// Per-bit probabilities of being 1.
    pub bprb: Vec<f64>,
    /// Bit-to-check messages, edge-indexed.
    pub pr: Vec<f64>,
    /// Check-to-bit messages, edge-indexed.
    pub lr: Vec<f64>,
}

impl Workspace {
    /// Allocates scratch matching `graph`.
    pub fn new(graph: &Graph) -> Self {
        Self {
            dblk: vec![0; graph.bits()],
            pchk: vec![0; graph.checks()],
            bprb: vec![0.0; graph.bits()],
            pr: vec![0.0; graph.edges()],
            lr: vec![0.0; graph.edges()],
        }
    }
}

/// Runs probability propagation until the syndrome clears or `max_iter`
/// passes have been made. Returns the number of passes taken.
pub fn decode_prprp(graph: &Graph, lratio: &[f64], ws: &mut Workspace, max_iter: u32) -> u32 {
    initprp(graph, lratio, &mut ws.dblk, &mut ws.bprb, &mut ws.pr, &mut ws.lr);

    let mut n = 0;
    loop {
        let c = check(graph, &ws.dblk, &mut ws.pchk);
        if n == max_iter || c == 0 {
            break;
        }
        iterprp(graph, lratio, &mut ws.dblk, &mut ws.bprb, &mut ws.pr, &mut ws.lr);
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ldpc::distrib::Distribution;
    use crate::codec::ldpc::gen::GeneratorMatrix;
    use crate::codec::ldpc::pchk::{self, PchkMethod};

    /// A saturated likelihood ratio: 10 nats toward the given bit, strong
    /// enough for propagation to overturn a contradicted prior.
    fn llr(bit: u8) -> f64 {
        if bit != 0 {
            10.0f64.exp()
        } else {
            (-10.0f64).exp()
        }
    }

    #[test]
    fn test_graph_indexing_is_consistent() {
        let mut h = Mod2Sparse::new(2, 3);
        h.insert(0, 0);
        h.insert(0, 2);
        h.insert(1, 1);
        h.insert(1, 2);

        let g = Graph::new(&h);
        assert_eq!(g.checks(), 2);
        assert_eq!(g.bits(), 3);
        assert_eq!(g.edges(), 4);

        // Bit 2 participates in both checks and the edge indices must match
        // the row-major enumeration.
        assert_eq!(g.col_edges[2], vec![(0, 1), (1, 3)]);
    }

    #[test]
    fn test_initprp_takes_the_hard_decision() {
        let mut h = Mod2Sparse::new(1, 2);
        h.insert(0, 0);
        h.insert(0, 1);
        let g = Graph::new(&h);
        let mut ws = Workspace::new(&g);

        let lratio = [llr(1), llr(0)];
        initprp(&g, &lratio, &mut ws.dblk, &mut ws.bprb, &mut ws.pr, &mut ws.lr);
        assert_eq!(ws.dblk, vec![1, 0]);
        assert!(ws.bprb[0] > 0.5);
        assert!(ws.bprb[1] < 0.5);
    }

    #[test]
    fn test_even_ratio_guesses_zero() {
        let mut h = Mod2Sparse::new(1, 2);
        h.insert(0, 0);
        h.insert(0, 1);
        let g = Graph::new(&h);
        let mut ws = Workspace::new(&g);

        // A ratio of exactly 1 (a zero-confidence stream byte) carries no
        // evidence and must not be guessed as 1.
        let lratio = [1.0, llr(1)];
        initprp(&g, &lratio, &mut ws.dblk, &mut ws.bprb, &mut ws.pr, &mut ws.lr);
        assert_eq!(ws.dblk[0], 0);
        assert_eq!(ws.dblk[1], 1);
    }

    #[test]
    fn test_clean_codeword_decodes_in_zero_iterations() {
        let d = Distribution::from_spec("3").unwrap();
        let h = pchk::make(1, PchkMethod::EvenBoth, &d, true, 24, 48).unwrap();
        let gm = GeneratorMatrix::make_dense(&h);
        let g = Graph::new(&h);

        let sblk: Vec<u8> = (0..gm.n() - gm.m()).map(|i| (i % 2) as u8).collect();
        let mut cblk = vec![0u8; gm.n()];
        gm.encode(&h, &sblk, &mut cblk).unwrap();

        let lratio: Vec<f64> = cblk.iter().map(|&b| llr(b)).collect();
        let mut ws = Workspace::new(&g);
        let iterations = decode_prprp(&g, &lratio, &mut ws, 25);

        assert_eq!(iterations, 0);
        assert_eq!(ws.dblk, cblk);
        assert!(ws.pchk.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_single_flipped_bit_is_repaired() {
        let d = Distribution::from_spec("3").unwrap();
        let h = pchk::make(1, PchkMethod::EvenBoth, &d, true, 24, 48).unwrap();
        let gm = GeneratorMatrix::make_dense(&h);
        let g = Graph::new(&h);

        let sblk: Vec<u8> = (0..gm.n() - gm.m()).map(|i| (i % 3 == 1) as u8).collect();
        let mut cblk = vec![0u8; gm.n()];
        gm.encode(&h, &sblk, &mut cblk).unwrap();

        let mut lratio: Vec<f64> = cblk.iter().map(|&b| llr(b)).collect();
        lratio[5] = llr(1 - cblk[5]);

        let mut ws = Workspace::new(&g);
        let iterations = decode_prprp(&g, &lratio, &mut ws, 25);

        assert!(iterations > 0);
        assert_eq!(ws.dblk, cblk);
        assert!(ws.pchk.iter().all(|&p| p == 0));
    }
}
