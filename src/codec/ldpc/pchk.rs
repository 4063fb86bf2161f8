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

//! Random construction of sparse parity-check matrices.
//!
//! The builder distributes 1s over an M x N matrix according to a column
//! weight distribution, patches up degenerate rows, and can move entries
//! around to remove short cycles from the Tanner graph. All randomness
//! comes from a PRNG seeded deterministically from the code seed, so a
//! given parameter set always yields the same matrix.

use super::distrib::Distribution;
use super::mod2sparse::Mod2Sparse;
use crate::error::{Result, UnboxError};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How to spread the 1s over the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PchkMethod {
    /// Per-column weights only; rows land where they land.
    EvenCol,
    /// Balance the 1s over both columns and rows.
    EvenBoth,
}

/// Partitions `n` columns according to the distribution proportions.
///
/// Truncated shares are handed out one column at a time to the entries with
/// the largest remainders. Fails when the rounded shares already exceed `n`.
fn column_partition(d: &Distribution, n: usize) -> Option<Vec<usize>> {
    let mut trunc = vec![0.0; d.size()];
    let mut part = vec![0; d.size()];

    let mut used = 0;
    for z in 0..d.size() {
        let share = d.prop(z) * n as f64;
        let cur = share.floor() as usize;
        part[z] = cur;
        trunc[z] = share - cur as f64;
        used += cur;
    }

    if used > n {
        return None;
    }

    while used < n {
        let mut cur = 0;
        for z in 1..d.size() {
            if trunc[z] > trunc[cur] {
                cur = z;
            }
        }
        part[cur] += 1;
        used += 1;
        trunc[cur] = -1.0;
    }

    Some(part)
}

/// Draws a row index not yet set in column `j`.
fn random_free_row(rng: &mut StdRng, h: &Mod2Sparse, j: usize, m: usize) -> usize {
    loop {
        let i = rng.gen_range(0..m);
        if !h.find(i, j) {
            return i;
        }
    }
}

/// Creates a sparse M x N parity-check matrix.
///
/// `seed` seeds the PRNG (as `10 * seed + 1`), `d` gives the column weight
/// distribution, and `no4cycle` requests removal of length-4 cycles. Fails
/// when the distribution cannot partition the columns.
pub fn make(
    seed: u32,
    method: PchkMethod,
    d: &Distribution,
    no4cycle: bool,
    m: usize,
    n: usize,
) -> Result<Mod2Sparse> {
    let mut rng = StdRng::seed_from_u64(u64::from(seed) * 10 + 1);
    let mut h = Mod2Sparse::new(m, n);

    let part = column_partition(d, n).ok_or_else(|| {
        UnboxError::Construction(format!(
            "column weight distribution cannot partition {n} columns"
        ))
    })?;

    match method {
        PchkMethod::EvenCol => {
            let mut z = 0;
            let mut left = part[z];
            for j in 0..n {
                while left == 0 {
                    z += 1;
                    if z >= d.size() {
                        return Err(UnboxError::Construction(
                            "column partition exhausted before all columns were filled"
                                .to_owned(),
                        ));
                    }
                    left = part[z];
                }
                for _ in 0..d.num(z) {
                    let i = random_free_row(&mut rng, &h, j, m);
                    h.insert(i, j);
                }
                left -= 1;
            }
        }

        PchkMethod::EvenBoth => {
            // Pre-enumerate one slot per 1 to place, spreading the slots
            // over the rows round-robin.
            let cb_n: usize = (0..d.size()).map(|z| d.num(z) * part[z]).sum();
            let mut u: Vec<usize> = (0..cb_n).map(|k| k % m).collect();

            let mut uneven = 0;
            let mut t = 0;
            let mut z = 0;
            let mut left = part[z];

            for j in 0..n {
                while left == 0 {
                    z += 1;
                    if z >= d.size() {
                        return Err(UnboxError::Construction(
                            "column partition exhausted before all columns were filled"
                                .to_owned(),
                        ));
                    }
                    left = part[z];
                }

                for _ in 0..d.num(z) {
                    // Use the unconsumed slot prefix when it still offers a
                    // row this column does not occupy; otherwise fall back
                    // to rejection sampling over all rows.
                    let mut i = t;
                    while i < cb_n && h.find(u[i], j) {
                        i += 1;
                    }

                    if i == cb_n {
                        uneven += 1;
                        let row = random_free_row(&mut rng, &h, j, m);
                        h.insert(row, j);
                    } else {
                        loop {
                            let pick = t + rng.gen_range(0..cb_n - t);
                            if !h.find(u[pick], j) {
                                h.insert(u[pick], j);
                                u[pick] = u[t];
                                t += 1;
                                break;
                            }
                        }
                    }
                }
                left -= 1;
            }

            if uneven > 0 {
                warn!("had to place {uneven} checks in rows unevenly");
            }
        }
    }

    // Add extra bits to avoid rows with fewer than two checks.
    let mut added = 0;
    for i in 0..m {
        if h.count_row(i) == 0 {
            let j = rng.gen_range(0..n);
            h.insert(i, j);
            added += 1;
        }
        if h.count_row(i) == 1 && n > 1 {
            let taken = h.row(i)[0];
            loop {
                let j = rng.gen_range(0..n);
                if j != taken {
                    h.insert(i, j);
                    added += 1;
                    break;
                }
            }
        }
    }
    if added > 0 {
        warn!("added {added} extra bit-checks to make row counts at least two");
    }

    // When every column weight is even, drop in two extra 1s to break the
    // resulting parity regularities.
    let mut n_full = 0;
    let mut all_even = true;
    for z in 0..d.size() {
        if d.num(z) == m {
            n_full += part[z];
        }
        if d.num(z) % 2 == 1 {
            all_even = false;
        }
    }
    if all_even && n - n_full > 1 && added < 2 {
        let mut extra = 0;
        while added + extra < 2 {
            loop {
                let i = rng.gen_range(0..m);
                let j = rng.gen_range(0..n);
                if !h.find(i, j) {
                    h.insert(i, j);
                    break;
                }
            }
            extra += 1;
        }
        warn!("added {extra} extra bit-checks to try to avoid problems from even column counts");
    }

    if no4cycle {
        eliminate_4cycles(&mut rng, &mut h, m, n);
    }

    Ok(h)
}

/// Finds a row `r1` such that column `j` and some other column both have 1s
/// in `r1` and in one further shared row.
fn find_4cycle(h: &Mod2Sparse, j: usize) -> Option<usize> {
    for &r1 in h.col(j) {
        for &j2 in h.row(r1) {
            if j2 == j {
                continue;
            }
            for &r2 in h.col(j2) {
                if r2 != r1 && h.find(r2, j) {
                    return Some(r1);
                }
            }
        }
    }
    None
}

/// Moves checks within their columns until no length-4 cycle remains, for
/// at most 10 passes over the matrix.
fn eliminate_4cycles(rng: &mut StdRng, h: &mut Mod2Sparse, m: usize, n: usize) {
    let mut eliminated = 0;
    let mut pass = 0;

    while pass < 10 {
        let mut changed = 0;
        for j in 0..n {
            if let Some(r1) = find_4cycle(h, j) {
                let row = random_free_row(rng, h, j, m);
                h.delete(r1, j);
                h.insert(row, j);
                eliminated += 1;
                changed += 1;
            }
        }
        if changed == 0 {
            break;
        }
        pass += 1;
    }

    if eliminated > 0 {
        debug!("eliminated {eliminated} cycles of length four by moving checks within column");
    }
    if pass == 10 {
        warn!("couldn't eliminate all cycles of length four in 10 passes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight3() -> Distribution {
        Distribution::from_spec("3").unwrap()
    }

    #[test]
    fn test_column_partition_is_exact() {
        let d = Distribution::from_spec("0.4x2/0.6x3").unwrap();
        let part = column_partition(&d, 10).unwrap();
        assert_eq!(part.iter().sum::<usize>(), 10);
        assert_eq!(part, vec![4, 6]);
    }

    #[test]
    fn test_every_column_has_three_ones() {
        let h = make(1, PchkMethod::EvenBoth, &weight3(), false, 40, 80).unwrap();
        for j in 0..h.cols() {
            assert_eq!(h.count_col(j), 3, "column {j}");
        }
    }

    #[test]
    fn test_every_row_has_at_least_two_ones() {
        let h = make(1, PchkMethod::EvenBoth, &weight3(), true, 40, 80).unwrap();
        for i in 0..h.rows() {
            assert!(h.count_row(i) >= 2, "row {i} has {} ones", h.count_row(i));
        }
    }

    #[test]
    fn test_evencol_respects_column_weights() {
        let h = make(7, PchkMethod::EvenCol, &weight3(), false, 32, 64).unwrap();
        for j in 0..h.cols() {
            assert_eq!(h.count_col(j), 3);
        }
    }

    #[test]
    fn test_construction_is_deterministic_per_seed() {
        let a = make(1, PchkMethod::EvenBoth, &weight3(), true, 24, 48).unwrap();
        let b = make(1, PchkMethod::EvenBoth, &weight3(), true, 24, 48).unwrap();
        for i in 0..a.rows() {
            assert_eq!(a.row(i), b.row(i));
        }

        let c = make(2, PchkMethod::EvenBoth, &weight3(), true, 24, 48).unwrap();
        let differs = (0..a.rows()).any(|i| a.row(i) != c.row(i));
        assert!(differs);
    }

    #[test]
    fn test_no_4cycles_after_elimination() {
        let h = make(1, PchkMethod::EvenBoth, &weight3(), true, 60, 120).unwrap();
        // Columns sharing two rows would be a length-4 cycle.
        for j in 0..h.cols() {
            assert!(find_4cycle(&h, j).is_none(), "column {j} sits on a 4-cycle");
        }
    }
}
