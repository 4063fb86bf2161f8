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

//! Adaptive equalization of downsampled data frames.
//!
//! The input frame carries a set of symbols as equidistant gray values that
//! drift with the illumination across the frame. The equalizer subdivides
//! the frame into tiles, fits a 5x5 filter per tile with LMS against that
//! tile's expected symbol means, applies the filter with edge clamping, and
//! quantizes the result into symbol indices.

use crate::error::{Result, UnboxError};
use crate::image::Image8;
use crate::matrix::{FilterCoeff2d, MultipageFloatMatrix};
use crate::viewport::{Viewport, ViewportMut};

/// Side of the square LMS filter.
const FILTER_SIZE: usize = 5;

/// LMS passes per tile.
const COEFF_LOOPS: usize = 10;

/// Tile grid for a frame: `(rows, cols, vertical step, horizontal step)`.
fn tile_grid(
    width: usize,
    height: usize,
    block_width: usize,
    block_height: usize,
) -> (usize, usize, f64, f64) {
    let rows = (height / block_height).max(1);
    let cols = (width / block_width).max(1);
    (
        rows,
        cols,
        height as f64 / rows as f64,
        width as f64 / cols as f64,
    )
}

/// Start and extent of tile `index` along one axis.
///
/// Rounding the accumulated step keeps the tiles gapless: the spans of all
/// tiles along an axis sum exactly to the frame extent.
fn tile_span(index: usize, step: f64) -> (usize, usize) {
    let start = (index as f64 * step + 0.5).floor() as usize;
    let end = ((index as f64 + 1.0) * step + 0.5).floor() as usize;
    (start, end - start)
}

/// Index of the first threshold above `value`, i.e. the symbol bin the
/// value falls into.
fn identify_symbol(value: f32, thresholds: &[f32]) -> usize {
    thresholds
        .iter()
        .position(|&t| value < t)
        .unwrap_or(thresholds.len())
}

/// Midpoints between consecutive symbol means.
fn thresholds_of(symbol_mean: &[f32]) -> Vec<f32> {
    symbol_mean
        .windows(2)
        .map(|pair| (pair[0] + pair[1]) / 2.0)
        .collect()
}

/// Sums the squared 5x5 neighborhood of every interior pixel of the view.
fn calc_signal_energy(energy: &mut ViewportMut<f32>, input: &Viewport<u8>, filter: &FilterCoeff2d) {
    let n = filter.rows();
    let d = n / 2;
    let width = input.width();
    let height = input.height();

    for m in d..height.saturating_sub(d) {
        let row = energy.scanline_mut(m);
        for x in d..width.saturating_sub(d) {
            let mut sum = 0.0f32;
            for i in 0..n {
                for j in 0..n {
                    let p = f32::from(input.at((x - d + j) as isize, (m - d + i) as isize));
                    sum += p * p;
                }
            }
            row[x] = sum;
        }
    }
}

/// One LMS pass over the interior of the view.
///
/// Classifies the filter's prediction at every pixel, then nudges every
/// coefficient towards the mean of the predicted symbol, normalized by the
/// pixel's signal energy. A zero energy propagates through the division as
/// an IEEE infinity; the pass itself never fails.
fn calc_filter_coeffs(
    input: &Viewport<u8>,
    energy: &Viewport<f32>,
    filter: &mut FilterCoeff2d,
    symbol_mean: &[f32],
) {
    let n = filter.rows();
    let d = n / 2;
    let width = input.width();
    let height = input.height();
    let thresholds = thresholds_of(symbol_mean);
    let update_factor = 1.0 / (2 * n * n) as f32;

    for m in d..height.saturating_sub(d) {
        let energy_row = energy.scanline(m);
        for x in d..width.saturating_sub(d) {
            let mut estimated = 0.0f32;
            let coeff = filter.as_slice();
            let mut idx = 0;
            for i in 0..n {
                for j in 0..n {
                    estimated +=
                        coeff[idx] * f32::from(input.at((x - d + j) as isize, (m - d + i) as isize));
                    idx += 1;
                }
            }

            let index = identify_symbol(estimated, &thresholds);
            let err = symbol_mean[index] - estimated;
            let k = update_factor * err / energy_row[x];

            let coeff = filter.as_mut_slice();
            let mut idx = 0;
            for i in 0..n {
                for j in 0..n {
                    coeff[idx] +=
                        k * f32::from(input.at((x - d + j) as isize, (m - d + i) as isize));
                    idx += 1;
                }
            }
        }
    }
}

/// Applies the fitted filter over the whole view.
///
/// Border pixels borrow their missing neighborhood from the enclosing
/// buffer when the view has headroom there, and clamp to the buffer edge
/// otherwise, so tiles at the frame edge read neighboring data instead of
/// zero padding.
fn filter_extend(out: &mut ViewportMut<f32>, input: &Viewport<u8>, coeff: &FilterCoeff2d) {
    fn clamp(min: isize, max: isize, value: isize) -> isize {
        value.max(min).min(max)
    }

    let c_rows = coeff.rows() as isize;
    let c_cols = coeff.cols() as isize;
    let d = c_rows / 2;
    let x_offset = input.offset_x() as isize;
    let y_offset = input.offset_y() as isize;
    let width = input.width() as isize;
    let height = input.height() as isize;
    let buffer_width = input.buffer_width() as isize;
    let buffer_height = input.buffer_height() as isize;

    let x_clamp_min = if x_offset > d { -d } else { -x_offset };
    let y_clamp_min = if y_offset > d { -d } else { -y_offset };
    let x_clamp_max = if buffer_width - 1 - (x_offset + width) > d {
        width + d - 1
    } else {
        buffer_width - 1 - x_offset
    };
    let y_clamp_max = if buffer_height - 1 - (y_offset + height) > d {
        height + d - 1
    } else {
        buffer_height - 1 - y_offset
    };

    let c = coeff.as_slice();
    for y in 0..height {
        let out_row = out.scanline_mut(y as usize);
        for x in 0..width {
            let mut sum = 0.0f32;
            let mut idx = 0;
            for mm in 0..c_rows {
                let sy = clamp(y_clamp_min, y_clamp_max, y - c_rows / 2 + mm);
                for nn in 0..c_cols {
                    let sx = clamp(x_clamp_min, x_clamp_max, x - c_cols / 2 + nn);
                    sum += c[idx] * f32::from(input.at(sx, sy));
                    idx += 1;
                }
            }
            out_row[x as usize] = sum;
        }
    }
}

/// Maps every filtered pixel to its symbol index.
fn quantize(out: &mut ViewportMut<u8>, input: &Viewport<f32>, symbol_mean: &[f32]) {
    let thresholds = thresholds_of(symbol_mean);
    for m in 0..input.height() {
        let src_row = input.scanline(m);
        let out_row = out.scanline_mut(m);
        for (x, pixel) in out_row.iter_mut().enumerate() {
            *pixel = identify_symbol(src_row[x], &thresholds) as u8;
        }
    }
}

/// Equalizes a downsampled data frame into symbol indices.
///
/// Every pixel of `out` receives the index in `[0, symbols_per_pixel)` of
/// the symbol its neighborhood most resembles. `means` supplies, for each
/// tile of the grid implied by the block size, a monotonically
/// non-decreasing vector of `symbols_per_pixel` expected gray levels (one
/// page per tile row, one matrix row per tile column); see
/// [`measure_symbol_means`].
///
/// Fails only on shape mismatches between the images, the mean matrix and
/// the block grid. Numeric degeneracies such as zero signal energy follow
/// IEEE semantics instead of failing.
pub fn equalize(
    out: &mut Image8,
    input: &Image8,
    means: &MultipageFloatMatrix,
    symbols_per_pixel: usize,
    block_width: usize,
    block_height: usize,
) -> Result<()> {
    if out.width() != input.width() || out.height() != input.height() {
        return Err(UnboxError::InvalidInput(
            "output image shape differs from input".to_owned(),
        ));
    }
    if symbols_per_pixel == 0 || block_width == 0 || block_height == 0 {
        return Err(UnboxError::InvalidInput(
            "symbol count and block size must be nonzero".to_owned(),
        ));
    }

    let width = input.width();
    let height = input.height();
    let (rows, cols, vstep, hstep) = tile_grid(width, height, block_width, block_height);

    if means.pages() < rows
        || means.page(0).rows() < cols
        || means.page(0).cols() < symbols_per_pixel
    {
        return Err(UnboxError::InvalidInput(
            "mean matrix does not cover the tile grid".to_owned(),
        ));
    }

    let bad_view = || UnboxError::InvalidInput("viewport does not fit its buffer".to_owned());

    let mut fimage = vec![0.0f32; width * height];
    let mut eimage = vec![0.0f32; width * height];

    let mut in_vp =
        Viewport::new(input.as_slice(), width, height, input.stride()).ok_or_else(bad_view)?;
    let (out_w, out_h, out_stride) = (out.width(), out.height(), out.stride());

    for row in 0..rows {
        let (y, tile_h) = tile_span(row, vstep);
        for col in 0..cols {
            let (x, tile_w) = tile_span(col, hstep);

            in_vp.reset();
            in_vp.set_view(tile_w as i32, tile_h as i32, x as i32, y as i32);

            let symbol_mean = &means.page(row).row(col)[..symbols_per_pixel];
            let mut filter = FilterCoeff2d::identity(FILTER_SIZE);

            {
                let mut energy_vp =
                    ViewportMut::new(&mut eimage, width, height, width).ok_or_else(bad_view)?;
                energy_vp.set_view(tile_w as i32, tile_h as i32, x as i32, y as i32);
                calc_signal_energy(&mut energy_vp, &in_vp, &filter);
            }

            {
                let mut energy_vp =
                    Viewport::new(&eimage, width, height, width).ok_or_else(bad_view)?;
                energy_vp.set_view(tile_w as i32, tile_h as i32, x as i32, y as i32);
                for _ in 0..COEFF_LOOPS {
                    calc_filter_coeffs(&in_vp, &energy_vp, &mut filter, symbol_mean);
                }
            }

            {
                let mut tmp_vp =
                    ViewportMut::new(&mut fimage, width, height, width).ok_or_else(bad_view)?;
                tmp_vp.set_view(tile_w as i32, tile_h as i32, x as i32, y as i32);
                filter_extend(&mut tmp_vp, &in_vp, &filter);
            }

            {
                let mut tmp_vp =
                    Viewport::new(&fimage, width, height, width).ok_or_else(bad_view)?;
                tmp_vp.set_view(tile_w as i32, tile_h as i32, x as i32, y as i32);
                let mut out_vp = ViewportMut::new(out.as_mut_slice(), out_w, out_h, out_stride)
                    .ok_or_else(bad_view)?;
                out_vp.set_view(tile_w as i32, tile_h as i32, x as i32, y as i32);
                quantize(&mut out_vp, &tmp_vp, symbol_mean);
            }
        }
    }

    Ok(())
}

/// Measures the expected symbol means of every tile.
///
/// Sorts each tile's pixels and averages `symbols` equal-count bins, which
/// yields a monotonically non-decreasing mean vector per tile. The result
/// is laid out the way [`equalize`] consumes it: one page per tile row, one
/// matrix row per tile column.
pub fn measure_symbol_means(
    input: &Image8,
    block_width: usize,
    block_height: usize,
    symbols: usize,
) -> Result<MultipageFloatMatrix> {
    if symbols == 0 || block_width == 0 || block_height == 0 {
        return Err(UnboxError::InvalidInput(
            "symbol count and block size must be nonzero".to_owned(),
        ));
    }

    let (rows, cols, vstep, hstep) = tile_grid(input.width(), input.height(), block_width, block_height);
    let mut means = MultipageFloatMatrix::new(rows, cols, symbols);

    for row in 0..rows {
        let (y, tile_h) = tile_span(row, vstep);
        for col in 0..cols {
            let (x, tile_w) = tile_span(col, hstep);

            let mut pixels = Vec::with_capacity(tile_w * tile_h);
            for ty in y..y + tile_h {
                pixels.extend_from_slice(&input.row(ty)[x..x + tile_w]);
            }
            pixels.sort_unstable();

            let tile_means = means.page_mut(row).row_mut(col);
            let count = pixels.len();
            for s in 0..symbols {
                let lo = s * count / symbols;
                let hi = (s + 1) * count / symbols;
                if hi > lo {
                    let sum: f64 = pixels[lo..hi].iter().map(|&p| f64::from(p)).sum();
                    tile_means[s] = (sum / (hi - lo) as f64) as f32;
                } else {
                    // Fewer pixels than symbols; reuse the nearest value to
                    // keep the vector monotone.
                    tile_means[s] = f32::from(pixels[lo.min(count - 1)]);
                }
            }
        }
    }

    Ok(means)
}
