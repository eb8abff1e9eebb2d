// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Denoising filters for grayscale page images.
//
// Non-local means replaces each pixel by a weighted average of pixels whose
// surrounding patches look alike. Patch distances for one search offset are
// read from a summed-area table of squared differences, so the cost per
// pixel is O(search window) instead of O(search window × patch). The distance
// between p and p+d equals the one between p+d and p, so only half of the
// offsets are tabulated and each table feeds both pixels. The page is
// filtered in horizontal bands to keep the tables a fixed height.

use folio_core::DenoiseMethod;
use image::GrayImage;
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, instrument};

/// Filter strength of non-local means. Larger removes more noise and more
/// detail.
pub const NLM_STRENGTH: f32 = 10.0;

/// Patch edge length compared between pixels.
pub const NLM_TEMPLATE_SIZE: u32 = 7;

/// Edge length of the window searched for similar patches.
pub const NLM_SEARCH_SIZE: u32 = 21;

/// Sigma of the lighter Gaussian variant (a 5×5 kernel).
pub const GAUSSIAN_SIGMA: f32 = 1.1;

/// Weights below exp(-CUTOFF) are skipped.
const WEIGHT_CUTOFF: f32 = 9.0;

/// Output rows filtered per band.
const BAND_ROWS: usize = 64;

/// Denoise `gray` with the chosen method.
pub fn denoise(gray: &GrayImage, method: DenoiseMethod) -> GrayImage {
    match method {
        DenoiseMethod::NonLocalMeans => {
            non_local_means(gray, NLM_STRENGTH, NLM_TEMPLATE_SIZE, NLM_SEARCH_SIZE)
        }
        DenoiseMethod::Gaussian => gaussian_blur_f32(gray, GAUSSIAN_SIGMA),
    }
}

/// Non-local means denoising.
///
/// `template_size` and `search_size` are forced odd. Borders are handled by
/// replicating edge pixels. A non-positive `strength` leaves the page as is.
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn non_local_means(
    gray: &GrayImage,
    strength: f32,
    template_size: u32,
    search_size: u32,
) -> GrayImage {
    let out = filter_in_bands(gray, strength, template_size, search_size, BAND_ROWS);
    debug!(strength, template_size, search_size, "Non-local means complete");
    out
}

fn filter_in_bands(
    gray: &GrayImage,
    strength: f32,
    template_size: u32,
    search_size: u32,
    band_rows: usize,
) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 || strength.is_nan() || strength <= 0.0 {
        return gray.clone();
    }

    let geometry = Geometry {
        width: width as usize,
        tr: (template_size / 2) as usize,
        sr: (search_size / 2) as usize,
    };
    let padded = Padded::new(gray, geometry.tr + geometry.sr);
    let weights = weight_table(strength, geometry.tr);
    let band_rows = band_rows.clamp(1, height as usize);
    let mut scratch = Scratch::new(&geometry, band_rows);

    let mut out = GrayImage::new(width, height);
    let raw: &mut [u8] = &mut out;
    for y0 in (0..height as usize).step_by(band_rows) {
        let y1 = (y0 + band_rows).min(height as usize);
        filter_band(&padded, &weights, &geometry, &mut scratch, y0, y1);

        let rows = y1 - y0;
        let dst = &mut raw[y0 * geometry.width..y1 * geometry.width];
        let acc = &scratch.acc[..rows * geometry.width];
        let weight_sum = &scratch.weight_sum[..rows * geometry.width];
        for ((px, &a), &w) in dst.iter_mut().zip(acc).zip(weight_sum) {
            // The zero offset always contributes weight 1, so `w` is positive.
            *px = (a / w).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Page width plus template and search radii.
struct Geometry {
    width: usize,
    tr: usize,
    sr: usize,
}

/// Per-band working memory. Sized by the page width and band height only.
struct Scratch {
    /// Summed-area table of squared differences for one offset, `u32`
    /// with wrapping arithmetic: every patch sum fits, so box sums are exact.
    table: Vec<u32>,
    acc: Vec<f32>,
    weight_sum: Vec<f32>,
}

impl Scratch {
    fn new(geometry: &Geometry, band_rows: usize) -> Self {
        let Geometry { width, tr, sr } = *geometry;
        let table_rows = band_rows + sr + 2 * tr + 1;
        let table_cols = width + sr + 2 * tr + 1;
        Self {
            table: vec![0; table_rows * table_cols],
            acc: vec![0.0; band_rows * width],
            weight_sum: vec![0.0; band_rows * width],
        }
    }

    #[cfg(test)]
    fn bytes(&self) -> usize {
        self.table.len() * size_of::<u32>() + (self.acc.len() + self.weight_sum.len()) * size_of::<f32>()
    }
}

/// `exp(-ssd / (patch_area * strength²))` for every patch distance that
/// stays under the cutoff. Longer distances fall off the end of the table.
fn weight_table(strength: f32, tr: usize) -> Vec<f32> {
    let patch_area = ((2 * tr + 1) * (2 * tr + 1)) as f32;
    let inv = 1.0 / (patch_area * strength * strength);
    let worst = patch_area * 255.0 * 255.0;
    let limit = (WEIGHT_CUTOFF / inv).min(worst) as usize;
    (0..=limit).map(|ssd| (-(ssd as f32) * inv).exp()).collect()
}

/// Accumulate weighted neighbours for output rows `y0..y1`.
fn filter_band(
    padded: &Padded,
    weights: &[f32],
    geometry: &Geometry,
    scratch: &mut Scratch,
    y0: usize,
    y1: usize,
) {
    let Geometry { width, tr, sr } = *geometry;
    let n = (y1 - y0) * width;
    let Scratch {
        table,
        acc,
        weight_sum,
    } = scratch;
    let (acc, weight_sum) = (&mut acc[..n], &mut weight_sum[..n]);

    // Zero offset: every pixel matches itself with weight 1.
    for (row, y) in (y0..y1).enumerate() {
        let own = padded.row(0, y as isize, width);
        let dst = row * width..(row + 1) * width;
        for ((a, w), &v) in acc[dst.clone()].iter_mut().zip(&mut weight_sum[dst]).zip(own) {
            *a = f32::from(v);
            *w = 1.0;
        }
    }

    let (y0, y1) = (y0 as isize, y1 as isize);
    let (tr, sr, width) = (tr as isize, sr as isize, width as isize);
    let k = (2 * tr + 1) as usize;

    for dy in 0..=sr {
        let first_dx = if dy == 0 { 1 } else { -sr };
        for dx in first_dx..=sr {
            // Grid of pixels q whose pair (q, q + d) touches the band, either
            // because q lies in it or because q + d does.
            let qx0 = -dx.max(0);
            let qy0 = y0 - dy;
            let grid_w = (width + dx.abs()) as usize;
            let grid_h = (y1 - qy0) as usize;
            let cols = grid_w + 2 * tr as usize;
            let stride = cols + 1;
            // The stride changes with `dx`, so the zero edge is rewritten.
            table[..stride].fill(0);

            for r in 0..grid_h + 2 * tr as usize {
                let y = qy0 - tr + r as isize;
                let here = padded.row(qx0 - tr, y, cols);
                let there = padded.row(qx0 - tr + dx, y + dy, cols);
                let (done, rest) = table.split_at_mut((r + 1) * stride);
                let above = &done[r * stride..];
                let current = &mut rest[..stride];
                current[0] = 0;
                let mut run = 0u32;
                for (c, (&a, &b)) in here.iter().zip(there).enumerate() {
                    let d = i32::from(a) - i32::from(b);
                    run = run.wrapping_add((d * d) as u32);
                    current[c + 1] = run.wrapping_add(above[c + 1]);
                }
            }

            for gy in 0..grid_h {
                let qy = qy0 + gy as isize;
                let py = qy + dy;
                let forward = qy >= y0;
                let backward = (y0..y1).contains(&py);
                if !forward && !backward {
                    continue;
                }
                let top = &table[gy * stride..(gy + 1) * stride];
                let bottom = &table[(gy + k) * stride..(gy + k + 1) * stride];
                let q_row = padded.row(qx0, qy, grid_w);
                let p_row = padded.row(qx0 + dx, py, grid_w);

                for gx in 0..grid_w {
                    let ssd = bottom[gx + k]
                        .wrapping_sub(bottom[gx])
                        .wrapping_sub(top[gx + k])
                        .wrapping_add(top[gx]);
                    let Some(&w) = weights.get(ssd as usize) else {
                        continue;
                    };
                    let qx = qx0 + gx as isize;
                    if forward && (0..width).contains(&qx) {
                        let i = ((qy - y0) * width + qx) as usize;
                        acc[i] += w * f32::from(p_row[gx]);
                        weight_sum[i] += w;
                    }
                    let px = qx + dx;
                    if backward && (0..width).contains(&px) {
                        let i = ((py - y0) * width + px) as usize;
                        acc[i] += w * f32::from(q_row[gx]);
                        weight_sum[i] += w;
                    }
                }
            }
        }
    }
}

/// Grayscale pixels with a replicated border of `pad` pixels on every side.
struct Padded {
    data: Vec<u8>,
    stride: usize,
    pad: usize,
}

impl Padded {
    fn new(gray: &GrayImage, pad: usize) -> Self {
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        let stride = w + 2 * pad;
        let source: &[u8] = gray;
        let mut data = Vec::with_capacity(stride * (h + 2 * pad));
        for y in 0..h + 2 * pad {
            let sy = y.saturating_sub(pad).min(h - 1);
            let line = &source[sy * w..(sy + 1) * w];
            data.extend(std::iter::repeat_n(line[0], pad));
            data.extend_from_slice(line);
            data.extend(std::iter::repeat_n(line[w - 1], pad));
        }
        Self { data, stride, pad }
    }

    /// `len` pixels starting at page coordinates (x, y), which may lie up to
    /// `pad` pixels outside the page.
    fn row(&self, x: isize, y: isize, len: usize) -> &[u8] {
        let pad = self.pad as isize;
        let start = (y + pad) as usize * self.stride + (x + pad) as usize;
        &self.data[start..start + len]
    }
}
