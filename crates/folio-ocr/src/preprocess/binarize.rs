// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adaptive binarization — local-threshold black/white conversion that copes
// with uneven lighting and page-curl shadows.

use folio_core::AdaptiveMethod;
use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::gaussian_blur_f32;
use imageproc::integral_image::{integral_image, sum_image_pixels};
use tracing::{debug, instrument};

/// Neighbourhood edge length in pixels.
pub const DEFAULT_BLOCK_SIZE: u32 = 31;

/// Subtracted from the local mean to form the threshold.
pub const DEFAULT_OFFSET: i32 = 10;

/// Threshold `gray` against a per-pixel local threshold.
///
/// The threshold is the mean of the `block_size` × `block_size` neighbourhood
/// (plain or Gaussian-weighted) minus `offset`. A pixel strictly brighter than
/// its threshold becomes white (255), every other pixel black (0).
///
/// `block_size` is forced odd and at least 3.
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn adaptive_threshold(
    gray: &GrayImage,
    method: AdaptiveMethod,
    block_size: u32,
    offset: i32,
) -> GrayImage {
    let block_size = (block_size.max(3)) | 1;
    let (width, height) = gray.dimensions();

    let local_mean: Box<dyn Fn(u32, u32) -> f64> = match method {
        AdaptiveMethod::Mean => {
            let sums = integral_image::<_, u64>(gray);
            let radius = block_size / 2;
            Box::new(move |x, y| window_mean(&sums, width, height, x, y, radius))
        }
        AdaptiveMethod::Gaussian => {
            let blurred = gaussian_blur_f32(gray, gaussian_sigma(block_size));
            Box::new(move |x, y| blurred.get_pixel(x, y).0[0] as f64)
        }
    };

    let mut output = GrayImage::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        let threshold = local_mean(x, y) - offset as f64;
        let binary = if pixel.0[0] as f64 > threshold { 255u8 } else { 0u8 };
        output.put_pixel(x, y, Luma([binary]));
    }

    debug!(block_size, offset, ?method, "Adaptive binarization complete");
    output
}

/// Sigma of the Gaussian kernel whose support matches `block_size`.
fn gaussian_sigma(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Mean of the `(2 * radius + 1)`-square window centred on (x, y), read from
/// the page's summed-area table. Windows at the page edge are cut to the
/// part that lies on the page.
fn window_mean(sums: &Image<Luma<u64>>, width: u32, height: u32, x: u32, y: u32, radius: u32) -> f64 {
    let left = x.saturating_sub(radius);
    let top = y.saturating_sub(radius);
    let right = x.saturating_add(radius).min(width - 1);
    let bottom = y.saturating_add(radius).min(height - 1);

    let pixels = u64::from(right - left + 1) * u64::from(bottom - top + 1);
    let [ink] = sum_image_pixels(sums, left, top, right, bottom);
    ink as f64 / pixels as f64
}
