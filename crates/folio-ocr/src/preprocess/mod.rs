// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR preprocessing — rescale, grayscale, denoise, adaptive binarization.

pub mod binarize;
pub mod denoise;

use folio_core::error::{FolioError, Result};
use folio_core::{AdaptiveMethod, DenoiseMethod, PipelineConfig};
use image::imageops::FilterType;
use image::{GrayImage, RgbImage};
use tracing::{debug, info, instrument};

pub use binarize::{DEFAULT_BLOCK_SIZE, DEFAULT_OFFSET, adaptive_threshold};
pub use denoise::{denoise, non_local_means};

/// Parameters of one preprocessing run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessOptions {
    /// Resize factor applied to both axes. `1.0` skips resizing.
    pub scale: f32,
    /// Denoising filter, or `None` to skip the step.
    pub denoise: Option<DenoiseMethod>,
    pub adaptive_method: AdaptiveMethod,
    pub block_size: u32,
    pub offset: i32,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            scale: 1.5,
            denoise: Some(DenoiseMethod::NonLocalMeans),
            adaptive_method: AdaptiveMethod::Gaussian,
            block_size: DEFAULT_BLOCK_SIZE,
            offset: DEFAULT_OFFSET,
        }
    }
}

impl PreprocessOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            scale: config.scale(),
            denoise: config.denoise().then(|| config.denoise_method()),
            adaptive_method: config.adaptive_method(),
            ..Self::default()
        }
    }
}

/// Turns a color page photo into a black-and-white image suited to text
/// recognition.
///
/// Steps always run in this order, since each assumes the previous one:
///
/// 1. Rescale by `scale` (Catmull-Rom cubic interpolation)
/// 2. Grayscale conversion
/// 3. Denoise (optional)
/// 4. Adaptive binarization
///
/// The transformation is pure: the same input and options always give the
/// same output.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    options: PreprocessOptions,
}

impl Preprocessor {
    pub fn new(options: PreprocessOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(PreprocessOptions::from_config(config))
    }

    /// Run the full pipeline on `image`.
    ///
    /// # Errors
    ///
    /// [`FolioError::InvalidImageData`] if the image has zero width or height.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn preprocess(&self, image: &RgbImage) -> Result<GrayImage> {
        ensure_dimensions(image.width(), image.height())?;
        let opts = &self.options;
        info!(scale = opts.scale, denoise = ?opts.denoise, "Preprocessing page");

        let gray = match rescale(image, opts.scale) {
            Some(resized) => to_grayscale(&resized),
            None => to_grayscale(image),
        };

        let gray = match opts.denoise {
            Some(method) => denoise(&gray, method),
            None => gray,
        };

        let binary = adaptive_threshold(&gray, opts.adaptive_method, opts.block_size, opts.offset);
        debug!(
            out_w = binary.width(),
            out_h = binary.height(),
            "Preprocessing complete"
        );
        Ok(binary)
    }
}

/// Fail with [`FolioError::InvalidImageData`] on a degenerate image.
pub fn ensure_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(FolioError::InvalidImageData { width, height });
    }
    Ok(())
}

/// Resize both axes by `scale`, truncating to whole pixels (never below 1).
///
/// Returns `None` when `scale` is exactly 1.0 and nothing needs to happen.
pub fn rescale(image: &RgbImage, scale: f32) -> Option<RgbImage> {
    if scale == 1.0 {
        return None;
    }
    let (w, h) = scaled_dimensions(image.width(), image.height(), scale);
    debug!(
        from_w = image.width(),
        from_h = image.height(),
        to_w = w,
        to_h = h,
        "Rescaling"
    );
    Some(image::imageops::resize(image, w, h, FilterType::CatmullRom))
}

fn scaled_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let w = (width as f64 * scale as f64) as u32;
    let h = (height as f64 * scale as f64) as u32;
    (w.max(1), h.max(1))
}

/// Luminance of an RGB image.
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}
