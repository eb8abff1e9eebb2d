// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR pipeline — decode, preprocess, recognize, assemble, for one image at a
// time, around a single long-lived recognition engine.

use std::path::{Path, PathBuf};

use folio_core::error::{FolioError, Result};
use folio_core::{OcrResult, PipelineConfig};
use image::{DynamicImage, ImageReader, RgbImage};
use tracing::{debug, info, instrument};

use crate::assemble::assemble;
use crate::catalog::ImagePath;
use crate::engine::{RecognitionEngine, RecognitionRequest};
use crate::preprocess::{Preprocessor, ensure_dimensions};

/// Reusable OCR pipeline.
///
/// Owns one recognition engine for its whole lifetime: the engine is acquired
/// when the pipeline is built and released when the pipeline is dropped.
/// Every [`run_on_image`](Self::run_on_image) call is independent.
///
/// ```rust,ignore
/// use folio_ocr::{Pipeline, TesseractEngine, catalog};
///
/// let config = PipelineConfig::default();
/// let pipeline = Pipeline::load(config, TesseractEngine::new)?;
/// for image in catalog::discover("~/scans/quijote")? {
///     println!("{}", pipeline.run_on_image(&image)?.text);
/// }
/// ```
pub struct Pipeline<E: RecognitionEngine> {
    config: PipelineConfig,
    preprocessor: Preprocessor,
    engine: E,
}

impl<E: RecognitionEngine> Pipeline<E> {
    /// Wrap an already constructed engine.
    pub fn new(config: PipelineConfig, engine: E) -> Self {
        info!(engine = engine.name(), languages = ?config.languages(), "Pipeline ready");
        Self {
            preprocessor: Preprocessor::from_config(&config),
            config,
            engine,
        }
    }

    /// Construct the engine from the config, then the pipeline.
    ///
    /// # Errors
    ///
    /// Whatever `loader` fails with, typically [`FolioError::EngineInit`].
    pub fn load<F>(config: PipelineConfig, loader: F) -> Result<Self>
    where
        F: FnOnce(&PipelineConfig) -> Result<E>,
    {
        let engine = loader(&config)?;
        Ok(Self::new(config, engine))
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Extract the text of one image.
    ///
    /// # Errors
    ///
    /// - [`FolioError::ImageDecode`] if the file cannot be decoded.
    /// - [`FolioError::InvalidImageData`] if it decodes to zero pixels.
    /// - [`FolioError::Recognition`] if the engine fails.
    #[instrument(skip_all, fields(image = %image))]
    pub fn run_on_image(&self, image: &ImagePath) -> Result<OcrResult> {
        let resolved = resolve(image.as_path());
        let raw = decode(&resolved)?;
        self.run_on_decoded(&resolved, raw)
    }

    /// Preprocess, recognize, and assemble an already decoded image.
    /// `resolved` is only recorded in the result.
    pub fn run_on_decoded(&self, resolved: &Path, raw: RgbImage) -> Result<OcrResult> {
        ensure_dimensions(raw.width(), raw.height())?;

        let input = if self.config.preprocess() {
            DynamicImage::ImageLuma8(self.preprocessor.preprocess(&raw)?)
        } else {
            DynamicImage::ImageRgb8(raw)
        };

        let request = RecognitionRequest::from_config(&self.config);
        let fragments = self.engine.recognize(&input, &request)?;
        debug!(fragments = fragments.len(), "Engine returned");

        let result = assemble(resolved, fragments, self.config.min_confidence());
        info!(
            chars = result.text.chars().count(),
            fragments = result.fragments.len(),
            "Image processed"
        );
        Ok(result)
    }
}

impl<E: RecognitionEngine> Drop for Pipeline<E> {
    fn drop(&mut self) {
        debug!(engine = self.engine.name(), "Releasing recognition engine");
    }
}

/// Absolute form of `path`: canonical when the file exists, otherwise made
/// absolute against the working directory.
fn resolve(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Decode `path` into an RGB buffer. The format is sniffed from the content,
/// falling back to the extension.
fn decode(path: &Path) -> Result<RgbImage> {
    let fail = |reason: String| FolioError::ImageDecode {
        path: path.to_path_buf(),
        reason,
    };
    let image = ImageReader::open(path)
        .map_err(|err| fail(err.to_string()))?
        .with_guessed_format()
        .map_err(|err| fail(err.to_string()))?
        .decode()
        .map_err(|err| fail(err.to_string()))?;
    debug!(
        width = image.width(),
        height = image.height(),
        "Image decoded"
    );
    Ok(image.to_rgb8())
}
