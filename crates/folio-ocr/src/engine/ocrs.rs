// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ocrs adapter — line recognition with the pure-Rust `ocrs` engine, whose
// neural networks run on `rten`.
//
// ocrs hands back plain text, one line per detected text line, with neither
// confidences nor paragraph structure. Fragments from this engine carry no
// confidence, so the confidence filter never drops them.
//
// # Models
//
// Two `.rten` files are needed, a text detector and a line recognizer, both
// published at <https://github.com/robertknight/ocrs-models>. Running the
// `ocrs` command line tool once (`cargo install ocrs-cli`) downloads them
// into its cache, which is where [`OcrsModelPaths::default`] looks.

use std::path::{Path, PathBuf};

use ::ocrs::{ImageSource, OcrEngine as OcrsBackend, OcrEngineParams};
use folio_core::error::{FolioError, Result};
use folio_core::{PipelineConfig, RecognitionFragment};
use image::DynamicImage;
use rten::Model;
use tracing::{debug, info, instrument, warn};

use super::{RawRecognition, RecognitionEngine, RecognitionRequest, normalize};

/// The `ocrs` tool's model cache: `$XDG_CACHE_HOME/ocrs`, else
/// `$HOME/.cache/ocrs`, else `./ocrs-models`.
fn default_model_dir() -> PathBuf {
    std::env::var_os("XDG_CACHE_HOME")
        .map(|cache| PathBuf::from(cache).join("ocrs"))
        .or_else(|| std::env::var_os("HOME").map(|home| Path::new(&home).join(".cache/ocrs")))
        .unwrap_or_else(|| PathBuf::from("ocrs-models"))
}

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Locations of the two model files.
#[derive(Debug, Clone)]
pub struct OcrsModelPaths {
    pub detection: PathBuf,
    pub recognition: PathBuf,
}

impl Default for OcrsModelPaths {
    /// Paths inside the default model cache directory.
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrsModelPaths {
    /// Both model files inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection: dir.join(DETECTION_MODEL_FILENAME),
            recognition: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for (kind, path) in [("detection", &self.detection), ("recognition", &self.recognition)] {
            if !path.exists() {
                return Err(FolioError::EngineInit(format!(
                    "{kind} model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Recognition with the `ocrs` neural engine.
pub struct OcrsEngine {
    backend: OcrsBackend,
}

impl OcrsEngine {
    /// Load both models. This is the expensive step; keep the engine and
    /// reuse it for every page.
    ///
    /// # Errors
    ///
    /// [`FolioError::EngineInit`] if model files are missing or corrupt.
    ///
    /// # Performance
    ///
    /// `ocrs` and `rten` must be compiled in release mode; debug builds are
    /// 10-100x slower.
    #[instrument(skip_all, fields(
        detection = %paths.detection.display(),
        recognition = %paths.recognition.display(),
    ))]
    pub fn new(paths: &OcrsModelPaths, config: &PipelineConfig) -> Result<Self> {
        paths.validate()?;

        if config.use_accelerator() {
            warn!("GPU requested but ocrs runs on the CPU only; continuing on CPU");
        }
        if !config.languages().iter().any(|l| l == "en") {
            debug!(languages = ?config.languages(), "ocrs recognizes Latin script regardless of language");
        }

        info!(kind = "detection", "Loading ocrs model");
        let detection_model = load_model(&paths.detection, "detection")?;
        info!(kind = "recognition", "Loading ocrs model");
        let recognition_model = load_model(&paths.recognition, "recognition")?;

        let backend = OcrsBackend::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| FolioError::EngineInit(format!("failed to initialise ocrs: {err}")))?;

        info!("ocrs engine ready");
        Ok(Self { backend })
    }
}

fn load_model(path: &Path, kind: &str) -> Result<Model> {
    Model::load_file(path).map_err(|err| {
        FolioError::EngineInit(format!(
            "failed to load {kind} model from {}: {err}",
            path.display()
        ))
    })
}

/// Split ocrs output into fragments: one per non-blank line, or one for the
/// whole page when paragraphs are requested.
fn split_text(text: &str, whole_page: bool) -> Vec<RawRecognition> {
    if whole_page {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        return vec![RawRecognition::Plain(trimmed.to_string())];
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| RawRecognition::Plain(line.to_string()))
        .collect()
}

impl RecognitionEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(
        &self,
        image: &DynamicImage,
        request: &RecognitionRequest<'_>,
    ) -> Result<Vec<RecognitionFragment>> {
        let fail = |reason: String| FolioError::Recognition {
            engine: "ocrs",
            reason,
        };

        // ocrs takes packed RGB; binarized pages are expanded back to three channels.
        let rgb = image.to_rgb8();
        let (width, height) = (rgb.width(), rgb.height());

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            fail(format!("failed to create image source ({width}x{height}): {err}"))
        })?;
        let input = self
            .backend
            .prepare_input(source)
            .map_err(|err| fail(format!("OCR preprocessing failed: {err}")))?;
        let text = self
            .backend
            .get_text(&input)
            .map_err(|err| fail(format!("OCR text recognition failed: {err}")))?;

        let fragments = normalize(
            split_text(&text, request.group_into_paragraphs),
            request.detail,
        );
        debug!(fragments = fragments.len(), chars = text.len(), "ocrs recognition complete");
        Ok(fragments)
    }
}
