// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract adapter — structured, paragraph-aware recognition through the
// system `tesseract` binary (via `rusty-tesseract`).
//
// Tesseract reports one row per word with its block/paragraph/line indices,
// a bounding box, and a 0–100 confidence. Rows are grouped into line or
// paragraph fragments and confidences rescaled to [0, 1].
//
// # Setup
//
// The `tesseract` binary must be on `PATH`, with trained data for every
// requested language (e.g. `tesseract-ocr-spa` and `tesseract-ocr-eng` on
// Debian-based systems).

use std::collections::HashMap;

use folio_core::error::{FolioError, Result};
use folio_core::{PipelineConfig, RecognitionFragment};
use image::DynamicImage;
use rusty_tesseract::{Args, Image};
use tracing::{debug, info, instrument, warn};

use super::words::{WordBox, group_words};
use super::{RecognitionEngine, RecognitionRequest, normalize};

/// LSTM engine.
const DEFAULT_OEM: i32 = 3;

/// Fully automatic page segmentation.
pub const DEFAULT_PSM: i32 = 3;

/// Tesseract's word-level rows.
const WORD_LEVEL: i32 = 5;

/// ISO 639-1 codes mapped to tesseract traineddata names.
const LANGUAGE_CODES: &[(&str, &str)] = &[
    ("ca", "cat"),
    ("de", "deu"),
    ("en", "eng"),
    ("es", "spa"),
    ("eu", "eus"),
    ("fr", "fra"),
    ("gl", "glg"),
    ("it", "ita"),
    ("la", "lat"),
    ("nl", "nld"),
    ("pt", "por"),
    ("ru", "rus"),
];

/// Map language codes to a tesseract `-l` argument (`"spa+eng"`).
///
/// Codes without a known mapping are passed through unchanged, so tesseract
/// names like `"spa_old"` work too.
pub fn tesseract_languages(languages: &[String]) -> String {
    languages
        .iter()
        .map(|code| {
            let lower = code.to_ascii_lowercase();
            LANGUAGE_CODES
                .iter()
                .find(|(iso, _)| *iso == lower)
                .map(|(_, tess)| tess.to_string())
                .unwrap_or_else(|| code.clone())
        })
        .collect::<Vec<_>>()
        .join("+")
}

/// Recognition through the system tesseract binary.
pub struct TesseractEngine {
    oem: i32,
    psm: i32,
    dpi: Option<i32>,
}

impl TesseractEngine {
    /// Check that tesseract is installed and has the configured languages.
    ///
    /// # Errors
    ///
    /// [`FolioError::EngineInit`] when the binary cannot be run.
    #[instrument(skip_all, fields(languages = ?config.languages()))]
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let version = rusty_tesseract::get_tesseract_version().map_err(|err| {
            FolioError::EngineInit(format!("tesseract binary not usable: {err}"))
        })?;
        info!(%version, "Tesseract found");

        if config.use_accelerator() {
            warn!("GPU requested but tesseract runs on the CPU only; continuing on CPU");
        }

        match rusty_tesseract::get_tesseract_langs() {
            Ok(installed) => {
                let wanted = tesseract_languages(config.languages());
                for lang in wanted.split('+') {
                    if !installed.iter().any(|l| l == lang) {
                        warn!(lang, "Tesseract language data not installed");
                    }
                }
            }
            Err(err) => debug!(%err, "Could not list tesseract languages"),
        }

        Ok(Self {
            oem: DEFAULT_OEM,
            psm: DEFAULT_PSM,
            dpi: None,
        })
    }

    /// Override the page segmentation mode. Mode 6 (one uniform block of
    /// text) often suits single-column book pages better than the default.
    pub fn with_page_segmentation(mut self, psm: i32) -> Self {
        self.psm = psm;
        self
    }

    /// Declare the scan resolution instead of letting tesseract guess.
    pub fn with_dpi(mut self, dpi: i32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    fn args(&self, request: &RecognitionRequest<'_>) -> Args {
        Args {
            lang: tesseract_languages(request.languages),
            config_variables: HashMap::new(),
            dpi: self.dpi,
            psm: Some(self.psm),
            oem: Some(self.oem),
        }
    }
}

impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(
        &self,
        image: &DynamicImage,
        request: &RecognitionRequest<'_>,
    ) -> Result<Vec<RecognitionFragment>> {
        let fail = |reason: String| FolioError::Recognition {
            engine: "tesseract",
            reason,
        };

        let tess_image = Image::from_dynamic_image(image)
            .map_err(|err| fail(format!("failed to hand image to tesseract: {err}")))?;
        let args = self.args(request);
        debug!(lang = %args.lang, psm = self.psm, "Running tesseract");

        let data = rusty_tesseract::image_to_data(&tess_image, &args)
            .map_err(|err| fail(err.to_string()))?;

        let words = data
            .data
            .into_iter()
            .filter(|row| row.level == WORD_LEVEL && row.conf >= 0.0)
            .map(|row| WordBox {
                block: row.block_num,
                paragraph: row.par_num,
                line: row.line_num,
                left: row.left,
                top: row.top,
                width: row.width,
                height: row.height,
                confidence: (row.conf / 100.0).clamp(0.0, 1.0),
                text: row.text,
            });

        let fragments = normalize(
            group_words(words, request.group_into_paragraphs),
            request.detail,
        );
        debug!(fragments = fragments.len(), "Tesseract recognition complete");
        Ok(fragments)
    }
}
