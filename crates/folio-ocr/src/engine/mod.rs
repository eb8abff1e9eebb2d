// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition engines — the capability the pipeline calls to turn pixels into
// text fragments, and one adapter per concrete engine.
//
// # Feature Gates
//
// Each adapter is compiled only when its feature is enabled:
//
// ```toml
// folio-ocr = { path = "crates/folio-ocr", features = ["tesseract", "ocrs"] }
// ```
//
// Engines report results in different shapes. Adapters normalize them at the
// boundary through [`RawRecognition`], so the rest of the pipeline only ever
// sees [`RecognitionFragment`]s.

pub mod words;

#[cfg(feature = "ocrs")]
pub mod ocrs;

#[cfg(feature = "tesseract")]
pub mod tesseract;

use folio_core::error::Result;
use folio_core::{Detail, PipelineConfig, RecognitionFragment, Region};
use image::DynamicImage;

#[cfg(feature = "ocrs")]
pub use self::ocrs::OcrsEngine;

#[cfg(feature = "tesseract")]
pub use self::tesseract::TesseractEngine;

/// Per-call recognition parameters.
#[derive(Debug, Clone, Copy)]
pub struct RecognitionRequest<'a> {
    /// Language codes in priority order. Never empty when built from a
    /// [`PipelineConfig`].
    pub languages: &'a [String],
    pub detail: Detail,
    /// Merge adjacent lines into paragraph fragments.
    pub group_into_paragraphs: bool,
}

impl<'a> RecognitionRequest<'a> {
    pub fn from_config(config: &'a PipelineConfig) -> Self {
        Self {
            languages: config.languages(),
            detail: config.detail(),
            group_into_paragraphs: config.group_into_paragraphs(),
        }
    }
}

/// A text recognizer.
///
/// Implementations are constructed once (loading models is expensive) and
/// then called for any number of images. The returned order is significant:
/// it is the engine's reading order and is never changed downstream.
///
/// Implementations are not assumed to be safe for concurrent calls; give each
/// worker thread its own instance.
pub trait RecognitionEngine {
    /// Short identifier used in logs and errors (e.g. `"tesseract"`).
    fn name(&self) -> &'static str;

    /// Recognize text in `image`, which may be color or single-channel.
    ///
    /// # Errors
    ///
    /// [`FolioError::Recognition`](folio_core::FolioError::Recognition) when
    /// the engine fails on this image.
    fn recognize(
        &self,
        image: &DynamicImage,
        request: &RecognitionRequest<'_>,
    ) -> Result<Vec<RecognitionFragment>>;
}

impl<E: RecognitionEngine + ?Sized> RecognitionEngine for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn recognize(
        &self,
        image: &DynamicImage,
        request: &RecognitionRequest<'_>,
    ) -> Result<Vec<RecognitionFragment>> {
        (**self).recognize(image, request)
    }
}

/// An engine result before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecognition {
    /// Multi-field result. `confidence` is already on a [0, 1] scale.
    Detailed {
        region: Region,
        text: String,
        confidence: Option<f32>,
    },
    /// Text-only result.
    Plain(String),
}

impl RawRecognition {
    /// Convert to a fragment. [`Detail::TextOnly`] drops geometry and
    /// confidence.
    pub fn into_fragment(self, detail: Detail) -> RecognitionFragment {
        match (self, detail) {
            (
                RawRecognition::Detailed {
                    region,
                    text,
                    confidence,
                },
                Detail::Full,
            ) => RecognitionFragment::new(region, text, confidence),
            (RawRecognition::Detailed { text, .. }, Detail::TextOnly)
            | (RawRecognition::Plain(text), _) => RecognitionFragment::text_only(text),
        }
    }
}

/// Normalize engine output into fragments, preserving order.
pub fn normalize<I>(raw: I, detail: Detail) -> Vec<RecognitionFragment>
where
    I: IntoIterator<Item = RawRecognition>,
{
    raw.into_iter().map(|r| r.into_fragment(detail)).collect()
}
