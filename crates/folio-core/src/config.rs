// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.
//
// A `PipelineConfig` is validated once, in `PipelineConfigBuilder::build`, and
// is immutable afterwards. It can be shared read-only by any number of
// pipelines or worker threads.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};

/// Languages used when none are given.
pub const DEFAULT_LANGUAGES: [&str; 2] = ["es", "en"];

/// How much the recognition engine should report per fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detail {
    /// Text only; regions and confidences are discarded.
    TextOnly,
    /// Region, text, and confidence.
    #[default]
    Full,
}

/// Denoising filter applied before binarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenoiseMethod {
    /// Patch-based non-local means.
    #[default]
    NonLocalMeans,
    /// Small Gaussian blur. Much cheaper, softer edges.
    Gaussian,
}

/// How the local threshold of adaptive binarization is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptiveMethod {
    /// Plain mean of the block.
    Mean,
    /// Gaussian-weighted mean of the block.
    #[default]
    Gaussian,
}

/// Immutable pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    languages: Vec<String>,
    use_accelerator: bool,
    preprocess: bool,
    scale: f32,
    denoise: bool,
    group_into_paragraphs: bool,
    min_confidence: f32,
    detail: Detail,
    denoise_method: DenoiseMethod,
    adaptive_method: AdaptiveMethod,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            use_accelerator: false,
            preprocess: true,
            scale: 1.5,
            denoise: true,
            group_into_paragraphs: true,
            min_confidence: 0.0,
            detail: Detail::Full,
            denoise_method: DenoiseMethod::NonLocalMeans,
            adaptive_method: AdaptiveMethod::Gaussian,
        }
    }
}

fn default_languages() -> Vec<String> {
    DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect()
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Parse a JSON config document. Every field is optional; missing fields
    /// take their defaults and the result is validated like any other build.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let builder: PipelineConfigBuilder = serde_json::from_str(json)?;
        builder.build()
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Recognition languages in priority order. Never empty.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Whether GPU execution was requested. Engines may ignore it.
    pub fn use_accelerator(&self) -> bool {
        self.use_accelerator
    }

    pub fn preprocess(&self) -> bool {
        self.preprocess
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn denoise(&self) -> bool {
        self.denoise
    }

    pub fn group_into_paragraphs(&self) -> bool {
        self.group_into_paragraphs
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    pub fn detail(&self) -> Detail {
        self.detail
    }

    pub fn denoise_method(&self) -> DenoiseMethod {
        self.denoise_method
    }

    pub fn adaptive_method(&self) -> AdaptiveMethod {
        self.adaptive_method
    }

    /// A builder pre-filled with this config, for deriving variants.
    pub fn to_builder(&self) -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            languages: Some(self.languages.clone()),
            use_accelerator: Some(self.use_accelerator),
            preprocess: Some(self.preprocess),
            scale: Some(self.scale),
            denoise: Some(self.denoise),
            group_into_paragraphs: Some(self.group_into_paragraphs),
            min_confidence: Some(self.min_confidence),
            detail: Some(self.detail),
            denoise_method: Some(self.denoise_method),
            adaptive_method: Some(self.adaptive_method),
        }
    }
}

/// Collects settings and validates them once in [`build`](Self::build).
///
/// Unset fields take the [`PipelineConfig::default`] values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfigBuilder {
    languages: Option<Vec<String>>,
    use_accelerator: Option<bool>,
    preprocess: Option<bool>,
    scale: Option<f32>,
    denoise: Option<bool>,
    group_into_paragraphs: Option<bool>,
    min_confidence: Option<f32>,
    detail: Option<Detail>,
    denoise_method: Option<DenoiseMethod>,
    adaptive_method: Option<AdaptiveMethod>,
}

impl PipelineConfigBuilder {
    /// Language codes in priority order. An empty list (or one holding only
    /// blank codes) falls back to [`DEFAULT_LANGUAGES`].
    pub fn languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = Some(languages.into_iter().map(Into::into).collect());
        self
    }

    pub fn use_accelerator(mut self, value: bool) -> Self {
        self.use_accelerator = Some(value);
        self
    }

    pub fn preprocess(mut self, value: bool) -> Self {
        self.preprocess = Some(value);
        self
    }

    pub fn scale(mut self, value: f32) -> Self {
        self.scale = Some(value);
        self
    }

    pub fn denoise(mut self, value: bool) -> Self {
        self.denoise = Some(value);
        self
    }

    pub fn group_into_paragraphs(mut self, value: bool) -> Self {
        self.group_into_paragraphs = Some(value);
        self
    }

    pub fn min_confidence(mut self, value: f32) -> Self {
        self.min_confidence = Some(value);
        self
    }

    pub fn detail(mut self, value: Detail) -> Self {
        self.detail = Some(value);
        self
    }

    pub fn denoise_method(mut self, value: DenoiseMethod) -> Self {
        self.denoise_method = Some(value);
        self
    }

    pub fn adaptive_method(mut self, value: AdaptiveMethod) -> Self {
        self.adaptive_method = Some(value);
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// # Errors
    ///
    /// [`FolioError::InvalidConfig`] when `scale` is not a positive finite
    /// number or `min_confidence` is NaN.
    pub fn build(self) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();

        let languages: Vec<String> = self
            .languages
            .unwrap_or_default()
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        let languages = if languages.is_empty() {
            defaults.languages
        } else {
            languages
        };

        let scale = self.scale.unwrap_or(defaults.scale);
        if !scale.is_finite() || scale <= 0.0 {
            return Err(FolioError::InvalidConfig(format!(
                "scale must be a positive number, got {scale}"
            )));
        }

        let min_confidence = self.min_confidence.unwrap_or(defaults.min_confidence);
        if min_confidence.is_nan() {
            return Err(FolioError::InvalidConfig(
                "min_confidence must be a number".into(),
            ));
        }

        Ok(PipelineConfig {
            languages,
            use_accelerator: self.use_accelerator.unwrap_or(defaults.use_accelerator),
            preprocess: self.preprocess.unwrap_or(defaults.preprocess),
            scale,
            denoise: self.denoise.unwrap_or(defaults.denoise),
            group_into_paragraphs: self
                .group_into_paragraphs
                .unwrap_or(defaults.group_into_paragraphs),
            min_confidence,
            detail: self.detail.unwrap_or(defaults.detail),
            denoise_method: self.denoise_method.unwrap_or(defaults.denoise_method),
            adaptive_method: self.adaptive_method.unwrap_or(defaults.adaptive_method),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.languages(), ["es", "en"]);
        assert!(!config.use_accelerator());
        assert!(config.preprocess());
        assert_eq!(config.scale(), 1.5);
        assert!(config.denoise());
        assert!(config.group_into_paragraphs());
        assert_eq!(config.min_confidence(), 0.0);
        assert_eq!(config.detail(), Detail::Full);
    }

    #[test]
    fn empty_languages_fall_back_to_default() {
        let config = PipelineConfig::builder()
            .languages(Vec::<String>::new())
            .build()
            .unwrap();
        assert_eq!(config.languages(), ["es", "en"]);

        let unset = PipelineConfig::builder().build().unwrap();
        assert_eq!(unset.languages(), ["es", "en"]);
    }

    #[test]
    fn blank_language_codes_are_dropped() {
        let config = PipelineConfig::builder()
            .languages([" fr ", "", "  "])
            .build()
            .unwrap();
        assert_eq!(config.languages(), ["fr"]);

        let all_blank = PipelineConfig::builder()
            .languages(["", " "])
            .build()
            .unwrap();
        assert_eq!(all_blank.languages(), ["es", "en"]);
    }

    #[test]
    fn language_order_is_kept() {
        let config = PipelineConfig::builder()
            .languages(["en", "de", "es"])
            .build()
            .unwrap();
        assert_eq!(config.languages(), ["en", "de", "es"]);
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = PipelineConfig::builder().scale(bad).build().unwrap_err();
            assert!(matches!(err, FolioError::InvalidConfig(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn min_confidence_above_one_is_accepted() {
        let config = PipelineConfig::builder()
            .min_confidence(1.5)
            .build()
            .unwrap();
        assert_eq!(config.min_confidence(), 1.5);
    }

    #[test]
    fn nan_min_confidence_is_rejected() {
        let err = PipelineConfig::builder()
            .min_confidence(f32::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, FolioError::InvalidConfig(_)));
    }

    #[test]
    fn json_fields_are_optional() {
        let config = PipelineConfig::from_json_str(r#"{ "scale": 2.0, "languages": [] }"#).unwrap();
        assert_eq!(config.scale(), 2.0);
        assert_eq!(config.languages(), ["es", "en"]);
        assert!(config.preprocess());
    }

    #[test]
    fn json_enums_use_snake_case() {
        let config = PipelineConfig::from_json_str(
            r#"{ "denoise_method": "gaussian", "adaptive_method": "mean", "detail": "text_only" }"#,
        )
        .unwrap();
        assert_eq!(config.denoise_method(), DenoiseMethod::Gaussian);
        assert_eq!(config.adaptive_method(), AdaptiveMethod::Mean);
        assert_eq!(config.detail(), Detail::TextOnly);
    }

    #[test]
    fn json_unknown_field_is_an_error() {
        let err = PipelineConfig::from_json_str(r#"{ "gpu": true }"#).unwrap_err();
        assert!(matches!(err, FolioError::Serialization(_)));
    }

    #[test]
    fn json_still_validates() {
        let err = PipelineConfig::from_json_str(r#"{ "scale": -2 }"#).unwrap_err();
        assert!(matches!(err, FolioError::InvalidConfig(_)));
    }

    #[test]
    fn to_builder_round_trips() {
        let config = PipelineConfig::builder()
            .languages(["de"])
            .scale(2.0)
            .denoise(false)
            .build()
            .unwrap();
        let copy = config.to_builder().build().unwrap();
        assert_eq!(copy, config);

        let variant = config.to_builder().min_confidence(0.4).build().unwrap();
        assert_eq!(variant.min_confidence(), 0.4);
        assert_eq!(variant.languages(), ["de"]);
    }
}
