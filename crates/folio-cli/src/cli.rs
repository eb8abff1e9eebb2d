// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and their translation into a pipeline configuration.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use folio_core::error::Result;
use folio_core::PipelineConfig;
use folio_ocr::BatchPolicy;

/// OCR for photographed or scanned book pages.
///
/// Extracts the text of one image, or of every image below a folder, and
/// prints it or saves one file per image in an output folder.
#[derive(Debug, Parser)]
#[command(name = "folio", version)]
#[command(about = "Extract text from book page images")]
pub struct Cli {
    /// Image file, or folder searched recursively for images.
    pub input: PathBuf,

    /// Comma-separated language codes in priority order. Default: es,en
    #[arg(long, value_parser = parse_languages)]
    pub langs: Option<LanguageList>,

    /// Request hardware acceleration if the engine supports it.
    #[arg(long)]
    pub gpu: bool,

    /// Clean up the page (rescale, denoise, binarize) before recognition.
    #[arg(long)]
    pub preprocess: bool,

    /// Resize factor used by --preprocess. Default: 1.5
    #[arg(long)]
    pub scale: Option<f32>,

    /// Remove sensor noise during --preprocess. Recommended for photos.
    #[arg(long)]
    pub denoise: bool,

    /// Drop text recognized with a confidence below this value (0 to 1).
    #[arg(long = "min-conf")]
    pub min_conf: Option<f32>,

    /// Print the text of each image.
    #[arg(long)]
    pub print: bool,

    /// Save the text of each image to <out-dir>/<name>.txt.
    #[arg(long)]
    pub save_txt: bool,

    /// Save the full result of each image to <out-dir>/<name>.json.
    #[arg(long)]
    pub save_json: bool,

    /// Folder for saved files. Created if missing.
    #[arg(long, default_value = "outputs", env = "FOLIO_OUT_DIR")]
    pub out_dir: PathBuf,

    /// Recognition engine.
    #[arg(long, value_enum, default_value_t = EngineKind::Tesseract)]
    pub engine: EngineKind,

    /// Tesseract page segmentation mode (0-13). Default: 3, automatic.
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=13))]
    pub psm: Option<i32>,

    /// Scan resolution passed to tesseract instead of its own estimate.
    #[arg(long, value_parser = clap::value_parser!(i32).range(70..=2400))]
    pub dpi: Option<i32>,

    /// Folder holding the ocrs model files. Default: ~/.cache/ocrs
    #[arg(long, env = "FOLIO_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// JSON file with pipeline settings. Flags given on the command line
    /// take precedence.
    #[arg(long, env = "FOLIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of images processed in parallel. Each job loads its own engine.
    #[arg(long, default_value_t = NonZeroUsize::MIN)]
    pub jobs: NonZeroUsize,

    /// Stop at the first image that fails.
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    /// System tesseract binary.
    Tesseract,
    /// Built-in neural engine (needs model files).
    Ocrs,
}

impl EngineKind {
    pub fn name(self) -> &'static str {
        match self {
            EngineKind::Tesseract => "tesseract",
            EngineKind::Ocrs => "ocrs",
        }
    }
}

/// Parsed `--langs` value. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageList(pub Vec<String>);

fn parse_languages(raw: &str) -> std::result::Result<LanguageList, String> {
    let codes: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect();
    if codes.is_empty() {
        return Err("at least one language code is required (e.g. es,en)".to_string());
    }
    Ok(LanguageList(codes))
}

impl Cli {
    /// Whether any output was requested at all.
    pub fn has_output(&self) -> bool {
        self.print || self.save_txt || self.save_json
    }

    pub fn batch_policy(&self) -> BatchPolicy {
        if self.fail_fast {
            BatchPolicy::AbortOnFirst
        } else {
            BatchPolicy::ContinueOnError
        }
    }

    /// Build the pipeline configuration.
    ///
    /// Starts from `--config` when given, otherwise from the library defaults
    /// with preprocessing and denoising off. Boolean flags can only switch a
    /// step on; valued flags replace the file's value.
    ///
    /// # Errors
    ///
    /// The config file cannot be read or parsed, or a value is out of range.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut builder = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?.to_builder(),
            None => PipelineConfig::builder().preprocess(false).denoise(false),
        };

        if let Some(LanguageList(codes)) = &self.langs {
            builder = builder.languages(codes.iter().cloned());
        }
        if self.gpu {
            builder = builder.use_accelerator(true);
        }
        if self.preprocess {
            builder = builder.preprocess(true);
        }
        if let Some(scale) = self.scale {
            builder = builder.scale(scale);
        }
        if self.denoise {
            builder = builder.denoise(true);
        }
        if let Some(min_conf) = self.min_conf {
            builder = builder.min_confidence(min_conf);
        }
        builder.build()
    }
}
