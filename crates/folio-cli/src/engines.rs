// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine construction for the engine picked on the command line. Engines not
// compiled into this binary fail at load time with a clear message.

use folio_core::error::{FolioError, Result};
use folio_core::PipelineConfig;
use folio_ocr::RecognitionEngine;

use crate::cli::{Cli, EngineKind};

/// Load the engine chosen by `--engine`, tuned by the engine-specific flags.
///
/// # Errors
///
/// [`FolioError::EngineInit`] when the engine is unavailable or its
/// resources cannot be loaded.
pub fn load_engine(cli: &Cli, config: &PipelineConfig) -> Result<Box<dyn RecognitionEngine>> {
    match cli.engine {
        EngineKind::Tesseract => load_tesseract(cli, config),
        EngineKind::Ocrs => load_ocrs(cli, config),
    }
}

#[cfg(feature = "tesseract")]
fn load_tesseract(cli: &Cli, config: &PipelineConfig) -> Result<Box<dyn RecognitionEngine>> {
    let mut engine = folio_ocr::TesseractEngine::new(config)?;
    if let Some(psm) = cli.psm {
        engine = engine.with_page_segmentation(psm);
    }
    if let Some(dpi) = cli.dpi {
        engine = engine.with_dpi(dpi);
    }
    Ok(Box::new(engine))
}

#[cfg(not(feature = "tesseract"))]
fn load_tesseract(_cli: &Cli, _config: &PipelineConfig) -> Result<Box<dyn RecognitionEngine>> {
    Err(not_built(EngineKind::Tesseract))
}

#[cfg(feature = "ocrs")]
fn load_ocrs(cli: &Cli, config: &PipelineConfig) -> Result<Box<dyn RecognitionEngine>> {
    use folio_ocr::engine::ocrs::OcrsModelPaths;

    if cli.psm.is_some() || cli.dpi.is_some() {
        tracing::warn!("--psm and --dpi only apply to tesseract; ignoring them");
    }
    let paths = match &cli.model_dir {
        Some(dir) => OcrsModelPaths::from_dir(folio_ocr::catalog::expand_home(dir)),
        None => OcrsModelPaths::default(),
    };
    Ok(Box::new(folio_ocr::OcrsEngine::new(&paths, config)?))
}

#[cfg(not(feature = "ocrs"))]
fn load_ocrs(_cli: &Cli, _config: &PipelineConfig) -> Result<Box<dyn RecognitionEngine>> {
    Err(not_built(EngineKind::Ocrs))
}

#[cfg(any(test, not(feature = "tesseract"), not(feature = "ocrs")))]
fn not_built(kind: EngineKind) -> FolioError {
    FolioError::EngineInit(format!(
        "this build of folio does not include the {} engine; rebuild with `--features {}`",
        kind.name(),
        kind.name()
    ))
}
