// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-ocr — Text extraction from photographed or scanned book pages.
//
// Provides image discovery (single file or recursive directory walk), page
// preprocessing (rescale, grayscale, denoise, adaptive binarization), pluggable
// recognition engines (tesseract, ocrs), confidence filtering, and a batch
// driver that spreads a catalog across worker threads.

pub mod assemble;
pub mod batch;
pub mod catalog;
pub mod engine;
pub mod pipeline;
pub mod preprocess;

// Re-export the primary items so callers can use `folio_ocr::Pipeline` etc.
pub use assemble::assemble;
pub use batch::{BatchPolicy, BatchReport, ImageOutcome, run_batch, run_batch_parallel};
pub use catalog::{ImagePath, discover};
pub use engine::{RecognitionEngine, RecognitionRequest};
pub use pipeline::Pipeline;
pub use preprocess::Preprocessor;

#[cfg(feature = "ocrs")]
pub use engine::OcrsEngine;

#[cfg(feature = "tesseract")]
pub use engine::TesseractEngine;
