// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.

use std::path::PathBuf;

use thiserror::Error;

/// How far an error reaches.
///
/// Invocation-scoped errors leave nothing to process; image-scoped errors
/// concern one image and leave its siblings untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    Invocation,
    Image,
}

/// Top-level error type for all Folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Discovery errors --
    #[error("invalid path (neither a file nor a directory): {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("unsupported file or not an image: {}", .0.display())]
    UnsupportedFileKind(PathBuf),

    #[error("no images found in: {}", .0.display())]
    NoImagesFound(PathBuf),

    // -- Per-image errors --
    #[error("could not decode image {}: {reason}", path.display())]
    ImageDecode { path: PathBuf, reason: String },

    #[error("degenerate image dimensions {width}x{height}")]
    InvalidImageData { width: u32, height: u32 },

    #[error("text recognition failed ({engine}): {reason}")]
    Recognition { engine: &'static str, reason: String },

    // -- Setup errors --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("recognition engine could not be initialised: {0}")]
    EngineInit(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FolioError {
    /// Whether this error is fatal for the whole invocation or only for the
    /// image that raised it.
    pub fn scope(&self) -> ErrorScope {
        match self {
            Self::ImageDecode { .. } | Self::InvalidImageData { .. } | Self::Recognition { .. } => {
                ErrorScope::Image
            }
            _ => ErrorScope::Invocation,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;
