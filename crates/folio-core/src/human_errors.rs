// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command line.
//
// Every technical error is mapped to a plain sentence plus a concrete next
// step. Per-image failures are phrased so a batch report stays readable when
// several pages fail for the same reason.

use std::io::ErrorKind;

use crate::error::{ErrorScope, FolioError};

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether processing of other images can go on.
    pub scope: ErrorScope,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `FolioError` into a `HumanError`.
pub fn humanize_error(err: &FolioError) -> HumanError {
    let scope = err.scope();
    let (message, suggestion) = match err {
        // -- Discovery --
        FolioError::InvalidPath(path) => (
            format!("Nothing usable at {}.", path.display()),
            "Check the path: it must be an image file or a folder of images.".to_string(),
        ),

        FolioError::UnsupportedFileKind(path) => (
            format!("{} is not a supported image.", path.display()),
            "Use one of: .jpg .jpeg .png .bmp .tif .tiff .webp.".to_string(),
        ),

        FolioError::NoImagesFound(path) => (
            format!("No images were found in {}.", path.display()),
            "Subfolders are searched too; make sure the pages use a supported extension."
                .to_string(),
        ),

        // -- Per image --
        FolioError::ImageDecode { path, .. } => (
            format!("{} could not be read as an image.", path.display()),
            "The file may be damaged or use an unusual variant of its format. Try re-saving it as PNG."
                .to_string(),
        ),

        FolioError::InvalidImageData { width, height } => (
            format!("The image is empty ({width}x{height} pixels)."),
            "Re-export the page; it has no pixel data.".to_string(),
        ),

        FolioError::Recognition { engine, reason } => (
            format!("Text recognition failed ({engine})."),
            format!("Try again with --preprocess, or check the engine installation. ({reason})"),
        ),

        // -- Setup --
        FolioError::InvalidConfig(detail) => (
            "The settings are not valid.".to_string(),
            format!("Fix the option and run again: {detail}."),
        ),

        FolioError::EngineInit(detail) => {
            let lower = detail.to_ascii_lowercase();
            if lower.contains("tesseract") {
                (
                    "Tesseract is not available.".to_string(),
                    "Install tesseract and the language packs you need (e.g. tesseract-ocr-spa), or pick another engine with --engine."
                        .to_string(),
                )
            } else if lower.contains("model") {
                (
                    "The OCR models could not be loaded.".to_string(),
                    "Download text-detection.rten and text-recognition.rten and pass their folder with --model-dir."
                        .to_string(),
                )
            } else {
                (
                    "The recognition engine could not start.".to_string(),
                    format!("Check the engine installation. ({detail})"),
                )
            }
        }

        // -- Storage --
        FolioError::Io(io_err) => match io_err.kind() {
            ErrorKind::NotFound => (
                "A file could not be found.".to_string(),
                "It may have been moved or deleted while processing.".to_string(),
            ),
            ErrorKind::PermissionDenied => (
                "Permission denied while reading or writing a file.".to_string(),
                "Check the permissions of the input and output folders.".to_string(),
            ),
            _ => (
                "There was a problem reading or writing a file.".to_string(),
                format!("Check free disk space and try again. ({io_err})"),
            ),
        },

        FolioError::Serialization(detail) => (
            "A JSON document could not be read or written.".to_string(),
            format!("Check the config file syntax. ({detail})"),
        ),
    };

    HumanError {
        message,
        suggestion,
        scope,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tesseract_points_at_installation() {
        let err = FolioError::EngineInit("tesseract binary not found on PATH".into());
        let human = humanize_error(&err);
        assert!(human.suggestion.contains("Install tesseract"));
        assert_eq!(human.scope, ErrorScope::Invocation);
    }

    #[test]
    fn missing_model_points_at_model_dir() {
        let err = FolioError::EngineInit("detection model not found at /x".into());
        let human = humanize_error(&err);
        assert!(human.suggestion.contains("--model-dir"));
    }

    #[test]
    fn decode_failure_is_image_scoped() {
        let err = FolioError::ImageDecode {
            path: "/pages/007.jpg".into(),
            reason: "unexpected EOF".into(),
        };
        let human = humanize_error(&err);
        assert_eq!(human.scope, ErrorScope::Image);
        assert!(human.message.contains("/pages/007.jpg"));
    }

    #[test]
    fn unsupported_kind_lists_extensions() {
        let human = humanize_error(&FolioError::UnsupportedFileKind("notes.pdf".into()));
        assert!(human.suggestion.contains(".webp"));
    }

    #[test]
    fn permission_denied_is_distinguished() {
        let err = FolioError::Io(std::io::Error::new(ErrorKind::PermissionDenied, "nope"));
        let human = humanize_error(&err);
        assert!(human.message.contains("Permission denied"));
    }
}
