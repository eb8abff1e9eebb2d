// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result assembly — confidence filtering and text concatenation.

use std::path::Path;

use folio_core::{OcrResult, RecognitionFragment};
use tracing::debug;

/// Separator placed between retained fragment texts.
pub const FRAGMENT_SEPARATOR: &str = "\n";

/// Build the result record for one image.
///
/// Fragments are kept in engine order. A fragment is dropped when its
/// confidence is below `min_confidence` (the boundary is inclusive); a missing
/// confidence counts as 1.0. Retained texts are joined by
/// [`FRAGMENT_SEPARATOR`] and the whole string is trimmed.
///
/// Never fails: an image with nothing retained yields empty text.
pub fn assemble(
    path: &Path,
    fragments: Vec<RecognitionFragment>,
    min_confidence: f32,
) -> OcrResult {
    let total = fragments.len();
    let retained: Vec<RecognitionFragment> = fragments
        .into_iter()
        .filter(|f| f.effective_confidence() >= min_confidence)
        .collect();

    let text = retained
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(FRAGMENT_SEPARATOR)
        .trim()
        .to_string();

    debug!(
        total,
        retained = retained.len(),
        min_confidence,
        "Fragments filtered"
    );

    OcrResult {
        path: path.display().to_string(),
        text,
        fragments: retained,
    }
}
