// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Console rendering and per-image output files.

use std::fs;
use std::path::{Path, PathBuf};

use folio_core::OcrResult;
use folio_core::error::Result;
use folio_ocr::ImagePath;
use tracing::{debug, instrument};

/// Width of the rules framing each printed result.
const RULE_WIDTH: usize = 80;

/// Shown instead of the text when an image yielded none.
pub const NO_TEXT_PLACEHOLDER: &str = "[No text detected]";

/// The console block for one result: a blank line, a rule, the file path,
/// a thin rule, the text (or [`NO_TEXT_PLACEHOLDER`]), and a closing rule.
pub fn render_console_block(result: &OcrResult) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let text = if result.text.is_empty() {
        NO_TEXT_PLACEHOLDER
    } else {
        result.text.as_str()
    };
    format!(
        "\n{heavy}\nFILE: {path}\n{light}\n{text}\n{heavy}",
        path = result.path
    )
}

/// Write `text` plus a trailing newline to `<out_dir>/<stem>.txt`, creating
/// `out_dir` first. Returns the written path.
#[instrument(skip_all, fields(image = %image))]
pub fn save_text(out_dir: &Path, image: &ImagePath, text: &str) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let out_file = out_dir.join(format!("{}.txt", image.stem()));
    fs::write(&out_file, format!("{text}\n"))?;
    debug!(path = %out_file.display(), bytes = text.len() + 1, "Text saved");
    Ok(out_file)
}

/// Write the whole result as pretty JSON to `<out_dir>/<stem>.json`.
#[instrument(skip_all, fields(image = %image))]
pub fn save_json(out_dir: &Path, image: &ImagePath, result: &OcrResult) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let out_file = out_dir.join(format!("{}.json", image.stem()));
    let json = serde_json::to_string_pretty(result)?;
    fs::write(&out_file, json)?;
    debug!(path = %out_file.display(), "Result saved");
    Ok(out_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{RecognitionFragment, Region};
    use folio_ocr::discover;
    use tempfile::TempDir;

    fn result(text: &str) -> OcrResult {
        OcrResult {
            path: "/libros/quijote/p001.jpg".into(),
            text: text.into(),
            fragments: vec![RecognitionFragment::new(
                Region::Rect {
                    left: 1,
                    top: 2,
                    width: 30,
                    height: 10,
                },
                text,
                Some(0.87),
            )],
        }
    }

    fn image_in(dir: &Path, name: &str) -> ImagePath {
        let path = dir.join(name);
        fs::write(&path, b"").unwrap();
        discover(&path).unwrap().remove(0)
    }

    #[test]
    fn console_block_layout() {
        let block = render_console_block(&result("En un lugar\nde la Mancha"));
        let lines: Vec<&str> = block.split('\n').collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "=".repeat(80));
        assert_eq!(lines[2], "FILE: /libros/quijote/p001.jpg");
        assert_eq!(lines[3], "-".repeat(80));
        assert_eq!(lines[4], "En un lugar");
        assert_eq!(lines[5], "de la Mancha");
        assert_eq!(lines[6], "=".repeat(80));
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn empty_text_shows_placeholder() {
        let block = render_console_block(&result(""));
        assert!(block.contains(&format!("\n{NO_TEXT_PLACEHOLDER}\n")));
    }

    #[test]
    fn text_file_gets_trailing_newline_and_dir_is_created() {
        let tmp = TempDir::new().unwrap();
        let image = image_in(tmp.path(), "p001.JPG");
        let out_dir = tmp.path().join("out").join("nested");

        let saved = save_text(&out_dir, &image, "HOLA").unwrap();
        assert_eq!(saved, out_dir.join("p001.txt"));
        assert_eq!(fs::read_to_string(&saved).unwrap(), "HOLA\n");
    }

    #[test]
    fn empty_text_saves_a_lone_newline() {
        let tmp = TempDir::new().unwrap();
        let image = image_in(tmp.path(), "blank.png");
        let saved = save_text(tmp.path(), &image, "").unwrap();
        assert_eq!(fs::read_to_string(saved).unwrap(), "\n");
    }

    #[test]
    fn existing_text_file_is_replaced() {
        let tmp = TempDir::new().unwrap();
        let image = image_in(tmp.path(), "p.png");
        save_text(tmp.path(), &image, "old and much longer").unwrap();
        let saved = save_text(tmp.path(), &image, "new").unwrap();
        assert_eq!(fs::read_to_string(saved).unwrap(), "new\n");
    }

    #[test]
    fn json_file_holds_the_result() {
        let tmp = TempDir::new().unwrap();
        let image = image_in(tmp.path(), "p001.png");
        let original = result("HOLA");

        let saved = save_json(&tmp.path().join("out"), &image, &original).unwrap();
        assert_eq!(saved.file_name().unwrap(), "p001.json");
        let loaded: OcrResult =
            serde_json::from_str(&fs::read_to_string(saved).unwrap()).unwrap();
        assert_eq!(loaded.text, "HOLA");
        assert_eq!(loaded.fragments, original.fragments);
    }

    #[test]
    fn unwritable_out_dir_is_an_io_error() {
        let tmp = TempDir::new().unwrap();
        let image = image_in(tmp.path(), "p.png");
        let blocker = tmp.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let err = save_text(&blocker.join("sub"), &image, "x").unwrap_err();
        assert!(matches!(err, folio_core::FolioError::Io(_)));
    }
}
