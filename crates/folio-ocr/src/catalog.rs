// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image catalog — validates an input path and enumerates the page images
// below it.

use std::fs;
use std::path::{Path, PathBuf};

use folio_core::error::{FolioError, Result};
use tracing::{debug, info, instrument, warn};

/// File extensions (lowercase, without the dot) accepted as page images.
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"];

/// A path that referenced a file with a supported image extension when the
/// catalog validated it.
///
/// Only [`discover`] produces these, so holding one means the extension check
/// has already happened.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImagePath(PathBuf);

impl ImagePath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// File name without extension, used to name output files.
    pub fn stem(&self) -> &str {
        self.0
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("page")
    }
}

impl AsRef<Path> for ImagePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for ImagePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Whether `path` carries a supported image extension (case-insensitive).
/// Only the name is inspected; the file need not exist.
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Expand a leading `~` to `$HOME`. Other paths are returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// List the images to process under `path`.
///
/// - A regular file is returned alone if its extension is supported, and is
///   otherwise [`FolioError::UnsupportedFileKind`].
/// - A directory is searched recursively; supported files are returned sorted
///   by full path. No match is [`FolioError::NoImagesFound`].
/// - Anything else is [`FolioError::InvalidPath`].
///
/// Symlinked directories are not descended into. Subfolders that cannot
/// be listed are skipped with a warning; only an unreadable root fails.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn discover(path: impl AsRef<Path>) -> Result<Vec<ImagePath>> {
    let path = expand_home(path.as_ref());

    if path.is_file() {
        if !has_supported_extension(&path) {
            return Err(FolioError::UnsupportedFileKind(path));
        }
        debug!("Single image input");
        return Ok(vec![ImagePath(path)]);
    }

    if path.is_dir() {
        let mut found = Vec::new();
        walk(&path, &mut found)?;
        if found.is_empty() {
            return Err(FolioError::NoImagesFound(path));
        }
        found.sort();
        found.dedup();
        info!(count = found.len(), "Images discovered");
        return Ok(found.into_iter().map(ImagePath).collect());
    }

    Err(FolioError::InvalidPath(path))
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let entry_path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if let Err(err) = walk(&entry_path, found) {
                warn!(path = %entry_path.display(), %err, "Skipping unreadable folder");
            }
        } else if file_type.is_symlink() {
            // Follow links to files, never to directories.
            match fs::metadata(&entry_path) {
                Ok(meta) if meta.is_file() && has_supported_extension(&entry_path) => {
                    found.push(entry_path);
                }
                Ok(_) => {}
                Err(err) => warn!(path = %entry_path.display(), %err, "Skipping dangling link"),
            }
        } else if file_type.is_file() && has_supported_extension(&entry_path) {
            found.push(entry_path);
        }
    }
    Ok(())
}
