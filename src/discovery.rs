//! Input enumeration: every regular file beneath the input path

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, ThumbnailerError};

/// Collect every regular file under `root`, sorted by path.
///
/// No extension filter is applied; files the decoder cannot read fail
/// later as individual jobs. A root that is itself a file yields just
/// that file. Any error while walking is fatal to the run.
pub fn discover_files(root: &Path) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(root).map_err(|e| {
        ThumbnailerError::config(format!("Error reading input path {:?}: {}", root, e))
    })?;

    if metadata.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            ThumbnailerError::config(format!("Error reading input path {:?}: {}", root, e))
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}
