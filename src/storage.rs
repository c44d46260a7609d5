//! Local filesystem bookkeeping for generated batches.
//!
//! All output lives under the configured output root, one directory per
//! batch. Nothing here is persistent state; a restart simply starts with an
//! empty registry over whatever files remain on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::generator::common::output_dir_name;

pub fn ensure_output_root(root: &Path) -> io::Result<()> {
    fs::create_dir_all(root)
}

/// The directory one batch writes into, derived from the class label.
pub fn batch_output_dir(root: &Path, class_label: &str) -> PathBuf {
    root.join(output_dir_name(class_label))
}

/// Resolve a PDF inside a batch directory for serving. Rejects anything that
/// is not a plain filename so the route cannot escape the batch directory.
pub fn resolve_pdf(batch_dir: &Path, filename: &str) -> Option<PathBuf> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return None;
    }

    let path = batch_dir.join(filename);
    path.is_file().then_some(path)
}

/// Names of the PDF files currently present in a batch directory.
pub fn list_pdfs(batch_dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(batch_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.to_ascii_lowercase().ends_with(".pdf") && entry.path().is_file() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
