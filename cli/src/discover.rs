//! Finds the documents of a data root.
//!
//! Every immediate sub-directory of the root is a source; every `*.xml` file
//! below it, at any depth, is one document of that source. Files directly in
//! the root belong to no source and are ignored.

use anyhow::Context;
use anyhow::Result;
use defscope_core::DocumentInput;
use defscope_core::ParseFailure;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use tracing::warn;
use walkdir::WalkDir;

const DOCUMENT_EXTENSION: &str = "xml";

/// Documents found under a data root, in deterministic order.
#[derive(Debug, Default)]
pub struct Discovery {
    pub inputs: Vec<DocumentInput>,
    /// Files that were found but could not be read
    pub unreadable: Vec<ParseFailure>,
}

/// Immediate sub-directories of `root`, sorted by name.
pub fn source_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in
        fs::read_dir(root).with_context(|| format!("Failed to read data root {}", root.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}

pub fn discover(root: &Path) -> Result<Discovery> {
    let mut discovery = Discovery::default();
    for source_dir in source_dirs(root)? {
        let source_name = source_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut paths: Vec<PathBuf> = WalkDir::new(&source_dir)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("skipping unreadable entry under {}: {err}", source_dir.display());
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_document(entry.path()))
            .map(walkdir::DirEntry::into_path)
            .collect();
        paths.sort();
        debug!("{} documents in source {source_name}", paths.len());

        for path in paths {
            let relative_path = path
                .strip_prefix(&source_dir)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.clone());
            match fs::read(&path) {
                Ok(bytes) => discovery.inputs.push(
                    DocumentInput::new(path, source_name.clone(), bytes)
                        .with_relative_path(relative_path),
                ),
                Err(err) => discovery.unreadable.push(ParseFailure {
                    error: err.to_string(),
                    absolute_path: path,
                    source_name: source_name.clone(),
                }),
            }
        }
    }
    Ok(discovery)
}
