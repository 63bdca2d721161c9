//! Layout Discovery
//!
//! Recursively scans a directory for `*.layout.json` files and batch-compiles
//! them. Files are independent, so the batch runs in parallel; one bad file
//! reports its error and never aborts the rest.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::compile::{compile_source, CompileOptions, CompileOutput};
use crate::style::StyleTable;
use crate::validate::{CompilerError, ERR_UNREADABLE_FILE};

pub const LAYOUT_SUFFIX: &str = ".layout.json";

/// Outcome of compiling one discovered file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: String,
    pub output: Option<CompileOutput>,
    pub error: Option<CompilerError>,
}

/// Recursively find all layout files under a directory, in sorted order so
/// batch reports are stable.
pub fn find_layout_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).into_iter().flatten() {
        let path = entry.path();
        if path.is_file() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(LAYOUT_SUFFIX) {
                    files.push(path.to_path_buf());
                }
            }
        }
    }
    files.sort();
    files
}

fn compile_file(path: &Path, styles: &StyleTable, template: &CompileOptions) -> FileReport {
    let path_str = path.to_string_lossy().to_string();
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            return FileReport {
                path: path_str.clone(),
                output: None,
                error: Some(CompilerError::new(
                    ERR_UNREADABLE_FILE,
                    &format!("Failed to read layout file: {}", e),
                    &path_str,
                )),
            };
        }
    };
    let options = CompileOptions {
        file_path: Some(path_str.clone()),
        ..template.clone()
    };
    match compile_source(&source, styles, options) {
        Ok(output) => FileReport {
            path: path_str,
            output: Some(output),
            error: None,
        },
        Err(error) => FileReport {
            path: path_str,
            output: None,
            error: Some(error),
        },
    }
}

/// Compile every layout file under `base_dir`. Each compile is independent,
/// so the set is processed in parallel; report order matches the sorted file
/// order regardless of scheduling.
pub fn compile_directory(
    base_dir: &Path,
    styles: &StyleTable,
    template: &CompileOptions,
) -> Vec<FileReport> {
    let files = find_layout_files(base_dir);
    files
        .par_iter()
        .map(|path| compile_file(path, styles, template))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
