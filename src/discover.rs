// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Finding Go source files and expanding `path/...` module patterns.

use crate::constraint::BuildContext;
use crate::error::{LocateError, LocateResult};
use crate::roots::SourceRoots;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Suffix of a pattern naming a module and every module below it.
pub const RECURSIVE_SUFFIX: &str = "/...";

/// Non-test `.go` files directly in `dir`, sorted by name.
pub fn go_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_go_source(p))
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

/// A non-test `.go` file whose `_GOOS`/`_GOARCH` suffix admits the host.
fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('.')
        && !name.starts_with('_')
        && BuildContext::host().matches_file_name(name)
}

/// Directories the go tool never treats as part of a `...` pattern.
fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == "testdata" || name == "vendor" || name.starts_with('.') || name.starts_with('_')
}

pub fn is_recursive(pattern: &str) -> bool {
    pattern.ends_with(RECURSIVE_SUFFIX)
}

/// Expand a module pattern. A plain path expands to itself; `base/...`
/// expands to `base` and every module directory below it, sorted.
pub fn expand_pattern(roots: &SourceRoots, pattern: &str) -> LocateResult<Vec<String>> {
    let Some(base) = pattern.strip_suffix(RECURSIVE_SUFFIX) else {
        return Ok(vec![pattern.to_string()]);
    };
    let dir = roots.directory(base).ok_or_else(|| LocateError::ModuleNotFound {
        path: pattern.to_string(),
    })?;

    let mut modules = Vec::new();
    let walker = WalkDir::new(&dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_type().is_dir() && !is_skipped_dir(e));
    for entry in walker.filter_map(|e| e.ok()) {
        if go_files(entry.path()).is_empty() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(&dir)
            .map(|r| {
                r.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default();
        modules.push(if rel.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{rel}")
        });
    }
    modules.sort();
    if modules.is_empty() {
        return Err(LocateError::ModuleNotFound {
            path: pattern.to_string(),
        });
    }
    Ok(modules)
}
