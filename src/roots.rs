// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Mapping from module paths to directories.

use crate::discover::go_files;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// The module `$GOROOT/src/go.mod` declares. Standard library import
/// paths carry no prefix.
const STD_MODULE: &str = "std";

/// A directory that module paths are resolved under.
///
/// With a `go.mod` in `dir` the prefix is its `module` path, so
/// `example.com/m/sub` resolves to `dir/sub`. Without one, or for the
/// standard library's `module std`, the prefix is empty and every path
/// resolves relative to `dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    pub dir: PathBuf,
    pub prefix: String,
}

impl SourceRoot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let prefix = read_module_path(&dir.join("go.mod"))
            .filter(|module| module != STD_MODULE)
            .unwrap_or_default();
        SourceRoot { dir, prefix }
    }

    pub fn with_prefix(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        SourceRoot {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// The directory `path` maps to under this root, if the prefix matches.
    fn candidate(&self, path: &str) -> Option<PathBuf> {
        if self.prefix.is_empty() {
            return Some(self.dir.join(path));
        }
        if path == self.prefix {
            return Some(self.dir.clone());
        }
        let rest = path.strip_prefix(&self.prefix)?.strip_prefix('/')?;
        Some(self.dir.join(rest))
    }

    /// The module path of a directory under this root.
    fn module_path(&self, dir: &Path) -> Option<String> {
        let rel = dir.strip_prefix(&self.dir).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let rel = parts.join("/");
        Some(match (self.prefix.is_empty(), rel.is_empty()) {
            (true, _) => rel,
            (false, true) => self.prefix.clone(),
            (false, false) => format!("{}/{}", self.prefix, rel),
        })
    }
}

/// The `module` directive of a go.mod file.
fn read_module_path(go_mod: &Path) -> Option<String> {
    let content = fs::read_to_string(go_mod).ok()?;
    content.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or("").trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        Some(rest.trim().trim_matches('"').to_string())
    })
}

/// The Go installation: `$GOROOT`, else what `go env GOROOT` reports.
pub fn goroot() -> Option<PathBuf> {
    let dir = match std::env::var_os("GOROOT").filter(|dir| !dir.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let output = Command::new("go").args(["env", "GOROOT"]).output().ok()?;
            if !output.status.success() {
                return None;
            }
            let dir = String::from_utf8(output.stdout).ok()?;
            PathBuf::from(dir.trim())
        }
    };
    if dir.join("src").is_dir() {
        Some(dir)
    } else {
        debug!(goroot = %dir.display(), "GOROOT has no src directory");
        None
    }
}

/// An ordered set of source roots.
#[derive(Debug, Clone, Default)]
pub struct SourceRoots {
    roots: Vec<SourceRoot>,
}

impl SourceRoots {
    pub fn new() -> Self {
        SourceRoots::default()
    }

    pub fn from_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        SourceRoots {
            roots: dirs.into_iter().map(SourceRoot::new).collect(),
        }
    }

    pub fn push(&mut self, root: SourceRoot) {
        self.roots.push(root);
    }

    /// Add the standard library of the Go installation at `goroot`. With
    /// an empty prefix it only wins where no other root matches.
    pub fn with_goroot(mut self, goroot: impl AsRef<Path>) -> Self {
        self.roots.push(SourceRoot::with_prefix(goroot.as_ref().join("src"), ""));
        self
    }

    pub fn roots(&self) -> &[SourceRoot] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Roots whose prefix matches `path`, longest prefix first.
    fn matching(&self, path: &str) -> Vec<(&SourceRoot, PathBuf)> {
        let mut found: Vec<_> = self
            .roots
            .iter()
            .filter_map(|root| root.candidate(path).map(|dir| (root, dir)))
            .collect();
        found.sort_by(|a, b| b.0.prefix.len().cmp(&a.0.prefix.len()));
        found
    }

    /// The directory of module `path`: the first matching root, longest
    /// prefix first, whose candidate directory holds Go source.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        if path.is_empty() {
            return None;
        }
        for (root, dir) in self.matching(path) {
            if dir.is_dir() && !go_files(&dir).is_empty() {
                debug!(module = path, dir = %dir.display(), prefix = %root.prefix, "resolved module");
                return Some(dir);
            }
        }
        None
    }

    /// The directory a path maps to, whether or not it holds Go source.
    pub fn directory(&self, path: &str) -> Option<PathBuf> {
        self.matching(path)
            .into_iter()
            .map(|(_, dir)| dir)
            .find(|dir| dir.is_dir())
    }

    /// The module path of `dir` under the first root containing it.
    pub fn module_path(&self, dir: &Path) -> Option<String> {
        self.roots.iter().find_map(|root| root.module_path(dir))
    }
}
