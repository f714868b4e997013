// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! JSON configuration for a locator session.

use crate::locator::{Locator, Options};
use crate::roots::{goroot, SourceRoot, SourceRoots};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A source root as configured: a directory, with the module prefix read
/// from its `go.mod` unless given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootConfig {
    pub dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl RootConfig {
    fn source_root(&self, base: &Path) -> SourceRoot {
        let dir = if self.dir.is_absolute() {
            self.dir.clone()
        } else {
            base.join(&self.dir)
        };
        match &self.prefix {
            Some(prefix) => SourceRoot::with_prefix(dir, prefix.clone()),
            None => SourceRoot::new(dir),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocateConfig {
    /// Interface specs, `module.pattern`.
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Function specs, `module.pattern`.
    #[serde(default)]
    pub functions: Vec<String>,
    /// Modules, or `module/...` patterns, searched for implementations.
    #[serde(default)]
    pub packages: Vec<String>,
    /// Comment patterns.
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub roots: Vec<RootConfig>,
    /// Go installation whose standard library is searched after the roots;
    /// found from `$GOROOT` or `go env GOROOT` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goroot: Option<PathBuf>,
    #[serde(default)]
    pub options: Options,
    /// Directory relative root dirs are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl LocateConfig {
    /// Load a config file; relative roots resolve against its directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON: {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// Parse a config; relative roots resolve against the current directory.
    pub fn from_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse config JSON")?;
        Ok(config)
    }

    pub fn add_root(&mut self, dir: impl Into<PathBuf>) {
        self.roots.push(RootConfig {
            dir: dir.into(),
            prefix: None,
        });
    }

    /// The configured roots, then the standard library.
    pub fn source_roots(&self) -> SourceRoots {
        let mut roots = SourceRoots::new();
        for root in &self.roots {
            roots.push(root.source_root(&self.base_dir));
        }
        let std_dir = match &self.goroot {
            Some(dir) if dir.is_absolute() => Some(dir.clone()),
            Some(dir) => Some(self.base_dir.join(dir)),
            None => goroot(),
        };
        match std_dir {
            Some(dir) => {
                debug!(goroot = %dir.display(), "standard library root");
                roots.with_goroot(dir)
            }
            None => roots,
        }
    }

    /// A locator with every configured spec registered.
    pub fn locator(&self) -> Locator {
        let mut locator = Locator::new(self.source_roots(), self.options);
        locator.add_interfaces(&self.interfaces);
        locator.add_functions(&self.functions);
        locator.add_packages(&self.packages);
        locator.add_comments(&self.comments);
        locator
    }
}
