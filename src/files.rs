// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Per-file record of what was located in each file.

use crate::syntax::SourceFile;
use serde::Serialize;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::PathBuf;
use std::sync::Arc;

/// Kinds of hits found in one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct HitMask(u8);

impl HitMask {
    pub const INTERFACE: HitMask = HitMask(1);
    pub const FUNCTION: HitMask = HitMask(1 << 1);
    pub const COMMENT: HitMask = HitMask(1 << 2);

    const NAMES: [(HitMask, &'static str); 3] = [
        (HitMask::INTERFACE, "interface"),
        (HitMask::FUNCTION, "function"),
        (HitMask::COMMENT, "comment"),
    ];

    pub fn empty() -> Self {
        HitMask(0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: HitMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: HitMask) {
        self.0 |= other.0;
    }
}

impl BitOr for HitMask {
    type Output = HitMask;

    fn bitor(self, rhs: HitMask) -> HitMask {
        HitMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for HitMask {
    fn bitor_assign(&mut self, rhs: HitMask) {
        self.insert(rhs);
    }
}

impl fmt::Display for HitMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = HitMask::NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join(", "))
    }
}

/// A loaded file with at least one hit.
#[derive(Debug, Clone)]
pub struct FileHit {
    pub path: PathBuf,
    pub module: String,
    pub file: Arc<SourceFile>,
    pub hits: HitMask,
}

impl FileHit {
    pub fn package(&self) -> &str {
        &self.file.package
    }

    /// `file: package (hits)`
    pub fn summary(&self) -> String {
        format!("{}: {} ({})", self.path.display(), self.package(), self.hits)
    }
}
