// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Scanning comment groups for patterns.

use crate::error::{LocateError, LocateResult};
use crate::loader::Module;
use crate::position::SourcePosition;
use crate::syntax::{CommentGroup, DeclKind, SourceFile};
use regex::Regex;
use serde::Serialize;

/// A comment group whose text matched a pattern.
#[derive(Debug, Clone, Serialize)]
pub struct CommentMatch {
    pub pattern: String,
    /// Start of the comment group.
    pub position: SourcePosition,
    /// Byte offset just past the group.
    pub end: usize,
    /// Group text with comment markers removed.
    pub text: String,
    /// The declaration the group documents, trails or sits inside.
    pub anchor: Option<CommentAnchor>,
}

/// A top-level declaration a comment group is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentAnchor {
    pub kind: DeclKind,
    /// `Recv.Name` for methods, the import path for imports.
    pub name: String,
    pub position: SourcePosition,
}

impl CommentAnchor {
    fn of(file: &SourceFile, group: &CommentGroup) -> Option<Self> {
        file.comment_anchor(group).map(|span| CommentAnchor {
            kind: span.kind,
            name: span.name.clone(),
            position: file.position(span.offset),
        })
    }
}

pub fn compile_patterns(patterns: &[String]) -> LocateResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|err| LocateError::InvalidSpec {
                spec: p.clone(),
                pattern: p.clone(),
                message: err.to_string(),
            })
        })
        .collect()
}

/// Every (comment group, pattern) match in the files of `module`.
pub fn scan_comments(patterns: &[Regex], module: &Module) -> Vec<CommentMatch> {
    let mut found = Vec::new();
    for file in &module.files {
        for group in &file.comment_groups {
            let text = group.text();
            let mut anchor = None;
            for pattern in patterns {
                if pattern.is_match(&text) {
                    found.push(CommentMatch {
                        pattern: pattern.as_str().to_string(),
                        position: file.position(group.start),
                        end: group.end,
                        text: text.clone(),
                        anchor: anchor.get_or_insert_with(|| CommentAnchor::of(file, group)).clone(),
                    });
                }
            }
        }
    }
    found
}
