// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Go source parsing: tree-sitter-go trees lowered to a declaration-level
//! AST.

pub mod ast;
pub mod parser;

pub use ast::*;

use crate::error::{LocateError, LocateResult};
use crate::position::LineIndex;
use std::path::Path;

/// A parse failure at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        SyntaxError {
            offset,
            message: message.into(),
        }
    }
}

/// Parse one Go file. `path` is only recorded for positions and errors.
pub fn parse_file(path: &Path, src: &str) -> LocateResult<SourceFile> {
    let lines = LineIndex::new(src);
    let to_error = |err: SyntaxError| {
        let (line, column) = lines.line_col(err.offset.min(src.len()));
        LocateError::ParseError {
            file: path.to_path_buf(),
            line,
            column,
            message: err.message,
        }
    };
    let decls = parser::parse(src).map_err(to_error)?;
    Ok(SourceFile {
        path: path.to_path_buf(),
        package: decls.package,
        package_offset: decls.package_offset,
        imports: decls.imports,
        import_decls: decls.import_decls,
        decls: decls.decls,
        decl_spans: decls.decl_spans,
        comment_groups: decls.comment_groups,
        constraint: decls.constraint,
        len: src.len(),
        lines,
    })
}
