// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Declaration-level syntax tree for Go source files.
//!
//! Offsets are byte offsets into the file. Function bodies, `var` and
//! `const` declarations are not represented beyond their spans.

use crate::constraint::{BuildContext, Constraint};
use crate::position::{LineIndex, SourcePosition};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A type expression as written.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `Name`, `pkg.Name`, `Name[Args]`
    Name {
        pkg: Option<String>,
        name: String,
        args: Vec<TypeExpr>,
        offset: usize,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array { len: String, elem: Box<TypeExpr> },
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    Func(FuncTypeExpr),
    Interface(Vec<InterfaceElem>),
    Struct(Vec<FieldExpr>),
    /// `~int | string`, only valid as a constraint
    Union(Vec<UnionTerm>),
}

impl TypeExpr {
    /// The identifier if this is an unqualified, uninstantiated name.
    pub fn as_plain_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Name {
                pkg: None,
                name,
                args,
                ..
            } if args.is_empty() => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionTerm {
    pub tilde: bool,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceElem {
    Method {
        name: String,
        offset: usize,
        func: FuncTypeExpr,
    },
    Embed(TypeExpr),
    Union(Vec<UnionTerm>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldExpr {
    /// `None` for an embedded field
    pub name: Option<String>,
    pub ty: TypeExpr,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamExpr {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FuncTypeExpr {
    pub params: Vec<ParamExpr>,
    pub results: Vec<ParamExpr>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParamExpr {
    pub name: String,
    pub constraint: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    /// Explicit name, `.` or `_`
    pub name: Option<String>,
    pub path: String,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: String,
    pub offset: usize,
    pub type_params: Vec<TypeParamExpr>,
    pub alias: bool,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverExpr {
    pub name: Option<String>,
    pub pointer: bool,
    pub base: String,
    pub base_offset: usize,
    pub type_params: Vec<String>,
}

/// Offsets of the braces delimiting a function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BodySpan {
    pub lbrace: usize,
    pub rbrace: usize,
    /// Nothing but whitespace, comments or semicolons between the braces
    pub empty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    /// Offset of the `func` keyword
    pub offset: usize,
    pub recv: Option<ReceiverExpr>,
    pub name: String,
    pub name_offset: usize,
    pub type_params: Vec<TypeParamExpr>,
    pub sig: FuncTypeExpr,
    pub body: Option<BodySpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Type(TypeSpec),
    Func(FuncDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Package,
    Import,
    Const,
    Var,
    Type,
    Func,
}

/// Extent of one top-level declaration. Specs of a parenthesized group
/// get a span each; an ungrouped declaration starts at its keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclSpan {
    pub kind: DeclKind,
    /// Declared name; `Recv.Name` for methods, the path for imports
    pub name: String,
    pub offset: usize,
    pub end: usize,
}

/// Adjacent comments with no tokens between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    pub start: usize,
    pub end: usize,
    pub comments: Vec<String>,
}

impl CommentGroup {
    /// The text of the group with comment markers removed, as a reader
    /// would see it. `//go:` style directive lines are dropped.
    pub fn text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        for comment in &self.comments {
            if let Some(line) = comment.strip_prefix("//") {
                if is_directive(line) {
                    continue;
                }
                let line = line.strip_prefix(' ').unwrap_or(line);
                lines.push(line.to_string());
            } else {
                let body = comment
                    .strip_prefix("/*")
                    .and_then(|c| c.strip_suffix("*/"))
                    .unwrap_or(comment);
                lines.extend(body.split('\n').map(|l| l.to_string()));
            }
        }
        let lines: Vec<&str> = lines.iter().map(|l| l.trim_end()).collect();
        let first = lines.iter().position(|l| !l.is_empty());
        let last = lines.iter().rposition(|l| !l.is_empty());
        match (first, last) {
            (Some(first), Some(last)) => {
                let mut text = lines[first..=last].join("\n");
                text.push('\n');
                text
            }
            _ => String::new(),
        }
    }
}

fn is_directive(line: &str) -> bool {
    // //go:generate, //line, //export and friends
    if line.starts_with("line ") || line.starts_with("export ") || line.starts_with("extern ") {
        return true;
    }
    match line.split_once(':') {
        Some((prefix, rest)) => {
            !prefix.is_empty()
                && prefix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                && rest.starts_with(|c: char| c.is_ascii_lowercase())
        }
        None => false,
    }
}

/// A parsed Go source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub package: String,
    pub package_offset: usize,
    pub imports: Vec<ImportSpec>,
    /// Spans of the leading import declarations
    pub import_decls: Vec<(usize, usize)>,
    pub decls: Vec<Decl>,
    /// Every top-level declaration, the package clause first
    pub decl_spans: Vec<DeclSpan>,
    pub comment_groups: Vec<CommentGroup>,
    /// The `//go:build` (or `// +build`) constraint above the package clause
    pub constraint: Option<Constraint>,
    pub len: usize,
    pub lines: LineIndex,
}

impl SourceFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn position(&self, offset: usize) -> SourcePosition {
        self.lines.position(&self.path, offset)
    }

    /// Start and end offsets of the import declarations at the top of
    /// the file, or `None` if the file has no imports.
    pub fn import_block(&self) -> Option<(usize, usize)> {
        let start = self.import_decls.first()?.0;
        let end = self.import_decls.last()?.1;
        Some((start, end))
    }

    /// Whether the file belongs to its package when building for `ctx`.
    pub fn builds_with(&self, ctx: &BuildContext) -> bool {
        self.constraint.as_ref().map_or(true, |c| ctx.satisfies(c))
    }

    /// The declaration a comment group belongs to: the one enclosing it,
    /// else one ending on the line the group starts (a trailing comment),
    /// else the next one.
    pub fn comment_anchor(&self, group: &CommentGroup) -> Option<&DeclSpan> {
        let spans = &self.decl_spans;
        if let Some(span) = spans.iter().find(|s| s.offset <= group.start && group.end <= s.end) {
            return Some(span);
        }
        let (line, _) = self.lines.line_col(group.start);
        let trailed = spans
            .iter()
            .rev()
            .find(|s| s.end <= group.start && self.lines.line_col(s.end.saturating_sub(1)).0 == line);
        trailed.or_else(|| spans.iter().find(|s| s.offset >= group.end))
    }

    pub fn type_specs(&self) -> impl Iterator<Item = &TypeSpec> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Type(t) => Some(t),
            Decl::Func(_) => None,
        })
    }

    pub fn func_decls(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Func(f) => Some(f),
            Decl::Type(_) => None,
        })
    }
}
