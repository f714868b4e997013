// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! golocate - locate Go interfaces, their structural implementations,
//! functions and comments
//!
//! This library loads Go packages from configured source roots, checks
//! their declarations, and reports the located symbols in source order for
//! tools that annotate or rewrite them.

pub mod args;
pub mod checker;
pub mod comments;
pub mod config;
pub mod constraint;
pub mod contracts;
pub mod discover;
pub mod error;
pub mod files;
pub mod functions;
pub mod implementations;
pub mod loader;
pub mod locator;
pub mod methodset;
pub mod position;
pub mod roots;
pub mod spec;
pub mod syntax;
pub mod types;

use std::path::Path;

// Re-export commonly used items
pub use args::LocateArgs;
pub use comments::{CommentAnchor, CommentMatch};
pub use config::LocateConfig;
pub use constraint::{BuildContext, Constraint};
pub use contracts::ContractDescriptor;
pub use error::{Errors, LocateError, LocateResult};
pub use files::{FileHit, HitMask};
pub use functions::FunctionDescriptor;
pub use loader::{Loader, Module};
pub use locator::{CancelToken, Locator, Options, Report};
pub use position::SourcePosition;
pub use roots::{SourceRoot, SourceRoots};
pub use spec::Spec;
pub use syntax::parse_file;

/// Parse Go source into a SourceFile
pub fn parse_source(path: &Path, source: &str) -> LocateResult<syntax::SourceFile> {
    parse_file(path, source)
}
