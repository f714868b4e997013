// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Error taxonomy for locating interfaces, functions and implementations.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single failure raised while loading or resolving.
///
/// Errors are `Clone` so that a failed module load can be cached and
/// replayed to every caller that requests the same path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("invalid spec {spec:?}: failed to compile pattern {pattern:?}: {message}")]
    InvalidSpec {
        spec: String,
        pattern: String,
        message: String,
    },

    #[error("module not found: {path}")]
    ModuleNotFound { path: String },

    #[error("{} contains more than one package: {}", dir.display(), names.join(", "))]
    AmbiguousModule { dir: PathBuf, names: Vec<String> },

    #[error("{}:{line}:{column}: {message}", file.display())]
    ParseError {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("failed to type check {module}: {}", messages.join("; "))]
    TypeCheckError {
        module: String,
        messages: Vec<String>,
    },

    #[error("failed to find any exported {kind} in {module} for {pattern}")]
    NoMatch {
        kind: &'static str,
        module: String,
        pattern: String,
    },

    #[error("cancelled")]
    Cancelled,
}

impl LocateError {
    pub fn type_check(module: impl Into<String>, message: impl Into<String>) -> Self {
        LocateError::TypeCheckError {
            module: module.into(),
            messages: vec![message.into()],
        }
    }

    /// True for the only error kind that can be configured away.
    pub fn is_no_match(&self) -> bool {
        matches!(self, LocateError::NoMatch { .. })
    }
}

pub type LocateResult<T> = Result<T, LocateError>;

/// Every error produced by one `run`, in the order they were collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Errors(Vec<LocateError>);

impl Errors {
    pub fn new() -> Self {
        Errors(Vec::new())
    }

    pub fn push(&mut self, err: LocateError) {
        self.0.push(err);
    }

    pub fn extend(&mut self, errs: impl IntoIterator<Item = LocateError>) {
        self.0.extend(errs);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocateError> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<LocateError> {
        self.0
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), Errors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

impl From<LocateError> for Errors {
    fn from(err: LocateError) -> Self {
        Errors(vec![err])
    }
}

impl IntoIterator for Errors {
    type Item = LocateError;
    type IntoIter = std::vec::IntoIter<LocateError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a LocateError;
    type IntoIter = std::slice::Iter<'a, LocateError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
