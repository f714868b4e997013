// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Spec parsing for interface and function queries
//!
//! A spec names a module path and a regular expression for the package
//! local component, for example:
//!
//! ```text
//! example.com/a/b            all exported names in example.com/a/b
//! example.com/a/b.           same as above
//! example.com/a/b.Ifc        names containing Ifc
//! example.com/a/b.^Reader$   exactly Reader
//! ```
//!
//! The `.` separating the module path from the pattern is not part of the
//! regular expression.

use crate::error::{LocateError, LocateResult};
use regex::Regex;

/// Pattern used when a spec has no name component.
pub const MATCH_ALL: &str = ".*";

/// A parsed `(module path, name pattern)` query.
#[derive(Debug, Clone)]
pub struct Spec {
    /// Module (package import) path
    pub module_path: String,
    /// Pattern matched against the unqualified exported name
    pub pattern: Regex,
    /// Resolve every match (true) or stop at the first match in name order
    pub match_all: bool,
}

impl Spec {
    /// Parse a user supplied spec. User specs always resolve every match.
    pub fn parse(spec: &str) -> LocateResult<Spec> {
        let (module_path, expr) = split_spec(spec);
        if module_path.is_empty() {
            return Err(LocateError::InvalidSpec {
                spec: spec.to_string(),
                pattern: expr,
                message: "no module path".to_string(),
            });
        }
        let pattern = compile(spec, &expr)?;
        Ok(Spec {
            module_path,
            pattern,
            match_all: true,
        })
    }

    /// A spec matching exactly one name, as used for contracts embedded
    /// from another module.
    pub fn exact(module_path: &str, name: &str) -> LocateResult<Spec> {
        let expr = format!("^{}$", regex::escape(name));
        let pattern = compile(&format!("{module_path}.{expr}"), &expr)?;
        Ok(Spec {
            module_path: module_path.to_string(),
            pattern,
            match_all: false,
        })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    pub fn pattern_str(&self) -> &str {
        self.pattern.as_str()
    }
}

impl std::fmt::Display for Spec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module_path, self.pattern.as_str())
    }
}

fn compile(spec: &str, expr: &str) -> LocateResult<Regex> {
    Regex::new(expr).map_err(|err| LocateError::InvalidSpec {
        spec: spec.to_string(),
        pattern: expr.to_string(),
        message: err.to_string(),
    })
}

/// Split a spec into its module path and pattern text.
///
/// The module path ends at the first `.` after the last `/`; with no `.`
/// the pattern defaults to [`MATCH_ALL`].
pub fn split_spec(spec: &str) -> (String, String) {
    let (dir, tail) = match spec.rfind('/') {
        Some(idx) => (&spec[..idx + 1], &spec[idx + 1..]),
        None => ("", spec),
    };
    match tail.find('.') {
        Some(idx) => (format!("{dir}{}", &tail[..idx]), tail[idx + 1..].to_string()),
        None => (format!("{dir}{tail}"), MATCH_ALL.to_string()),
    }
}

/// Deduplicate, preserving first-seen order and dropping empty entries.
pub fn dedup<I, S>(inputs: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut deduped = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_empty() || !seen.insert(input.to_string()) {
            continue;
        }
        deduped.push(input.to_string());
    }
    deduped
}

/// Every module that must be loaded for the supplied specs and packages.
pub fn modules_to_load(contracts: &[Spec], functions: &[Spec], packages: &[String]) -> Vec<String> {
    let all = contracts
        .iter()
        .chain(functions.iter())
        .map(|s| s.module_path.clone())
        .chain(packages.iter().cloned());
    dedup(all)
}
