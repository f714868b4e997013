// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Resolving function specs into function descriptors.

use crate::checker::{FuncObject, Receiver};
use crate::error::{LocateError, LocateResult};
use crate::loader::Loader;
use crate::locator::CancelToken;
use crate::position::SourcePosition;
use crate::spec::Spec;
use crate::syntax::BodySpan;
use crate::types::{Param, Signature};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// A located function or implementing method.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDescriptor {
    /// `module.Fn`, `(module.T).M` or `(*module.T).M`
    pub full_name: String,
    pub module: String,
    pub name: String,
    pub receiver: Option<Receiver>,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub variadic: bool,
    pub signature: Signature,
    /// Position of the `func` keyword.
    pub declared_at: SourcePosition,
    pub name_at: SourcePosition,
    pub body: Option<BodySpan>,
    /// Full names of the contracts its receiver implements.
    pub satisfied_contracts: BTreeSet<String>,
}

/// Full name of a function or method declared in `module`.
pub fn full_name(module: &str, func: &FuncObject) -> String {
    match &func.receiver {
        None => format!("{module}.{}", func.name),
        Some(Receiver { base, pointer: true, .. }) => format!("(*{module}.{base}).{}", func.name),
        Some(Receiver { base, .. }) => format!("({module}.{base}).{}", func.name),
    }
}

impl FunctionDescriptor {
    pub fn new(module: &str, func: &FuncObject) -> Self {
        FunctionDescriptor {
            full_name: full_name(module, func),
            module: module.to_string(),
            name: func.name.clone(),
            receiver: func.receiver.clone(),
            params: func.params.clone(),
            results: func.results.clone(),
            variadic: func.variadic,
            signature: func.signature.clone(),
            declared_at: func.declared_at.clone(),
            name_at: func.name_at.clone(),
            body: func.body,
            satisfied_contracts: BTreeSet::new(),
        }
    }

    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }
}

/// Exported package level functions matching `spec`, in name order.
pub fn resolve_functions(
    loader: &Loader,
    spec: &Spec,
    ignore_missing: bool,
    cancel: &CancelToken,
) -> LocateResult<Vec<FunctionDescriptor>> {
    cancel.check()?;
    let module = loader.load(&spec.module_path)?;
    let mut matches: Vec<&FuncObject> = module
        .symbols
        .free_funcs()
        .filter(|f| f.exported && spec.is_match(&f.name))
        .collect();
    matches.sort_by(|a, b| a.name.cmp(&b.name));
    if !spec.match_all {
        matches.truncate(1);
    }
    if matches.is_empty() && !ignore_missing {
        return Err(LocateError::NoMatch {
            kind: "functions",
            module: spec.module_path.clone(),
            pattern: spec.pattern_str().to_string(),
        });
    }
    Ok(matches
        .into_iter()
        .map(|f| {
            let desc = FunctionDescriptor::new(&module.path, f);
            debug!(function = %desc.full_name, at = %desc.declared_at, "registered function");
            desc
        })
        .collect())
}
