// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Resolving interface specs into contract descriptors.

use crate::checker::{is_exported, TypeKind};
use crate::error::{LocateError, LocateResult};
use crate::loader::{Loader, Module};
use crate::locator::CancelToken;
use crate::methodset::{interface_methods, underlying};
use crate::position::SourcePosition;
use crate::spec::Spec;
use crate::types::{MethodSignature, NamedRef, Type};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::debug;

/// A located interface.
#[derive(Debug, Clone, Serialize)]
pub struct ContractDescriptor {
    /// `module.Name`
    pub full_name: String,
    pub module: String,
    pub name: String,
    /// Declared and embedded methods, exported or not.
    pub method_set: BTreeSet<MethodSignature>,
    /// Full names of the named contracts it embeds.
    pub embeds: Vec<String>,
    /// Position of the type name.
    pub declared_at: SourcePosition,
    /// A constraint interface; never implemented.
    pub type_elements: bool,
    /// Full names of the methods whose receivers implement it.
    pub implementers: BTreeSet<String>,
}

impl ContractDescriptor {
    pub fn method_names(&self) -> Vec<&str> {
        self.method_set.iter().map(|m| m.name.as_str()).collect()
    }
}

struct Resolver<'a> {
    loader: &'a Loader,
    cancel: &'a CancelToken,
    visited: HashSet<String>,
    found: Vec<ContractDescriptor>,
}

/// Every exported interface matching `spec`, with the exported
/// interfaces they embed, in name order.
pub fn resolve_contracts(
    loader: &Loader,
    spec: &Spec,
    ignore_missing: bool,
    cancel: &CancelToken,
) -> LocateResult<Vec<ContractDescriptor>> {
    let mut resolver = Resolver {
        loader,
        cancel,
        visited: HashSet::new(),
        found: Vec::new(),
    };
    let matched = resolver.resolve_spec(spec)?;
    if matched == 0 && !ignore_missing {
        return Err(LocateError::NoMatch {
            kind: "interfaces",
            module: spec.module_path.clone(),
            pattern: spec.pattern_str().to_string(),
        });
    }
    Ok(resolver.found)
}

impl<'a> Resolver<'a> {
    fn resolve_spec(&mut self, spec: &Spec) -> LocateResult<usize> {
        self.cancel.check()?;
        let module = self.loader.load(&spec.module_path)?;
        let mut matched = 0;
        for (name, obj) in &module.symbols.types {
            if !obj.exported || obj.kind != TypeKind::Defined || !spec.is_match(name) {
                continue;
            }
            if !self.is_interface(&module, name)? {
                continue;
            }
            matched += 1;
            self.register(&module, name)?;
            if !spec.match_all {
                break;
            }
        }
        Ok(matched)
    }

    fn is_interface(&self, module: &Module, name: &str) -> LocateResult<bool> {
        let named = Type::Named(NamedRef::new(module.path.clone(), name));
        Ok(matches!(underlying(self.loader, &named)?, Type::Interface(_)))
    }

    fn register(&mut self, module: &Arc<Module>, name: &str) -> LocateResult<()> {
        let full_name = format!("{}.{name}", module.path);
        if !self.visited.insert(full_name.clone()) {
            return Ok(());
        }
        let Some(obj) = module.symbols.lookup_type(name) else {
            return Ok(());
        };
        let named = Type::Named(NamedRef::new(module.path.clone(), name));
        let Type::Interface(iface) = underlying(self.loader, &named)? else {
            return Ok(());
        };
        let methods = interface_methods(self.loader, &iface, &module.path)?;

        let mut embeds = Vec::new();
        for embed in &iface.embeds {
            let Type::Named(embedded) = embed else {
                continue;
            };
            if embedded.is_universe() || !is_exported(&embedded.name) {
                continue;
            }
            if embedded.module == module.path {
                if self.is_interface(module, &embedded.name)? {
                    embeds.push(embedded.full_name());
                    self.register(module, &embedded.name)?;
                }
            } else {
                let spec = Spec::exact(&embedded.module, &embedded.name)?;
                if self.resolve_spec(&spec)? > 0 {
                    embeds.push(embedded.full_name());
                }
            }
        }

        debug!(contract = %full_name, methods = methods.methods.len(), "registered contract");
        self.found.push(ContractDescriptor {
            full_name,
            module: module.path.clone(),
            name: name.to_string(),
            method_set: methods.signatures(),
            embeds,
            declared_at: obj.declared_at.clone(),
            type_elements: methods.type_elements,
            implementers: BTreeSet::new(),
        });
        Ok(())
    }
}
