// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Matching concrete methods against resolved contracts.

use crate::error::LocateResult;
use crate::functions::FunctionDescriptor;
use crate::loader::Loader;
use crate::locator::CancelToken;
use crate::methodset::{method_set, satisfies, MethodMap};
use crate::types::{MethodSignature, NamedRef};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// The part of a contract the matcher needs.
#[derive(Debug, Clone)]
pub struct ContractShape {
    pub full_name: String,
    pub method_set: BTreeSet<MethodSignature>,
    pub type_elements: bool,
}

/// A method whose receiver type implements a contract.
#[derive(Debug, Clone)]
pub struct Implementation {
    pub method: FunctionDescriptor,
    pub contract: String,
}

/// Every (exported method, contract) pair in `module` where the method's
/// receiver type, `T` or `*T` as declared, implements the contract.
pub fn match_implementations(
    loader: &Loader,
    contracts: &[ContractShape],
    module: &str,
    cancel: &CancelToken,
) -> LocateResult<Vec<Implementation>> {
    cancel.check()?;
    let module = loader.load(module)?;
    let mut sets: HashMap<(String, bool), MethodMap> = HashMap::new();
    let mut found = Vec::new();

    for func in &module.symbols.funcs {
        let Some(recv) = &func.receiver else {
            continue;
        };
        if !func.exported {
            continue;
        }
        let key = (recv.base.clone(), recv.pointer);
        if !sets.contains_key(&key) {
            let named = NamedRef::new(module.path.clone(), recv.base.clone());
            let set = method_set(loader, &named, recv.pointer)?;
            sets.insert(key.clone(), set);
        }
        let Some(set) = sets.get(&key) else {
            continue;
        };
        for contract in contracts {
            if contract.type_elements || !satisfies(set, &contract.method_set) {
                continue;
            }
            let method = FunctionDescriptor::new(&module.path, func);
            debug!(method = %method.full_name, contract = %contract.full_name, "implements");
            found.push(Implementation {
                method,
                contract: contract.full_name.clone(),
            });
        }
    }
    Ok(found)
}
