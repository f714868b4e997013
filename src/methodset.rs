// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Method sets of interfaces and of concrete named types.

use crate::error::{LocateError, LocateResult};
use crate::loader::Loader;
use crate::types::{InterfaceType, MethodSignature, NamedRef, Signature, Type};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::warn;

/// Method name to signature.
pub type MethodMap = BTreeMap<String, Signature>;

/// The full method set of an interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceMethods {
    pub methods: MethodMap,
    /// The interface, or one it embeds, has type terms.
    pub type_elements: bool,
}

impl InterfaceMethods {
    pub fn signatures(&self) -> BTreeSet<MethodSignature> {
        self.methods
            .iter()
            .map(|(name, signature)| MethodSignature {
                name: name.clone(),
                signature: signature.clone(),
            })
            .collect()
    }
}

fn error_interface() -> InterfaceType {
    InterfaceType {
        methods: vec![MethodSignature {
            name: "Error".to_string(),
            signature: Signature {
                params: Vec::new(),
                results: vec![Type::Basic("string".to_string())],
                variadic: false,
            },
        }],
        embeds: Vec::new(),
        type_elements: false,
    }
}

fn universe_underlying(name: &str) -> Option<Type> {
    match name {
        "error" => Some(Type::Interface(error_interface())),
        "comparable" => Some(Type::Interface(InterfaceType {
            type_elements: true,
            ..InterfaceType::default()
        })),
        _ => None,
    }
}

/// Follow named types to their underlying type. A type from a module no
/// root holds is returned unchanged.
pub fn underlying(loader: &Loader, ty: &Type) -> LocateResult<Type> {
    let mut current = ty.clone();
    let mut seen = HashSet::new();
    loop {
        let Type::Named(named) = &current else {
            return Ok(current);
        };
        if named.is_universe() {
            return Ok(universe_underlying(&named.name).unwrap_or(current));
        }
        if !seen.insert(named.full_name()) {
            return Err(LocateError::type_check(
                named.module.clone(),
                format!("invalid recursive type {}", named.name),
            ));
        }
        let Some(module) = loader.lookup(&named.module)? else {
            return Ok(current);
        };
        let Some(obj) = module.symbols.lookup_type(&named.name) else {
            return Err(LocateError::type_check(
                named.module.clone(),
                format!("undefined: {}", named.name),
            ));
        };
        current = obj.underlying.clone();
    }
}

/// Declared and embedded methods of an interface, recursively. `owner`
/// names the module reported in errors.
pub fn interface_methods(loader: &Loader, iface: &InterfaceType, owner: &str) -> LocateResult<InterfaceMethods> {
    let mut out = InterfaceMethods::default();
    let mut visited = HashSet::new();
    collect_interface(loader, iface, owner, &mut out, &mut visited)?;
    Ok(out)
}

fn collect_interface(
    loader: &Loader,
    iface: &InterfaceType,
    owner: &str,
    out: &mut InterfaceMethods,
    visited: &mut HashSet<String>,
) -> LocateResult<()> {
    for method in &iface.methods {
        add_method(out, method, owner)?;
    }
    out.type_elements |= iface.type_elements;
    for embed in &iface.embeds {
        match embed {
            Type::Named(named) => {
                if !visited.insert(named.full_name()) {
                    continue;
                }
                if !named.is_universe() && loader.lookup(&named.module)?.is_none() {
                    return Err(LocateError::type_check(
                        owner,
                        format!("cannot embed {named}: module {} is not available", named.module),
                    ));
                }
                match underlying(loader, embed)? {
                    Type::Interface(inner) => {
                        let inner_owner = if named.is_universe() { owner } else { named.module.as_str() };
                        collect_interface(loader, &inner, inner_owner, out, visited)?;
                    }
                    _ => out.type_elements = true,
                }
            }
            Type::Interface(inner) => collect_interface(loader, inner, owner, out, visited)?,
            _ => out.type_elements = true,
        }
    }
    Ok(())
}

fn add_method(out: &mut InterfaceMethods, method: &MethodSignature, owner: &str) -> LocateResult<()> {
    match out.methods.get(&method.name) {
        Some(existing) if *existing != method.signature => Err(LocateError::type_check(
            owner,
            format!("duplicate method {}", method.name),
        )),
        Some(_) => Ok(()),
        None => {
            out.methods.insert(method.name.clone(), method.signature.clone());
            Ok(())
        }
    }
}

/// Candidates for one selector name at one embedding depth. `None`
/// entries are fields or methods not in the set; they still hide deeper
/// names.
type Candidates = BTreeMap<String, Vec<Option<Signature>>>;

/// The method set of `named` (`*named` when `pointer`).
///
/// Declared methods follow Go's receiver rules: a value receiver method
/// is in both sets, a pointer receiver method only in the pointer set.
/// Methods of embedded fields are promoted breadth first. A name found
/// at a shallower depth hides deeper ones, and a name found more than
/// once at the same depth is dropped.
pub fn method_set(loader: &Loader, named: &NamedRef, pointer: bool) -> LocateResult<MethodMap> {
    let mut result = MethodMap::new();
    let mut hidden: HashSet<String> = HashSet::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut level = vec![(named.clone(), pointer)];

    while !level.is_empty() {
        let mut candidates = Candidates::new();
        let mut next = Vec::new();
        for (ty, addressable) in level {
            if !seen.insert(ty.full_name()) {
                continue;
            }
            expand(loader, &ty, addressable, &mut candidates, &mut next)?;
        }
        for (name, entries) in candidates {
            if !hidden.insert(name.clone()) {
                continue;
            }
            if let [Some(signature)] = entries.as_slice() {
                result.insert(name, signature.clone());
            }
        }
        level = next;
    }
    Ok(result)
}

fn expand(
    loader: &Loader,
    ty: &NamedRef,
    addressable: bool,
    candidates: &mut Candidates,
    next: &mut Vec<(NamedRef, bool)>,
) -> LocateResult<()> {
    if ty.is_universe() {
        if let Some(Type::Interface(iface)) = universe_underlying(&ty.name) {
            for m in iface.methods {
                candidates.entry(m.name).or_default().push(Some(m.signature));
            }
        }
        return Ok(());
    }
    let Some(module) = loader.lookup(&ty.module)? else {
        warn!(module = %ty.module, name = %ty.name, "cannot promote methods from unavailable module");
        return Ok(());
    };

    for method in module.symbols.methods(&ty.name) {
        let pointer_only = method.receiver.as_ref().is_some_and(|r| r.pointer);
        let entry = if pointer_only && !addressable {
            None
        } else {
            Some(method.signature.clone())
        };
        candidates.entry(method.name.clone()).or_default().push(entry);
    }

    match underlying(loader, &Type::Named(ty.clone()))? {
        Type::Struct(fields) => {
            for field in &fields {
                if let Some(selector) = field.selector() {
                    candidates.entry(selector.to_string()).or_default().push(None);
                }
                if field.name.is_some() {
                    continue;
                }
                let (inner, via_pointer) = match &field.ty {
                    Type::Pointer(inner) => (inner.as_ref(), true),
                    other => (other, false),
                };
                if let Type::Named(embedded) = inner {
                    next.push((embedded.clone(), addressable || via_pointer));
                }
            }
        }
        Type::Interface(iface) => {
            let methods = interface_methods(loader, &iface, &ty.module)?;
            for (name, signature) in methods.methods {
                candidates.entry(name).or_default().push(Some(signature));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Whether `methods` holds every method of `required` with an identical
/// signature.
pub fn satisfies(methods: &MethodMap, required: &BTreeSet<MethodSignature>) -> bool {
    required
        .iter()
        .all(|m| methods.get(&m.name).is_some_and(|sig| *sig == m.signature))
}
