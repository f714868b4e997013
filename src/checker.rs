// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Declaration checker: resolves the type expressions of one module into
//! a symbol table.
//!
//! Only package level type and function declarations are checked.
//! Qualified names are resolved through the importing file's imports.
//! An import found under the source roots is parsed to confirm that the
//! referenced type exists and to expand aliases; any other import is
//! opaque and its types are identified by path and name alone.

use crate::error::{LocateError, LocateResult};
use crate::loader::{ModuleSource, ParsedModule};
use crate::position::SourcePosition;
use crate::syntax::{BodySpan, FuncTypeExpr, InterfaceElem, SourceFile, TypeExpr, TypeSpec};
use crate::types::{
    basic_name, Field, InterfaceType, MethodSignature, NamedRef, Param, Signature, Type,
};
use std::collections::{BTreeMap, HashSet};
use tracing::trace;

pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// The package name an import path is referred to by when the imported
/// module cannot be parsed: the last element, without a major version.
pub fn default_import_name(path: &str) -> &str {
    let mut parts = path.rsplit('/');
    let last = parts.next().unwrap_or(path);
    let is_major = |s: &str| s.len() > 1 && s.starts_with('v') && s[1..].bytes().all(|b| b.is_ascii_digit());
    if is_major(last) {
        if let Some(prev) = parts.next() {
            return prev;
        }
    }
    match last.rsplit_once('.') {
        Some((name, version)) if is_major(version) => name,
        _ => last,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Defined,
    Alias,
}

#[derive(Debug, Clone)]
pub struct TypeObject {
    pub name: String,
    pub exported: bool,
    pub declared_at: SourcePosition,
    pub kind: TypeKind,
    pub type_params: Vec<String>,
    /// The declared right hand side with aliases expanded. For a defined
    /// type this may itself be a named type.
    pub underlying: Type,
}

impl TypeObject {
    pub fn is_interface(&self) -> bool {
        matches!(self.underlying, Type::Interface(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Receiver {
    pub name: Option<String>,
    /// Name of the defined receiver type, after alias expansion
    pub base: String,
    pub pointer: bool,
    pub type_params: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FuncObject {
    pub name: String,
    pub exported: bool,
    pub receiver: Option<Receiver>,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub variadic: bool,
    pub signature: Signature,
    /// Position of the `func` keyword
    pub declared_at: SourcePosition,
    pub name_at: SourcePosition,
    pub body: Option<BodySpan>,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub package: String,
    pub types: BTreeMap<String, TypeObject>,
    pub funcs: Vec<FuncObject>,
}

impl SymbolTable {
    pub fn lookup_type(&self, name: &str) -> Option<&TypeObject> {
        self.types.get(name)
    }

    /// Methods declared with `base` (or `*base`) as receiver.
    pub fn methods<'a>(&'a self, base: &'a str) -> impl Iterator<Item = &'a FuncObject> + 'a {
        self.funcs
            .iter()
            .filter(move |f| f.receiver.as_ref().is_some_and(|r| r.base == base))
    }

    /// Package level functions, without receivers.
    pub fn free_funcs(&self) -> impl Iterator<Item = &FuncObject> {
        self.funcs.iter().filter(|f| f.receiver.is_none())
    }
}

/// Lexical context of a type expression.
struct Scope<'a> {
    module: &'a ParsedModule,
    file: &'a SourceFile,
    type_params: Vec<String>,
}

struct Checker<'a> {
    source: &'a dyn ModuleSource,
    alias_stack: Vec<(String, String)>,
}

type Resolved<T> = Result<T, String>;

impl<'a> Checker<'a> {
    fn convert(&mut self, scope: &Scope<'_>, expr: &TypeExpr) -> Resolved<Type> {
        Ok(match expr {
            TypeExpr::Name { pkg, name, args, .. } => {
                let mut targs = Vec::with_capacity(args.len());
                for arg in args {
                    targs.push(self.convert(scope, arg)?);
                }
                return self.resolve_name(scope, pkg.as_deref(), name, targs);
            }
            TypeExpr::Pointer(inner) => Type::Pointer(Box::new(self.convert(scope, inner)?)),
            TypeExpr::Slice(elem) => Type::Slice(Box::new(self.convert(scope, elem)?)),
            TypeExpr::Array { len, elem } => {
                Type::Array(len.clone(), Box::new(self.convert(scope, elem)?))
            }
            TypeExpr::Map { key, value } => Type::Map(
                Box::new(self.convert(scope, key)?),
                Box::new(self.convert(scope, value)?),
            ),
            TypeExpr::Chan { dir, elem } => Type::Chan(*dir, Box::new(self.convert(scope, elem)?)),
            TypeExpr::Func(func) => Type::Func(self.signature(scope, func)?.0),
            TypeExpr::Interface(elems) => Type::Interface(self.interface(scope, elems)?),
            TypeExpr::Struct(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for field in fields {
                    out.push(Field {
                        name: field.name.clone(),
                        ty: self.convert(scope, &field.ty)?,
                    });
                }
                Type::Struct(out)
            }
            TypeExpr::Union(terms) => {
                let mut out = Vec::with_capacity(terms.len());
                for term in terms {
                    out.push((term.tilde, self.convert(scope, &term.ty)?));
                }
                Type::Union(out)
            }
        })
    }

    fn interface(&mut self, scope: &Scope<'_>, elems: &[InterfaceElem]) -> Resolved<InterfaceType> {
        let mut iface = InterfaceType::default();
        for elem in elems {
            match elem {
                InterfaceElem::Method { name, func, .. } => {
                    let (signature, _, _) = self.signature(scope, func)?;
                    iface.methods.push(MethodSignature {
                        name: name.clone(),
                        signature,
                    });
                }
                InterfaceElem::Embed(ty) => iface.embeds.push(self.convert(scope, ty)?),
                InterfaceElem::Union(terms) => {
                    for term in terms {
                        self.convert(scope, &term.ty)?;
                    }
                    iface.type_elements = true;
                }
            }
        }
        Ok(iface)
    }

    fn params(&mut self, scope: &Scope<'_>, list: &[crate::syntax::ParamExpr]) -> Resolved<Vec<Param>> {
        let mut out = Vec::with_capacity(list.len());
        for p in list {
            out.push(Param {
                name: p.name.clone(),
                ty: self.convert(scope, &p.ty)?,
            });
        }
        Ok(out)
    }

    fn signature(
        &mut self,
        scope: &Scope<'_>,
        func: &FuncTypeExpr,
    ) -> Resolved<(Signature, Vec<Param>, Vec<Param>)> {
        let mut params = self.params(scope, &func.params)?;
        let results = self.params(scope, &func.results)?;
        if func.variadic {
            if let Some(last) = params.last_mut() {
                let elem = std::mem::replace(&mut last.ty, Type::empty_interface());
                last.ty = Type::Slice(Box::new(elem));
            }
        }
        let signature = Signature {
            params: params.iter().map(|p| p.ty.clone()).collect(),
            results: results.iter().map(|p| p.ty.clone()).collect(),
            variadic: func.variadic,
        };
        Ok((signature, params, results))
    }

    /// The type a declaration denotes: a named reference, or the expanded
    /// target of an alias.
    fn declared(
        &mut self,
        module: &ParsedModule,
        file: &SourceFile,
        spec: &TypeSpec,
        args: Vec<Type>,
    ) -> Resolved<Type> {
        if !spec.alias {
            return Ok(Type::Named(NamedRef {
                module: module.path.clone(),
                name: spec.name.clone(),
                args,
            }));
        }
        let key = (module.path.clone(), spec.name.clone());
        if self.alias_stack.contains(&key) {
            return Err(format!("invalid recursive type alias {}", spec.name));
        }
        self.alias_stack.push(key);
        let scope = Scope {
            module,
            file,
            type_params: spec.type_params.iter().map(|p| p.name.clone()).collect(),
        };
        let resolved = self.convert(&scope, &spec.ty);
        self.alias_stack.pop();
        resolved
    }

    fn resolve_name(
        &mut self,
        scope: &Scope<'_>,
        pkg: Option<&str>,
        name: &str,
        args: Vec<Type>,
    ) -> Resolved<Type> {
        let Some(pkg) = pkg else {
            return self.resolve_unqualified(scope, name, args);
        };
        let Some(path) = self.import_path(scope.file, pkg)? else {
            return Err(format!("undefined: {pkg}"));
        };
        match self.source.parsed(&path) {
            Ok(Some(dep)) => match dep.type_spec(name) {
                Some((file, spec)) if is_exported(name) => self.declared(&dep, file, spec, args),
                _ => Err(format!("undefined: {pkg}.{name}")),
            },
            Ok(None) => Ok(Type::Named(NamedRef {
                module: path,
                name: name.to_string(),
                args,
            })),
            Err(err) => Err(format!("could not import {path}: {err}")),
        }
    }

    fn resolve_unqualified(&mut self, scope: &Scope<'_>, name: &str, args: Vec<Type>) -> Resolved<Type> {
        if scope.type_params.iter().any(|p| p == name) {
            return Ok(Type::TypeParam(name.to_string()));
        }
        if let Some((file, spec)) = scope.module.type_spec(name) {
            return self.declared(scope.module, file, spec, args);
        }
        if let Some(basic) = basic_name(name) {
            return Ok(Type::Basic(basic.to_string()));
        }
        match name {
            "error" | "comparable" => return Ok(Type::Named(NamedRef::universe(name))),
            "any" => return Ok(Type::empty_interface()),
            _ => {}
        }

        let mut opaque = None;
        for import in scope.file.imports.iter().filter(|i| i.name.as_deref() == Some(".")) {
            match self.source.parsed(&import.path) {
                Ok(Some(dep)) => {
                    if let Some((file, spec)) = dep.type_spec(name) {
                        if is_exported(name) {
                            return self.declared(&dep, file, spec, args);
                        }
                    }
                }
                Ok(None) => {
                    opaque.get_or_insert_with(|| import.path.clone());
                }
                Err(err) => return Err(format!("could not import {}: {err}", import.path)),
            }
        }
        match opaque {
            Some(module) => Ok(Type::Named(NamedRef {
                module,
                name: name.to_string(),
                args,
            })),
            None => Err(format!("undefined: {name}")),
        }
    }

    /// Import path of the package named `pkg` in `file`.
    fn import_path(&self, file: &SourceFile, pkg: &str) -> Resolved<Option<String>> {
        for import in &file.imports {
            match import.name.as_deref() {
                Some(name) if name == pkg => return Ok(Some(import.path.clone())),
                Some(_) => continue,
                None => {}
            }
            let name = match self.source.parsed(&import.path) {
                Ok(Some(dep)) => dep.package.clone(),
                Ok(None) | Err(_) => default_import_name(&import.path).to_string(),
            };
            if name == pkg {
                return Ok(Some(import.path.clone()));
            }
        }
        Ok(None)
    }
}

/// Build the symbol table of a parsed module. Every diagnostic is
/// collected into one `TypeCheckError`.
pub fn check(module: &ParsedModule, source: &dyn ModuleSource) -> LocateResult<SymbolTable> {
    let mut checker = Checker {
        source,
        alias_stack: Vec::new(),
    };
    let mut errors: Vec<String> = Vec::new();
    let mut table = SymbolTable {
        package: module.package.clone(),
        ..SymbolTable::default()
    };

    let mut type_names: HashSet<String> = HashSet::new();
    for file in &module.files {
        for spec in file.type_specs() {
            if spec.name == "_" {
                continue;
            }
            let at = file.position(spec.offset);
            if !type_names.insert(spec.name.clone()) {
                errors.push(format!("{at}: {} redeclared in this block", spec.name));
                continue;
            }
            let type_params: Vec<String> = spec.type_params.iter().map(|p| p.name.clone()).collect();
            let scope = Scope {
                module,
                file,
                type_params: type_params.clone(),
            };
            let mut ok = true;
            for tp in &spec.type_params {
                if let Err(msg) = checker.convert(&scope, &tp.constraint) {
                    errors.push(format!("{at}: {msg}"));
                    ok = false;
                }
            }
            let underlying = if spec.alias {
                checker.declared(module, file, spec, Vec::new())
            } else {
                checker.convert(&scope, &spec.ty)
            };
            match underlying {
                Ok(underlying) if ok => {
                    trace!(module = %module.path, name = %spec.name, "checked type");
                    table.types.insert(
                        spec.name.clone(),
                        TypeObject {
                            name: spec.name.clone(),
                            exported: is_exported(&spec.name),
                            declared_at: at,
                            kind: if spec.alias { TypeKind::Alias } else { TypeKind::Defined },
                            type_params,
                            underlying,
                        },
                    );
                }
                Ok(_) => {}
                Err(msg) => errors.push(format!("{at}: {msg}")),
            }
        }
    }

    let mut free_names: HashSet<String> = HashSet::new();
    let mut method_names: HashSet<(String, String)> = HashSet::new();
    for file in &module.files {
        for decl in file.func_decls() {
            let at = file.position(decl.offset);
            let mut type_params: Vec<String> = Vec::new();

            let receiver = match &decl.recv {
                None => {
                    if decl.name != "init" && decl.name != "_" {
                        if type_names.contains(&decl.name) || !free_names.insert(decl.name.clone()) {
                            errors.push(format!("{at}: {} redeclared in this block", decl.name));
                            continue;
                        }
                    }
                    None
                }
                Some(recv) => {
                    let base = match receiver_base(&table, module, &recv.base) {
                        Ok(base) => base,
                        Err(msg) => {
                            errors.push(format!("{at}: {msg}"));
                            continue;
                        }
                    };
                    if decl.name != "_" && !method_names.insert((base.clone(), decl.name.clone())) {
                        errors.push(format!("{at}: method {base}.{} already declared", decl.name));
                        continue;
                    }
                    type_params.extend(recv.type_params.iter().cloned());
                    Some(Receiver {
                        name: recv.name.clone(),
                        base,
                        pointer: recv.pointer,
                        type_params: recv.type_params.clone(),
                    })
                }
            };
            type_params.extend(decl.type_params.iter().map(|p| p.name.clone()));

            let scope = Scope {
                module,
                file,
                type_params,
            };
            let mut ok = true;
            for tp in &decl.type_params {
                if let Err(msg) = checker.convert(&scope, &tp.constraint) {
                    errors.push(format!("{at}: {msg}"));
                    ok = false;
                }
            }
            match checker.signature(&scope, &decl.sig) {
                Ok((signature, params, results)) if ok => table.funcs.push(FuncObject {
                    name: decl.name.clone(),
                    exported: is_exported(&decl.name),
                    receiver,
                    params,
                    results,
                    variadic: decl.sig.variadic,
                    signature,
                    declared_at: at,
                    name_at: file.position(decl.name_offset),
                    body: decl.body,
                }),
                Ok(_) => {}
                Err(msg) => errors.push(format!("{at}: {msg}")),
            }
        }
    }

    if errors.is_empty() {
        Ok(table)
    } else {
        Err(LocateError::TypeCheckError {
            module: module.path.clone(),
            messages: errors,
        })
    }
}

/// The defined type a method is declared on. Aliases of local defined
/// types are followed; pointer and interface types cannot have methods.
fn receiver_base(table: &SymbolTable, module: &ParsedModule, name: &str) -> Result<String, String> {
    let Some(obj) = table.lookup_type(name) else {
        return Err(format!("undefined: {name}"));
    };
    let base = match (obj.kind, &obj.underlying) {
        (TypeKind::Alias, Type::Named(target)) if target.module == module.path => target.name.clone(),
        (TypeKind::Alias, _) => return Err(format!("invalid receiver type {name}")),
        (TypeKind::Defined, _) => name.to_string(),
    };
    match table.lookup_type(&base).map(|o| &o.underlying) {
        Some(Type::Pointer(_)) => Err(format!("invalid receiver type {name} (pointer type)")),
        Some(Type::Interface(_)) => Err(format!("invalid receiver type {name} (interface type)")),
        _ => Ok(base),
    }
}
