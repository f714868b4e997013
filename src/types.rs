// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Resolved Go types.
//!
//! Named types are identified by module path and name, so two references
//! to the same declaration compare equal no matter how they were
//! spelled. Aliases never appear here; they are replaced by their
//! target when a type expression is resolved.

use crate::syntax::ChanDir;
use serde::Serialize;
use std::fmt;

/// Module path of predeclared names such as `error`.
pub const UNIVERSE: &str = "";

/// Canonical name of a predeclared basic type, with `byte` and `rune`
/// mapped to `uint8` and `int32`.
pub fn basic_name(name: &str) -> Option<&'static str> {
    Some(match name {
        "bool" => "bool",
        "string" => "string",
        "int" => "int",
        "int8" => "int8",
        "int16" => "int16",
        "int32" | "rune" => "int32",
        "int64" => "int64",
        "uint" => "uint",
        "uint8" | "byte" => "uint8",
        "uint16" => "uint16",
        "uint32" => "uint32",
        "uint64" => "uint64",
        "uintptr" => "uintptr",
        "float32" => "float32",
        "float64" => "float64",
        "complex64" => "complex64",
        "complex128" => "complex128",
        _ => return None,
    })
}

/// Reference to a declared (or predeclared) named type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NamedRef {
    pub module: String,
    pub name: String,
    pub args: Vec<Type>,
}

impl NamedRef {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        NamedRef {
            module: module.into(),
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn universe(name: &str) -> Self {
        NamedRef::new(UNIVERSE, name)
    }

    pub fn is_universe(&self) -> bool {
        self.module == UNIVERSE
    }

    /// `module.Name`, or just `Name` for predeclared types.
    pub fn full_name(&self) -> String {
        if self.is_universe() {
            self.name.clone()
        } else {
            format!("{}.{}", self.module, self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Type {
    Basic(String),
    Named(NamedRef),
    TypeParam(String),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array(String, Box<Type>),
    Map(Box<Type>, Box<Type>),
    Chan(#[serde(skip)] ChanDir, Box<Type>),
    Func(Signature),
    Interface(InterfaceType),
    Struct(Vec<Field>),
    /// Constraint terms; the flag marks `~T`.
    Union(Vec<(bool, Type)>),
}

impl Type {
    pub fn as_named(&self) -> Option<&NamedRef> {
        match self {
            Type::Named(n) => Some(n),
            _ => None,
        }
    }

    pub fn empty_interface() -> Type {
        Type::Interface(InterfaceType::default())
    }
}

/// A function signature. The last parameter of a variadic signature is
/// stored as a slice.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Signature {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    pub variadic: bool,
}

/// A method name and its signature; parameter names are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MethodSignature {
    pub name: String,
    pub signature: Signature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct InterfaceType {
    pub methods: Vec<MethodSignature>,
    pub embeds: Vec<Type>,
    /// Declares union or type terms, so it can only be a constraint.
    pub type_elements: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Field {
    /// `None` for an embedded field.
    pub name: Option<String>,
    pub ty: Type,
}

impl Field {
    /// The name a selector uses: the field name, or the type name of an
    /// embedded field.
    pub fn selector(&self) -> Option<&str> {
        if let Some(name) = &self.name {
            return Some(name);
        }
        let inner = match &self.ty {
            Type::Pointer(inner) => inner.as_ref(),
            other => other,
        };
        inner.as_named().map(|n| n.name.as_str())
    }
}

/// A named parameter or result as declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: Option<String>,
    pub ty: Type,
}

impl fmt::Display for NamedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())?;
        if !self.args.is_empty() {
            f.write_str("[")?;
            write_list(f, &self.args)?;
            f.write_str("]")?;
        }
        Ok(())
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

fn write_params(f: &mut fmt::Formatter<'_>, sig: &Signature) -> fmt::Result {
    f.write_str("(")?;
    for (i, ty) in sig.params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match ty {
            Type::Slice(elem) if sig.variadic && i + 1 == sig.params.len() => write!(f, "...{elem}")?,
            _ => write!(f, "{ty}")?,
        }
    }
    f.write_str(")")?;
    match sig.results.len() {
        0 => Ok(()),
        1 if !matches!(sig.results[0], Type::Func(_)) => write!(f, " {}", sig.results[0]),
        _ => {
            f.write_str(" (")?;
            write_list(f, &sig.results)?;
            f.write_str(")")
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("func")?;
        write_params(f, self)
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        write_params(f, &self.signature)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(name) | Type::TypeParam(name) => f.write_str(name),
            Type::Named(named) => write!(f, "{named}"),
            Type::Pointer(inner) => write!(f, "*{inner}"),
            Type::Slice(elem) => write!(f, "[]{elem}"),
            Type::Array(len, elem) => write!(f, "[{len}]{elem}"),
            Type::Map(k, v) => write!(f, "map[{k}]{v}"),
            Type::Chan(ChanDir::Both, elem) => write!(f, "chan {elem}"),
            Type::Chan(ChanDir::Send, elem) => write!(f, "chan<- {elem}"),
            Type::Chan(ChanDir::Recv, elem) => write!(f, "<-chan {elem}"),
            Type::Func(sig) => write!(f, "{sig}"),
            Type::Interface(iface) => {
                if iface.methods.is_empty() && iface.embeds.is_empty() {
                    return f.write_str("interface{}");
                }
                f.write_str("interface{")?;
                let mut first = true;
                for embed in &iface.embeds {
                    if !first {
                        f.write_str("; ")?;
                    }
                    first = false;
                    write!(f, "{embed}")?;
                }
                for m in &iface.methods {
                    if !first {
                        f.write_str("; ")?;
                    }
                    first = false;
                    write!(f, "{m}")?;
                }
                f.write_str("}")
            }
            Type::Struct(fields) => {
                f.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    match &field.name {
                        Some(name) => write!(f, "{name} {}", field.ty)?,
                        None => write!(f, "{}", field.ty)?,
                    }
                }
                f.write_str("}")
            }
            Type::Union(terms) => {
                for (i, (tilde, ty)) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    if *tilde {
                        f.write_str("~")?;
                    }
                    write!(f, "{ty}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_display() {
        let sig = Signature {
            params: vec![
                Type::Basic("int".into()),
                Type::Slice(Box::new(Type::Basic("string".into()))),
            ],
            results: vec![Type::Named(NamedRef::universe("error"))],
            variadic: true,
        };
        assert_eq!(sig.to_string(), "func(int, ...string) error");
        let m = MethodSignature {
            name: "M".into(),
            signature: Signature {
                params: vec![],
                results: vec![
                    Type::Pointer(Box::new(Type::Named(NamedRef::new("example.com/a", "T")))),
                    Type::Basic("bool".into()),
                ],
                variadic: false,
            },
        };
        assert_eq!(m.to_string(), "M() (*example.com/a.T, bool)");
    }

    #[test]
    fn test_byte_and_rune_are_aliases() {
        assert_eq!(basic_name("byte"), basic_name("uint8"));
        assert_eq!(basic_name("rune"), Some("int32"));
        assert_eq!(basic_name("error"), None);
    }
}
