// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Lowering of tree-sitter Go syntax trees to the declaration AST.
//!
//! Only the parts of a file needed to resolve types and signatures are
//! kept: the package clause, imports, type declarations and function
//! signatures. Function bodies become brace spans, `var` and `const`
//! declarations only spans.

use super::ast::*;
use super::SyntaxError;
use crate::constraint::Constraint;
use tree_sitter::{Node, Parser, Tree};

type PResult<T> = Result<T, SyntaxError>;

/// Everything extracted from one file, before positions are attached.
pub struct ParsedDecls {
    pub package: String,
    pub package_offset: usize,
    pub imports: Vec<ImportSpec>,
    pub import_decls: Vec<(usize, usize)>,
    pub decls: Vec<Decl>,
    pub decl_spans: Vec<DeclSpan>,
    pub comment_groups: Vec<CommentGroup>,
    pub constraint: Option<Constraint>,
}

pub fn parse_tree(src: &str) -> PResult<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|err| SyntaxError::new(0, format!("loading the Go grammar: {err}")))?;
    parser
        .parse(src, None)
        .ok_or_else(|| SyntaxError::new(0, "parse aborted"))
}

/// Parse `src` and lower its tree.
pub fn parse(src: &str) -> PResult<ParsedDecls> {
    let tree = parse_tree(src)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(first_error(src, root));
    }
    Lowering { src }.source_file(root)
}

/// Named children other than comments.
fn named<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect();
    children
}

fn has_token(node: Node<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| !c.is_named() && c.kind() == kind);
    found
}

fn field<'t>(node: Node<'t>, name: &str) -> PResult<Node<'t>> {
    node.child_by_field_name(name)
        .ok_or_else(|| SyntaxError::new(node.start_byte(), format!("{} without {name}", node.kind())))
}

fn first_named(node: Node<'_>) -> PResult<Node<'_>> {
    named(node)
        .into_iter()
        .next()
        .ok_or_else(|| SyntaxError::new(node.start_byte(), format!("empty {}", node.kind())))
}

/// Leaf nodes in source order, without statement terminators.
fn leaves(root: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut cursor = root.walk();
    'walk: loop {
        if cursor.goto_first_child() {
            continue;
        }
        let node = cursor.node();
        if !matches!(node.kind(), "\n" | ";" | "\0") && node.end_byte() > node.start_byte() {
            out.push(node);
        }
        loop {
            if cursor.goto_next_sibling() {
                continue 'walk;
            }
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }
    out
}

/// The first error or missing node, in source order.
fn first_error(src: &str, root: Node<'_>) -> SyntaxError {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_missing() {
            return SyntaxError::new(node.start_byte(), format!("expected {}", describe_kind(node.kind())));
        }
        if node.is_error() {
            let found = leaves(node)
                .first()
                .and_then(|leaf| src.get(leaf.byte_range()))
                .map(|text| format!("'{text}'"))
                .unwrap_or_else(|| "EOF".to_string());
            return SyntaxError::new(node.start_byte(), format!("syntax error: unexpected {found}"));
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return SyntaxError::new(root.start_byte(), "syntax error");
            }
        }
    }
}

fn describe_kind(kind: &str) -> String {
    match kind {
        "identifier" | "type_identifier" | "field_identifier" | "package_identifier" => "identifier".to_string(),
        "\n" | ";" => "';'".to_string(),
        kind => format!("'{kind}'"),
    }
}

/// Strip the delimiters of an interpreted or raw string literal.
fn unquote(lit: &str) -> String {
    if lit.len() >= 2 {
        lit[1..lit.len() - 1].to_string()
    } else {
        lit.to_string()
    }
}

/// The expression of a `//go:build` line.
fn go_build_expr(comment: &str) -> Option<&str> {
    let rest = comment.strip_prefix("//go:build")?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
}

struct Lowering<'a> {
    src: &'a str,
}

impl<'a> Lowering<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        self.src.get(node.byte_range()).unwrap_or("")
    }

    fn source_file(&self, root: Node<'_>) -> PResult<ParsedDecls> {
        let mut package: Option<(String, usize)> = None;
        let mut imports = Vec::new();
        let mut import_decls = Vec::new();
        let mut decls = Vec::new();
        let mut spans = Vec::new();
        let mut seen_decl = false;

        for node in named(root) {
            match node.kind() {
                "package_clause" if package.is_none() => {
                    let name = self.text(first_named(node)?).to_string();
                    spans.push(DeclSpan {
                        kind: DeclKind::Package,
                        name: name.clone(),
                        offset: node.start_byte(),
                        end: node.end_byte(),
                    });
                    package = Some((name, node.start_byte()));
                }
                _ if package.is_none() => {
                    return Err(SyntaxError::new(
                        node.start_byte(),
                        format!("expected 'package', found {}", describe_kind(node.kind())),
                    ));
                }
                "import_declaration" if seen_decl => {
                    return Err(SyntaxError::new(
                        node.start_byte(),
                        "imports must appear before other declarations",
                    ));
                }
                "import_declaration" => {
                    self.import_decl(node, &mut imports, &mut spans)?;
                    import_decls.push((node.start_byte(), node.end_byte()));
                }
                "type_declaration" => {
                    seen_decl = true;
                    self.type_decl(node, &mut decls, &mut spans)?;
                }
                "function_declaration" | "method_declaration" => {
                    seen_decl = true;
                    let func = self.func_decl(node)?;
                    let name = match &func.recv {
                        Some(recv) => format!("{}.{}", recv.base, func.name),
                        None => func.name.clone(),
                    };
                    spans.push(DeclSpan {
                        kind: DeclKind::Func,
                        name,
                        offset: node.start_byte(),
                        end: node.end_byte(),
                    });
                    decls.push(Decl::Func(func));
                }
                "var_declaration" | "const_declaration" => {
                    seen_decl = true;
                    self.value_decl(node, &mut spans);
                }
                kind => {
                    return Err(SyntaxError::new(
                        node.start_byte(),
                        format!("non-declaration statement outside function body: {kind}"),
                    ));
                }
            }
        }

        let Some((package, package_offset)) = package else {
            return Err(SyntaxError::new(self.src.len(), "expected 'package', found EOF"));
        };
        let constraint = self.build_constraint(root, package_offset)?;
        Ok(ParsedDecls {
            package,
            package_offset,
            imports,
            import_decls,
            decls,
            decl_spans: spans,
            comment_groups: self.comment_groups(root),
            constraint,
        })
    }

    /// `//go:build` wins over `// +build`; only comments above the
    /// package clause count.
    fn build_constraint(&self, root: Node<'_>, package_offset: usize) -> PResult<Option<Constraint>> {
        let mut go_build = None;
        let mut plus_build = Vec::new();
        let mut cursor = root.walk();
        let comments: Vec<Node> = root
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "comment" && c.end_byte() <= package_offset)
            .collect();
        for comment in comments {
            let text = self.text(comment);
            if let Some(expr) = go_build_expr(text) {
                if go_build.is_none() {
                    let parsed = Constraint::parse(expr).map_err(|err| {
                        SyntaxError::new(comment.start_byte(), format!("parsing //go:build line: {err}"))
                    })?;
                    go_build = Some(parsed);
                }
            } else if let Some(line) = text.strip_prefix("// +build") {
                plus_build.extend(Constraint::parse_plus_build(line));
            }
        }
        Ok(go_build.or_else(|| Constraint::all(plus_build)))
    }

    fn import_decl(&self, node: Node<'_>, imports: &mut Vec<ImportSpec>, spans: &mut Vec<DeclSpan>) -> PResult<()> {
        let (specs, grouped) = match named(node).into_iter().next() {
            Some(list) if list.kind() == "import_spec_list" => (named(list), true),
            Some(spec) => (vec![spec], false),
            None => return Err(SyntaxError::new(node.start_byte(), "empty import declaration")),
        };
        for spec in specs.into_iter().filter(|s| s.kind() == "import_spec") {
            let import = ImportSpec {
                name: spec.child_by_field_name("name").map(|n| self.text(n).to_string()),
                path: unquote(self.text(field(spec, "path")?)),
                offset: spec.start_byte(),
            };
            spans.push(DeclSpan {
                kind: DeclKind::Import,
                name: import.path.clone(),
                offset: if grouped { spec.start_byte() } else { node.start_byte() },
                end: spec.end_byte(),
            });
            imports.push(import);
        }
        Ok(())
    }

    fn type_decl(&self, node: Node<'_>, decls: &mut Vec<Decl>, spans: &mut Vec<DeclSpan>) -> PResult<()> {
        let grouped = has_token(node, "(");
        for spec in named(node) {
            if !matches!(spec.kind(), "type_spec" | "type_alias") {
                continue;
            }
            let type_spec = self.type_spec(spec)?;
            spans.push(DeclSpan {
                kind: DeclKind::Type,
                name: type_spec.name.clone(),
                offset: if grouped { spec.start_byte() } else { node.start_byte() },
                end: spec.end_byte(),
            });
            decls.push(Decl::Type(type_spec));
        }
        Ok(())
    }

    fn type_spec(&self, spec: Node<'_>) -> PResult<TypeSpec> {
        let name = field(spec, "name")?;
        let type_params = match spec.child_by_field_name("type_parameters") {
            Some(list) => self.type_params(list)?,
            None => Vec::new(),
        };
        Ok(TypeSpec {
            name: self.text(name).to_string(),
            offset: name.start_byte(),
            type_params,
            alias: spec.kind() == "type_alias",
            ty: self.type_expr(field(spec, "type")?)?,
        })
    }

    fn value_decl(&self, node: Node<'_>, spans: &mut Vec<DeclSpan>) {
        let kind = if node.kind() == "const_declaration" {
            DeclKind::Const
        } else {
            DeclKind::Var
        };
        let mut specs = Vec::new();
        let mut grouped = has_token(node, "(");
        for child in named(node) {
            if child.kind().ends_with("_spec_list") {
                grouped = true;
                specs.extend(named(child));
            } else {
                specs.push(child);
            }
        }
        for spec in specs.into_iter().filter(|s| s.kind().ends_with("_spec")) {
            let name = spec
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string())
                .unwrap_or_default();
            spans.push(DeclSpan {
                kind,
                name,
                offset: if grouped { spec.start_byte() } else { node.start_byte() },
                end: spec.end_byte(),
            });
        }
    }

    fn type_params(&self, list: Node<'_>) -> PResult<Vec<TypeParamExpr>> {
        let mut params = Vec::new();
        for decl in named(list) {
            let constraint = self.constraint(field(decl, "type")?)?;
            let mut cursor = decl.walk();
            let names: Vec<String> = decl
                .children_by_field_name("name", &mut cursor)
                .map(|n| self.text(n).to_string())
                .collect();
            for name in names {
                params.push(TypeParamExpr {
                    name,
                    constraint: constraint.clone(),
                });
            }
        }
        Ok(params)
    }

    /// The `|` separated terms of a type element or constraint.
    fn terms(&self, node: Node<'_>) -> PResult<Vec<UnionTerm>> {
        match node.kind() {
            "type_elem" | "type_constraint" => {
                let mut terms = Vec::new();
                for child in named(node) {
                    terms.extend(self.terms(child)?);
                }
                Ok(terms)
            }
            "negated_type" => Ok(vec![UnionTerm {
                tilde: true,
                ty: self.type_expr(first_named(node)?)?,
            }]),
            _ => Ok(vec![UnionTerm {
                tilde: false,
                ty: self.type_expr(node)?,
            }]),
        }
    }

    fn constraint(&self, node: Node<'_>) -> PResult<TypeExpr> {
        let mut terms = self.terms(node)?;
        if terms.len() == 1 && !terms[0].tilde {
            return Ok(terms.remove(0).ty);
        }
        Ok(TypeExpr::Union(terms))
    }

    fn type_expr(&self, node: Node<'_>) -> PResult<TypeExpr> {
        let ty = match node.kind() {
            "type_identifier" | "identifier" => TypeExpr::Name {
                pkg: None,
                name: self.text(node).to_string(),
                args: Vec::new(),
                offset: node.start_byte(),
            },
            "qualified_type" => TypeExpr::Name {
                pkg: Some(self.text(field(node, "package")?).to_string()),
                name: self.text(field(node, "name")?).to_string(),
                args: Vec::new(),
                offset: node.start_byte(),
            },
            "generic_type" => {
                let arguments = field(node, "type_arguments")?;
                let mut args = Vec::new();
                for arg in named(arguments) {
                    args.push(self.constraint(arg)?);
                }
                match self.type_expr(field(node, "type")?)? {
                    TypeExpr::Name { pkg, name, offset, .. } => TypeExpr::Name { pkg, name, args, offset },
                    _ => return Err(SyntaxError::new(node.start_byte(), "instantiation of a non-generic type")),
                }
            }
            "pointer_type" => TypeExpr::Pointer(Box::new(self.type_expr(first_named(node)?)?)),
            "slice_type" => TypeExpr::Slice(Box::new(self.type_expr(field(node, "element")?)?)),
            "array_type" => TypeExpr::Array {
                len: self.text(field(node, "length")?).split_whitespace().collect(),
                elem: Box::new(self.type_expr(field(node, "element")?)?),
            },
            "implicit_length_array_type" => TypeExpr::Array {
                len: "...".to_string(),
                elem: Box::new(self.type_expr(field(node, "element")?)?),
            },
            "map_type" => TypeExpr::Map {
                key: Box::new(self.type_expr(field(node, "key")?)?),
                value: Box::new(self.type_expr(field(node, "value")?)?),
            },
            "channel_type" => TypeExpr::Chan {
                dir: chan_dir(node),
                elem: Box::new(self.type_expr(field(node, "value")?)?),
            },
            "function_type" => TypeExpr::Func(self.signature(node)?),
            "interface_type" => {
                let mut elems = Vec::new();
                self.interface_elems(node, &mut elems)?;
                TypeExpr::Interface(elems)
            }
            "struct_type" => TypeExpr::Struct(self.struct_fields(first_named(node)?)?),
            "parenthesized_type" => self.type_expr(first_named(node)?)?,
            "negated_type" | "type_elem" | "type_constraint" => TypeExpr::Union(self.terms(node)?),
            kind => {
                return Err(SyntaxError::new(
                    node.start_byte(),
                    format!("expected type, found {}", describe_kind(kind)),
                ))
            }
        };
        Ok(ty)
    }

    fn interface_elems(&self, node: Node<'_>, elems: &mut Vec<InterfaceElem>) -> PResult<()> {
        for child in named(node) {
            match child.kind() {
                "method_elem" | "method_spec" => {
                    let name = field(child, "name")?;
                    elems.push(InterfaceElem::Method {
                        name: self.text(name).to_string(),
                        offset: name.start_byte(),
                        func: self.signature(child)?,
                    });
                }
                "method_spec_list" => self.interface_elems(child, elems)?,
                _ => {
                    let mut terms = self.terms(child)?;
                    if terms.len() == 1 && !terms[0].tilde {
                        elems.push(InterfaceElem::Embed(terms.remove(0).ty));
                    } else {
                        elems.push(InterfaceElem::Union(terms));
                    }
                }
            }
        }
        Ok(())
    }

    fn struct_fields(&self, list: Node<'_>) -> PResult<Vec<FieldExpr>> {
        let mut fields = Vec::new();
        for decl in named(list) {
            let tag = decl.child_by_field_name("tag").map(|t| unquote(self.text(t)));
            let mut ty = self.type_expr(field(decl, "type")?)?;
            let mut cursor = decl.walk();
            let names: Vec<String> = decl
                .children_by_field_name("name", &mut cursor)
                .map(|n| self.text(n).to_string())
                .collect();
            if names.is_empty() {
                if has_token(decl, "*") {
                    ty = TypeExpr::Pointer(Box::new(ty));
                }
                fields.push(FieldExpr { name: None, ty, tag });
                continue;
            }
            for name in names {
                fields.push(FieldExpr {
                    name: Some(name),
                    ty: ty.clone(),
                    tag: tag.clone(),
                });
            }
        }
        Ok(fields)
    }

    /// Parameters and result of a function, method or function type.
    fn signature(&self, node: Node<'_>) -> PResult<FuncTypeExpr> {
        let (params, variadic) = self.params(field(node, "parameters")?)?;
        let results = match node.child_by_field_name("result") {
            Some(list) if list.kind() == "parameter_list" => {
                let (results, variadic) = self.params(list)?;
                if variadic {
                    return Err(SyntaxError::new(list.start_byte(), "can only use ... with final parameter in list"));
                }
                results
            }
            Some(result) => vec![ParamExpr {
                name: None,
                ty: self.type_expr(result)?,
            }],
            None => Vec::new(),
        };
        Ok(FuncTypeExpr {
            params,
            results,
            variadic,
        })
    }

    /// A parameter list and whether it is variadic. Every entry must be
    /// named or every entry unnamed.
    fn params(&self, list: Node<'_>) -> PResult<(Vec<ParamExpr>, bool)> {
        let decls = named(list);
        let mut params = Vec::new();
        let mut variadic = false;
        let mut named_form: Option<bool> = None;
        for (i, decl) in decls.iter().enumerate() {
            let mut cursor = decl.walk();
            let names: Vec<String> = decl
                .children_by_field_name("name", &mut cursor)
                .map(|n| self.text(n).to_string())
                .collect();
            let is_named = !names.is_empty();
            if *named_form.get_or_insert(is_named) != is_named {
                return Err(SyntaxError::new(list.start_byte(), "mixed named and unnamed parameters"));
            }
            if decl.kind() == "variadic_parameter_declaration" {
                if i + 1 != decls.len() {
                    return Err(SyntaxError::new(list.start_byte(), "can only use ... with final parameter in list"));
                }
                variadic = true;
            }
            let ty = self.type_expr(field(*decl, "type")?)?;
            if names.is_empty() {
                params.push(ParamExpr { name: None, ty });
                continue;
            }
            for name in names {
                params.push(ParamExpr {
                    name: Some(name),
                    ty: ty.clone(),
                });
            }
        }
        Ok((params, variadic))
    }

    fn receiver(&self, list: Node<'_>) -> PResult<ReceiverExpr> {
        let (mut params, _) = self.params(list)?;
        if params.len() != 1 {
            let msg = if params.is_empty() {
                "method has no receiver"
            } else {
                "method has multiple receivers"
            };
            return Err(SyntaxError::new(list.start_byte(), msg));
        }
        let param = params.remove(0);
        let (pointer, base) = match param.ty {
            TypeExpr::Pointer(inner) => (true, *inner),
            other => (false, other),
        };
        let TypeExpr::Name {
            pkg: None,
            name,
            args,
            offset,
        } = base
        else {
            return Err(SyntaxError::new(list.start_byte(), "invalid receiver type"));
        };
        let mut type_params = Vec::new();
        for arg in &args {
            match arg.as_plain_name() {
                Some(n) => type_params.push(n.to_string()),
                None => return Err(SyntaxError::new(offset, "receiver type parameter must be an identifier")),
            }
        }
        Ok(ReceiverExpr {
            name: param.name.filter(|n| n != "_"),
            pointer,
            base: name,
            base_offset: offset,
            type_params,
        })
    }

    fn func_decl(&self, node: Node<'_>) -> PResult<FuncDecl> {
        let name = field(node, "name")?;
        let recv = match node.kind() {
            "method_declaration" => Some(self.receiver(field(node, "receiver")?)?),
            _ => None,
        };
        let type_params = match node.child_by_field_name("type_parameters") {
            Some(list) => self.type_params(list)?,
            None => Vec::new(),
        };
        let body = node.child_by_field_name("body").map(|block| BodySpan {
            lbrace: block.start_byte(),
            rbrace: block.end_byte().saturating_sub(1),
            empty: is_empty_block(block),
        });
        Ok(FuncDecl {
            offset: node.start_byte(),
            recv,
            name: self.text(name).to_string(),
            name_offset: name.start_byte(),
            type_params,
            sig: self.signature(node)?,
            body,
        })
    }

    /// Group comments the way a reader sees them: adjacent lines with no
    /// tokens in between. A comment following a token on the same line
    /// always starts its own group.
    fn comment_groups(&self, root: Node<'_>) -> Vec<CommentGroup> {
        // (group, trailing, last row)
        let mut groups: Vec<(CommentGroup, bool, usize)> = Vec::new();
        let mut token_row: Option<usize> = None;
        let mut token_since_comment = true;
        for leaf in leaves(root) {
            if leaf.kind() != "comment" {
                token_row = Some(leaf.end_position().row);
                token_since_comment = true;
                continue;
            }
            let start_row = leaf.start_position().row;
            let end_row = leaf.end_position().row;
            let trailing = token_row == Some(start_row);
            let text = self.text(leaf).to_string();
            let joins = !token_since_comment
                && !trailing
                && groups
                    .last()
                    .is_some_and(|(_, last_trailing, last_row)| !last_trailing && start_row <= last_row + 1);
            token_since_comment = false;
            if joins {
                if let Some((group, _, last_row)) = groups.last_mut() {
                    group.end = leaf.end_byte();
                    group.comments.push(text);
                    *last_row = end_row;
                    continue;
                }
            }
            groups.push((
                CommentGroup {
                    start: leaf.start_byte(),
                    end: leaf.end_byte(),
                    comments: vec![text],
                },
                trailing,
                end_row,
            ));
        }
        groups.into_iter().map(|(g, _, _)| g).collect()
    }
}

fn chan_dir(node: Node<'_>) -> ChanDir {
    let mut cursor = node.walk();
    let tokens: Vec<&str> = node.children(&mut cursor).take(2).map(|c| c.kind()).collect();
    match tokens.as_slice() {
        ["<-", ..] => ChanDir::Recv,
        [_, "<-"] => ChanDir::Send,
        _ => ChanDir::Both,
    }
}

/// Nothing but comments or empty statements between the braces.
fn is_empty_block(block: Node<'_>) -> bool {
    let mut cursor = block.walk();
    let empty = block
        .named_children(&mut cursor)
        .all(|child| match child.kind() {
            "comment" | "empty_statement" => true,
            "statement_list" => is_empty_block(child),
            _ => false,
        });
    empty
}
