// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

use super::{lines, locator, locator_ignoring_missing, run, spec};
use golocate::{CancelToken, FunctionDescriptor, Locator};

/// `line:col` of the braces around a function body.
fn body_at(locator: &Locator, func: &FunctionDescriptor) -> (String, String) {
    let module = locator.loader().cached(&func.module).unwrap();
    let file = module.file(&func.declared_at.file).unwrap();
    let body = func.body.unwrap();
    let at = |offset| {
        let pos = file.position(offset);
        format!("{}:{}", pos.line, pos.column)
    };
    (at(body.lbrace), at(body.rbrace))
}

#[test]
fn test_functions() {
    let mut locator = locator_ignoring_missing();
    locator.add_functions([spec("data.Fn2$")]);
    run(&locator);
    assert_eq!(
        lines(&locator.functions_summary()),
        vec!["example.com/testdata/data.Fn2 @ data/functions_more.go:3:1"]
    );

    let mut locator = super::locator();
    locator.add_functions([spec("data.Fn2$")]);
    locator.add_functions([spec("data")]);
    run(&locator);
    let expected = vec![
        "example.com/testdata/data.Fn1 @ data/functions.go:7:1",
        "example.com/testdata/data.Fn2 @ data/functions_more.go:3:1",
    ];
    assert_eq!(lines(&locator.functions_summary()), expected);
    // Walks are repeatable.
    assert_eq!(lines(&locator.functions_summary()), expected);
    assert_eq!(
        lines(&locator.files_summary()),
        vec![
            "data/functions.go: data (function)",
            "data/functions_more.go: data (function)",
        ]
    );
    // Unexported functions are never located.
    assert!(locator.function("example.com/testdata/data.fn0").is_none());
}

#[test]
fn test_functions_and_interfaces() {
    let mut locator = locator();
    locator.add_functions([spec("data.Fn2$")]);
    locator.add_interfaces([spec("data.Ifc2$")]);
    run(&locator);
    assert_eq!(
        lines(&locator.interfaces_summary()),
        vec!["example.com/testdata/data.Ifc2 interface data/interfaces.go:12:6"]
    );
    assert_eq!(
        lines(&locator.functions_summary()),
        vec!["example.com/testdata/data.Fn2 @ data/functions_more.go:3:1"]
    );
}

#[test]
fn test_function_descriptor() {
    let mut locator = locator();
    locator.add_functions([spec("data.Fn2$")]);
    run(&locator);
    let fn2 = locator.function("example.com/testdata/data.Fn2").unwrap();
    assert!(!fn2.is_method());
    assert_eq!(fn2.signature.to_string(), "func(string) error");
    assert_eq!(fn2.params.len(), 1);
    assert_eq!(fn2.params[0].name.as_deref(), Some("s"));
    assert_eq!((fn2.name_at.line, fn2.name_at.column), (3, 6));
    assert!(!fn2.body.unwrap().empty);
}

#[test]
fn test_function_bodies() {
    let mut locator = locator();
    locator.add_functions([spec("data")]);
    locator.add_interfaces([spec("data")]);
    locator.add_packages([spec("data"), spec("impl")]);
    run(&locator);

    let (start, stop): (Vec<String>, Vec<String>) = locator
        .walk_functions()
        .map(|f| body_at(&locator, &f))
        .unzip();
    assert_eq!(start, vec!["7:17", "3:26", "5:22", "9:28", "15:31", "22:23", "26:29", "30:32"]);
    assert_eq!(stop, vec!["9:1", "5:1", "7:1", "11:1", "18:1", "24:1", "28:1", "33:1"]);

    let empty: Vec<bool> = locator.walk_functions().map(|f| f.body.unwrap().empty).collect();
    assert_eq!(empty, vec![false, false, true, true, false, true, true, false]);
}

#[test]
fn test_missing_function_fails() {
    let mut locator = locator();
    locator.add_functions([spec("data.Nope")]);
    let errors = locator.run(&CancelToken::new()).unwrap_err();
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("functions"));
    assert!(messages[0].contains("Nope"));
}
