// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

use super::{lines, locator, run, spec, testdata};

#[test]
fn test_comments() {
    let mut locator = locator();
    locator.add_comments([".*"]);
    locator.add_packages([spec("data"), spec("data/embedded"), spec("comments")]);
    run(&locator);

    let positions: Vec<String> = locator
        .walk_comments()
        .map(|c| {
            let file = c.position.file.strip_prefix(testdata()).unwrap().display().to_string();
            format!("{file}:{}:{}", c.position.line, c.position.column)
        })
        .collect();
    assert_eq!(
        positions,
        vec![
            "comments/doc.go:1:1",
            "comments/doc.go:4:11",
            "comments/doc.go:6:1",
            "comments/funcs.go:3:16",
            "data/embedded/embedded.go:17:1",
            "data/functions.go:5:1",
        ]
    );

    let anchors: Vec<String> = locator
        .walk_comments()
        .map(|c| match c.anchor {
            Some(a) => format!("{:?} {}@{}:{}", a.kind, a.name, a.position.line, a.position.column),
            None => "none".to_string(),
        })
        .collect();
    assert_eq!(
        anchors,
        vec![
            "Package comments@2:1",
            "Var x@4:1",
            "Func F@9:1",
            "Func G@3:1",
            "Type IfcE@18:1",
            "Func Fn1@7:1",
        ]
    );
}

#[test]
fn test_comment_anchor_in_report() {
    let mut locator = locator();
    locator.add_comments(["^Fn1 "]);
    locator.add_packages([spec("data")]);
    run(&locator);
    let json = serde_json::to_value(locator.report()).unwrap();
    let anchor = &json["comments"][0]["anchor"];
    assert_eq!(anchor["kind"], "func");
    assert_eq!(anchor["name"], "Fn1");
    assert_eq!(anchor["position"]["line"], 7);
}

#[test]
fn test_comment_text_and_patterns() {
    let mut locator = locator();
    locator.add_comments(["^Fn1 ", "block"]);
    locator.add_packages([spec("data"), spec("comments")]);
    run(&locator);

    let found: Vec<(String, String)> = locator.walk_comments().map(|c| (c.pattern, c.text)).collect();
    assert_eq!(
        found,
        vec![
            ("block".to_string(), "A block comment.\n".to_string()),
            (
                "^Fn1 ".to_string(),
                "Fn1 prints its argument.\nIt is used by the function tests.\n".to_string()
            ),
        ]
    );
    assert_eq!(
        lines(&locator.comments_summary()),
        vec!["comments/doc.go:6:1: block", "data/functions.go:5:1: ^Fn1 "]
    );
}

#[test]
fn test_comments_only_in_loaded_modules() {
    let mut locator = locator();
    locator.add_comments(["trailing"]);
    locator.add_packages([spec("data")]);
    run(&locator);
    assert_eq!(locator.walk_comments().count(), 0);
}
