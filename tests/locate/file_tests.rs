// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

use super::{lines, locator, run, spec, testdata};
use golocate::HitMask;

#[test]
fn test_files_and_imports() {
    let mut locator = locator();
    locator.add_interfaces([spec("data")]);
    locator.add_functions([spec("imports"), spec("data")]);
    run(&locator);

    let mut names = Vec::new();
    let mut blocks = Vec::new();
    let mut masks = Vec::new();
    for hit in locator.walk_files() {
        names.push(hit.path.strip_prefix(testdata()).unwrap().display().to_string());
        blocks.push(match hit.file.import_block() {
            Some((start, end)) => {
                let (start, end) = (hit.file.position(start), hit.file.position(end));
                format!("{}:{}-{}:{}", start.line, start.column, end.line, end.column)
            }
            None => "-".to_string(),
        });
        masks.push(hit.hits);
    }
    assert_eq!(
        names,
        vec![
            "data/functions.go",
            "data/functions_more.go",
            "data/interfaces.go",
            "imports/blocks.go",
            "imports/import.go",
            "imports/imports.go",
        ]
    );
    assert_eq!(blocks, vec!["3:1-3:13", "-", "-", "3:1-8:2", "3:1-3:13", "3:1-6:2"]);
    assert_eq!(
        masks,
        vec![
            HitMask::FUNCTION,
            HitMask::FUNCTION,
            HitMask::INTERFACE,
            HitMask::FUNCTION,
            HitMask::FUNCTION,
            HitMask::FUNCTION,
        ]
    );
}

#[test]
fn test_file_with_several_hits() {
    let mut locator = locator();
    locator.add_functions([spec("data.Fn1")]);
    locator.add_comments(["prints"]);
    run(&locator);
    assert_eq!(
        lines(&locator.files_summary()),
        vec!["data/functions.go: data (function, comment)"]
    );
    let hit = locator.walk_files().next().unwrap();
    assert!(hit.hits.contains(HitMask::FUNCTION | HitMask::COMMENT));
    assert_eq!(hit.module, "example.com/testdata/data");
    assert_eq!(hit.package(), "data");
}

#[test]
fn test_report_serializes() {
    let mut locator = locator();
    locator.add_interfaces([spec("data")]);
    locator.add_packages([spec("impl")]);
    run(&locator);
    let report = serde_json::to_value(locator.report()).unwrap();
    assert_eq!(report["contracts"].as_array().unwrap().len(), 3);
    assert_eq!(report["functions"].as_array().unwrap().len(), 6);
    assert_eq!(report["contracts"][0]["name"], "Ifc1");
    assert_eq!(report["contracts"][0]["declared_at"]["line"], 3);
    let files: Vec<&str> = report["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["hits"].as_str().unwrap())
        .collect();
    assert_eq!(files, vec!["interface", "function"]);
}
