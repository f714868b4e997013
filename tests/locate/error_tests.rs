// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

use super::{locator, locator_ignoring_missing, spec};
use golocate::{CancelToken, LocateError};

fn only_error(locator: &golocate::Locator) -> LocateError {
    let errors = locator.run(&CancelToken::new()).unwrap_err().into_vec();
    assert_eq!(errors.len(), 1, "{errors:?}");
    errors.into_iter().next().unwrap()
}

#[test]
fn test_invalid_spec_loads_nothing() {
    let mut locator = locator();
    locator.add_interfaces([spec("data.Ifc1")]);
    locator.add_functions([spec("data.Fn(")]);
    match only_error(&locator) {
        LocateError::InvalidSpec { pattern, .. } => assert_eq!(pattern, "Fn("),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(locator.loader().load_count(), 0);
    assert_eq!(locator.walk_contracts().count(), 0);
}

#[test]
fn test_invalid_comment_pattern() {
    let mut locator = locator();
    locator.add_comments(["[unclosed"]);
    locator.add_packages([spec("data")]);
    assert!(matches!(only_error(&locator), LocateError::InvalidSpec { .. }));
    assert_eq!(locator.loader().load_count(), 0);
}

#[test]
fn test_ambiguous_module() {
    let mut locator = locator_ignoring_missing();
    locator.add_interfaces([spec("ambiguous")]);
    match only_error(&locator) {
        LocateError::AmbiguousModule { names, .. } => assert_eq!(names, vec!["a", "b"]),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_parse_error() {
    let mut locator = locator();
    locator.add_packages([spec("broken")]);
    match only_error(&locator) {
        LocateError::ParseError { file, line, message, .. } => {
            assert!(file.ends_with("broken/broken.go"));
            assert!(line >= 3);
            assert!(!message.is_empty());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_module_not_found() {
    let mut locator = locator();
    locator.add_interfaces([spec("nothere.Ifc")]);
    match only_error(&locator) {
        LocateError::ModuleNotFound { path } => assert_eq!(path, "example.com/testdata/nothere"),
        other => panic!("unexpected {other:?}"),
    }

    let mut recursive = super::locator();
    recursive.add_packages(["example.com/elsewhere/..."]);
    assert!(matches!(only_error(&recursive), LocateError::ModuleNotFound { .. }));
}

#[test]
fn test_failures_keep_other_results() {
    let mut locator = locator();
    locator.add_interfaces([spec("data"), spec("ambiguous")]);
    locator.add_packages([spec("impl")]);
    assert!(matches!(only_error(&locator), LocateError::AmbiguousModule { .. }));
    assert_eq!(locator.walk_contracts().count(), 3);
    assert_eq!(locator.walk_functions().count(), 6);
}
