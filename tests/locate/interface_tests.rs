// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

use super::{lines, locator, locator_ignoring_missing, locator_with_goroot, run, spec};
use golocate::{CancelToken, LocateError};

#[test]
fn test_named_interfaces() {
    let mut locator = locator_ignoring_missing();
    locator.add_interfaces([spec("data.xxxx"), spec("data.Ifc2")]);
    locator.add_interfaces([spec("data.Ifc1"), spec("data.Ifc2")]);
    run(&locator);
    assert_eq!(
        lines(&locator.interfaces_summary()),
        vec![
            "example.com/testdata/data.Ifc1 interface data/interfaces.go:3:6",
            "example.com/testdata/data.Ifc2 interface data/interfaces.go:12:6",
        ]
    );
}

#[test]
fn test_whole_module() {
    let mut locator = locator_ignoring_missing();
    locator.add_interfaces([spec("data.Ifc1")]);
    locator.add_interfaces([spec("data")]);
    run(&locator);
    assert_eq!(
        lines(&locator.interfaces_summary()),
        vec![
            "example.com/testdata/data.Ifc1 interface data/interfaces.go:3:6",
            "example.com/testdata/data.Ifc2 interface data/interfaces.go:12:6",
            "example.com/testdata/data.Ifc3 interface data/interfaces.go:16:6",
        ]
    );
    assert_eq!(lines(&locator.files_summary()), vec!["data/interfaces.go: data (interface)"]);

    let ifc3 = locator.contract("example.com/testdata/data.Ifc3").unwrap();
    assert_eq!(ifc3.method_names(), vec!["M1", "M2", "M3"]);
    assert_eq!(
        ifc3.embeds,
        vec!["example.com/testdata/data.Ifc1", "example.com/testdata/data.Ifc2"]
    );
    assert!(locator.contract("example.com/testdata/data.hidden").is_none());
}

#[test]
fn test_missing_interface_fails() {
    let mut locator = locator();
    locator.add_interfaces([spec("data.xxxx"), spec("data.Ifc2")]);
    let errors = locator.run(&CancelToken::new()).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors.iter().all(LocateError::is_no_match));
    // The spec that resolved is still available.
    assert!(locator.contract("example.com/testdata/data.Ifc2").is_some());
}

#[test]
fn test_non_interface_is_no_match() {
    let mut locator = locator_ignoring_missing();
    locator.add_interfaces([spec("data/embedded.StructEmbed")]);
    run(&locator);
    assert_eq!(locator.interfaces_summary(), "");

    let mut locator = locator_ignoring_missing();
    locator.add_interfaces([spec("data.StructExampleIgnored"), spec("data.IgnoredVariable")]);
    run(&locator);
    assert_eq!(locator.walk_contracts().count(), 0);
}

#[test]
fn test_embedded_interfaces() {
    let mut locator = locator();
    locator.add_interfaces([spec("data/embedded.IfcE$")]);
    locator.add_packages([spec("data/embedded/pkg")]);
    run(&locator);
    assert_eq!(
        lines(&locator.interfaces_summary()),
        vec![
            "example.com/testdata/data/embedded.IfcE1 interface data/embedded/embedded.go:5:6",
            "example.com/testdata/data/embedded.IfcE2 interface data/embedded/embedded.go:9:6",
            "example.com/testdata/data/embedded.IfcE interface data/embedded/embedded.go:18:6",
            "example.com/testdata/data/embedded/pkg.Pkg interface data/embedded/pkg/interface.go:3:6",
        ]
    );

    let ifce = locator.contract("example.com/testdata/data/embedded.IfcE").unwrap();
    assert_eq!(ifce.method_names(), vec!["E1", "E2", "E3", "P"]);
    assert_eq!(
        ifce.embeds,
        vec![
            "example.com/testdata/data/embedded.IfcE1",
            "example.com/testdata/data/embedded.IfcE2",
            "example.com/testdata/data/embedded/pkg.Pkg",
        ]
    );
    // Unexported embeds contribute methods but are not located.
    assert!(locator.contract("example.com/testdata/data/embedded.ifcE3").is_none());

    assert_eq!(
        lines(&locator.files_summary()),
        vec![
            "data/embedded/embedded.go: embedded (interface)",
            "data/embedded/pkg/impl.go: pkg (function)",
            "data/embedded/pkg/interface.go: pkg (interface)",
        ]
    );
}

#[test]
fn test_constraint_interfaces() {
    let mut locator = locator();
    locator.add_interfaces([spec("generic")]);
    locator.add_packages([spec("generic")]);
    run(&locator);

    let number = locator.contract("example.com/testdata/generic.Number").unwrap();
    assert!(number.type_elements);
    assert!(number.method_set.is_empty());
    assert!(number.implementers.is_empty());

    // Methods of generic types keep their type parameters.
    let pusher = locator.contract("example.com/testdata/generic.Pusher").unwrap();
    assert_eq!(
        pusher.implementers.iter().collect::<Vec<_>>(),
        vec!["(*example.com/testdata/generic.IntStack).Push"]
    );
}

#[test]
fn test_standard_library_embeds() {
    let mut locator = locator_with_goroot();
    locator.add_interfaces([spec("stdembed")]);
    locator.add_packages([spec("stdembed")]);
    run(&locator);

    let names: Vec<String> = locator.walk_contracts().map(|c| c.full_name).collect();
    assert_eq!(
        names,
        vec![
            "fmt.Stringer",
            "io.Reader",
            "example.com/testdata/stdembed.ReadCloser",
            "example.com/testdata/stdembed.NamedReader",
        ]
    );
    let read_closer = locator.contract("example.com/testdata/stdembed.ReadCloser").unwrap();
    assert_eq!(read_closer.method_names(), vec!["Close", "Read"]);
    assert_eq!(read_closer.embeds, vec!["io.Reader"]);
    assert_eq!(
        read_closer.implementers.iter().map(String::as_str).collect::<Vec<_>>(),
        vec![
            "(*example.com/testdata/stdembed.File).Close",
            "(*example.com/testdata/stdembed.File).Read",
            "(*example.com/testdata/stdembed.File).String",
        ]
    );
    let read = locator.function("(*example.com/testdata/stdembed.File).Read").unwrap();
    assert_eq!(read.satisfied_contracts.len(), 4);
}

#[test]
fn test_standard_library_embeds_need_goroot() {
    let mut locator = locator();
    locator.add_interfaces([spec("stdembed.ReadCloser")]);
    let errors = locator.run(&CancelToken::new()).unwrap_err().into_vec();
    assert!(
        errors.iter().any(|e| matches!(
            e,
            LocateError::TypeCheckError { messages, .. } if messages.iter().any(|m| m.contains("io.Reader"))
        )),
        "{errors:?}"
    );
}
