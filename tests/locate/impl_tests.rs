// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

use super::{lines, locator, run, spec};

fn implements(ifcs: &[&str]) -> String {
    ifcs.iter()
        .map(|ifc| format!("example.com/testdata/data.{ifc}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[test]
fn test_find_implementations() {
    let mut locator = locator();
    locator.add_interfaces([spec("data")]);
    locator.add_packages([spec("data"), spec("impl")]);
    run(&locator);

    let all = implements(&["Ifc1", "Ifc2", "Ifc3"]);
    assert_eq!(
        lines(&locator.functions_summary()),
        vec![
            format!("(*example.com/testdata/impl.Impl1).M1 implements {} @ impl/impls.go:5:1", implements(&["Ifc1"])),
            format!("(*example.com/testdata/impl.Impl1).M2 implements {} @ impl/impls.go:9:1", implements(&["Ifc1"])),
            format!("(*example.com/testdata/impl.impl2).M3 implements {} @ impl/impls.go:15:1", implements(&["Ifc2"])),
            format!("(*example.com/testdata/impl.Impl12).M1 implements {all} @ impl/impls.go:22:1"),
            format!("(*example.com/testdata/impl.Impl12).M2 implements {all} @ impl/impls.go:26:1"),
            format!("(*example.com/testdata/impl.Impl12).M3 implements {all} @ impl/impls.go:30:1"),
        ]
    );
    // Other only has M1.
    assert!(locator.function("(*example.com/testdata/impl.Other).M1").is_none());
}

#[test]
fn test_implementers_recorded_on_contracts() {
    let mut locator = locator();
    locator.add_interfaces([spec("data")]);
    locator.add_packages([spec("impl")]);
    run(&locator);

    let ifc2 = locator.contract("example.com/testdata/data.Ifc2").unwrap();
    assert_eq!(
        ifc2.implementers.iter().map(String::as_str).collect::<Vec<_>>(),
        vec![
            "(*example.com/testdata/impl.Impl12).M1",
            "(*example.com/testdata/impl.Impl12).M2",
            "(*example.com/testdata/impl.Impl12).M3",
            "(*example.com/testdata/impl.impl2).M3",
        ]
    );
    let ifc3 = locator.contract("example.com/testdata/data.Ifc3").unwrap();
    assert_eq!(ifc3.implementers.len(), 3);

    let m1 = locator.function("(*example.com/testdata/impl.Impl12).M1").unwrap();
    let receiver = m1.receiver.as_ref().unwrap();
    assert_eq!(receiver.base, "Impl12");
    assert!(receiver.pointer);
    assert_eq!(m1.satisfied_contracts.len(), 3);
}

#[test]
fn test_value_receivers_and_recursive_packages() {
    let mut locator = locator();
    locator.add_interfaces([spec("data/embedded/pkg")]);
    locator.add_packages([spec("data/...")]);
    run(&locator);
    assert_eq!(
        lines(&locator.functions_summary()),
        vec![
            "(example.com/testdata/data/embedded/pkg.Impl).P implements example.com/testdata/data/embedded/pkg.Pkg @ data/embedded/pkg/impl.go:5:1"
        ]
    );
}

#[test]
fn test_located_function_also_implements() {
    let mut locator = locator();
    locator.add_interfaces([spec("data.Ifc2$")]);
    locator.add_packages([spec("impl")]);
    locator.add_functions([spec("data.Fn1")]);
    run(&locator);
    let names: Vec<String> = locator.walk_functions().map(|f| f.full_name).collect();
    assert_eq!(
        names,
        vec![
            "example.com/testdata/data.Fn1",
            "(*example.com/testdata/impl.impl2).M3",
            "(*example.com/testdata/impl.Impl12).M1",
            "(*example.com/testdata/impl.Impl12).M2",
            "(*example.com/testdata/impl.Impl12).M3",
        ]
    );
    let fn1 = locator.function("example.com/testdata/data.Fn1").unwrap();
    assert!(fn1.satisfied_contracts.is_empty());
}
