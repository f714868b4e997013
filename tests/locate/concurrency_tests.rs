// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

use super::{locator, run, spec, testdata};
use golocate::{CancelToken, LocateError, Loader, Locator, Options, SourceRoots};
use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn test_concurrent_loads_are_single_flight() {
    let loader = Loader::new(SourceRoots::from_dirs([testdata()]));
    let paths = [spec("data"), spec("impl"), spec("data/embedded")];
    let modules: Vec<Vec<_>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| paths.iter().map(|p| loader.load(p).unwrap()).collect::<Vec<_>>()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(loader.load_count(), paths.len());
    for loaded in &modules[1..] {
        for (a, b) in loaded.iter().zip(&modules[0]) {
            assert!(Arc::ptr_eq(a, b));
        }
    }
    let data = loader.load(&spec("data")).unwrap();
    assert_eq!(data.package, "data");
    assert_eq!(data.symbols.types.len(), 5);
    assert_eq!(loader.load_count(), paths.len());
}

#[test]
fn test_cached_errors_replay() {
    let loader = Loader::new(SourceRoots::from_dirs([testdata()]));
    let first = loader.load(&spec("ambiguous")).unwrap_err();
    let second = loader.load(&spec("ambiguous")).unwrap_err();
    assert_eq!(first, second);
    assert_eq!(loader.load_count(), 1);
}

#[test]
fn test_repeated_runs_are_idempotent() {
    let mut locator = locator();
    locator.add_interfaces([spec("data")]);
    locator.add_functions([spec("data")]);
    locator.add_packages([spec("impl")]);
    run(&locator);
    let loads = locator.loader().load_count();
    let interfaces = locator.interfaces_summary();
    let functions = locator.functions_summary();

    run(&locator);
    assert_eq!(locator.loader().load_count(), loads);
    assert_eq!(locator.interfaces_summary(), interfaces);
    assert_eq!(locator.functions_summary(), functions);
    let m3 = locator.function("(*example.com/testdata/impl.Impl12).M3").unwrap();
    assert_eq!(m3.satisfied_contracts.len(), 3);
}

#[test]
fn test_single_thread_matches_pool() {
    let build = |concurrency| {
        let options = Options {
            concurrency,
            ignore_missing: false,
        };
        let mut locator = Locator::new(SourceRoots::from_dirs([testdata()]), options);
        locator.add_interfaces([spec("data"), spec("data/embedded.IfcE")]);
        locator.add_packages([spec("...")]);
        locator.add_comments(["."]);
        locator
    };
    let single = build(1);
    let pooled = build(0);
    // The recursive pattern reaches the ambiguous and broken fixtures.
    assert!(single.run(&CancelToken::new()).is_err());
    assert!(pooled.run(&CancelToken::new()).is_err());
    assert_eq!(single.interfaces_summary(), pooled.interfaces_summary());
    assert_eq!(single.functions_summary(), pooled.functions_summary());
    assert_eq!(single.comments_summary(), pooled.comments_summary());
    assert!(!single.functions_summary().is_empty());
}

#[test]
fn test_cancelled_run_discards_results() {
    let mut locator = locator();
    locator.add_interfaces([spec("data")]);
    locator.add_packages([spec("impl")]);
    run(&locator);
    assert_eq!(locator.walk_contracts().count(), 3);

    let cancel = CancelToken::new();
    let other = cancel.clone();
    other.cancel();
    assert!(cancel.is_cancelled());
    let errors = locator.run(&cancel).unwrap_err().into_vec();
    assert_eq!(errors, vec![LocateError::Cancelled]);
    assert_eq!(locator.walk_contracts().count(), 0);
    assert_eq!(locator.walk_functions().count(), 0);
    assert_eq!(locator.walk_files().count(), 0);
}

#[test]
fn test_cancel_during_run() {
    const MODULES: usize = 300;
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("go.mod"), "module example.com/many\n").unwrap();
    for m in 0..MODULES {
        let dir = tmp.path().join(format!("p{m:03}"));
        std::fs::create_dir(&dir).unwrap();
        let mut src = format!("package p{m:03}\n\ntype Namer interface {{\n\tName() string\n}}\n");
        for t in 0..60 {
            write!(src, "\n// type T{t} has a name.\ntype T{t} struct{{ n int }}\n\nfunc (t *T{t}) Name() string {{ return \"T{t}\" }}\n").unwrap();
        }
        std::fs::write(dir.join("p.go"), src).unwrap();
    }

    let options = Options {
        concurrency: 1,
        ignore_missing: true,
    };
    let mut locator = Locator::new(SourceRoots::from_dirs([tmp.path()]), options);
    locator.add_interfaces(["example.com/many/p000.Namer"]);
    locator.add_packages(["example.com/many/..."]);
    locator.add_comments(["type"]);

    let cancel = CancelToken::new();
    let result = std::thread::scope(|s| {
        let canceller = cancel.clone();
        let loader = locator.loader();
        s.spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(10);
            while loader.load_count() == 0 && Instant::now() < deadline {
                std::thread::yield_now();
            }
            canceller.cancel();
        });
        locator.run(&cancel)
    });

    assert_eq!(result.unwrap_err().into_vec(), vec![LocateError::Cancelled]);
    assert!(locator.loader().load_count() < MODULES);
    assert_eq!(locator.walk_contracts().count(), 0);
    assert_eq!(locator.walk_functions().count(), 0);
    assert_eq!(locator.walk_comments().count(), 0);
    assert_eq!(locator.walk_files().count(), 0);
}
