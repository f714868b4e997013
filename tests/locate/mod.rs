// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Locator tests against the Go packages in tests/testdata.

mod comment_tests;
mod concurrency_tests;
mod error_tests;
mod file_tests;
mod function_tests;
mod impl_tests;
mod interface_tests;

use golocate::{CancelToken, Locator, Options, SourceRoots};
use std::path::PathBuf;

pub const HERE: &str = "example.com/testdata/";

pub fn testdata() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("testdata")
}

pub fn locator() -> Locator {
    Locator::new(SourceRoots::from_dirs([testdata()]), Options::default())
}

/// A stand-in Go installation holding trimmed `io` and `fmt` packages.
pub fn goroot() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("goroot")
}

pub fn locator_with_goroot() -> Locator {
    Locator::new(SourceRoots::from_dirs([testdata()]).with_goroot(goroot()), Options::default())
}

pub fn locator_ignoring_missing() -> Locator {
    let options = Options {
        ignore_missing: true,
        ..Options::default()
    };
    Locator::new(SourceRoots::from_dirs([testdata()]), options)
}

pub fn spec(rest: &str) -> String {
    format!("{HERE}{rest}")
}

pub fn run(locator: &Locator) {
    if let Err(errors) = locator.run(&CancelToken::new()) {
        panic!("locator.run: {errors}");
    }
}

/// Summary lines with the testdata directory removed from file names.
pub fn lines(summary: &str) -> Vec<String> {
    let prefix = format!("{}/", testdata().display());
    summary.lines().map(|l| l.replace(&prefix, "")).collect()
}
