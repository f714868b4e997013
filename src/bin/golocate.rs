// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! golocate: locate Go interfaces, their implementations, functions and
//! comments.
//!
//! Usage: golocate [--config FILE] [--root DIR]... [--interface SPEC]...
//!                 [--function SPEC]... [--package PATH]... [--json]

use anyhow::{bail, Context, Result};
use clap::Parser;
use golocate::{CancelToken, LocateArgs};

fn main() -> Result<()> {
    let args = LocateArgs::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .init();

    let config = args.config()?;
    if config.roots.is_empty() {
        bail!("no source roots: pass --root or set roots in the config");
    }
    let locator = config.locator();

    if let Err(errors) = locator.run(&CancelToken::new()) {
        for err in &errors {
            eprintln!("{err}");
        }
        std::process::exit(1);
    }

    if args.json {
        let report = serde_json::to_string_pretty(&locator.report()).context("Failed to serialize report")?;
        println!("{report}");
        return Ok(());
    }

    print!("{}", locator.interfaces_summary());
    print!("{}", locator.functions_summary());
    print!("{}", locator.comments_summary());
    print!("{}", locator.files_summary());
    Ok(())
}
