// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Command line arguments for `golocate`.

use crate::config::LocateConfig;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct LocateArgs {
    /// JSON config naming the interfaces, functions, packages and comments to locate.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Source root directory. Can be provided multiple times.
    #[arg(long, value_name = "DIR")]
    pub root: Vec<PathBuf>,

    /// Go installation providing the standard library; defaults to
    /// `$GOROOT` or `go env GOROOT`.
    #[arg(long, value_name = "DIR")]
    pub goroot: Option<PathBuf>,

    /// Interface spec, `module.pattern`. Can be provided multiple times.
    #[arg(long = "interface", value_name = "SPEC")]
    pub interfaces: Vec<String>,

    /// Function spec, `module.pattern`. Can be provided multiple times.
    #[arg(long = "function", value_name = "SPEC")]
    pub functions: Vec<String>,

    /// Module, or `module/...`, to search for implementations.
    #[arg(long = "package", value_name = "PATH")]
    pub packages: Vec<String>,

    /// Regular expression matched against comments.
    #[arg(long = "comment", value_name = "REGEX")]
    pub comments: Vec<String>,

    /// Treat specs that match nothing as success.
    #[arg(long, default_value_t = false)]
    pub ignore_missing: bool,

    /// Worker threads; defaults to the configured value or the CPU count.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Print a JSON report instead of the summaries.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// More logging on stderr; repeat for trace output.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl LocateArgs {
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// The config file, if any, extended by the command line.
    pub fn config(&self) -> Result<LocateConfig> {
        let mut config = match &self.config {
            Some(path) => LocateConfig::from_file(path)?,
            None => LocateConfig::default(),
        };
        for dir in &self.root {
            config.add_root(dir.clone());
        }
        if let Some(goroot) = &self.goroot {
            config.goroot = Some(goroot.clone());
        }
        config.interfaces.extend(self.interfaces.iter().cloned());
        config.functions.extend(self.functions.iter().cloned());
        config.packages.extend(self.packages.iter().cloned());
        config.comments.extend(self.comments.iter().cloned());
        if self.ignore_missing {
            config.options.ignore_missing = true;
        }
        if let Some(concurrency) = self.concurrency {
            config.options.concurrency = concurrency;
        }
        Ok(config)
    }
}
