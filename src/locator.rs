// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! The locator session: registration, concurrent resolution and ordered
//! walks over the results.

use crate::comments::{compile_patterns, scan_comments, CommentMatch};
use crate::contracts::{resolve_contracts, ContractDescriptor};
use crate::discover::is_recursive;
use crate::error::{Errors, LocateError, LocateResult};
use crate::files::{FileHit, HitMask};
use crate::functions::{resolve_functions, FunctionDescriptor};
use crate::implementations::{match_implementations, ContractShape, Implementation};
use crate::loader::Loader;
use crate::position::SourcePosition;
use crate::roots::SourceRoots;
use crate::spec::{dedup, modules_to_load, Spec};
use parking_lot::Mutex;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tuning for one locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Worker threads per run; 0 uses the thread pool default.
    pub concurrency: usize,
    /// Treat specs that match nothing as success.
    pub ignore_missing: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            concurrency: std::thread::available_parallelism().map_or(0, |n| n.get()),
            ignore_missing: false,
        }
    }
}

/// Cooperative cancellation shared between a caller and a running
/// locator. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancelled.
    pub fn check(&self) -> LocateResult<()> {
        if self.is_cancelled() {
            Err(LocateError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
struct Results {
    contracts: BTreeMap<String, ContractDescriptor>,
    functions: BTreeMap<String, FunctionDescriptor>,
    comments: BTreeMap<(SourcePosition, String), CommentMatch>,
    hits: BTreeMap<PathBuf, HitMask>,
}

impl Results {
    fn hit(&mut self, at: &SourcePosition, mask: HitMask) {
        *self.hits.entry(at.file.clone()).or_default() |= mask;
    }

    fn add_contract(&mut self, contract: ContractDescriptor) {
        self.hit(&contract.declared_at, HitMask::INTERFACE);
        self.contracts.entry(contract.full_name.clone()).or_insert(contract);
    }

    fn add_function(&mut self, function: FunctionDescriptor) {
        self.hit(&function.declared_at, HitMask::FUNCTION);
        self.functions.entry(function.full_name.clone()).or_insert(function);
    }

    fn add_implementation(&mut self, found: Implementation) {
        let method = found.method.full_name.clone();
        self.hit(&found.method.declared_at, HitMask::FUNCTION);
        self.functions
            .entry(method.clone())
            .or_insert(found.method)
            .satisfied_contracts
            .insert(found.contract.clone());
        if let Some(contract) = self.contracts.get_mut(&found.contract) {
            contract.implementers.insert(method);
        }
    }

    fn add_comment(&mut self, comment: CommentMatch) {
        self.hit(&comment.position, HitMask::COMMENT);
        let key = (comment.position.clone(), comment.pattern.clone());
        self.comments.entry(key).or_insert(comment);
    }
}

/// Everything located, in walk order, for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub contracts: Vec<ContractDescriptor>,
    pub functions: Vec<FunctionDescriptor>,
    pub comments: Vec<CommentMatch>,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub module: String,
    pub package: String,
    pub hits: String,
}

/// Locates interfaces, their implementations, functions and comments
/// in Go modules.
///
/// Specs are registered with the `add_*` methods and resolved by
/// [`Locator::run`]; results accumulate across runs and are read back
/// with the `walk_*` methods, ordered by source position.
pub struct Locator {
    loader: Loader,
    options: Options,
    interfaces: Vec<String>,
    functions: Vec<String>,
    packages: Vec<String>,
    comments: Vec<String>,
    results: Mutex<Results>,
}

impl Locator {
    pub fn new(roots: SourceRoots, options: Options) -> Self {
        Locator {
            loader: Loader::new(roots),
            options,
            interfaces: Vec::new(),
            functions: Vec::new(),
            packages: Vec::new(),
            comments: Vec::new(),
            results: Mutex::new(Results::default()),
        }
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Interface specs: `module.pattern`.
    pub fn add_interfaces<I, S>(&mut self, specs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interfaces.extend(specs.into_iter().map(Into::into));
    }

    /// Function specs: `module.pattern`.
    pub fn add_functions<I, S>(&mut self, specs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.functions.extend(specs.into_iter().map(Into::into));
    }

    /// Modules, or `module/...` patterns, to search for implementations.
    pub fn add_packages<I, S>(&mut self, packages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages.extend(packages.into_iter().map(Into::into));
    }

    /// Regular expressions matched against comment text.
    pub fn add_comments<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.comments.extend(patterns.into_iter().map(Into::into));
    }

    /// Resolve everything registered so far.
    ///
    /// Invalid specs fail before any module is loaded. Other failures are
    /// collected, and whatever resolved cleanly stays available. On
    /// cancellation every result is discarded and only `Cancelled` is
    /// returned.
    pub fn run(&self, cancel: &CancelToken) -> Result<(), Errors> {
        let mut errors = Errors::new();
        let contract_specs = parse_specs(&self.interfaces, &mut errors);
        let function_specs = parse_specs(&self.functions, &mut errors);
        let patterns = match compile_patterns(&self.comments) {
            Ok(patterns) => patterns,
            Err(err) => {
                errors.push(err);
                Vec::new()
            }
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut packages = Vec::new();
        for pattern in &self.packages {
            if is_recursive(pattern) {
                match self.loader.expand(pattern) {
                    Ok(expanded) => packages.extend(expanded),
                    Err(err) => errors.push(err),
                }
            } else {
                packages.push(pattern.clone());
            }
        }
        let packages = dedup(packages);
        if !errors.is_empty() {
            return Err(errors);
        }

        let modules = modules_to_load(&contract_specs, &function_specs, &packages);
        info!(
            modules = modules.len(),
            interfaces = contract_specs.len(),
            functions = function_specs.len(),
            packages = packages.len(),
            "locating"
        );

        let plan = Plan {
            contract_specs,
            function_specs,
            patterns,
            packages,
            modules,
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.concurrency)
            .build();
        let errors = match pool {
            Ok(pool) => pool.install(|| self.execute(&plan, cancel)),
            Err(err) => {
                warn!(error = %err, "falling back to the global thread pool");
                self.execute(&plan, cancel)
            }
        };

        if cancel.is_cancelled() || errors.iter().any(|e| matches!(e, LocateError::Cancelled)) {
            *self.results.lock() = Results::default();
            return Err(Errors::from(LocateError::Cancelled));
        }
        errors.into_result()
    }

    fn execute(&self, plan: &Plan, cancel: &CancelToken) -> Errors {
        let mut errors = Errors::new();
        let ignore_missing = self.options.ignore_missing;

        let load_errors: Vec<(String, LocateError)> = plan
            .modules
            .par_iter()
            .filter_map(|path| {
                if let Err(err) = cancel.check() {
                    return Some((path.clone(), err));
                }
                self.loader.load(path).err().map(|err| (path.clone(), err))
            })
            .collect();
        let failed: HashSet<String> = load_errors.iter().map(|(p, _)| p.clone()).collect();
        errors.extend(load_errors.into_iter().map(|(_, e)| e));
        if cancel.is_cancelled() {
            return errors;
        }

        let contract_specs: Vec<&Spec> = plan
            .contract_specs
            .iter()
            .filter(|s| !failed.contains(&s.module_path))
            .collect();
        let function_specs: Vec<&Spec> = plan
            .function_specs
            .iter()
            .filter(|s| !failed.contains(&s.module_path))
            .collect();
        let loaded: Vec<String> = plan
            .modules
            .iter()
            .filter(|m| !failed.contains(*m))
            .cloned()
            .collect();

        let (contract_errors, (function_errors, comment_errors)) = rayon::join(
            || {
                contract_specs
                    .par_iter()
                    .filter_map(|spec| {
                        match resolve_contracts(&self.loader, spec, ignore_missing, cancel) {
                            Ok(found) => {
                                let mut results = self.results.lock();
                                found.into_iter().for_each(|c| results.add_contract(c));
                                None
                            }
                            Err(err) => Some(err),
                        }
                    })
                    .collect::<Vec<_>>()
            },
            || {
                rayon::join(
                    || {
                        function_specs
                            .par_iter()
                            .filter_map(|spec| {
                                match resolve_functions(&self.loader, spec, ignore_missing, cancel) {
                                    Ok(found) => {
                                        let mut results = self.results.lock();
                                        found.into_iter().for_each(|f| results.add_function(f));
                                        None
                                    }
                                    Err(err) => Some(err),
                                }
                            })
                            .collect::<Vec<_>>()
                    },
                    || self.scan_comments(&plan.patterns, &loaded, cancel),
                )
            },
        );
        errors.extend(contract_errors);
        errors.extend(function_errors);
        errors.extend(comment_errors);
        if cancel.is_cancelled() {
            return errors;
        }

        let shapes: Vec<ContractShape> = self
            .results
            .lock()
            .contracts
            .values()
            .map(|c| ContractShape {
                full_name: c.full_name.clone(),
                method_set: c.method_set.clone(),
                type_elements: c.type_elements,
            })
            .collect();
        let impl_errors: Vec<LocateError> = plan
            .packages
            .par_iter()
            .filter(|p| !failed.contains(*p))
            .filter_map(|path| match match_implementations(&self.loader, &shapes, path, cancel) {
                Ok(found) => {
                    let mut results = self.results.lock();
                    found.into_iter().for_each(|i| results.add_implementation(i));
                    None
                }
                Err(err) => Some(err),
            })
            .collect();
        errors.extend(impl_errors);
        debug!(errors = errors.len(), "run finished");
        errors
    }

    fn scan_comments(&self, patterns: &[Regex], modules: &[String], cancel: &CancelToken) -> Vec<LocateError> {
        if patterns.is_empty() {
            return Vec::new();
        }
        modules
            .par_iter()
            .filter_map(|path| {
                if let Err(err) = cancel.check() {
                    return Some(err);
                }
                let module = self.loader.cached(path)?;
                let found = scan_comments(patterns, &module);
                let mut results = self.results.lock();
                found.into_iter().for_each(|c| results.add_comment(c));
                None
            })
            .collect()
    }

    /// Located contracts ordered by declaration position.
    pub fn walk_contracts(&self) -> std::vec::IntoIter<ContractDescriptor> {
        let mut contracts: Vec<_> = self.results.lock().contracts.values().cloned().collect();
        contracts.sort_by(|a, b| a.declared_at.cmp(&b.declared_at).then_with(|| a.full_name.cmp(&b.full_name)));
        contracts.into_iter()
    }

    /// Located functions and implementing methods ordered by position.
    pub fn walk_functions(&self) -> std::vec::IntoIter<FunctionDescriptor> {
        let mut functions: Vec<_> = self.results.lock().functions.values().cloned().collect();
        functions.sort_by(|a, b| a.declared_at.cmp(&b.declared_at).then_with(|| a.full_name.cmp(&b.full_name)));
        functions.into_iter()
    }

    /// Matching comment groups ordered by position, then pattern.
    pub fn walk_comments(&self) -> std::vec::IntoIter<CommentMatch> {
        let comments: Vec<_> = self.results.lock().comments.values().cloned().collect();
        comments.into_iter()
    }

    /// Loaded files with at least one hit, ordered by path.
    pub fn walk_files(&self) -> std::vec::IntoIter<FileHit> {
        let hits = self.results.lock().hits.clone();
        let mut files = Vec::new();
        for module in self.loader.modules() {
            for file in &module.files {
                if let Some(mask) = hits.get(&file.path).filter(|m| !m.is_empty()) {
                    files.push(FileHit {
                        path: file.path.clone(),
                        module: module.path.clone(),
                        file: Arc::clone(file),
                        hits: *mask,
                    });
                }
            }
        }
        files.sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));
        files.into_iter()
    }

    pub fn contract(&self, full_name: &str) -> Option<ContractDescriptor> {
        self.results.lock().contracts.get(full_name).cloned()
    }

    pub fn function(&self, full_name: &str) -> Option<FunctionDescriptor> {
        self.results.lock().functions.get(full_name).cloned()
    }

    /// One `name interface file:line:col` line per contract.
    pub fn interfaces_summary(&self) -> String {
        self.walk_contracts()
            .map(|c| format!("{} interface {}\n", c.full_name, c.declared_at))
            .collect()
    }

    /// One `name[ implements a, b] @ file:line:col` line per function.
    pub fn functions_summary(&self) -> String {
        self.walk_functions()
            .map(|f| {
                let mut line = f.full_name.clone();
                if !f.satisfied_contracts.is_empty() {
                    let names: Vec<&str> = f.satisfied_contracts.iter().map(String::as_str).collect();
                    line.push_str(" implements ");
                    line.push_str(&names.join(", "));
                }
                format!("{line} @ {}\n", f.declared_at)
            })
            .collect()
    }

    /// One `file: package (hits)` line per file.
    pub fn files_summary(&self) -> String {
        self.walk_files().map(|f| format!("{}\n", f.summary())).collect()
    }

    /// One `file:line:col: pattern` line per comment match.
    pub fn comments_summary(&self) -> String {
        self.walk_comments()
            .map(|c| format!("{}: {}\n", c.position, c.pattern))
            .collect()
    }

    pub fn report(&self) -> Report {
        Report {
            contracts: self.walk_contracts().collect(),
            functions: self.walk_functions().collect(),
            comments: self.walk_comments().collect(),
            files: self
                .walk_files()
                .map(|f| FileReport {
                    package: f.package().to_string(),
                    hits: f.hits.to_string(),
                    path: f.path,
                    module: f.module,
                })
                .collect(),
        }
    }
}

struct Plan {
    contract_specs: Vec<Spec>,
    function_specs: Vec<Spec>,
    patterns: Vec<Regex>,
    packages: Vec<String>,
    modules: Vec<String>,
}

fn parse_specs(specs: &[String], errors: &mut Errors) -> Vec<Spec> {
    let mut parsed = Vec::new();
    for spec in dedup(specs) {
        match Spec::parse(&spec) {
            Ok(spec) => parsed.push(spec),
            Err(err) => errors.push(err),
        }
    }
    parsed
}
