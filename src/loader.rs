// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Caching module loader.
//!
//! Two single-flight caches are kept per module path: the parsed files,
//! and the checked module. Checking a module needs only the parsed form
//! of its imports, so a load never waits on another load and concurrent
//! first requests for a path share one parse and one check. Failures
//! are cached like successes.

use crate::checker::{self, SymbolTable};
use crate::constraint::BuildContext;
use crate::discover::{expand_pattern, go_files};
use crate::error::{LocateError, LocateResult};
use crate::roots::SourceRoots;
use crate::syntax::{parse_file, SourceFile, TypeSpec};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

/// The parsed, unchecked files of one module.
#[derive(Debug)]
pub struct ParsedModule {
    pub path: String,
    pub package: String,
    pub dir: PathBuf,
    pub files: Vec<Arc<SourceFile>>,
}

impl ParsedModule {
    /// The first declaration of type `name` and the file declaring it.
    pub fn type_spec(&self, name: &str) -> Option<(&SourceFile, &TypeSpec)> {
        self.files.iter().find_map(|file| {
            file.type_specs()
                .find(|spec| spec.name == name)
                .map(|spec| (file.as_ref(), spec))
        })
    }
}

/// A loaded and checked module.
#[derive(Debug)]
pub struct Module {
    pub path: String,
    pub package: String,
    pub dir: PathBuf,
    pub files: Vec<Arc<SourceFile>>,
    pub symbols: SymbolTable,
}

impl Module {
    pub fn file(&self, path: &Path) -> Option<&Arc<SourceFile>> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// Access to parsed modules by path, as needed to resolve imports.
pub trait ModuleSource {
    /// The parsed module at `path`, or `None` when no source root holds
    /// Go source for it.
    fn parsed(&self, path: &str) -> LocateResult<Option<Arc<ParsedModule>>>;
}

type Cell<T> = Arc<OnceLock<LocateResult<T>>>;

fn cell<T>(map: &Mutex<HashMap<String, Cell<T>>>, path: &str) -> (Cell<T>, bool) {
    let mut map = map.lock();
    match map.get(path) {
        Some(cell) => (Arc::clone(cell), false),
        None => {
            let cell: Cell<T> = Arc::new(OnceLock::new());
            map.insert(path.to_string(), Arc::clone(&cell));
            (cell, true)
        }
    }
}

pub struct Loader {
    roots: SourceRoots,
    parsed: Mutex<HashMap<String, Cell<Option<Arc<ParsedModule>>>>>,
    modules: Mutex<HashMap<String, Cell<Arc<Module>>>>,
    loads: AtomicUsize,
}

impl Loader {
    pub fn new(roots: SourceRoots) -> Self {
        Loader {
            roots,
            parsed: Mutex::new(HashMap::new()),
            modules: Mutex::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn roots(&self) -> &SourceRoots {
        &self.roots
    }

    /// Load, check and cache the module at `path`.
    pub fn load(&self, path: &str) -> LocateResult<Arc<Module>> {
        let (cell, fresh) = cell(&self.modules, path);
        if !fresh && cell.get().is_some() {
            trace!(module = path, "module cache hit");
        }
        cell.get_or_init(|| self.load_uncached(path)).clone()
    }

    /// Like `load`, but `Ok(None)` for a path no root holds.
    pub fn lookup(&self, path: &str) -> LocateResult<Option<Arc<Module>>> {
        match self.parsed(path)? {
            Some(_) => self.load(path).map(Some),
            None => Ok(None),
        }
    }

    /// A module that has already been loaded successfully.
    pub fn cached(&self, path: &str) -> Option<Arc<Module>> {
        let cell = self.modules.lock().get(path).cloned()?;
        match cell.get() {
            Some(Ok(module)) => Some(Arc::clone(module)),
            _ => None,
        }
    }

    /// Every successfully loaded module, by path.
    pub fn modules(&self) -> Vec<Arc<Module>> {
        let cells: Vec<_> = self.modules.lock().values().cloned().collect();
        let mut modules: Vec<_> = cells
            .iter()
            .filter_map(|c| match c.get() {
                Some(Ok(m)) => Some(Arc::clone(m)),
                _ => None,
            })
            .collect();
        modules.sort_by(|a, b| a.path.cmp(&b.path));
        modules
    }

    /// Number of real module loads performed; cache hits do not count.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Expand a `path/...` pattern into module paths.
    pub fn expand(&self, pattern: &str) -> LocateResult<Vec<String>> {
        expand_pattern(&self.roots, pattern)
    }

    fn load_uncached(&self, path: &str) -> LocateResult<Arc<Module>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let parsed = self.parsed(path)?.ok_or_else(|| LocateError::ModuleNotFound {
            path: path.to_string(),
        })?;
        let symbols = checker::check(&parsed, self)?;
        debug!(
            module = path,
            files = parsed.files.len(),
            types = symbols.types.len(),
            funcs = symbols.funcs.len(),
            "loaded module"
        );
        Ok(Arc::new(Module {
            path: parsed.path.clone(),
            package: parsed.package.clone(),
            dir: parsed.dir.clone(),
            files: parsed.files.clone(),
            symbols,
        }))
    }

    fn parse_uncached(&self, path: &str) -> LocateResult<Option<Arc<ParsedModule>>> {
        let Some(dir) = self.roots.resolve(path) else {
            return Ok(None);
        };
        let mut files = Vec::new();
        let mut packages: Vec<String> = Vec::new();
        for file in go_files(&dir) {
            let src = fs::read_to_string(&file).map_err(|err| LocateError::ParseError {
                file: file.clone(),
                line: 0,
                column: 0,
                message: err.to_string(),
            })?;
            let parsed = parse_file(&file, &src)?;
            if !parsed.builds_with(BuildContext::host()) {
                trace!(file = %file.display(), "excluded by build constraint");
                continue;
            }
            trace!(file = %file.display(), package = %parsed.package, "parsed file");
            if !packages.contains(&parsed.package) {
                packages.push(parsed.package.clone());
            }
            files.push(Arc::new(parsed));
        }
        if files.is_empty() {
            return Ok(None);
        }
        if packages.len() > 1 {
            packages.sort();
            return Err(LocateError::AmbiguousModule {
                dir,
                names: packages,
            });
        }
        Ok(Some(Arc::new(ParsedModule {
            path: path.to_string(),
            package: packages.remove(0),
            dir,
            files,
        })))
    }
}

impl ModuleSource for Loader {
    fn parsed(&self, path: &str) -> LocateResult<Option<Arc<ParsedModule>>> {
        let (cell, _) = cell(&self.parsed, path);
        cell.get_or_init(|| self.parse_uncached(path)).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_is_cached() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a/a.go", "package a\ntype T int\n");
        let loader = Loader::new(SourceRoots::from_dirs([tmp.path()]));
        let first = loader.load("a").unwrap();
        let second = loader.load("a").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.load_count(), 1);
        assert!(loader.cached("a").is_some());
    }

    #[test]
    fn test_errors_are_cached() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = Loader::new(SourceRoots::from_dirs([tmp.path()]));
        let first = loader.load("missing").unwrap_err();
        let second = loader.load("missing").unwrap_err();
        assert_eq!(first, second);
        assert!(matches!(first, LocateError::ModuleNotFound { .. }));
        assert_eq!(loader.load_count(), 1);
        assert!(loader.lookup("missing").unwrap().is_none());
    }

    #[test]
    fn test_ignored_files_excluded() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "p/p.go", "package p\n");
        write(tmp.path(), "p/gen.go", "//go:build ignore\n\npackage main\n");
        let loader = Loader::new(SourceRoots::from_dirs([tmp.path()]));
        let module = loader.load("p").unwrap();
        assert_eq!(module.files.len(), 1);
        assert_eq!(module.package, "p");
    }

    #[test]
    fn test_platform_variants_excluded() {
        let host = BuildContext::host();
        let other = if host.goos == "windows" { "plan9" } else { "windows" };
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "p/p.go", "package p\n");
        write(tmp.path(), &format!("p/f_{}.go", host.goos), "package p\n\nfunc F() {}\n");
        write(tmp.path(), &format!("p/f_{other}.go"), "package p\n\nfunc F() {}\n");
        write(tmp.path(), "p/g1.go", &format!("//go:build {other}\n\npackage p\n\nfunc G() {{}}\n"));
        write(tmp.path(), "p/g2.go", &format!("//go:build !{other}\n\npackage p\n\nfunc G() {{}}\n"));
        let loader = Loader::new(SourceRoots::from_dirs([tmp.path()]));
        let module = loader.load("p").unwrap();
        let mut names: Vec<_> = module.symbols.funcs.iter().map(|f| f.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["F", "G"]);
        assert_eq!(module.files.len(), 3);
    }
}
