// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Build constraints: `GOOS`/`GOARCH` file name suffixes and
//! `//go:build` (or legacy `// +build`) lines.

use std::sync::OnceLock;
use tracing::debug;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux", "nacl", "netbsd",
    "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux", "netbsd", "openbsd",
    "solaris",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle", "mips64",
    "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv", "riscv64", "s390", "s390x",
    "sparc", "sparc64", "wasm",
];

/// A boolean expression over build tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Tag(String),
    Not(Box<Constraint>),
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
}

impl Constraint {
    /// Parse the expression of a `//go:build` line.
    pub fn parse(expr: &str) -> Result<Constraint, String> {
        let mut parser = ExprParser { src: expr, pos: 0 };
        let constraint = parser.or()?;
        parser.skip_space();
        if parser.pos < expr.len() {
            return Err(format!("unexpected {:?}", &expr[parser.pos..]));
        }
        Ok(constraint)
    }

    /// Parse the tags of a `// +build` line: spaces separate alternatives,
    /// commas separate required tags.
    pub fn parse_plus_build(line: &str) -> Option<Constraint> {
        line.split_whitespace()
            .filter_map(|option| {
                option
                    .split(',')
                    .map(|term| match term.strip_prefix('!') {
                        Some(tag) => Constraint::Not(Box::new(Constraint::Tag(tag.to_string()))),
                        None => Constraint::Tag(term.to_string()),
                    })
                    .reduce(|a, b| Constraint::And(Box::new(a), Box::new(b)))
            })
            .reduce(|a, b| Constraint::Or(Box::new(a), Box::new(b)))
    }

    /// The conjunction of `constraints`, or `None` when there are none.
    pub fn all(constraints: Vec<Constraint>) -> Option<Constraint> {
        constraints
            .into_iter()
            .reduce(|a, b| Constraint::And(Box::new(a), Box::new(b)))
    }

    pub fn eval(&self, tag: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Constraint::Tag(name) => tag(name),
            Constraint::Not(inner) => !inner.eval(tag),
            Constraint::And(a, b) => a.eval(tag) && b.eval(tag),
            Constraint::Or(a, b) => a.eval(tag) || b.eval(tag),
        }
    }
}

struct ExprParser<'a> {
    src: &'a str,
    pos: usize,
}

impl ExprParser<'_> {
    fn skip_space(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, op: &str) -> bool {
        self.skip_space();
        if self.src[self.pos..].starts_with(op) {
            self.pos += op.len();
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<Constraint, String> {
        let mut left = self.and()?;
        while self.eat("||") {
            left = Constraint::Or(Box::new(left), Box::new(self.and()?));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Constraint, String> {
        let mut left = self.not()?;
        while self.eat("&&") {
            left = Constraint::And(Box::new(left), Box::new(self.not()?));
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Constraint, String> {
        if self.eat("!") {
            return Ok(Constraint::Not(Box::new(self.not()?)));
        }
        if self.eat("(") {
            let inner = self.or()?;
            if !self.eat(")") {
                return Err("missing )".to_string());
            }
            return Ok(inner);
        }
        self.skip_space();
        let rest = &self.src[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(match rest.chars().next() {
                Some(c) => format!("unexpected {c:?}"),
                None => "unexpected end of expression".to_string(),
            });
        }
        self.pos += len;
        Ok(Constraint::Tag(rest[..len].to_string()))
    }
}

/// The target a package is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub cgo: bool,
}

impl BuildContext {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        BuildContext {
            goos: goos.into(),
            goarch: goarch.into(),
            cgo: false,
        }
    }

    /// The running host, overridden by `$GOOS` and `$GOARCH` like the go
    /// tool.
    pub fn host() -> &'static BuildContext {
        static HOST: OnceLock<BuildContext> = OnceLock::new();
        HOST.get_or_init(|| {
            let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
            let goos = env("GOOS").unwrap_or_else(|| host_goos().to_string());
            let goarch = env("GOARCH").unwrap_or_else(|| host_goarch().to_string());
            debug!(%goos, %goarch, "build context");
            BuildContext::new(goos, goarch)
        })
    }

    pub fn matches_tag(&self, tag: &str) -> bool {
        if tag == self.goos || tag == self.goarch || tag == "gc" {
            return true;
        }
        match tag {
            "unix" => UNIX_OS.contains(&self.goos.as_str()),
            "cgo" => self.cgo,
            "linux" => self.goos == "android",
            "darwin" => self.goos == "ios",
            "solaris" => self.goos == "illumos",
            _ => is_release_tag(tag),
        }
    }

    pub fn satisfies(&self, constraint: &Constraint) -> bool {
        constraint.eval(&|tag: &str| self.matches_tag(tag))
    }

    /// Whether a `_GOOS`, `_GOARCH` or `_GOOS_GOARCH` file name suffix
    /// admits this context. Text before the first `_` never counts.
    pub fn matches_file_name(&self, name: &str) -> bool {
        let stem = name.strip_suffix(".go").unwrap_or(name);
        let Some(idx) = stem.find('_') else {
            return true;
        };
        let mut parts: Vec<&str> = stem[idx..].split('_').collect();
        if parts.last() == Some(&"test") {
            parts.pop();
        }
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.matches_tag(parts[n - 2]) && self.matches_tag(parts[n - 1]);
        }
        match parts.last() {
            Some(last) if KNOWN_OS.contains(last) || KNOWN_ARCH.contains(last) => self.matches_tag(last),
            _ => true,
        }
    }
}

/// `go1.N` tags name releases; every release is assumed available.
fn is_release_tag(tag: &str) -> bool {
    tag.strip_prefix("go1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

fn host_goos() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        os => os,
    }
}

fn host_goarch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "loongarch64" => "loong64",
        "powerpc" => "ppc",
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        "powerpc64" => "ppc64",
        "mips" if cfg!(target_endian = "little") => "mipsle",
        "mips64" if cfg!(target_endian = "little") => "mips64le",
        arch => arch,
    }
}
