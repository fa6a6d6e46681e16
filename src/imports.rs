//! JavaScript/TypeScript import-usage scanner.
//!
//! Walks a source tree, extracts module specifiers from `import`/`export ...
//! from`, side-effect imports, dynamic `import()` and `require()`, and
//! counts how often each package is referenced. The resulting [`ImportMap`]
//! drives the `required`/`optional` scope of npm components.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;
use walkdir::WalkDir;

/// `import x from 'y'`, `export { a } from 'y'`, multi-line import lists
static FROM_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[\s;}])(?:import|export)\s[^'";]*?\bfrom\s*['"]([^'"\n]+)['"]"#)
        .expect("static regex")
});

static SIDE_EFFECT_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[^\S\n]*import\s*['"]([^'"\n]+)['"]"#).expect("static regex")
});

static DYNAMIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#).expect("static regex")
});

static REQUIRE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#).expect("static regex")
});

const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "vue"];

const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "timers",
    "tls",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "worker_threads",
    "zlib",
];

/// Package name to number of import sites
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMap {
    counts: BTreeMap<String, usize>,
}

impl ImportMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more usage of `package`
    pub fn record(&mut self, package: impl Into<String>) {
        *self.counts.entry(package.into()).or_insert(0) += 1;
    }

    #[must_use]
    pub fn contains(&self, package: &str) -> bool {
        self.counts.contains_key(package)
    }

    #[must_use]
    pub fn get(&self, package: &str) -> Option<usize> {
        self.counts.get(package).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for ImportMap {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Reduce a module specifier to the package it names.
///
/// Relative and absolute paths, URL-like specifiers (`node:fs`,
/// `https://...`), subpath imports (`#internal`) and node builtins yield
/// `None`. Deep imports keep only the package part.
///
/// ```
/// use depbom::imports::package_of_specifier;
///
/// assert_eq!(package_of_specifier("@babel/core/lib/index").as_deref(), Some("@babel/core"));
/// assert_eq!(package_of_specifier("lodash/fp").as_deref(), Some("lodash"));
/// assert_eq!(package_of_specifier("./util"), None);
/// ```
#[must_use]
pub fn package_of_specifier(specifier: &str) -> Option<String> {
    let spec = specifier.trim();
    if spec.is_empty()
        || spec.starts_with(['.', '/', '#', '~'])
        || spec.contains(':')
    {
        return None;
    }

    let mut segments = spec.split('/');
    let first = segments.next()?;
    if first.starts_with('@') {
        let name = segments.next().filter(|n| !n.is_empty())?;
        if first.len() < 2 {
            return None;
        }
        return Some(format!("{first}/{name}"));
    }
    if NODE_BUILTINS.contains(&first) {
        return None;
    }
    Some(first.to_string())
}

/// Extract package usages from one source text into `map`.
pub fn scan_source(content: &str, map: &mut ImportMap) {
    // Drop whole-line comments so commented-out imports do not count
    let code: String = content
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !(trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*'))
        })
        .collect::<Vec<_>>()
        .join("\n");

    for regex in [&*FROM_CLAUSE, &*SIDE_EFFECT_IMPORT, &*DYNAMIC_IMPORT, &*REQUIRE_CALL] {
        for caps in regex.captures_iter(&code) {
            if let Some(package) = caps.get(1).and_then(|m| package_of_specifier(m.as_str())) {
                map.record(package);
            }
        }
    }
}

/// Scan every JS/TS source file below `root`.
///
/// Directories whose name is in `exclude_dirs` are not entered;
/// `node_modules` is always skipped. Unreadable files are ignored.
#[must_use]
pub fn scan_imports(root: &Path, exclude_dirs: &[String]) -> ImportMap {
    let mut map = ImportMap::new();
    let mut files = 0usize;

    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(|e| {
        e.depth() == 0
            || !e.file_type().is_dir()
            || e.file_name().to_str().is_none_or(|name| {
                name != "node_modules" && !exclude_dirs.iter().any(|d| d == name)
            })
    }) {
        let Ok(entry) = entry else {
            continue;
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let is_source = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
        if !is_source {
            continue;
        }
        match std::fs::read_to_string(entry.path()) {
            Ok(content) => {
                scan_source(&content, &mut map);
                files += 1;
            }
            Err(e) => debug!("Skipping {}: {e}", entry.path().display()),
        }
    }

    debug!("Scanned {files} source files, {} packages imported", map.len());
    map
}
