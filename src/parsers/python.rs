//! Python: requirements files, `Pipfile.lock`, `poetry.lock` and `setup.py`.

use super::traits::{LockfileParser, ParseError};
use crate::model::{Ecosystem, HashAlgorithm, PackageRecord, PackageSet, RawDigest};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

static REQUIREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\[[^\]]*\])?\s*(.*)$").expect("static regex")
});

static INSTALL_REQUIRES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)install_requires\s*=\s*\[(.*?)\]").expect("static regex")
});

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).expect("static regex"));

static SETUP_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bname\s*=\s*["']([^"']+)["']"#).expect("static regex")
});

static SETUP_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bversion\s*=\s*["']([^"']+)["']"#).expect("static regex")
});

/// Parser for `requirements.txt` and `requirements/*.txt`
pub struct RequirementsParser;

impl LockfileParser for RequirementsParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        Ok(parse_requirements(content))
    }

    fn format_name(&self) -> &'static str {
        "requirements.txt"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pypi
    }
}

/// Parser for `Pipfile.lock`
pub struct PipfileLockParser;

impl LockfileParser for PipfileLockParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        parse_pipfile_lock(content)
    }

    fn format_name(&self) -> &'static str {
        "Pipfile.lock"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pypi
    }
}

/// Parser for `poetry.lock`
pub struct PoetryLockParser;

impl LockfileParser for PoetryLockParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        parse_poetry_lock(content)
    }

    fn format_name(&self) -> &'static str {
        "poetry.lock"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pypi
    }
}

/// Parser for `setup.py`
pub struct SetupPyParser;

impl LockfileParser for SetupPyParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        Ok(parse_setup_py(content))
    }

    fn format_name(&self) -> &'static str {
        "setup.py"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pypi
    }
}

/// `algo:hex` as written by pip, Pipenv and Poetry
fn parse_hash(value: &str) -> Option<RawDigest> {
    let (algo, digest) = value.split_once(':')?;
    let algorithm = HashAlgorithm::from_tag(algo)?;
    Some(RawDigest::new(algorithm, digest.trim()))
}

/// Pick a version out of a PEP 440 specifier list.
///
/// Exact pins (`==`, `===`) win; otherwise the lower bound of `>=`, `~=` or
/// `>` is used. Upper bounds and exclusions alone give no version.
fn version_from_specifier(spec: &str) -> Option<String> {
    let clauses: Vec<&str> = spec.split(',').map(str::trim).collect();
    for ops in [&["===", "=="][..], &["~=", ">=", ">"][..]] {
        for clause in &clauses {
            for op in ops {
                if let Some(version) = clause.strip_prefix(op) {
                    let version = version.trim();
                    if !version.is_empty() && !version.starts_with('=') {
                        return Some(version.to_string());
                    }
                }
            }
        }
    }
    None
}

/// Parse a single PEP 508 requirement (`name[extras] spec ; markers`).
fn requirement_record(line: &str) -> Option<PackageRecord> {
    let line = line.split(';').next().unwrap_or(line).trim();
    let caps = REQUIREMENT.captures(line)?;
    let name = &caps[1];
    let rest = caps[2].trim();
    let mut record = PackageRecord::new(Ecosystem::Pypi, name);
    // `name @ url` direct references carry no version
    if !rest.starts_with('@')
        && let Some(version) = version_from_specifier(rest)
    {
        record = record.with_version(version);
    }
    Some(record)
}

/// Parse a pip requirements file.
///
/// Options (`-r`, `-e`, `--index-url`), bare URLs and comments are skipped.
/// `--hash` options attached to a requirement become digests. Unpinned
/// requirements are kept without a version.
#[must_use]
pub fn parse_requirements(content: &str) -> PackageSet {
    let mut set = PackageSet::new();
    let mut logical = String::new();

    for raw in content.lines() {
        let line = strip_comment(raw);
        if let Some(continued) = line.trim_end().strip_suffix('\\') {
            logical.push_str(continued);
            logical.push(' ');
            continue;
        }
        logical.push_str(line);
        let entry = std::mem::take(&mut logical);
        push_requirement(&mut set, entry.trim());
    }
    if !logical.trim().is_empty() {
        push_requirement(&mut set, logical.trim());
    }

    set
}

fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    match line.find(" #") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn push_requirement(set: &mut PackageSet, entry: &str) {
    if entry.is_empty() || entry.starts_with('-') {
        return;
    }
    if entry.contains("://") && !entry.contains(" @ ") {
        debug!("Skipping URL requirement: {entry}");
        return;
    }

    let (spec, options) = match entry.find(" --") {
        Some(idx) => (&entry[..idx], &entry[idx..]),
        None => (entry, ""),
    };
    let Some(mut record) = requirement_record(spec) else {
        warn!("Skipping malformed requirement: {entry}");
        return;
    };
    for option in options.split_whitespace() {
        if let Some(hash) = option.strip_prefix("--hash=").and_then(parse_hash) {
            record = record.with_digest(hash);
        }
    }
    set.push(record);
}

/// Parse `Pipfile.lock`, `default` section first, then `develop`.
pub fn parse_pipfile_lock(content: &str) -> Result<PackageSet, ParseError> {
    let doc: Value = serde_json::from_str(content)?;
    if !doc.is_object() {
        return Err(ParseError::InvalidStructure(
            "Pipfile.lock root is not an object".to_string(),
        ));
    }

    let mut set = PackageSet::new();
    for section in ["default", "develop"] {
        let Some(entries) = doc.get(section).and_then(Value::as_object) else {
            continue;
        };
        for (name, entry) in entries {
            let mut record = PackageRecord::new(Ecosystem::Pypi, name.as_str());
            if let Some(version) = entry.get("version").and_then(Value::as_str) {
                record = record.with_version(version.trim_start_matches("===").trim_start_matches("=="));
            }
            if let Some(hashes) = entry.get("hashes").and_then(Value::as_array) {
                for hash in hashes.iter().filter_map(Value::as_str).filter_map(parse_hash) {
                    record = record.with_digest(hash);
                }
            }
            set.push(record);
        }
    }
    Ok(set)
}

#[derive(Debug, Deserialize)]
struct PoetryLock {
    #[serde(default)]
    package: Vec<toml::Value>,
    #[serde(default)]
    metadata: PoetryMetadata,
}

#[derive(Debug, Deserialize)]
struct PoetryPackage {
    name: String,
    version: String,
    description: Option<String>,
    #[serde(default)]
    files: Vec<PoetryFile>,
}

#[derive(Debug, Default, Deserialize)]
struct PoetryMetadata {
    #[serde(default)]
    files: std::collections::HashMap<String, Vec<PoetryFile>>,
}

#[derive(Debug, Deserialize)]
struct PoetryFile {
    hash: Option<String>,
}

/// Parse `poetry.lock` (lock format 1.x and 2.x).
///
/// Only the first file hash of each package is kept.
pub fn parse_poetry_lock(content: &str) -> Result<PackageSet, ParseError> {
    let lock: PoetryLock = toml::from_str(content)?;
    let mut set = PackageSet::new();

    for entry in lock.package {
        let pkg: PoetryPackage = match entry.try_into() {
            Ok(pkg) => pkg,
            Err(e) => {
                warn!("Skipping malformed poetry.lock package: {}", e.message());
                continue;
            }
        };
        let mut record = PackageRecord::new(Ecosystem::Pypi, pkg.name.as_str())
            .with_version(pkg.version.as_str());
        record.description = pkg.description.clone().filter(|d| !d.is_empty());

        let files = if pkg.files.is_empty() {
            lock.metadata.files.get(&pkg.name).map(Vec::as_slice).unwrap_or_default()
        } else {
            pkg.files.as_slice()
        };
        if let Some(hash) = files
            .iter()
            .filter_map(|f| f.hash.as_deref())
            .find_map(parse_hash)
        {
            record = record.with_digest(hash);
        }
        set.push(record);
    }

    Ok(set)
}

/// Best-effort `setup.py` scan: `name=`/`version=` for the root and the
/// string literals inside `install_requires=[...]`.
#[must_use]
pub fn parse_setup_py(content: &str) -> PackageSet {
    let mut set = PackageSet::new();

    if let Some(name) = SETUP_NAME.captures(content).map(|c| c[1].to_string()) {
        let mut root = PackageRecord::new(Ecosystem::Pypi, name);
        if let Some(version) = SETUP_VERSION.captures(content) {
            root = root.with_version(&version[1]);
        }
        set.root = Some(root);
    }

    if let Some(block) = INSTALL_REQUIRES.captures(content) {
        for literal in STRING_LITERAL.captures_iter(&block[1]) {
            match requirement_record(&literal[1]) {
                Some(record) => set.push(record),
                None => warn!("Skipping malformed install_requires entry: {}", &literal[1]),
            }
        }
    }

    set
}
