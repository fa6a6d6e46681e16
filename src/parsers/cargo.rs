//! Rust: `Cargo.lock` and, when no lockfile exists, `Cargo.toml`.

use super::traits::{LockfileParser, ParseError};
use crate::model::{Ecosystem, HashAlgorithm, PackageRecord, PackageSet, RawDigest, RawLicense};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use toml::{Table, Value};
use tracing::{debug, warn};

/// Parser for `Cargo.lock`
pub struct CargoLockParser;

impl LockfileParser for CargoLockParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        parse_cargo_lock(content)
    }

    fn format_name(&self) -> &'static str {
        "Cargo.lock"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Crates
    }
}

/// Parser for `Cargo.toml`
pub struct CargoTomlParser;

impl LockfileParser for CargoTomlParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        parse_cargo_toml(content)
    }

    fn format_name(&self) -> &'static str {
        "Cargo.toml"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Crates
    }
}

#[derive(Debug, Deserialize)]
struct CargoLock {
    #[serde(default)]
    package: Vec<Value>,
    #[serde(default)]
    metadata: Table,
}

#[derive(Debug, Deserialize)]
struct LockPackage {
    name: String,
    version: String,
    checksum: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

/// Parse `Cargo.lock` (format v1 through v4).
///
/// When a crate name appears with several versions, only the versions some
/// package depends on explicitly (`"name version"`) are kept; if none is
/// referenced that way, all of them are.
pub fn parse_cargo_lock(content: &str) -> Result<PackageSet, ParseError> {
    let lock: CargoLock = toml::from_str(content)?;
    let packages: Vec<LockPackage> = lock
        .package
        .into_iter()
        .filter_map(|entry| match entry.try_into::<LockPackage>() {
            Ok(pkg) => Some(pkg),
            Err(e) => {
                warn!("Skipping malformed Cargo.lock package: {}", e.message());
                None
            }
        })
        .collect();

    let mut version_counts: HashMap<&str, usize> = HashMap::new();
    for pkg in &packages {
        *version_counts.entry(pkg.name.as_str()).or_default() += 1;
    }

    let mut pinned: HashSet<(String, String)> = HashSet::new();
    for pkg in &packages {
        for dep in &pkg.dependencies {
            let mut parts = dep.split_whitespace();
            if let (Some(name), Some(version)) = (parts.next(), parts.next()) {
                pinned.insert((name.to_string(), version.to_string()));
            }
        }
    }
    let pinned_names: HashSet<&str> = pinned.iter().map(|(n, _)| n.as_str()).collect();

    let mut set = PackageSet::new();
    for pkg in &packages {
        let duplicated = version_counts.get(pkg.name.as_str()).copied().unwrap_or(0) > 1;
        if duplicated
            && pinned_names.contains(pkg.name.as_str())
            && !pinned.contains(&(pkg.name.clone(), pkg.version.clone()))
        {
            debug!("Dropping unreferenced {} {}", pkg.name, pkg.version);
            continue;
        }

        let mut record = PackageRecord::new(Ecosystem::Crates, pkg.name.clone())
            .with_version(pkg.version.clone());
        let checksum = pkg.checksum.clone().or_else(|| v1_checksum(&lock.metadata, pkg));
        if let Some(checksum) = checksum {
            record = record.with_digest(RawDigest::new(HashAlgorithm::Sha256, checksum));
        }
        set.push(record);
    }

    Ok(set)
}

/// Format v1 keeps checksums in `[metadata]` as
/// `"checksum name version (source)" = "hex"`.
fn v1_checksum(metadata: &Table, pkg: &LockPackage) -> Option<String> {
    let prefix = format!("checksum {} {} ", pkg.name, pkg.version);
    metadata
        .iter()
        .find(|(key, _)| key.starts_with(&prefix))
        .and_then(|(_, value)| value.as_str())
        .filter(|v| *v != "<none>")
        .map(ToString::to_string)
}

/// Parse `Cargo.toml`: the package becomes the root and every declared
/// dependency a record. Path dependencies get no version.
pub fn parse_cargo_toml(content: &str) -> Result<PackageSet, ParseError> {
    let manifest: Table = toml::from_str(content)?;
    let mut set = PackageSet::new();

    if let Some(package) = manifest.get("package").and_then(Value::as_table) {
        let name = package
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::MissingField("package.name".to_string()))?;
        let mut root = PackageRecord::new(Ecosystem::Crates, name);
        if let Some(version) = package.get("version").and_then(Value::as_str) {
            root = root.with_version(version);
        }
        let text = |key: &str| {
            package
                .get(key)
                .and_then(Value::as_str)
                .map(ToString::to_string)
        };
        root.description = text("description");
        root.homepage = text("homepage");
        root.repository = text("repository");
        if let Some(license) = text("license") {
            root.license = RawLicense::Text(license);
        }
        root.keywords = package
            .get("keywords")
            .and_then(Value::as_array)
            .map(|k| k.iter().filter_map(Value::as_str).map(ToString::to_string).collect())
            .unwrap_or_default();
        set.root = Some(root);
    }

    let workspace_deps = manifest
        .get("workspace")
        .and_then(|w| w.get("dependencies"))
        .and_then(Value::as_table);

    let mut tables: Vec<&Table> = Vec::new();
    for key in ["dependencies", "dev-dependencies", "build-dependencies"] {
        if let Some(t) = manifest.get(key).and_then(Value::as_table) {
            tables.push(t);
        }
    }
    if let Some(targets) = manifest.get("target").and_then(Value::as_table) {
        for target in targets.values() {
            for key in ["dependencies", "dev-dependencies", "build-dependencies"] {
                if let Some(t) = target.get(key).and_then(Value::as_table) {
                    tables.push(t);
                }
            }
        }
    }
    if let Some(ws) = workspace_deps {
        tables.push(ws);
    }

    for table in tables {
        for (key, spec) in table {
            set.push(dependency_record(key, spec, workspace_deps));
        }
    }

    Ok(set)
}

fn dependency_record(key: &str, spec: &Value, workspace: Option<&Table>) -> PackageRecord {
    let (name, version) = match spec {
        Value::String(req) => (key.to_string(), Some(req.clone())),
        Value::Table(t) => {
            let name = t
                .get("package")
                .and_then(Value::as_str)
                .unwrap_or(key)
                .to_string();
            let inherited = t.get("workspace").and_then(Value::as_bool) == Some(true);
            let version = if t.contains_key("path") {
                None
            } else if inherited {
                workspace
                    .and_then(|ws| ws.get(key))
                    .and_then(|ws_spec| match ws_spec {
                        Value::String(req) => Some(req.clone()),
                        Value::Table(wt) if !wt.contains_key("path") => {
                            wt.get("version").and_then(Value::as_str).map(ToString::to_string)
                        }
                        _ => None,
                    })
            } else {
                t.get("version").and_then(Value::as_str).map(ToString::to_string)
            };
            (name, version)
        }
        _ => (key.to_string(), None),
    };

    let record = PackageRecord::new(Ecosystem::Crates, name);
    match version {
        Some(req) => record.with_version(req.trim_start_matches(['^', '=', '~', ' '])),
        None => record,
    }
}
