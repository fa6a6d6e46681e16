//! `pnpm-lock.yaml` and rush `shrinkwrap.yaml` parsing.
//!
//! Package keys changed shape across lockfile versions:
//! - v5 and older shrinkwrap files: `/name/1.0.0` or `/name/1.0.0_peer@2.0.0`
//! - v6: `/name@1.0.0(peer@2.0.0)`
//! - v9: `name@1.0.0(peer@2.0.0)`

use super::traits::{LockfileParser, ParseError};
use crate::model::{Ecosystem, PackageRecord, PackageSet, split_npm_name};
use serde_yaml_ng::Value;
use tracing::warn;

/// Parser for `pnpm-lock.yaml`
pub struct PnpmLockParser;

impl LockfileParser for PnpmLockParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        parse_pnpm_lock(content)
    }

    fn format_name(&self) -> &'static str {
        "pnpm-lock.yaml"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }
}

/// Parse a pnpm lockfile.
pub fn parse_pnpm_lock(content: &str) -> Result<PackageSet, ParseError> {
    let doc: Value = serde_yaml_ng::from_str(content)?;
    let mut set = PackageSet::new();

    let lockfile_version = doc
        .get("lockfileVersion")
        .and_then(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.parse::<f64>().ok()))
        })
        .unwrap_or(5.0);
    let at_separated = lockfile_version >= 6.0;

    let Some(packages) = doc.get("packages").and_then(Value::as_mapping) else {
        return Ok(set);
    };

    for (key, entry) in packages {
        let Some(key) = key.as_str() else {
            warn!("Skipping non-string pnpm package key");
            continue;
        };

        let explicit_name = entry.get("name").and_then(Value::as_str);
        let explicit_version = entry.get("version").and_then(Value::as_str);
        let parsed = parse_package_key(key, at_separated);

        let (full_name, version) = match (explicit_name, explicit_version, parsed) {
            (Some(n), Some(v), _) => (n.to_string(), v.to_string()),
            (_, _, Some((n, v))) => (n, v),
            _ => {
                warn!("Skipping unrecognised pnpm package key '{key}'");
                continue;
            }
        };

        let (group, name) = split_npm_name(&full_name);
        let mut record = PackageRecord::new(Ecosystem::Npm, name)
            .with_group(group)
            .with_version(version);
        record.integrity.sri = entry
            .get("resolution")
            .and_then(|r| r.get("integrity"))
            .and_then(Value::as_str)
            .map(ToString::to_string);
        set.push(record);
    }

    Ok(set)
}

/// Split a pnpm package key into `(name, version)`.
fn parse_package_key(key: &str, at_separated: bool) -> Option<(String, String)> {
    let key = key.strip_prefix('/').unwrap_or(key);
    // Peer-dependency suffix in v6+ keys
    let key = key.split('(').next().unwrap_or(key);

    if at_separated {
        let idx = key.get(1..)?.find('@')? + 1;
        let (name, version) = (&key[..idx], &key[idx + 1..]);
        if name.is_empty() || version.is_empty() {
            return None;
        }
        Some((name.to_string(), version.to_string()))
    } else {
        let (name, version) = key.rsplit_once('/')?;
        let version = version.split('_').next().unwrap_or(version);
        if name.is_empty() || version.is_empty() {
            return None;
        }
        Some((name.to_string(), version.to_string()))
    }
}
