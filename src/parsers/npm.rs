//! npm `package-lock.json` (v1, v2, v3), `npm ls --json` output and
//! `package.json` parsing.
//!
//! Lockfile v2/v3 carries a flat `packages` map keyed by install path; v1 and
//! `npm ls` nest records under `dependencies`. In the nested shape a string
//! where an object is expected marks a dependency already described further
//! up the tree and becomes a [`DependencyEdge::CycleRef`].

use super::common::{json_license, json_str, json_string_list, json_url};
use super::traits::{LockfileParser, ParseError};
use crate::model::{DependencyEdge, Ecosystem, PackageRecord, PackageSet, split_npm_name};
use serde_json::Value;
use tracing::{debug, warn};

const NODE_MODULES: &str = "node_modules/";

/// Parser for `package-lock.json`, `npm-shrinkwrap.json` and `npm ls --json`
pub struct PackageLockParser;

impl LockfileParser for PackageLockParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        parse_package_lock(content)
    }

    fn format_name(&self) -> &'static str {
        "package-lock.json"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }
}

/// Parser for `package.json`; yields the project root only
pub struct PackageJsonParser;

impl LockfileParser for PackageJsonParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        parse_package_json(content)
    }

    fn format_name(&self) -> &'static str {
        "package.json"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }
}

/// Parse an npm lockfile or `npm ls --json` document.
pub fn parse_package_lock(content: &str) -> Result<PackageSet, ParseError> {
    let doc: Value = serde_json::from_str(content)?;
    if !doc.is_object() {
        return Err(ParseError::InvalidStructure(
            "package-lock root is not an object".to_string(),
        ));
    }

    let mut set = PackageSet::new();

    if let Some(packages) = doc.get("packages").and_then(Value::as_object) {
        let root_entry = packages.get("").unwrap_or(&doc);
        let root_name = json_str(root_entry, "name").or_else(|| json_str(&doc, "name"));
        if let Some(name) = root_name {
            set.root = Some(record_from_json(name, root_entry, false));
        }

        for (path, entry) in packages {
            if path.is_empty() {
                continue;
            }
            if !entry.is_object() {
                warn!("Skipping malformed package-lock entry '{path}'");
                continue;
            }
            if entry.get("link").and_then(Value::as_bool) == Some(true) {
                continue;
            }
            let Some(idx) = path.rfind(NODE_MODULES) else {
                debug!("Skipping workspace source entry '{path}'");
                continue;
            };
            let install_name = &path[idx + NODE_MODULES.len()..];
            let name = json_str(entry, "name").unwrap_or(install_name);
            if name.is_empty() {
                warn!("Skipping package-lock entry without a name at '{path}'");
                continue;
            }
            set.push(record_from_json(name, entry, false));
        }
    } else {
        if let Some(name) = json_str(&doc, "name") {
            set.root = Some(record_from_json(name, &doc, false));
        }
        if let Some(deps) = doc.get("dependencies").and_then(Value::as_object) {
            for (name, value) in deps {
                if value.is_object() {
                    set.push(record_from_json(name, value, true));
                } else {
                    debug!("Ignoring non-object top-level dependency '{name}'");
                }
            }
        }
    }

    Ok(set)
}

/// Parse `package.json` for the project's own metadata.
pub fn parse_package_json(content: &str) -> Result<PackageSet, ParseError> {
    let doc: Value = serde_json::from_str(content)?;
    let name = json_str(&doc, "name")
        .ok_or_else(|| ParseError::MissingField("name".to_string()))?;
    Ok(PackageSet::new().with_root(record_from_json(name, &doc, false)))
}

/// Build a record from one JSON package object.
///
/// `nested` enables reading child records from `dependencies`, which in the
/// flat lockfile shape is only a name-to-range map.
fn record_from_json(full_name: &str, value: &Value, nested: bool) -> PackageRecord {
    let (group, name) = split_npm_name(full_name);
    let mut record = PackageRecord::new(Ecosystem::Npm, name).with_group(group);
    if let Some(version) = json_str(value, "version") {
        record = record.with_version(version);
    }

    record.integrity.shasum = json_str(value, "_shasum").map(ToString::to_string);
    record.integrity.sri = json_str(value, "_integrity")
        .or_else(|| json_str(value, "integrity"))
        .map(ToString::to_string);
    record.extraneous = value
        .get("extraneous")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    record.license = json_license(value);
    record.homepage = json_str(value, "homepage").map(ToString::to_string);
    record.bug_tracker = json_url(value, "bugs");
    record.repository = json_url(value, "repository");
    record.description = json_str(value, "description").map(ToString::to_string);
    record.keywords = json_string_list(value, "keywords");

    if nested && let Some(deps) = value.get("dependencies").and_then(Value::as_object) {
        for (child_name, child) in deps {
            match child {
                Value::Object(_) => {
                    record.dependencies.insert(
                        child_name.clone(),
                        DependencyEdge::Expanded(Box::new(record_from_json(
                            child_name, child, true,
                        ))),
                    );
                }
                Value::String(target) => record.add_cycle_ref(child_name.clone(), target.clone()),
                _ => warn!("Skipping malformed dependency '{child_name}' of '{full_name}'"),
            }
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCK_V3: &str = r#"{
      "name": "web-app",
      "version": "2.1.0",
      "lockfileVersion": 3,
      "packages": {
        "": { "name": "web-app", "version": "2.1.0", "license": "MIT" },
        "node_modules/@babel/core": {
          "version": "7.24.0",
          "integrity": "sha512-fQfkg0Gjkza3nf0c7/w6Xf34BW4YvzNfACRLmmb7XRLa6XHdR+K9AlJlxneFfWYf6uhOzuzZVTjF/8KfndZANw==",
          "license": "MIT"
        },
        "node_modules/left-pad": { "version": "1.3.0", "dev": true },
        "node_modules/a/node_modules/left-pad": { "version": "1.1.0" },
        "node_modules/stale": { "version": "0.0.1", "extraneous": true },
        "node_modules/my-lib": { "resolved": "packages/my-lib", "link": true },
        "packages/my-lib": { "name": "my-lib", "version": "0.1.0" }
      }
    }"#;

    #[test]
    fn test_lock_v3_flat_packages() {
        let set = parse_package_lock(LOCK_V3).unwrap();
        let root = set.root.as_ref().unwrap();
        assert_eq!(root.name, "web-app");
        assert_eq!(root.version.as_deref(), Some("2.1.0"));

        let names: Vec<(&str, &str, Option<&str>)> = set
            .packages
            .iter()
            .map(|r| (r.group.as_str(), r.name.as_str(), r.version.as_deref()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("@babel", "core", Some("7.24.0")),
                ("", "left-pad", Some("1.3.0")),
                ("", "left-pad", Some("1.1.0")),
                ("", "stale", Some("0.0.1")),
            ]
        );
        assert!(set.packages[3].extraneous);
        assert!(set.packages[0].integrity.sri.is_some());
    }

    #[test]
    fn test_nested_ls_output_with_cycle_marker() {
        let json = r#"{
          "name": "cli-tool",
          "version": "1.0.0",
          "dependencies": {
            "a": {
              "version": "1.0.0",
              "_shasum": "0123456789abcdef0123456789abcdef01234567",
              "bugs": {"url": "https://github.com/x/a/issues"},
              "dependencies": {
                "b": { "version": "2.0.0", "dependencies": { "a": "1.0.0" } }
              }
            }
          }
        }"#;
        let set = parse_package_lock(json).unwrap();
        assert_eq!(set.packages.len(), 1);
        let a = &set.packages[0];
        assert_eq!(a.bug_tracker.as_deref(), Some("https://github.com/x/a/issues"));
        assert!(a.integrity.shasum.is_some());
        let b = a.dependencies["b"].record().unwrap();
        assert!(matches!(b.dependencies["a"], DependencyEdge::CycleRef(ref v) if v == "1.0.0"));
        assert_eq!(set.record_count(), 2);
    }

    #[test]
    fn test_package_json_root_only() {
        let set = parse_package_json(
            r#"{"name": "@acme/site", "version": "3.0.0", "homepage": "https://acme.dev",
                "dependencies": {"react": "^18.0.0"}}"#,
        )
        .unwrap();
        let root = set.root.unwrap();
        assert_eq!(root.group, "@acme");
        assert_eq!(root.name, "site");
        assert_eq!(root.homepage.as_deref(), Some("https://acme.dev"));
        assert!(set.packages.is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(parse_package_lock("{ not json").is_err());
        assert!(parse_package_lock("[]").is_err());
    }
}
