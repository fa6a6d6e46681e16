//! PHP Composer: `composer.lock` packages and the `composer.json` root.

use super::common::{json_license, json_str, json_string_list};
use super::traits::{LockfileParser, ParseError};
use crate::model::{Ecosystem, PackageRecord, PackageSet};
use serde_json::Value;
use tracing::warn;

/// Parser for `composer.lock`
pub struct ComposerLockParser;

impl LockfileParser for ComposerLockParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        parse_composer_lock(content)
    }

    fn format_name(&self) -> &'static str {
        "composer.lock"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Composer
    }
}

/// Parser for `composer.json`; yields the project root only
pub struct ComposerJsonParser;

impl LockfileParser for ComposerJsonParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        parse_composer_json(content)
    }

    fn format_name(&self) -> &'static str {
        "composer.json"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Composer
    }
}

/// Parse `composer.lock`, runtime packages first, then `packages-dev`.
pub fn parse_composer_lock(content: &str) -> Result<PackageSet, ParseError> {
    let doc: Value = serde_json::from_str(content)?;
    if !doc.is_object() {
        return Err(ParseError::InvalidStructure(
            "composer.lock root is not an object".to_string(),
        ));
    }

    let mut set = PackageSet::new();
    for section in ["packages", "packages-dev"] {
        let Some(packages) = doc.get(section).and_then(Value::as_array) else {
            continue;
        };
        for entry in packages {
            match composer_record(entry) {
                Some(record) => set.push(record),
                None => warn!("Skipping composer.lock entry without a name in '{section}'"),
            }
        }
    }
    Ok(set)
}

/// Parse `composer.json` for the project's own metadata.
pub fn parse_composer_json(content: &str) -> Result<PackageSet, ParseError> {
    let doc: Value = serde_json::from_str(content)?;
    let root = composer_record(&doc).ok_or_else(|| ParseError::MissingField("name".to_string()))?;
    Ok(PackageSet::new().with_root(root))
}

fn composer_record(entry: &Value) -> Option<PackageRecord> {
    let full_name = json_str(entry, "name")?;
    let (group, name) = match full_name.split_once('/') {
        Some((vendor, name)) => (vendor, name),
        None => ("", full_name),
    };

    let mut record = PackageRecord::new(Ecosystem::Composer, name).with_group(group);
    if let Some(version) = json_str(entry, "version") {
        record = record.with_version(version);
    }
    record.license = json_license(entry);
    record.description = json_str(entry, "description").map(ToString::to_string);
    record.homepage = json_str(entry, "homepage").map(ToString::to_string);
    record.keywords = json_string_list(entry, "keywords");

    let support = entry.get("support");
    record.bug_tracker = support
        .and_then(|s| json_str(s, "issues"))
        .map(ToString::to_string);
    record.repository = entry
        .get("source")
        .and_then(|s| json_str(s, "url"))
        .or_else(|| support.and_then(|s| json_str(s, "source")))
        .map(ToString::to_string);
    record.integrity.shasum = entry
        .get("dist")
        .and_then(|d| json_str(d, "shasum"))
        .map(ToString::to_string);

    Some(record)
}
