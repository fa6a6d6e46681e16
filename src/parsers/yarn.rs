//! `yarn.lock` parsing, classic (v1) and berry (v2+) flavours.
//!
//! Both are block oriented: an unindented header listing the requested
//! specifiers, followed by two-space indented fields. Classic separates key
//! and value with a space, berry with `: `.

use super::traits::{LockfileParser, ParseError};
use crate::model::{Ecosystem, HashAlgorithm, PackageRecord, PackageSet, RawDigest, split_npm_name};
use tracing::{debug, warn};

/// Parser for `yarn.lock`
pub struct YarnLockParser;

impl LockfileParser for YarnLockParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        Ok(parse_yarn_lock(content))
    }

    fn format_name(&self) -> &'static str {
        "yarn.lock"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }
}

#[derive(Default)]
struct Block {
    header: String,
    version: Option<String>,
    resolved: Option<String>,
    resolution: Option<String>,
    integrity: Option<String>,
    checksum: Option<String>,
}

/// Parse a yarn lockfile. Never fails; malformed blocks are skipped.
#[must_use]
pub fn parse_yarn_lock(content: &str) -> PackageSet {
    let mut set = PackageSet::new();
    let mut current: Option<Block> = None;

    for line in content.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() || trimmed.trim_start().starts_with('#') {
            continue;
        }

        if !line.starts_with(' ') {
            if let Some(block) = current.take() {
                push_block(&mut set, block);
            }
            current = trimmed.strip_suffix(':').map(|header| Block {
                header: header.to_string(),
                ..Block::default()
            });
            if current.is_none() {
                warn!("Skipping malformed yarn.lock line: {trimmed}");
            }
            continue;
        }

        // Only first-level fields matter; nested `dependencies:` entries are
        // indented further.
        let Some(field) = line.strip_prefix("  ") else {
            continue;
        };
        if field.starts_with(' ') {
            continue;
        }
        let Some(block) = current.as_mut() else {
            continue;
        };
        let Some((key, value)) = split_field(field) else {
            continue;
        };
        match key {
            "version" => block.version = Some(value),
            "resolved" => block.resolved = Some(value),
            "resolution" => block.resolution = Some(value),
            "integrity" => block.integrity = Some(value),
            "checksum" => block.checksum = Some(value),
            _ => {}
        }
    }
    if let Some(block) = current.take() {
        push_block(&mut set, block);
    }

    set
}

/// Split `key value` or `key: value`, unquoting the value.
fn split_field(field: &str) -> Option<(&str, String)> {
    let (key, value) = match field.split_once(": ") {
        Some((k, v)) if !k.contains(' ') => (k, v),
        _ => field.split_once(' ')?,
    };
    let key = key.trim_end_matches(':');
    let value = value.trim().trim_matches('"').to_string();
    if value.is_empty() {
        None
    } else {
        Some((key, value))
    }
}

/// Package name from a specifier such as `@scope/pkg@npm:^1.0.0`
fn name_from_spec(spec: &str) -> &str {
    let spec = spec.trim().trim_matches('"');
    match spec.get(1..).and_then(|rest| rest.find('@')) {
        Some(idx) => &spec[..=idx],
        None => spec,
    }
}

fn push_block(set: &mut PackageSet, block: Block) {
    if block.header == "__metadata" {
        return;
    }
    let first_spec = block.header.split(", ").next().unwrap_or_default();
    if first_spec.contains("@workspace:") || first_spec.contains("@link:") {
        debug!("Skipping workspace entry {first_spec}");
        return;
    }

    let full_name = block
        .resolution
        .as_deref()
        .map_or_else(|| name_from_spec(first_spec), name_from_spec);
    let Some(version) = block.version else {
        warn!("Skipping yarn.lock entry without version: {}", block.header);
        return;
    };
    if full_name.is_empty() {
        warn!("Skipping yarn.lock entry without a name: {}", block.header);
        return;
    }

    let (group, name) = split_npm_name(full_name);
    let mut record = PackageRecord::new(Ecosystem::Npm, name)
        .with_group(group)
        .with_version(version);

    record.integrity.shasum = block
        .resolved
        .as_deref()
        .and_then(|url| url.rsplit_once('#'))
        .map(|(_, sha)| sha.to_string())
        .filter(|sha| sha.len() == 40);
    record.integrity.sri = block.integrity;
    if let Some(checksum) = block.checksum {
        let hex = checksum.rsplit('/').next().unwrap_or_default();
        if !hex.is_empty() {
            record = record.with_digest(RawDigest::new(HashAlgorithm::Sha512, hex));
        }
    }

    set.push(record);
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSIC: &str = r#"# THIS IS AN AUTOGENERATED FILE. DO NOT EDIT THIS FILE DIRECTLY.
# yarn lockfile v1


"@babel/code-frame@^7.0.0", "@babel/code-frame@^7.10.4":
  version "7.12.13"
  resolved "https://registry.yarnpkg.com/@babel/code-frame/-/code-frame-7.12.13.tgz#dcfc826beef65e75c50e21d3837d7d95798dd658"
  integrity sha512-HV1Cm0Q3ZrpCR93tkWOYiuYIgLxZXZFVG2VgK+MBWjUqZTundupbfx2aXarXuw5Ko5aMcjtJgbSs4vUGBS5v6g==
  dependencies:
    "@babel/highlight" "^7.12.13"

left-pad@^1.3.0:
  version "1.3.0"
  resolved "https://registry.yarnpkg.com/left-pad/-/left-pad-1.3.0.tgz"

broken-entry@^1.0.0:
  resolved "https://example.invalid/broken.tgz"
"#;

    #[test]
    fn test_classic_lockfile() {
        let set = parse_yarn_lock(CLASSIC);
        assert_eq!(set.packages.len(), 2);

        let babel = &set.packages[0];
        assert_eq!(babel.group, "@babel");
        assert_eq!(babel.name, "code-frame");
        assert_eq!(babel.version.as_deref(), Some("7.12.13"));
        assert_eq!(
            babel.integrity.shasum.as_deref(),
            Some("dcfc826beef65e75c50e21d3837d7d95798dd658")
        );
        assert!(babel.integrity.sri.as_deref().unwrap().starts_with("sha512-"));

        let pad = &set.packages[1];
        assert_eq!(pad.name, "left-pad");
        assert!(pad.integrity.is_empty());
    }

    const BERRY: &str = r#"__metadata:
  version: 6
  cacheKey: 8

"@types/node@npm:^20.0.0":
  version: 20.11.5
  resolution: "@types/node@npm:20.11.5"
  checksum: 10c0/0123abcd
  languageName: node
  linkType: hard

"web@workspace:.":
  version: 0.0.0-use.local
  resolution: "web@workspace:."
  languageName: unknown
  linkType: soft

"lodash@npm:^4.17.21":
  version: 4.17.21
  resolution: "lodash@npm:4.17.21"
  checksum: eb835a2e51d381e561e508ce932ea50a8e5a68f4ebdd771ea240d3048244a8d13658acbd502cd4829768c56f2e16bdd4340b9ea141297d472517b83868e677f7
  languageName: node
  linkType: hard
"#;

    #[test]
    fn test_berry_lockfile() {
        let set = parse_yarn_lock(BERRY);
        assert_eq!(set.packages.len(), 2);
        assert_eq!(set.packages[0].group, "@types");
        assert_eq!(set.packages[0].integrity.digests[0].value, "0123abcd");

        let lodash = &set.packages[1];
        assert_eq!(lodash.name, "lodash");
        assert_eq!(lodash.version.as_deref(), Some("4.17.21"));
        assert_eq!(lodash.integrity.digests[0].algorithm, HashAlgorithm::Sha512);
    }

    #[test]
    fn test_name_from_spec() {
        assert_eq!(name_from_spec("\"@scope/pkg@npm:^1.0.0\""), "@scope/pkg");
        assert_eq!(name_from_spec("pkg@^1.0.0"), "pkg");
        assert_eq!(name_from_spec("pkg"), "pkg");
    }
}
