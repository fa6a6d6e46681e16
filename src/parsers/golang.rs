//! Go module files: `go.mod`, `go.sum` and dep's `Gopkg.lock`.

use super::traits::{LockfileParser, ParseError};
use crate::model::{
    Ecosystem, HashAlgorithm, PackageRecord, PackageSet, RawDigest, split_go_module,
};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

/// Parser for `go.mod`
pub struct GoModParser;

impl LockfileParser for GoModParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        Ok(parse_go_mod(content))
    }

    fn format_name(&self) -> &'static str {
        "go.mod"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Golang
    }
}

/// Parser for `go.sum`
pub struct GoSumParser;

impl LockfileParser for GoSumParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        Ok(parse_go_sum(content))
    }

    fn format_name(&self) -> &'static str {
        "go.sum"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Golang
    }
}

/// Parser for `Gopkg.lock`
pub struct GopkgLockParser;

impl LockfileParser for GopkgLockParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        parse_gopkg_lock(content)
    }

    fn format_name(&self) -> &'static str {
        "Gopkg.lock"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Golang
    }
}

fn go_record(module: &str, version: Option<&str>) -> PackageRecord {
    let (group, name) = split_go_module(module);
    let record = PackageRecord::new(Ecosystem::Golang, name).with_group(group);
    match version {
        Some(v) => record.with_version(v),
        None => record,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Replacement {
    old_version: Option<String>,
    new_path: String,
    new_version: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Require,
    Replace,
    Other,
}

/// Parse `go.mod`, applying `replace` directives to the required modules.
///
/// A replacement pointing at a local directory yields a module without a
/// version.
#[must_use]
pub fn parse_go_mod(content: &str) -> PackageSet {
    let mut set = PackageSet::new();
    let mut requires: Vec<(String, String)> = Vec::new();
    let mut replaces: IndexMap<String, Vec<Replacement>> = IndexMap::new();
    let mut block = Block::None;

    for raw in content.lines() {
        let line = raw.split("//").next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        if block != Block::None {
            if line == ")" {
                block = Block::None;
                continue;
            }
            match block {
                Block::Require => push_require(line, &mut requires),
                Block::Replace => push_replace(line, &mut replaces),
                _ => {}
            }
            continue;
        }

        let (directive, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match directive {
            "module" => {
                let module = rest.trim_matches('"');
                if !module.is_empty() {
                    set.root = Some(go_record(module, None));
                }
            }
            "require" | "replace" | "exclude" | "retract" | "tool" | "godebug"
                if rest == "(" =>
            {
                block = match directive {
                    "require" => Block::Require,
                    "replace" => Block::Replace,
                    _ => Block::Other,
                };
            }
            "require" => push_require(rest, &mut requires),
            "replace" => push_replace(rest, &mut replaces),
            _ => {}
        }
    }

    for (module, version) in requires {
        let replacement = replaces.get(&module).and_then(|candidates| {
            candidates
                .iter()
                .find(|r| r.old_version.as_deref() == Some(version.as_str()))
                .or_else(|| candidates.iter().find(|r| r.old_version.is_none()))
        });
        let record = match replacement {
            Some(r) => {
                debug!("Replacing {module} {version} with {}", r.new_path);
                go_record(&r.new_path, r.new_version.as_deref())
            }
            None => go_record(&module, Some(version.as_str())),
        };
        set.push(record);
    }

    set
}

fn push_require(line: &str, requires: &mut Vec<(String, String)>) {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(module), Some(version)) => {
            requires.push((module.trim_matches('"').to_string(), version.to_string()));
        }
        _ => warn!("Skipping malformed go.mod require: {line}"),
    }
}

fn push_replace(line: &str, replaces: &mut IndexMap<String, Vec<Replacement>>) {
    let Some((old, new)) = line.split_once("=>") else {
        warn!("Skipping malformed go.mod replace: {line}");
        return;
    };
    let mut old_parts = old.split_whitespace();
    let mut new_parts = new.split_whitespace();
    let (Some(old_path), Some(new_path)) = (old_parts.next(), new_parts.next()) else {
        warn!("Skipping malformed go.mod replace: {line}");
        return;
    };
    let is_local = new_path.starts_with("./")
        || new_path.starts_with("../")
        || new_path.starts_with('/');
    let replacement = Replacement {
        old_version: old_parts.next().map(ToString::to_string),
        new_path: new_path.to_string(),
        new_version: if is_local {
            None
        } else {
            new_parts.next().map(ToString::to_string)
        },
    };
    replaces
        .entry(old_path.to_string())
        .or_default()
        .push(replacement);
}

/// Parse `go.sum`; each module hash becomes a SHA-256 digest.
#[must_use]
pub fn parse_go_sum(content: &str) -> PackageSet {
    let mut set = PackageSet::new();
    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [module, version, hash] = parts.as_slice() else {
            if !line.trim().is_empty() {
                warn!("Skipping malformed go.sum line: {line}");
            }
            continue;
        };
        if version.ends_with("/go.mod") {
            continue;
        }
        let mut record = go_record(module, Some(*version));
        if let Some(digest) = hash.strip_prefix("h1:") {
            record = record.with_digest(RawDigest::new(HashAlgorithm::Sha256, digest));
        }
        set.push(record);
    }
    set
}

#[derive(Debug, Deserialize)]
struct GopkgLock {
    #[serde(default)]
    projects: Vec<toml::Value>,
}

#[derive(Debug, Deserialize)]
struct GopkgProject {
    name: String,
    version: Option<String>,
    revision: Option<String>,
}

/// Parse dep's `Gopkg.lock`; projects pinned to a revision use it as version.
pub fn parse_gopkg_lock(content: &str) -> Result<PackageSet, ParseError> {
    let lock: GopkgLock = toml::from_str(content)?;
    let mut set = PackageSet::new();
    for entry in lock.projects {
        match entry.try_into::<GopkgProject>() {
            Ok(p) => set.push(go_record(&p.name, p.version.as_deref().or(p.revision.as_deref()))),
            Err(e) => warn!("Skipping malformed Gopkg.lock project: {}", e.message()),
        }
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GO_MOD: &str = r"module github.com/acme/app

go 1.21

require (
	github.com/pkg/errors v0.9.1
	golang.org/x/text v0.14.0 // indirect
	github.com/acme/shared v1.0.0
)

require github.com/stretchr/testify v1.8.4

replace github.com/pkg/errors => github.com/acme/errors v0.9.2

replace (
	github.com/acme/shared v1.0.0 => ../shared
)
";

    #[test]
    fn test_go_mod_requires_and_replaces() {
        let set = parse_go_mod(GO_MOD);
        let root = set.root.as_ref().unwrap();
        assert_eq!(root.group, "github.com/acme");
        assert_eq!(root.name, "app");

        let modules: Vec<(String, Option<&str>)> = set
            .packages
            .iter()
            .map(|r| (format!("{}/{}", r.group, r.name), r.version.as_deref()))
            .collect();
        assert_eq!(
            modules,
            vec![
                ("github.com/acme/errors".to_string(), Some("v0.9.2")),
                ("golang.org/x/text".to_string(), Some("v0.14.0")),
                ("../shared".to_string(), None),
                ("github.com/stretchr/testify".to_string(), Some("v1.8.4")),
            ]
        );
    }

    #[test]
    fn test_go_sum_skips_go_mod_lines() {
        let sum = "github.com/pkg/errors v0.9.1 h1:FEBLx1zS214owpjy7qsBeixbURkuhQAwrK5UwLGTwt4=
github.com/pkg/errors v0.9.1/go.mod h1:bwawxfHBFNV+L2hUp1rHADufV3IMtnDRdf1r5NINEl0=
garbage
";
        let set = parse_go_sum(sum);
        assert_eq!(set.packages.len(), 1);
        let digest = &set.packages[0].integrity.digests[0];
        assert_eq!(digest.algorithm, HashAlgorithm::Sha256);
        assert_eq!(digest.value, "FEBLx1zS214owpjy7qsBeixbURkuhQAwrK5UwLGTwt4=");
    }

    #[test]
    fn test_gopkg_lock() {
        let lock = r#"
[[projects]]
  digest = "1:abc"
  name = "github.com/pkg/errors"
  packages = ["."]
  revision = "ba968bfe8b2f7e042a574c888954fccecfa385b4"
  version = "v0.8.1"

[[projects]]
  name = "golang.org/x/sys"
  packages = ["unix"]
  revision = "1b2967e3c290b7c545b3db0deeda16e9be4f98a2"

[[projects]]
  packages = ["."]
  revision = "0000000000000000000000000000000000000000"

[solve-meta]
  analyzer-name = "dep"
"#;
        let set = parse_gopkg_lock(lock).unwrap();
        assert_eq!(set.packages.len(), 2);
        assert_eq!(set.packages[0].version.as_deref(), Some("v0.8.1"));
        assert_eq!(
            set.packages[1].version.as_deref(),
            Some("1b2967e3c290b7c545b3db0deeda16e9be4f98a2")
        );
    }
}
