//! Ruby `Gemfile.lock`.

use super::traits::{LockfileParser, ParseError};
use crate::model::{Ecosystem, PackageRecord, PackageSet};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Resolved gem line inside a `specs:` block (exactly four spaces deep)
static SPEC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {4}([^\s(]+) \(([^)]+)\)\s*$").expect("static regex")
});

/// Parser for `Gemfile.lock`
pub struct GemfileLockParser;

impl LockfileParser for GemfileLockParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        Ok(parse_gemfile_lock(content))
    }

    fn format_name(&self) -> &'static str {
        "Gemfile.lock"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rubygems
    }
}

/// Parse the resolved gems of the `GEM`, `GIT` and `PATH` sections.
///
/// Platform-specific builds (`nokogiri (1.15.4-x86_64-linux)`) keep the
/// platform as a purl qualifier.
#[must_use]
pub fn parse_gemfile_lock(content: &str) -> PackageSet {
    let mut set = PackageSet::new();
    let mut in_gem_section = false;

    for line in content.lines() {
        if !line.starts_with(' ') && !line.trim().is_empty() {
            in_gem_section = matches!(line.trim(), "GEM" | "GIT" | "PATH" | "PLUGIN SOURCE");
            continue;
        }
        if !in_gem_section {
            continue;
        }
        let Some(caps) = SPEC_LINE.captures(line) else {
            if line.starts_with("    ") && !line.starts_with("     ") {
                debug!("Skipping unrecognised Gemfile.lock spec: {}", line.trim());
            }
            continue;
        };

        let name = &caps[1];
        let raw_version = &caps[2];
        let mut record = PackageRecord::new(Ecosystem::Rubygems, name);
        match raw_version.split_once('-') {
            Some((version, platform)) => {
                record = record
                    .with_version(version)
                    .with_qualifier("platform", platform);
            }
            None => record = record.with_version(raw_version),
        }
        set.push(record);
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCK: &str = "GIT
  remote: https://github.com/acme/toolkit.git
  revision: 0123456789abcdef
  specs:
    toolkit (0.4.0)

GEM
  remote: https://rubygems.org/
  specs:
    actioncable (7.0.4)
      actionpack (= 7.0.4)
      nio4r (~> 2.0)
    nokogiri (1.15.4-x86_64-linux)
      racc (~> 1.4)
    racc (1.7.3)

PLATFORMS
  x86_64-linux

DEPENDENCIES
  rails (~> 7.0)

BUNDLED WITH
   2.4.10
";

    #[test]
    fn test_specs_only() {
        let set = parse_gemfile_lock(LOCK);
        let names: Vec<&str> = set.packages.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["toolkit", "actioncable", "nokogiri", "racc"]);

        let nokogiri = &set.packages[2];
        assert_eq!(nokogiri.version.as_deref(), Some("1.15.4"));
        assert_eq!(
            nokogiri.qualifiers.get("platform").map(String::as_str),
            Some("x86_64-linux")
        );
    }
}
