//! `sbt dependencyList` output (`group:artifact:version` per line).

use super::traits::{LockfileParser, ParseError};
use crate::model::{Ecosystem, PackageRecord, PackageSet};
use tracing::debug;

/// Parser for `sbt dependencyList` output
pub struct SbtDependencyListParser;

impl LockfileParser for SbtDependencyListParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        Ok(parse_sbt_dependency_list(content))
    }

    fn format_name(&self) -> &'static str {
        "sbt dependencyList"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Maven
    }
}

/// Parse the flat dependency listing, with or without sbt's log prefixes.
#[must_use]
pub fn parse_sbt_dependency_list(content: &str) -> PackageSet {
    let mut set = PackageSet::new();
    for raw in content.lines() {
        let line = raw
            .trim()
            .strip_prefix("[info]")
            .unwrap_or(raw)
            .trim();
        if line.is_empty() || line.contains(char::is_whitespace) {
            if !line.is_empty() {
                debug!("Skipping sbt output line: {line}");
            }
            continue;
        }
        let parts: Vec<&str> = line.split(':').collect();
        let [group, artifact, version] = parts.as_slice() else {
            debug!("Skipping sbt output line: {line}");
            continue;
        };
        if group.is_empty() || artifact.is_empty() || version.is_empty() {
            continue;
        }
        set.push(
            PackageRecord::new(Ecosystem::Maven, *artifact)
                .with_group(*group)
                .with_version(*version)
                .with_qualifier("type", "jar"),
        );
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_list_with_log_lines() {
        let output = "[info] welcome to sbt 1.9.7 (Eclipse Adoptium Java 17.0.9)
[info] loading project definition from /work/project
[info] com.typesafe:config:1.4.2
[info] org.scala-lang:scala-library:2.13.12
[info] org.typelevel:cats-core_2.13:2.10.0
[success] Total time: 1 s, completed Jan 5, 2024
";
        let set = parse_sbt_dependency_list(output);
        let names: Vec<&str> = set.packages.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["config", "scala-library", "cats-core_2.13"]);
        assert_eq!(set.packages[2].group, "org.typelevel");
    }

    #[test]
    fn test_plain_file_output() {
        let set = parse_sbt_dependency_list("com.lihaoyi:os-lib_3:0.9.1\n");
        assert_eq!(set.packages[0].version.as_deref(), Some("0.9.1"));
    }
}
