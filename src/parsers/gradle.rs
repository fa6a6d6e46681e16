//! `gradle dependencies` text output.
//!
//! ```text
//! runtimeClasspath - Runtime classpath of source set 'main'.
//! +--- org.springframework.boot:spring-boot-starter-web -> 3.1.0
//! |    \--- org.yaml:snakeyaml:1.33 (*)
//! +--- project :core
//! \--- com.google.guava:guava:31.1-jre
//! ```
//!
//! Each tree level is five characters wide. `->` marks a conflict-resolved
//! version, `(*)` a subtree already printed, `(c)` a dependency constraint
//! and `(n)` a declaration that was not resolved. Bare `group:artifact:version`
//! lines without a tree prefix are read as top-level dependencies.

use super::traits::{LockfileParser, ParseError};
use super::tree::{TreeBuilder, tree_prefix_len};
use crate::model::{Ecosystem, PackageRecord, PackageSet};
use tracing::debug;

/// Parser for `gradle dependencies` output
pub struct GradleDependenciesParser;

impl LockfileParser for GradleDependenciesParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        Ok(parse_gradle_dependencies(content))
    }

    fn format_name(&self) -> &'static str {
        "gradle dependencies"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Maven
    }
}

/// Parse the dependency report of one or more configurations.
#[must_use]
pub fn parse_gradle_dependencies(content: &str) -> PackageSet {
    let mut builder = TreeBuilder::new();

    for line in content.lines() {
        let line = line.trim_end();
        let prefix = tree_prefix_len(line);
        if line.len() == prefix {
            continue;
        }
        // Unprefixed lines are configuration headers and build chatter,
        // except in flat listings where each coordinate is top-level
        let entry = &line[prefix..];
        let depth = prefix.div_ceil(5);

        if entry.starts_with("project ") {
            // Children of a sibling project are hoisted to top level
            debug!("Skipping project dependency '{entry}'");
            builder.close_to(depth);
            continue;
        }
        if entry.ends_with("(c)") || entry.ends_with("(n)") || entry.ends_with("FAILED") {
            continue;
        }
        match parse_entry(entry) {
            Some(record) => builder.push(depth, record),
            None => debug!("Skipping unrecognised gradle line: {line}"),
        }
    }

    PackageSet::from_packages(builder.finish().into_iter().map(|(_, r)| r).collect())
}

fn parse_entry(entry: &str) -> Option<PackageRecord> {
    let entry = entry.trim_end_matches("(*)").trim();
    let (coordinate, resolved) = match entry.split_once(" -> ") {
        Some((left, right)) => (left.trim(), right.split_whitespace().next()),
        None => (entry.split_whitespace().next()?, None),
    };

    let mut parts = coordinate.splitn(3, ':');
    let group = parts.next().filter(|s| !s.is_empty())?;
    let artifact = parts.next().filter(|s| !s.is_empty())?;
    let declared = parts.next().unwrap_or_default();
    let version = resolved.unwrap_or(declared);
    if version.is_empty() || version.contains('{') {
        return None;
    }

    Some(
        PackageRecord::new(Ecosystem::Maven, artifact)
            .with_group(group)
            .with_version(version)
            .with_qualifier("type", "jar"),
    )
}
