//! Package records produced by the format parsers.
//!
//! A [`PackageRecord`] is the common currency between every lockfile parser
//! and the assembly engine. Records may nest (npm lockfiles, Maven and Gradle
//! trees) or come as a flat list; nesting is expressed through
//! [`DependencyEdge`], which also carries cycle markers explicitly so the
//! traversal never has to guess.

use super::metadata::HashAlgorithm;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Package ecosystem a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Npm,
    Maven,
    Pypi,
    Golang,
    Crates,
    Composer,
    Rubygems,
    Nuget,
}

impl Ecosystem {
    /// Package-URL type for this ecosystem
    #[must_use]
    pub const fn purl_type(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Maven => "maven",
            Self::Pypi => "pypi",
            Self::Golang => "golang",
            Self::Crates => "cargo",
            Self::Composer => "composer",
            Self::Rubygems => "gem",
            Self::Nuget => "nuget",
        }
    }

    /// Canonical lowercase name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Maven => "maven",
            Self::Pypi => "pypi",
            Self::Golang => "golang",
            Self::Crates => "crates",
            Self::Composer => "composer",
            Self::Rubygems => "rubygems",
            Self::Nuget => "nuget",
        }
    }

    /// Resolve an ecosystem from a user-facing name or common alias
    /// (`js`, `java`, `python`, `go`, `rust`, `php`, `ruby`, `dotnet`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let eco = match name.trim().to_ascii_lowercase().as_str() {
            "npm" | "js" | "javascript" | "node" | "nodejs" | "ts" | "typescript" | "yarn"
            | "pnpm" => Self::Npm,
            "maven" | "java" | "mvn" | "gradle" | "sbt" | "scala" | "kotlin" | "jvm" => {
                Self::Maven
            }
            "pypi" | "python" | "py" | "pip" | "poetry" | "pipenv" => Self::Pypi,
            "golang" | "go" => Self::Golang,
            "crates" | "cargo" | "rust" => Self::Crates,
            "composer" | "php" => Self::Composer,
            "rubygems" | "ruby" | "gem" | "bundler" => Self::Rubygems,
            "nuget" | "dotnet" | ".net" | "csharp" | "c#" => Self::Nuget,
            _ => return None,
        };
        Some(eco)
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A license object as some lockfiles carry it (`{"type": "MIT", "url": ...}`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseObject {
    /// License identifier or name
    pub id: Option<String>,
    /// URL to the license text
    pub url: Option<String>,
}

/// License information in whatever shape the source format provides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawLicense {
    #[default]
    None,
    /// A single string, possibly an SPDX expression
    Text(String),
    /// A list of license strings
    List(Vec<String>),
    /// Structured license objects
    Structured(Vec<LicenseObject>),
}

impl RawLicense {
    /// Build from a list, collapsing empty input to `None`
    #[must_use]
    pub fn from_list(items: Vec<String>) -> Self {
        let items: Vec<String> = items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        match items.len() {
            0 => Self::None,
            1 => Self::Text(items.into_iter().next().unwrap_or_default()),
            _ => Self::List(items),
        }
    }

    /// Returns true if no license data is present
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// A digest whose algorithm is known but whose encoding (hex or base64) is not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDigest {
    pub algorithm: HashAlgorithm,
    pub value: String,
}

impl RawDigest {
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, value: impl Into<String>) -> Self {
        Self {
            algorithm,
            value: value.into(),
        }
    }
}

/// Integrity data attached to a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integrity {
    /// Raw SHA-1 digest (npm `_shasum`, yarn `#sha1` fragment, composer dist)
    pub shasum: Option<String>,
    /// Subresource-integrity string (`sha512-... sha1-...`)
    pub sri: Option<String>,
    /// Digests with an explicit algorithm (go.sum, Cargo.lock, pip hashes)
    pub digests: Vec<RawDigest>,
}

impl Integrity {
    /// Returns true if no integrity data is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shasum.is_none() && self.sri.is_none() && self.digests.is_empty()
    }
}

/// Edge from a record to one of its dependencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DependencyEdge {
    /// The dependency is described in full
    Expanded(Box<PackageRecord>),
    /// Back-reference to a package described elsewhere; never traversed
    CycleRef(String),
}

impl DependencyEdge {
    /// The expanded record, if this edge is not a cycle marker
    #[must_use]
    pub fn record(&self) -> Option<&PackageRecord> {
        match self {
            Self::Expanded(record) => Some(record),
            Self::CycleRef(_) => None,
        }
    }
}

/// One dependency as read from a manifest or lockfile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub ecosystem: Ecosystem,
    /// Namespace or organisation, empty when the ecosystem has none
    pub group: String,
    pub name: String,
    /// Absent for path/workspace dependencies and for some root packages
    pub version: Option<String>,
    /// Package-URL qualifiers (Maven `type`/`classifier`, gem `platform`)
    pub qualifiers: BTreeMap<String, String>,
    pub subpath: Option<String>,
    pub integrity: Integrity,
    /// Present on disk but not part of the install; excluded with its subtree
    pub extraneous: bool,
    pub license: RawLicense,
    pub dependencies: IndexMap<String, DependencyEdge>,
    pub homepage: Option<String>,
    pub bug_tracker: Option<String>,
    pub repository: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
}

impl PackageRecord {
    /// Create a record with just an ecosystem and a name
    pub fn new(ecosystem: Ecosystem, name: impl Into<String>) -> Self {
        Self {
            ecosystem,
            group: String::new(),
            name: name.into(),
            version: None,
            qualifiers: BTreeMap::new(),
            subpath: None,
            integrity: Integrity::default(),
            extraneous: false,
            license: RawLicense::None,
            dependencies: IndexMap::new(),
            homepage: None,
            bug_tracker: None,
            repository: None,
            description: None,
            keywords: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Set the version; empty strings are treated as absent
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.version = if version.trim().is_empty() {
            None
        } else {
            Some(version.trim().to_string())
        };
        self
    }

    #[must_use]
    pub fn with_qualifier(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.qualifiers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_license(mut self, license: RawLicense) -> Self {
        self.license = license;
        self
    }

    #[must_use]
    pub fn with_digest(mut self, digest: RawDigest) -> Self {
        self.integrity.digests.push(digest);
        self
    }

    #[must_use]
    pub const fn extraneous(mut self, extraneous: bool) -> Self {
        self.extraneous = extraneous;
        self
    }

    /// Attach an expanded child dependency
    pub fn add_dependency(&mut self, child: Self) {
        let key = child.display_name();
        self.dependencies
            .insert(key, DependencyEdge::Expanded(Box::new(child)));
    }

    /// Attach a cycle marker pointing at an already-described package
    pub fn add_cycle_ref(&mut self, name: impl Into<String>, target: impl Into<String>) {
        self.dependencies
            .insert(name.into(), DependencyEdge::CycleRef(target.into()));
    }

    /// `group/name` (or `group:name` for Maven), or just `name`
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.group.is_empty() {
            self.name.clone()
        } else if self.ecosystem == Ecosystem::Maven {
            format!("{}:{}", self.group, self.name)
        } else {
            format!("{}/{}", self.group, self.name)
        }
    }

    /// Number of records in this subtree, the record itself included
    #[must_use]
    pub fn tree_size(&self) -> usize {
        1 + self
            .dependencies
            .values()
            .filter_map(DependencyEdge::record)
            .map(Self::tree_size)
            .sum::<usize>()
    }
}

/// Output of a single parser run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageSet {
    /// The project itself, when the file describes it
    pub root: Option<PackageRecord>,
    /// Top-level dependency records (possibly nested further)
    pub packages: Vec<PackageRecord>,
    /// File the records were read from
    pub source: Option<PathBuf>,
}

impl PackageSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_root(mut self, root: PackageRecord) -> Self {
        self.root = Some(root);
        self
    }

    #[must_use]
    pub fn from_packages(packages: Vec<PackageRecord>) -> Self {
        Self {
            packages,
            ..Self::default()
        }
    }

    pub fn push(&mut self, record: PackageRecord) {
        self.packages.push(record);
    }

    /// True if there is neither a root nor any package
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.packages.is_empty()
    }

    /// Total number of records including nested ones (root excluded)
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.packages.iter().map(PackageRecord::tree_size).sum()
    }
}
