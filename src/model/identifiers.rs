//! Package-URL construction and npm name helpers.
//!
//! The purl is the deduplication key of the whole assembly stage, so it is
//! built from a record in exactly one place. Rendering is percent-decoded
//! for readability (`pkg:npm/@babel/core@7.24.0`), matching what the BOM
//! consumers of this tool expect to see in `bom-ref`.

use super::record::{Ecosystem, PackageRecord};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A package URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Purl {
    pub purl_type: &'static str,
    pub namespace: String,
    pub name: String,
    pub version: Option<String>,
    pub qualifiers: BTreeMap<String, String>,
    pub subpath: Option<String>,
}

impl Purl {
    /// Derive the purl for a record.
    ///
    /// Applies the per-type normalisation rules of the purl specification
    /// that matter for deduplication: PyPI names are lowercased with `_`
    /// folded to `-`; everything else is kept verbatim.
    #[must_use]
    pub fn for_record(record: &PackageRecord) -> Self {
        let (namespace, name) = match record.ecosystem {
            Ecosystem::Pypi => (String::new(), normalize_pypi_name(&record.name)),
            _ => (record.group.clone(), record.name.clone()),
        };
        Self {
            purl_type: record.ecosystem.purl_type(),
            namespace,
            name,
            version: record.version.clone(),
            qualifiers: record.qualifiers.clone(),
            subpath: record.subpath.clone(),
        }
    }

    /// Check the rendered purl with the `packageurl` parser.
    ///
    /// The decoded rendering is not always strictly valid (npm scopes keep
    /// their `@`), so callers only log the outcome.
    pub fn validate(&self) -> Result<(), String> {
        packageurl::PackageUrl::from_str(&self.to_string())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

impl fmt::Display for Purl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pkg:{}/", self.purl_type)?;
        if !self.namespace.is_empty() {
            write!(f, "{}/", self.namespace)?;
        }
        f.write_str(&self.name)?;
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        let mut qualifiers = self.qualifiers.iter().filter(|(_, v)| !v.is_empty());
        if let Some((k, v)) = qualifiers.next() {
            write!(f, "?{k}={v}")?;
            for (k, v) in qualifiers {
                write!(f, "&{k}={v}")?;
            }
        }
        if let Some(subpath) = &self.subpath {
            write!(f, "#{subpath}")?;
        }
        Ok(())
    }
}

/// PEP 503 style normalisation used by purl for PyPI
fn normalize_pypi_name(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

/// Split an npm package name into `(group, name)`.
///
/// `@babel/core` becomes `("@babel", "core")`; unscoped names get an empty
/// group.
#[must_use]
pub fn split_npm_name(full: &str) -> (String, String) {
    if let Some(rest) = full.strip_prefix('@')
        && let Some((scope, name)) = rest.split_once('/')
    {
        return (format!("@{scope}"), name.to_string());
    }
    (String::new(), full.to_string())
}

/// True for TypeScript declaration packages (`@types/*`).
#[must_use]
pub fn is_types_package(record: &PackageRecord) -> bool {
    record.ecosystem == Ecosystem::Npm
        && (record.group == "@types" || record.name.starts_with("@types/"))
}

/// Split a Go module path into `(group, name)` at the last `/`.
#[must_use]
pub fn split_go_module(path: &str) -> (String, String) {
    match path.rsplit_once('/') {
        Some((group, name)) => (group.to_string(), name.to_string()),
        None => (String::new(), path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npm_scoped_purl() {
        let (group, name) = split_npm_name("@babel/core");
        let record = PackageRecord::new(Ecosystem::Npm, name)
            .with_group(group)
            .with_version("7.24.0");
        assert_eq!(
            Purl::for_record(&record).to_string(),
            "pkg:npm/@babel/core@7.24.0"
        );
    }

    #[test]
    fn test_maven_purl_with_qualifiers() {
        let record = PackageRecord::new(Ecosystem::Maven, "netty-transport-native-epoll")
            .with_group("io.netty")
            .with_version("4.1.100.Final")
            .with_qualifier("type", "jar")
            .with_qualifier("classifier", "linux-x86_64");
        let purl = Purl::for_record(&record);
        assert_eq!(
            purl.to_string(),
            "pkg:maven/io.netty/netty-transport-native-epoll@4.1.100.Final?classifier=linux-x86_64&type=jar"
        );
        assert!(purl.validate().is_ok());
    }

    #[test]
    fn test_pypi_name_normalised() {
        let record = PackageRecord::new(Ecosystem::Pypi, "Typing_Extensions").with_version("4.9.0");
        assert_eq!(
            Purl::for_record(&record).to_string(),
            "pkg:pypi/typing-extensions@4.9.0"
        );
    }

    #[test]
    fn test_purl_without_version() {
        let record = PackageRecord::new(Ecosystem::Crates, "local-helper");
        assert_eq!(Purl::for_record(&record).to_string(), "pkg:cargo/local-helper");
    }

    #[test]
    fn test_split_npm_name_unscoped() {
        assert_eq!(split_npm_name("lodash"), (String::new(), "lodash".to_string()));
        assert_eq!(split_npm_name("@broken"), (String::new(), "@broken".to_string()));
    }

    #[test]
    fn test_types_packages_detected() {
        let scoped = PackageRecord::new(Ecosystem::Npm, "node").with_group("@types");
        let unsplit = PackageRecord::new(Ecosystem::Npm, "@types/node");
        let other = PackageRecord::new(Ecosystem::Npm, "types");
        let maven = PackageRecord::new(Ecosystem::Maven, "node").with_group("@types");
        assert!(is_types_package(&scoped));
        assert!(is_types_package(&unsplit));
        assert!(!is_types_package(&other));
        assert!(!is_types_package(&maven));
    }

    #[test]
    fn test_split_go_module() {
        assert_eq!(
            split_go_module("github.com/pkg/errors"),
            ("github.com/pkg".to_string(), "errors".to_string())
        );
        assert_eq!(split_go_module("rsc.io"), (String::new(), "rsc.io".to_string()));
    }
}
