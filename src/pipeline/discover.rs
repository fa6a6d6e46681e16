//! Manifest discovery.

use crate::config::ScanConfig;
use crate::model::Ecosystem;
use crate::parsers::{FormatDetector, ManifestKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Manifests found in one project directory, ordered by kind then path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectManifests {
    pub dir: PathBuf,
    pub manifests: Vec<(ManifestKind, PathBuf)>,
}

impl ProjectManifests {
    /// Paths of one manifest kind
    pub fn of_kind(&self, kind: ManifestKind) -> impl Iterator<Item = &Path> {
        self.manifests
            .iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, p)| p.as_path())
    }

    /// First path of a manifest kind
    #[must_use]
    pub fn first(&self, kind: ManifestKind) -> Option<&Path> {
        self.of_kind(kind).next()
    }

    #[must_use]
    pub fn has(&self, kind: ManifestKind) -> bool {
        self.first(kind).is_some()
    }

    /// Ecosystems present in this directory
    #[must_use]
    pub fn ecosystems(&self) -> Vec<Ecosystem> {
        let mut ecosystems: Vec<Ecosystem> =
            self.manifests.iter().map(|(k, _)| k.ecosystem()).collect();
        ecosystems.sort();
        ecosystems.dedup();
        ecosystems
    }

    /// Keep only manifests of one ecosystem
    #[must_use]
    pub fn restricted_to(mut self, ecosystem: Ecosystem) -> Self {
        self.manifests.retain(|(k, _)| k.ecosystem() == ecosystem);
        self
    }
}

fn is_excluded(entry: &DirEntry, exclude_dirs: &[String]) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| exclude_dirs.iter().any(|d| d == name))
}

/// Find manifests under `root`, grouped by project directory.
///
/// Without `recurse` only the root project is reported, though manifests in
/// its `project/` and `requirements/` subdirectories still count. A file
/// path is treated as a single-manifest project in its parent directory.
#[must_use]
pub fn discover(root: &Path, scan: &ScanConfig) -> BTreeMap<PathBuf, ProjectManifests> {
    let detector = FormatDetector::new();
    let mut projects: BTreeMap<PathBuf, ProjectManifests> = BTreeMap::new();

    if root.is_file() {
        if let Some(kind) = detector.detect(root) {
            let dir = kind.project_dir(root);
            projects.insert(
                dir.clone(),
                ProjectManifests {
                    dir,
                    manifests: vec![(kind, root.to_path_buf())],
                },
            );
        }
        return projects;
    }

    // Depth 2 reaches `project/build.properties` and `requirements/*.txt`
    let max_depth = if scan.recurse { scan.max_depth.max(2) } else { 2 };
    let walker = WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e, &scan.exclude_dirs));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(kind) = detector.detect(entry.path()) else {
            continue;
        };
        let dir = kind.project_dir(entry.path());
        if !scan.recurse && dir != root {
            continue;
        }
        debug!("Found {kind:?} at {}", entry.path().display());
        projects
            .entry(dir.clone())
            .or_insert_with(|| ProjectManifests {
                dir,
                manifests: Vec::new(),
            })
            .manifests
            .push((kind, entry.into_path()));
    }

    for project in projects.values_mut() {
        project.manifests.sort();
    }
    projects
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    fn layout() -> TempDir {
        let tmp = TempDir::new().unwrap();
        for rel in [
            "package.json",
            "yarn.lock",
            "package-lock.json",
            "requirements/base.txt",
            "project/build.properties",
            "node_modules/left-pad/package.json",
            "services/api/go.mod",
            "services/api/go.sum",
            "README.md",
        ] {
            touch(tmp.path(), rel);
        }
        tmp
    }

    #[test]
    fn test_discover_root_only() {
        let tmp = layout();
        let projects = discover(tmp.path(), &ScanConfig::default());
        assert_eq!(projects.len(), 1);

        let root = &projects[tmp.path()];
        let kinds: Vec<ManifestKind> = root.manifests.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                ManifestKind::PackageLock,
                ManifestKind::YarnLock,
                ManifestKind::PackageJson,
                ManifestKind::SbtBuild,
                ManifestKind::Requirements,
            ]
        );
        assert_eq!(
            root.ecosystems(),
            vec![Ecosystem::Npm, Ecosystem::Maven, Ecosystem::Pypi]
        );
    }

    #[test]
    fn test_discover_recursive_skips_excluded() {
        let tmp = layout();
        let scan = ScanConfig {
            recurse: true,
            ..ScanConfig::default()
        };
        let projects = discover(tmp.path(), &scan);
        assert_eq!(projects.len(), 2);

        let api = &projects[&tmp.path().join("services/api")];
        assert!(api.has(ManifestKind::GoSum));
        assert!(api.has(ManifestKind::GoMod));
        assert!(
            !projects
                .keys()
                .any(|dir| dir.components().any(|c| c.as_os_str() == "node_modules"))
        );
    }

    #[test]
    fn test_discover_single_file() {
        let tmp = layout();
        let lock = tmp.path().join("yarn.lock");
        let projects = discover(&lock, &ScanConfig::default());
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[tmp.path()].manifests, vec![(ManifestKind::YarnLock, lock)]);
    }

    #[test]
    fn test_restricted_to() {
        let tmp = layout();
        let root = discover(tmp.path(), &ScanConfig::default())
            .remove(tmp.path())
            .unwrap()
            .restricted_to(Ecosystem::Pypi);
        assert_eq!(root.manifests.len(), 1);
        assert_eq!(root.ecosystems(), vec![Ecosystem::Pypi]);
    }
}
