//! Component assembly and deduplication.
//!
//! [`ComponentAssembler`] walks package record forests depth-first and
//! collects one [`Component`] per package URL. The first record seen for a
//! purl wins; later encounters, and everything below them, are ignored.
//! Extraneous records, npm `@types/*` packages and the project root itself
//! never become components, and cycle markers are never followed.
//!
//! ```
//! use depbom::assembly::ComponentAssembler;
//! use depbom::model::{Ecosystem, PackageRecord, PackageSet};
//!
//! let mut a = PackageRecord::new(Ecosystem::Npm, "a").with_version("1.0.0");
//! a.add_dependency(PackageRecord::new(Ecosystem::Npm, "b").with_version("2.0.0"));
//! a.add_cycle_ref("a", "1.0.0");
//!
//! let mut assembler = ComponentAssembler::new();
//! assembler.add_set(&PackageSet::from_packages(vec![a]));
//! assert_eq!(assembler.finish().len(), 2);
//! ```

mod enrich;

pub use enrich::{
    component_for, component_type_for, external_references_for, hashes_for, licenses_for,
    normalize_digest, parse_integrity, root_component,
};

use crate::imports::ImportMap;
use crate::model::{
    Component, DependencyEdge, DependencyScope, Ecosystem, PackageRecord, PackageSet, Purl,
    is_types_package,
};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// Decide the usage scope of a record from an import map.
///
/// Only npm components get a scope, and only when a non-empty map is
/// available: `required` when the package name (alone, or joined with its
/// scope as `@scope/name`) was imported, `optional` otherwise.
#[must_use]
pub fn resolve_scope(record: &PackageRecord, imports: Option<&ImportMap>) -> Option<DependencyScope> {
    let imports = imports.filter(|m| !m.is_empty())?;
    if record.ecosystem != Ecosystem::Npm {
        return None;
    }

    let mut candidates = vec![record.name.clone()];
    if !record.group.is_empty() {
        candidates.push(format!("{}/{}", record.group, record.name));
        if !record.group.starts_with('@') {
            candidates.push(format!("@{}/{}", record.group, record.name));
        }
    }

    if candidates.iter().any(|c| imports.contains(c)) {
        Some(DependencyScope::Required)
    } else {
        Some(DependencyScope::Optional)
    }
}

/// Collects components from one or more package sets.
#[derive(Debug, Default)]
pub struct ComponentAssembler<'a> {
    imports: Option<&'a ImportMap>,
    root_purl: Option<String>,
    components: IndexMap<String, Component>,
    duplicates: usize,
}

impl<'a> ComponentAssembler<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an import map for scope resolution
    #[must_use]
    pub fn with_imports(mut self, imports: Option<&'a ImportMap>) -> Self {
        self.imports = imports;
        self
    }

    /// Exclude the project's own record from the component list
    #[must_use]
    pub fn with_root(mut self, root: &PackageRecord) -> Self {
        self.root_purl = Some(Purl::for_record(root).to_string());
        self
    }

    /// Add every package of a set. A set's root is metadata and is skipped.
    pub fn add_set(&mut self, set: &PackageSet) {
        if self.root_purl.is_none()
            && let Some(root) = &set.root
        {
            self.root_purl = Some(Purl::for_record(root).to_string());
        }
        for record in &set.packages {
            self.add_record(record);
        }
    }

    /// Walk a record and its expanded dependencies in pre-order.
    pub fn add_record(&mut self, record: &PackageRecord) {
        let mut stack: Vec<&PackageRecord> = vec![record];

        while let Some(current) = stack.pop() {
            if current.extraneous {
                debug!("Skipping extraneous {}", current.display_name());
                continue;
            }
            if is_types_package(current) {
                continue;
            }
            if current.name.trim().is_empty() {
                warn!("Skipping {} record without a name", current.ecosystem);
                continue;
            }

            let purl = Purl::for_record(current);
            let key = purl.to_string();
            if self.root_purl.as_deref() == Some(key.as_str()) {
                continue;
            }
            if !self.add_component(current, &purl, key) {
                continue;
            }

            // Reverse so the first listed dependency is visited first
            let children: Vec<&PackageRecord> = current
                .dependencies
                .values()
                .filter_map(DependencyEdge::record)
                .collect();
            stack.extend(children.into_iter().rev());
        }
    }

    /// Insert the component for `record` unless its purl is already known.
    ///
    /// Returns `true` if the component was new.
    fn add_component(&mut self, record: &PackageRecord, purl: &Purl, key: String) -> bool {
        if self.components.contains_key(&key) {
            self.duplicates += 1;
            return false;
        }
        if let Err(e) = purl.validate() {
            debug!("Package URL {key} does not validate: {e}");
        }
        let mut component = component_for(record, purl);
        component.scope = resolve_scope(record, self.imports);
        self.components.insert(key, component);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    #[must_use]
    pub fn contains(&self, purl: &str) -> bool {
        self.components.contains_key(purl)
    }

    /// Components in first-seen order
    #[must_use]
    pub fn finish(self) -> Vec<Component> {
        if self.duplicates > 0 {
            info!(
                "Assembled {} components ({} repeated encounters merged)",
                self.components.len(),
                self.duplicates
            );
        }
        self.components.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npm(name: &str, version: &str) -> PackageRecord {
        PackageRecord::new(Ecosystem::Npm, name).with_version(version)
    }

    #[test]
    fn test_diamond_collapses_to_one_component() {
        let shared = npm("shared", "1.0.0");
        let mut left = npm("left", "1.0.0");
        left.add_dependency(shared.clone());
        let mut right = npm("right", "1.0.0");
        right.add_dependency(shared);

        let mut assembler = ComponentAssembler::new();
        assembler.add_set(&PackageSet::from_packages(vec![left, right]));
        let components = assembler.finish();
        let purls: Vec<&str> = components.iter().map(|c| c.purl.as_str()).collect();
        assert_eq!(
            purls,
            vec![
                "pkg:npm/left@1.0.0",
                "pkg:npm/shared@1.0.0",
                "pkg:npm/right@1.0.0"
            ]
        );
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut first = npm("dup", "1.0.0");
        first.description = Some("first".into());
        let mut second = npm("dup", "1.0.0");
        second.description = Some("second".into());

        let mut assembler = ComponentAssembler::new();
        assembler.add_record(&first);
        assembler.add_record(&second);
        let components = assembler.finish();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].description.as_deref(), Some("first"));
    }

    #[test]
    fn test_extraneous_subtree_excluded() {
        let mut dev = npm("devtool", "1.0.0").extraneous(true);
        dev.add_dependency(npm("only-dev", "1.0.0"));
        let mut app_dep = npm("runtime", "1.0.0");
        app_dep.add_dependency(dev);

        let mut assembler = ComponentAssembler::new();
        assembler.add_record(&app_dep);
        assert!(assembler.contains("pkg:npm/runtime@1.0.0"));
        assert!(!assembler.contains("pkg:npm/devtool@1.0.0"));
        assert!(!assembler.contains("pkg:npm/only-dev@1.0.0"));
    }

    #[test]
    fn test_types_packages_and_root_excluded() {
        let root = npm("my-app", "0.1.0");
        let types = npm("node", "20.0.0").with_group("@types");
        let set = PackageSet::from_packages(vec![types, npm("my-app", "0.1.0"), npm("ok", "1.0.0")])
            .with_root(root);

        let mut assembler = ComponentAssembler::new();
        assembler.add_set(&set);
        let components = assembler.finish();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name, "ok");
    }

    #[test]
    fn test_scope_resolution() {
        let imports: ImportMap = [("left-pad", 1usize), ("@angular/core", 3)].into_iter().collect();
        let left = npm("left-pad", "1.3.0");
        let right = npm("right-pad", "1.0.0");
        let angular = npm("core", "17.0.0").with_group("@angular");

        assert_eq!(resolve_scope(&left, Some(&imports)), Some(DependencyScope::Required));
        assert_eq!(resolve_scope(&right, Some(&imports)), Some(DependencyScope::Optional));
        assert_eq!(resolve_scope(&angular, Some(&imports)), Some(DependencyScope::Required));
        assert_eq!(resolve_scope(&left, None), None);
        assert_eq!(resolve_scope(&left, Some(&ImportMap::new())), None);
    }

    #[test]
    fn test_scope_applied_during_assembly() {
        let imports: ImportMap = [("left-pad", 1usize)].into_iter().collect();
        let mut assembler = ComponentAssembler::new().with_imports(Some(&imports));
        assembler.add_record(&npm("left-pad", "1.3.0"));
        assembler.add_record(&npm("right-pad", "1.0.0"));
        let components = assembler.finish();
        assert_eq!(components[0].scope, Some(DependencyScope::Required));
        assert_eq!(components[1].scope, Some(DependencyScope::Optional));
    }
}
