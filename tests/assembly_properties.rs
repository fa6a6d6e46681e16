//! Property-based tests for component assembly.
//!
//! Random npm dependency forests are drawn from a small name pool so that
//! diamonds, repeated subtrees and cycle markers show up often.

use base64::{Engine, engine::general_purpose::STANDARD};
use depbom::{
    ComponentAssembler, ImportMap, PackageRecord, PackageSet, Purl,
    assembly::{normalize_digest, resolve_scope},
    model::{DependencyEdge, DependencyScope, Ecosystem},
};
use proptest::prelude::*;
use std::collections::HashSet;

const NAMES: &[&str] = &["a", "b", "c", "d", "stale-e", "@types/node"];
const VERSIONS: &[&str] = &["1.0.0", "2.0.0"];

fn npm(name: &str, version: &str) -> PackageRecord {
    PackageRecord::new(Ecosystem::Npm, name)
        .with_version(version)
        .extraneous(name.starts_with("stale-"))
}

fn leaf() -> impl Strategy<Value = PackageRecord> {
    (prop::sample::select(NAMES), prop::sample::select(VERSIONS))
        .prop_map(|(name, version)| npm(name, version))
}

fn tree() -> impl Strategy<Value = PackageRecord> {
    leaf().prop_recursive(4, 64, 4, |inner| {
        (leaf(), prop::collection::vec(inner, 0..4), any::<bool>()).prop_map(
            |(mut parent, children, cycle)| {
                for child in children {
                    parent.add_dependency(child);
                }
                if cycle {
                    let version = parent.version.clone().unwrap_or_default();
                    parent.add_cycle_ref(format!("{}-cycle", parent.name), version);
                }
                parent
            },
        )
    })
}

fn forest() -> impl Strategy<Value = Vec<PackageRecord>> {
    prop::collection::vec(tree(), 0..6)
}

fn all_purls(record: &PackageRecord, out: &mut HashSet<String>) {
    out.insert(Purl::for_record(record).to_string());
    for edge in record.dependencies.values() {
        if let DependencyEdge::Expanded(child) = edge {
            all_purls(child, out);
        }
    }
}

fn assemble(records: &[PackageRecord], root: Option<&PackageRecord>) -> Vec<String> {
    let mut assembler = ComponentAssembler::new();
    if let Some(root) = root {
        assembler = assembler.with_root(root);
    }
    assembler.add_set(&PackageSet::from_packages(records.to_vec()));
    assembler.finish().into_iter().map(|c| c.purl).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn purls_are_unique(records in forest()) {
        let purls = assemble(&records, None);
        let unique: HashSet<&String> = purls.iter().collect();
        prop_assert_eq!(unique.len(), purls.len());
    }

    #[test]
    fn components_come_from_the_input(records in forest()) {
        let mut known = HashSet::new();
        for record in &records {
            all_purls(record, &mut known);
        }
        for purl in assemble(&records, None) {
            prop_assert!(known.contains(&purl), "{} not in input", purl);
        }
    }

    #[test]
    fn excluded_records_never_appear(records in forest()) {
        for purl in assemble(&records, None) {
            prop_assert!(!purl.contains("stale-"), "extraneous {} emitted", purl);
            prop_assert!(!purl.contains("@types"), "types package {} emitted", purl);
        }
    }

    #[test]
    fn top_level_records_are_kept(records in forest()) {
        let purls: HashSet<String> = assemble(&records, None).into_iter().collect();
        for record in records.iter().filter(|r| !r.extraneous && !r.name.starts_with("@types/")) {
            let purl = Purl::for_record(record).to_string();
            prop_assert!(purls.contains(&purl), "{} missing", purl);
        }
    }

    #[test]
    fn root_is_never_a_component(records in forest()) {
        let root = npm("a", "1.0.0");
        let purls = assemble(&records, Some(&root));
        prop_assert!(!purls.iter().any(|p| p == "pkg:npm/a@1.0.0"));
    }

    #[test]
    fn assembly_is_deterministic(records in forest()) {
        prop_assert_eq!(assemble(&records, None), assemble(&records, None));
    }

    #[test]
    fn scope_follows_import_map(
        name in prop::sample::select(NAMES),
        imported in prop::collection::vec(prop::sample::select(NAMES), 1..4),
    ) {
        let mut imports = ImportMap::new();
        for package in &imported {
            imports.record(*package);
        }
        let record = npm(name, "1.0.0");
        let expected = if imported.contains(&name) {
            DependencyScope::Required
        } else {
            DependencyScope::Optional
        };
        prop_assert_eq!(resolve_scope(&record, Some(&imports)), Some(expected));
        prop_assert_eq!(resolve_scope(&record, None), None);
    }

    #[test]
    fn base64_digest_becomes_hex(bytes in prop::collection::vec(any::<u8>(), 16..=64)) {
        let encoded = STANDARD.encode(&bytes);
        prop_assert_eq!(normalize_digest(&encoded), Some(hex::encode(&bytes)));
    }

    #[test]
    fn hex_digest_passes_through(bytes in prop::sample::select(vec![20usize, 32, 64])
        .prop_flat_map(|len| prop::collection::vec(any::<u8>(), len)))
    {
        let lower = hex::encode(&bytes);
        prop_assert_eq!(normalize_digest(&lower), Some(lower.clone()));
        prop_assert_eq!(normalize_digest(&lower.to_ascii_uppercase()), Some(lower));
    }
}

#[test]
fn test_diamond_yields_one_component() {
    let shared = npm("d", "1.0.0");
    let mut left = npm("b", "1.0.0");
    left.add_dependency(shared.clone());
    let mut right = npm("c", "1.0.0");
    right.add_dependency(shared);
    let mut top = npm("a", "1.0.0");
    top.add_dependency(left);
    top.add_dependency(right);

    assert_eq!(
        assemble(&[top], None),
        vec![
            "pkg:npm/a@1.0.0",
            "pkg:npm/b@1.0.0",
            "pkg:npm/d@1.0.0",
            "pkg:npm/c@1.0.0",
        ]
    );
}

#[test]
fn test_mutual_cycle_terminates() {
    let mut b = npm("b", "1.0.0");
    b.add_cycle_ref("a", "1.0.0");
    let mut a = npm("a", "1.0.0");
    a.add_dependency(b);
    let mut self_ref = npm("c", "1.0.0");
    self_ref.add_cycle_ref("c", "1.0.0");

    assert_eq!(assemble(&[a, self_ref], None).len(), 3);
}

#[test]
fn test_extraneous_dependency_subtree_skipped() {
    let mut stale = npm("stale-e", "1.0.0");
    stale.add_dependency(npm("d", "2.0.0"));
    let mut top = npm("a", "1.0.0");
    top.add_dependency(stale);

    assert_eq!(assemble(&[top], None), vec!["pkg:npm/a@1.0.0"]);
}
