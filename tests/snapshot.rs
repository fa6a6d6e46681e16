//! Snapshot of the deterministic JSON rendering.

use depbom::{
    Bom, BomOptions, ComponentAssembler, ImportMap, PackageRecord,
    assembly::root_component,
    model::{Ecosystem, HashAlgorithm, RawDigest, RawLicense},
};

fn sample_bom() -> Bom {
    let mut root = PackageRecord::new(Ecosystem::Npm, "web").with_version("2.0.0");
    root.homepage = Some("https://example.com/web".to_string());

    let mut left_pad = PackageRecord::new(Ecosystem::Npm, "left-pad")
        .with_version("1.3.0")
        .with_license(RawLicense::Text("WTFPL".to_string()));
    left_pad.description = Some("String left pad".to_string());

    let mut core = PackageRecord::new(Ecosystem::Npm, "core")
        .with_group("@acme")
        .with_version("1.2.0")
        .with_license(RawLicense::Text("MIT OR Apache-2.0".to_string()))
        .with_digest(RawDigest::new(
            HashAlgorithm::Sha1,
            "0123456789ABCDEF0123456789ABCDEF01234567",
        ));
    core.repository = Some("https://github.com/acme/core".to_string());
    core.add_dependency(left_pad);

    let mut imports = ImportMap::new();
    imports.record("@acme/core");

    let mut assembler = ComponentAssembler::new()
        .with_imports(Some(&imports))
        .with_root(&root);
    assembler.add_record(&core);
    let components = assembler.finish();

    Bom::new(
        components,
        Some(root_component(&root)),
        &BomOptions::default()
            .deterministic(true)
            .with_author("Release Bot"),
    )
}

#[test]
fn snapshot_deterministic_json() {
    let json = sample_bom()
        .to_json()
        .expect("render JSON")
        .replace(
            &format!("\"{}\"", env!("CARGO_PKG_VERSION")),
            "\"[version]\"",
        );

    insta::assert_snapshot!(json, @r#"
    {
      "bomFormat": "CycloneDX",
      "specVersion": "1.2",
      "version": 1,
      "metadata": {
        "timestamp": "1970-01-01T00:00:00.000Z",
        "tools": [
          {
            "vendor": "depbom",
            "name": "depbom",
            "version": "[version]"
          }
        ],
        "authors": [
          {
            "name": "Release Bot"
          }
        ],
        "component": {
          "type": "application",
          "bom-ref": "pkg:npm/web@2.0.0",
          "group": "",
          "name": "web",
          "version": "2.0.0",
          "purl": "pkg:npm/web@2.0.0",
          "externalReferences": [
            {
              "type": "website",
              "url": "https://example.com/web"
            }
          ]
        }
      },
      "components": [
        {
          "type": "library",
          "bom-ref": "pkg:npm/@acme/core@1.2.0",
          "group": "@acme",
          "name": "core",
          "version": "1.2.0",
          "scope": "required",
          "hashes": [
            {
              "alg": "SHA-1",
              "content": "0123456789abcdef0123456789abcdef01234567"
            }
          ],
          "licenses": [
            {
              "expression": "MIT OR Apache-2.0"
            }
          ],
          "purl": "pkg:npm/@acme/core@1.2.0",
          "externalReferences": [
            {
              "type": "vcs",
              "url": "https://github.com/acme/core"
            }
          ]
        },
        {
          "type": "library",
          "bom-ref": "pkg:npm/left-pad@1.3.0",
          "group": "",
          "name": "left-pad",
          "version": "1.3.0",
          "description": "String left pad",
          "scope": "optional",
          "licenses": [
            {
              "license": {
                "id": "WTFPL"
              }
            }
          ],
          "purl": "pkg:npm/left-pad@1.3.0"
        }
      ],
      "externalReferences": [
        {
          "type": "website",
          "url": "https://example.com/web"
        }
      ]
    }
    "#);
}

#[test]
fn snapshot_xml_is_stable() {
    let first = sample_bom().to_xml().expect("render XML");
    let second = sample_bom().to_xml().expect("render XML");
    assert_eq!(first, second);
    assert!(first.contains(r#"<component type="library" bom-ref="pkg:npm/@acme/core@1.2.0">"#));
    assert!(first.contains("<expression>MIT OR Apache-2.0</expression>"));
    assert!(first.contains("<scope>optional</scope>"));
}
