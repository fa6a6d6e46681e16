//! JSON encoding.
//!
//! Serializes borrowed views of the BOM so the canonical model stays free
//! of CycloneDX naming conventions.

use super::{Bom, SPEC_VERSION};
use crate::error::{DepBomError, RenderErrorKind, Result};
use crate::model::{Author, Component, ExternalReference, Hash, LicenseChoice, Tool};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CdxBom<'a> {
    bom_format: &'static str,
    spec_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    serial_number: Option<&'a str>,
    version: u32,
    metadata: CdxMetadata<'a>,
    components: Vec<CdxComponent<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    external_references: Vec<CdxExternalReference<'a>>,
}

#[derive(Serialize)]
struct CdxMetadata<'a> {
    timestamp: &'a str,
    tools: Vec<CdxTool<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    authors: Vec<CdxAuthor<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    component: Option<CdxComponent<'a>>,
}

#[derive(Serialize)]
struct CdxTool<'a> {
    vendor: &'a str,
    name: &'a str,
    version: &'a str,
}

#[derive(Serialize)]
struct CdxAuthor<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CdxComponent<'a> {
    #[serde(rename = "type")]
    component_type: &'static str,
    #[serde(rename = "bom-ref")]
    bom_ref: &'a str,
    group: &'a str,
    name: &'a str,
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hashes: Vec<CdxHash<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    licenses: Vec<CdxLicenseChoice<'a>>,
    purl: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    external_references: Vec<CdxExternalReference<'a>>,
}

#[derive(Serialize)]
struct CdxHash<'a> {
    alg: String,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum CdxLicenseChoice<'a> {
    License(CdxLicense<'a>),
    Expression(&'a str),
}

#[derive(Serialize)]
struct CdxLicense<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

#[derive(Serialize)]
struct CdxExternalReference<'a> {
    #[serde(rename = "type")]
    ref_type: String,
    url: &'a str,
}

impl<'a> From<&'a Tool> for CdxTool<'a> {
    fn from(tool: &'a Tool) -> Self {
        Self {
            vendor: &tool.vendor,
            name: &tool.name,
            version: &tool.version,
        }
    }
}

impl<'a> From<&'a Author> for CdxAuthor<'a> {
    fn from(author: &'a Author) -> Self {
        Self { name: &author.name }
    }
}

impl<'a> From<&'a Hash> for CdxHash<'a> {
    fn from(hash: &'a Hash) -> Self {
        Self {
            alg: hash.algorithm.to_string(),
            content: &hash.value,
        }
    }
}

impl<'a> From<&'a LicenseChoice> for CdxLicenseChoice<'a> {
    fn from(choice: &'a LicenseChoice) -> Self {
        match choice {
            LicenseChoice::License { id, name, url } => Self::License(CdxLicense {
                id: id.as_deref(),
                name: name.as_deref(),
                url: url.as_deref(),
            }),
            LicenseChoice::Expression(expr) => Self::Expression(expr),
        }
    }
}

impl<'a> From<&'a ExternalReference> for CdxExternalReference<'a> {
    fn from(reference: &'a ExternalReference) -> Self {
        Self {
            ref_type: reference.ref_type.to_string(),
            url: &reference.url,
        }
    }
}

impl<'a> From<&'a Component> for CdxComponent<'a> {
    fn from(c: &'a Component) -> Self {
        Self {
            component_type: c.component_type.as_str(),
            bom_ref: &c.bom_ref,
            group: &c.group,
            name: &c.name,
            version: &c.version,
            description: c.description.as_deref(),
            scope: c.scope.map(|s| s.to_string()),
            hashes: c.hashes.iter().map(Into::into).collect(),
            licenses: c.licenses.iter().map(Into::into).collect(),
            purl: &c.purl,
            external_references: c.external_refs.iter().map(Into::into).collect(),
        }
    }
}

/// Render the BOM as pretty-printed CycloneDX JSON.
pub fn render_json(bom: &Bom) -> Result<String> {
    let doc = CdxBom {
        bom_format: "CycloneDX",
        spec_version: SPEC_VERSION,
        serial_number: bom.serial_number.as_deref(),
        version: bom.version,
        metadata: CdxMetadata {
            timestamp: &bom.metadata.timestamp,
            tools: bom.metadata.tools.iter().map(Into::into).collect(),
            authors: bom.metadata.authors.iter().map(Into::into).collect(),
            component: bom.metadata.component.as_ref().map(Into::into),
        },
        components: bom.components.iter().map(Into::into).collect(),
        external_references: bom.external_refs.iter().map(Into::into).collect(),
    };
    serde_json::to_string_pretty(&doc)
        .map_err(|e| DepBomError::render("serializing JSON", RenderErrorKind::Json(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::BomOptions;
    use crate::model::{DependencyScope, Ecosystem, HashAlgorithm};
    use serde_json::Value;

    fn sample_component() -> Component {
        let mut c = Component::new(Ecosystem::Npm, "left-pad", "pkg:npm/left-pad@1.3.0");
        c.version = "1.3.0".into();
        c.scope = Some(DependencyScope::Required);
        c.hashes
            .push(Hash::new(HashAlgorithm::Sha1, "5b9f8d5b4e6c".into()));
        c.licenses.push(LicenseChoice::License {
            id: Some("WTFPL".into()),
            name: None,
            url: None,
        });
        c
    }

    #[test]
    fn test_json_shape() {
        let bom = Bom::new(
            vec![sample_component()],
            None,
            &BomOptions::default().deterministic(true),
        );
        let value: Value = serde_json::from_str(&render_json(&bom).unwrap()).unwrap();
        assert_eq!(value["bomFormat"], "CycloneDX");
        assert_eq!(value["specVersion"], "1.2");
        assert_eq!(value["version"], 1);
        assert!(value.get("serialNumber").is_none());
        assert!(value.get("externalReferences").is_none());

        let component = &value["components"][0];
        assert_eq!(component["type"], "library");
        assert_eq!(component["bom-ref"], "pkg:npm/left-pad@1.3.0");
        assert_eq!(component["group"], "");
        assert_eq!(component["scope"], "required");
        assert_eq!(component["hashes"][0]["alg"], "SHA-1");
        assert_eq!(component["licenses"][0]["license"]["id"], "WTFPL");
        assert!(component.get("externalReferences").is_none());
        assert!(component.get("description").is_none());
    }

    #[test]
    fn test_expression_license() {
        let mut c = sample_component();
        c.licenses = vec![LicenseChoice::Expression("MIT OR Apache-2.0".into())];
        c.scope = None;
        let bom = Bom::new(vec![c], None, &BomOptions::default());
        let value: Value = serde_json::from_str(&render_json(&bom).unwrap()).unwrap();
        assert_eq!(
            value["components"][0]["licenses"][0]["expression"],
            "MIT OR Apache-2.0"
        );
        assert!(value["components"][0].get("scope").is_none());
        assert!(value["serialNumber"].as_str().unwrap().starts_with("urn:uuid:"));
    }
}
