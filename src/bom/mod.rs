//! CycloneDX 1.2 BOM envelope and its two encodings.
//!
//! A [`Bom`] is built once from the assembled components and rendered
//! independently to XML ([`render_xml`]) and JSON ([`render_json`]). Both
//! renderers read the same values; only the structural conventions differ
//! (attributes and CDATA in XML, plain keys in JSON).

mod json;
mod xml;

pub use json::render_json;
pub use xml::render_xml;

use crate::error::Result;
use crate::model::{Author, Component, ExternalReference, Tool};
use chrono::{SecondsFormat, Utc};

/// CycloneDX specification version emitted
pub const SPEC_VERSION: &str = "1.2";

/// XML namespace of the emitted schema version
pub const XML_NAMESPACE: &str = "http://cyclonedx.org/schema/bom/1.2";

/// Timestamp written in deterministic mode
pub const DETERMINISTIC_TIMESTAMP: &str = "1970-01-01T00:00:00.000Z";

/// Options controlling the BOM envelope
#[derive(Debug, Clone, Default)]
pub struct BomOptions {
    /// Fixed timestamp and no serial number, for reproducible output
    pub deterministic: bool,
    pub tool: Tool,
    pub authors: Vec<Author>,
}

impl BomOptions {
    #[must_use]
    pub fn deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

    #[must_use]
    pub fn with_author(mut self, name: impl Into<String>) -> Self {
        self.authors.push(Author { name: name.into() });
        self
    }
}

/// BOM `metadata` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomMetadata {
    pub timestamp: String,
    pub tools: Vec<Tool>,
    pub authors: Vec<Author>,
    /// The project itself
    pub component: Option<Component>,
}

/// A complete bill of materials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bom {
    /// `urn:uuid:...`, absent in deterministic mode
    pub serial_number: Option<String>,
    pub version: u32,
    pub metadata: BomMetadata,
    pub components: Vec<Component>,
    /// References of the project itself
    pub external_refs: Vec<ExternalReference>,
}

impl Bom {
    /// Wrap assembled components and the optional root component.
    #[must_use]
    pub fn new(components: Vec<Component>, root: Option<Component>, options: &BomOptions) -> Self {
        let (serial_number, timestamp) = if options.deterministic {
            (None, DETERMINISTIC_TIMESTAMP.to_string())
        } else {
            (
                Some(format!("urn:uuid:{}", uuid::Uuid::new_v4())),
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            )
        };
        let external_refs = root
            .as_ref()
            .map(|r| r.external_refs.clone())
            .unwrap_or_default();

        Self {
            serial_number,
            version: 1,
            metadata: BomMetadata {
                timestamp,
                tools: vec![options.tool.clone()],
                authors: options.authors.clone(),
                component: root,
            },
            components,
            external_refs,
        }
    }

    /// Number of components (the root excluded)
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn to_xml(&self) -> Result<String> {
        render_xml(self)
    }

    pub fn to_json(&self) -> Result<String> {
        render_json(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Ecosystem, ExternalRefType};

    #[test]
    fn test_deterministic_envelope() {
        let options = BomOptions::default().deterministic(true);
        let bom = Bom::new(Vec::new(), None, &options);
        assert_eq!(bom.serial_number, None);
        assert_eq!(bom.metadata.timestamp, DETERMINISTIC_TIMESTAMP);
        assert_eq!(bom.version, 1);
        assert_eq!(bom.metadata.tools.len(), 1);
    }

    #[test]
    fn test_timestamped_envelope() {
        let bom = Bom::new(Vec::new(), None, &BomOptions::default());
        let serial = bom.serial_number.as_deref().unwrap();
        assert!(serial.starts_with("urn:uuid:"));
        assert_eq!(serial.len(), "urn:uuid:".len() + 36);
        assert!(bom.metadata.timestamp.ends_with('Z'));
        assert_ne!(bom.metadata.timestamp, DETERMINISTIC_TIMESTAMP);
    }

    #[test]
    fn test_root_references_lifted_to_bom() {
        let mut root = Component::new(Ecosystem::Npm, "app", "pkg:npm/app@1.0.0");
        root.external_refs
            .push(ExternalReference::new(ExternalRefType::Vcs, "https://git.example/app"));
        let bom = Bom::new(Vec::new(), Some(root), &BomOptions::default());
        assert_eq!(bom.external_refs.len(), 1);
        assert!(bom.metadata.component.is_some());
    }
}
