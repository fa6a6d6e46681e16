//! The assembled, deduplicated output unit.

use super::license::LicenseChoice;
use super::metadata::{ComponentType, DependencyScope, ExternalReference, Hash};
use super::record::Ecosystem;
use serde::{Deserialize, Serialize};

/// A component as it appears in the BOM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// BOM reference, equal to the purl
    pub bom_ref: String,
    pub component_type: ComponentType,
    pub ecosystem: Ecosystem,
    /// Always present, possibly empty
    pub group: String,
    pub name: String,
    /// Empty only for path/workspace packages
    pub version: String,
    pub description: Option<String>,
    /// Absent when no import information was supplied
    pub scope: Option<DependencyScope>,
    pub hashes: Vec<Hash>,
    pub licenses: Vec<LicenseChoice>,
    pub purl: String,
    pub external_refs: Vec<ExternalReference>,
}

impl Component {
    /// Minimal component for the given identity
    #[must_use]
    pub fn new(ecosystem: Ecosystem, name: impl Into<String>, purl: impl Into<String>) -> Self {
        let purl = purl.into();
        Self {
            bom_ref: purl.clone(),
            component_type: ComponentType::Library,
            ecosystem,
            group: String::new(),
            name: name.into(),
            version: String::new(),
            description: None,
            scope: None,
            hashes: Vec::new(),
            licenses: Vec::new(),
            purl,
            external_refs: Vec::new(),
        }
    }
}
