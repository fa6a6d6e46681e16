//! Parser trait definitions and error types.

use crate::model::{Ecosystem, PackageSet};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while parsing a manifest or lockfile
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("JSON parse error: {0}")]
    JsonError(String),

    #[error("XML parse error: {0}")]
    XmlError(String),

    #[error("YAML parse error: {0}")]
    YamlError(String),

    #[error("TOML parse error: {0}")]
    TomlError(String),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml_ng::Error> for ParseError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

impl From<toml::de::Error> for ParseError {
    fn from(err: toml::de::Error) -> Self {
        Self::TomlError(err.to_string())
    }
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlError(err.to_string())
    }
}

/// Trait for manifest and lockfile parsers.
///
/// Implementors only need `parse_str`; reading from disk and recording the
/// source path is shared.
pub trait LockfileParser {
    /// Parse a file from disk
    fn parse(&self, path: &Path) -> Result<PackageSet, ParseError> {
        let content = std::fs::read_to_string(path)?;
        let mut set = self.parse_str(&content)?;
        set.source = Some(path.to_path_buf());
        Ok(set)
    }

    /// Parse file content
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError>;

    /// Human-readable format name (usually the file name it reads)
    fn format_name(&self) -> &'static str;

    /// Ecosystem every record of this parser belongs to
    fn ecosystem(&self) -> Ecosystem;
}
