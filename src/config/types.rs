//! Configuration types for depbom runs.
//!
//! One [`AppConfig`] is built at start-up (file, then environment, then CLI)
//! and passed by reference to every stage that needs it.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Where and how the BOM is written
    pub output: OutputConfig,
    /// External build tool commands and timeout
    pub tools: ToolsConfig,
    /// Build tool cache locations
    pub cache: CacheConfig,
    /// Project discovery
    pub scan: ScanConfig,
    /// Optional BOM submission target
    pub server: ServerConfig,
    /// Verbose diagnostics
    pub debug: bool,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the output path (stem for `both`).
    pub fn output_path(mut self, path: Option<PathBuf>) -> Self {
        self.config.output.path = path;
        self
    }

    pub const fn format(mut self, format: OutputFormat) -> Self {
        self.config.output.format = format;
        self
    }

    pub const fn deterministic(mut self, deterministic: bool) -> Self {
        self.config.output.deterministic = deterministic;
        self
    }

    pub fn author(mut self, author: Option<String>) -> Self {
        self.config.output.author = author;
        self
    }

    pub const fn recurse(mut self, recurse: bool) -> Self {
        self.config.scan.recurse = recurse;
        self
    }

    pub const fn scan_imports(mut self, enabled: bool) -> Self {
        self.config.scan.scan_imports = enabled;
        self
    }

    /// Set the external tool timeout in seconds.
    pub const fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.tools.timeout_secs = secs;
        self
    }

    pub fn server_url(mut self, url: Option<String>) -> Self {
        self.config.server.url = url;
        self
    }

    pub fn api_key(mut self, key: Option<String>) -> Self {
        self.config.server.api_key = key;
        self
    }

    pub fn project_name(mut self, name: Option<String>) -> Self {
        self.config.server.project_name = name;
        self
    }

    pub const fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Sub-configuration Types
// ============================================================================

/// Which BOM encodings to write
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Xml,
    Json,
    /// `<stem>.xml` and `<stem>.json`
    #[default]
    Both,
}

/// Output-related configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file path (None for stdout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub format: OutputFormat,
    /// Fixed timestamp and no serial number
    pub deterministic: bool,
    /// Author recorded in BOM metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// External build tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ToolsConfig {
    /// Timeout for each build tool invocation, in seconds
    #[schemars(range(min = 1))]
    pub timeout_secs: u64,
    /// Maven command
    pub maven: String,
    /// Gradle command; the project's `gradlew` wrapper is preferred when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradle: Option<String>,
    /// sbt command
    pub sbt: String,
}

/// Build tool cache locations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CacheConfig {
    /// Local Maven repository (`-Dmaven.repo.local`), also where jars are
    /// looked up for the namespace map
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maven_repo: Option<PathBuf>,
    /// Gradle user home (`GRADLE_USER_HOME`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradle_home: Option<PathBuf>,
}

/// Project discovery configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScanConfig {
    /// Look for manifests in subdirectories
    pub recurse: bool,
    /// Maximum directory depth when recursing
    #[schemars(range(min = 1))]
    pub max_depth: usize,
    /// Directory names never entered
    pub exclude_dirs: Vec<String>,
    /// Scan JS/TS sources to mark npm components required or optional
    pub scan_imports: bool,
}

/// BOM submission target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the BOM server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Sent as `X-Api-Key`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Project name on the server; defaults to the root package name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

impl ServerConfig {
    /// True if a submission target is configured
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}
