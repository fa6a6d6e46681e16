//! Configuration module for depbom.
//!
//! This module provides a unified configuration system with:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - YAML config file loading and discovery
//! - Environment and CLI overrides
//!
//! # Quick Start
//!
//! ```rust
//! use depbom::config::{AppConfig, Validatable};
//!
//! let config = AppConfig::builder()
//!     .deterministic(true)
//!     .recurse(true)
//!     .build();
//! assert!(config.is_valid());
//! ```
//!
//! # Configuration File
//!
//! Place a `.depbom.yaml` file in your project root or `~/.config/depbom/`:
//!
//! ```yaml
//! output:
//!   format: both
//!   deterministic: true
//! tools:
//!   timeout_secs: 900
//!   maven: ./mvnw
//! scan:
//!   recurse: true
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::{DEFAULT_EXCLUDE_DIRS, DEFAULT_MAX_DEPTH, DEFAULT_TOOL_TIMEOUT_SECS};
pub use types::{
    AppConfig, AppConfigBuilder, CacheConfig, OutputConfig, OutputFormat, ScanConfig,
    ServerConfig, ToolsConfig,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    ConfigFileError, discover_config_file, generate_example_config, load_config_file,
    load_or_default,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// This schema documents all configuration options that can be set in
/// `.depbom.yaml` config files.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
