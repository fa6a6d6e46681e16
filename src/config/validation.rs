//! Configuration validation for depbom.

use super::types::{AppConfig, OutputConfig, ScanConfig, ServerConfig, ToolsConfig};

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.output.validate());
        errors.extend(self.tools.validate());
        errors.extend(self.scan.validate());
        errors.extend(self.server.validate());
        errors
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Some(parent) = self.path.as_deref().and_then(std::path::Path::parent)
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ConfigError::new(
                "output.path",
                format!("Parent directory does not exist: {}", parent.display()),
            ));
        }
        errors
    }
}

impl Validatable for ToolsConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.timeout_secs == 0 {
            errors.push(ConfigError::new(
                "tools.timeout_secs",
                "Timeout must be at least 1 second",
            ));
        }
        for (field, command) in [
            ("tools.maven", Some(&self.maven)),
            ("tools.gradle", self.gradle.as_ref()),
            ("tools.sbt", Some(&self.sbt)),
        ] {
            if command.is_some_and(|c| c.trim().is_empty()) {
                errors.push(ConfigError::new(field, "Command must not be empty"));
            }
        }
        errors
    }
}

impl Validatable for ScanConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.max_depth == 0 {
            errors.push(ConfigError::new("scan.max_depth", "Depth must be at least 1"));
        }
        errors
    }
}

impl Validatable for ServerConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Some(url) = &self.url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            errors.push(ConfigError::new(
                "server.url",
                format!("Expected an http(s) URL, got '{url}'"),
            ));
        }
        if self.api_key.is_some() && self.url.is_none() {
            errors.push(ConfigError::new(
                "server.api_key",
                "An API key was given without a server URL",
            ));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().is_valid());
    }

    #[test]
    fn test_invalid_values_reported() {
        let mut config = AppConfig::default();
        config.tools.timeout_secs = 0;
        config.tools.gradle = Some(String::new());
        config.scan.max_depth = 0;
        config.server.url = Some("ftp://example.com".into());
        config.output.path = Some(PathBuf::from("/nonexistent/dir/bom"));

        let fields: Vec<String> = config.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "output.path",
                "tools.timeout_secs",
                "tools.gradle",
                "scan.max_depth",
                "server.url"
            ]
        );
    }

    #[test]
    fn test_api_key_requires_url() {
        let server = ServerConfig {
            api_key: Some("secret".into()),
            ..ServerConfig::default()
        };
        let errors = server.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "server.api_key");
    }
}
