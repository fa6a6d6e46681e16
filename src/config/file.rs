//! Configuration file loading, discovery and environment overrides.

use super::types::{AppConfig, OutputFormat};
use std::path::{Path, PathBuf};
use tracing::warn;

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
const CONFIG_FILE_NAMES: &[&str] = &[".depbom.yaml", ".depbom.yml", "depbom.yaml"];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/depbom/)
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path
        && path.exists()
    {
        return Some(path.to_path_buf());
    }

    if let Ok(cwd) = std::env::current_dir()
        && let Some(path) = find_config_in_dir(&cwd)
    {
        return Some(path);
    }

    if let Some(git_root) = find_git_root()
        && let Some(path) = find_config_in_dir(&git_root)
    {
        return Some(path);
    }

    dirs::config_dir().and_then(|dir| find_config_in_dir(&dir.join("depbom")))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();

    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Errors reading a config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml_ng::Error),
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml_ng::from_str(&content)?;
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Environment Overrides
// ============================================================================

fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl AppConfig {
    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Recognised variables: `MVN_CMD`, `GRADLE_CMD`, `SBT_CMD`,
    /// `DEPBOM_TIMEOUT`, `DEPBOM_DEBUG`, `M2_REPO`, `GRADLE_USER_HOME`.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(cmd) = var("MVN_CMD") {
            self.tools.maven = cmd;
        }
        if let Some(cmd) = var("GRADLE_CMD") {
            self.tools.gradle = Some(cmd);
        }
        if let Some(cmd) = var("SBT_CMD") {
            self.tools.sbt = cmd;
        }
        if let Some(timeout) = var("DEPBOM_TIMEOUT") {
            match timeout.trim().parse::<u64>() {
                Ok(secs) => self.tools.timeout_secs = secs,
                Err(_) => warn!("Ignoring DEPBOM_TIMEOUT={timeout}: not a number of seconds"),
            }
        }
        if let Some(debug) = var("DEPBOM_DEBUG") {
            self.debug = self.debug || env_flag(&debug);
        }
        if let Some(repo) = var("M2_REPO") {
            self.cache.maven_repo = Some(PathBuf::from(repo));
        }
        if let Some(home) = var("GRADLE_USER_HOME") {
            self.cache.gradle_home = Some(PathBuf::from(home));
        }
    }

    /// Merge another config into this one, with `other` taking precedence.
    ///
    /// Only values that differ from the defaults are taken from `other`, so
    /// CLI overrides built with [`AppConfig::builder`] can be layered over a
    /// loaded file.
    pub fn merge(&mut self, other: &Self) {
        let defaults = Self::default();

        if other.output.path.is_some() {
            self.output.path.clone_from(&other.output.path);
        }
        if other.output.format != OutputFormat::default() {
            self.output.format = other.output.format;
        }
        if other.output.deterministic {
            self.output.deterministic = true;
        }
        if other.output.author.is_some() {
            self.output.author.clone_from(&other.output.author);
        }

        if other.tools.timeout_secs != defaults.tools.timeout_secs {
            self.tools.timeout_secs = other.tools.timeout_secs;
        }
        if other.tools.maven != defaults.tools.maven {
            self.tools.maven.clone_from(&other.tools.maven);
        }
        if other.tools.gradle.is_some() {
            self.tools.gradle.clone_from(&other.tools.gradle);
        }
        if other.tools.sbt != defaults.tools.sbt {
            self.tools.sbt.clone_from(&other.tools.sbt);
        }

        if other.cache.maven_repo.is_some() {
            self.cache.maven_repo.clone_from(&other.cache.maven_repo);
        }
        if other.cache.gradle_home.is_some() {
            self.cache.gradle_home.clone_from(&other.cache.gradle_home);
        }

        if other.scan.recurse {
            self.scan.recurse = true;
        }
        if other.scan.max_depth != defaults.scan.max_depth {
            self.scan.max_depth = other.scan.max_depth;
        }
        if other.scan.exclude_dirs != defaults.scan.exclude_dirs {
            self.scan.exclude_dirs.clone_from(&other.scan.exclude_dirs);
        }
        if !other.scan.scan_imports {
            self.scan.scan_imports = false;
        }

        if other.server.url.is_some() {
            self.server.url.clone_from(&other.server.url);
        }
        if other.server.api_key.is_some() {
            self.server.api_key.clone_from(&other.server.api_key);
        }
        if other.server.project_name.is_some() {
            self.server.project_name.clone_from(&other.server.project_name);
        }

        if other.debug {
            self.debug = true;
        }
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    format!(
        "# depbom configuration\n\
         # Place this file at .depbom.yaml in your project root or ~/.config/depbom/\n\n{}",
        serde_yaml_ng::to_string(&AppConfig::default()).unwrap_or_default()
    )
}

// ============================================================================
// Tests
// ============================================================================
