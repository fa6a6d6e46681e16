//! Default values for depbom configuration.

use super::types::{ScanConfig, ToolsConfig};

/// Default external tool timeout (10 minutes)
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 600;

/// Default maximum discovery depth when recursing
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Directories skipped during discovery and import scanning
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &["node_modules", ".git", "target", "vendor"];

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
            maven: "mvn".to_string(),
            gradle: None,
            sbt: "sbt".to_string(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recurse: false,
            max_depth: DEFAULT_MAX_DEPTH,
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(ToString::to_string).collect(),
            scan_imports: true,
        }
    }
}
