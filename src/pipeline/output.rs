//! Output handling for generated BOMs.
//!
//! Writes the rendered encodings to files, or one of them to stdout. File
//! output also gets a `<stem>.namespaces.json` sidecar when any Maven
//! component had class namespaces.

use super::Generated;
use crate::config::{OutputConfig, OutputFormat};
use crate::error::{DepBomError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Target for output - either stdout or a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to stdout
    Stdout,
    /// Write to a file
    File(PathBuf),
}

impl OutputTarget {
    /// Create output target from optional path
    #[must_use]
    pub fn from_option(path: Option<PathBuf>) -> Self {
        match path {
            Some(p) => Self::File(p),
            None => Self::Stdout,
        }
    }
}

/// Files to write for `path` in the given format.
///
/// `Both` derives `<stem>.xml` and `<stem>.json`; a single format writes
/// exactly the named file.
#[must_use]
pub fn output_paths(path: &Path, format: OutputFormat) -> Vec<(OutputFormat, PathBuf)> {
    match format {
        OutputFormat::Both => vec![
            (OutputFormat::Xml, path.with_extension("xml")),
            (OutputFormat::Json, path.with_extension("json")),
        ],
        single => vec![(single, path.to_path_buf())],
    }
}

/// Sidecar path for the namespace map: `<stem>.namespaces.json` next to
/// the BOM.
#[must_use]
pub fn namespaces_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map_or_else(|| "bom".into(), |s| s.to_string_lossy());
    path.with_file_name(format!("{stem}.namespaces.json"))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| DepBomError::io(path, e))?;
    info!("BOM written to {}", path.display());
    Ok(())
}

/// Write the generated BOM according to the output configuration.
///
/// Returns the files written; empty when printing to stdout, which gets
/// JSON unless XML alone was asked for.
pub fn write_outputs(generated: &Generated, output: &OutputConfig) -> Result<Vec<PathBuf>> {
    match OutputTarget::from_option(output.path.clone()) {
        OutputTarget::Stdout => {
            let content = match output.format {
                OutputFormat::Xml => &generated.xml,
                OutputFormat::Json | OutputFormat::Both => &generated.json,
            };
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{content}").map_err(DepBomError::from)?;
            Ok(Vec::new())
        }
        OutputTarget::File(path) => {
            let mut written = Vec::new();
            for (format, target) in output_paths(&path, output.format) {
                let content = match format {
                    OutputFormat::Xml => &generated.xml,
                    _ => &generated.json,
                };
                write_file(&target, content)?;
                written.push(target);
            }
            if !generated.namespaces.is_empty() {
                let target = namespaces_path(&path);
                let content = serde_json::to_string_pretty(&generated.namespaces)?;
                write_file(&target, &content)?;
                written.push(target);
            }
            Ok(written)
        }
    }
}
