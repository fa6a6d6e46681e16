//! Generate command handler.

use crate::config::{AppConfig, Validatable, load_or_default};
use crate::error::DepBomError;
use crate::model::Ecosystem;
use crate::pipeline::{
    Generated, exit_codes, generate, install_interrupt_cleanup, write_outputs,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Inputs of one `depbom` run
#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Project directory or manifest
    pub path: PathBuf,
    /// Explicit config file
    pub config_file: Option<PathBuf>,
    /// Values given on the command line, layered over file and environment
    pub overrides: AppConfig,
    /// Restrict to one ecosystem
    pub ecosystem: Option<Ecosystem>,
}

/// Build the effective configuration: file, then environment, then CLI.
pub fn resolve_config(args: &GenerateArgs) -> Result<AppConfig> {
    if let Some(path) = &args.config_file
        && !path.exists()
    {
        return Err(DepBomError::config(format!("file not found: {}", path.display())).into());
    }
    let (mut config, loaded_from) = load_or_default(args.config_file.as_deref());
    if let Some(path) = loaded_from {
        debug!("Loaded config from {}", path.display());
    }
    config.apply_env();
    config.merge(&args.overrides);

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(DepBomError::validation(messages.join("; ")).into());
    }
    Ok(config)
}

fn project_identity(generated: &Generated, config: &AppConfig, path: &Path) -> (String, String) {
    let name = config
        .server
        .project_name
        .clone()
        .or_else(|| generated.project_name().map(ToString::to_string))
        .or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "unnamed".to_string());
    let version = generated.project_version().unwrap_or("latest").to_string();
    (name, version)
}

#[cfg(feature = "server")]
fn submit(generated: &Generated, config: &AppConfig, path: &Path) {
    let (name, version) = project_identity(generated, config, path);
    if let Err(e) = crate::pipeline::submit_bom(&config.server, &generated.xml, &name, &version) {
        tracing::warn!("{e}");
    }
}

#[cfg(not(feature = "server"))]
fn submit(generated: &Generated, config: &AppConfig, path: &Path) {
    let (name, _) = project_identity(generated, config, path);
    tracing::warn!("Built without the `server` feature; BOM for {name} not submitted");
}

/// Run the generate command
pub fn run_generate(args: &GenerateArgs) -> Result<i32> {
    let config = resolve_config(args)?;
    install_interrupt_cleanup();

    let generated = generate(&args.path, &config, args.ecosystem)
        .with_context(|| format!("Failed to generate a BOM for {}", args.path.display()))?;

    let written = write_outputs(&generated, &config.output).context("Failed to write BOM")?;
    if !written.is_empty() {
        info!(
            "{} components written to {} file(s)",
            generated.bom.component_count(),
            written.len()
        );
    }

    if config.server.is_enabled() {
        submit(&generated, &config, &args.path);
    }
    Ok(exit_codes::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_file_is_error() {
        let args = GenerateArgs {
            path: PathBuf::from("."),
            config_file: Some(PathBuf::from("/nonexistent/depbom.yaml")),
            ..GenerateArgs::default()
        };
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_config_file_and_overrides() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("depbom.yaml");
        std::fs::write(&config_path, "tools:\n  timeout_secs: 42\noutput:\n  format: xml\n").unwrap();

        let args = GenerateArgs {
            path: tmp.path().to_path_buf(),
            config_file: Some(config_path),
            overrides: AppConfig::builder().deterministic(true).build(),
            ecosystem: None,
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.output.format, OutputFormat::Xml);
        assert!(config.output.deterministic);
        assert_eq!(config.tools.timeout_secs, 42);
    }

    #[test]
    fn test_invalid_overrides_rejected() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("depbom.yaml");
        std::fs::write(&config_path, "scan:\n  max_depth: 0\n").unwrap();
        let args = GenerateArgs {
            path: tmp.path().to_path_buf(),
            config_file: Some(config_path),
            ..GenerateArgs::default()
        };
        let err = resolve_config(&args).unwrap_err();
        assert!(err.to_string().contains("scan.max_depth"));
    }

    #[test]
    fn test_run_generate_writes_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("requirements.txt"),
            "flask==2.3.0\n",
        )
        .unwrap();
        let config_path = tmp.path().join("depbom.yaml");
        std::fs::write(&config_path, "debug: false\n").unwrap();
        let out = tmp.path().join("out").join("bom");
        std::fs::create_dir_all(out.parent().unwrap()).unwrap();

        let args = GenerateArgs {
            path: tmp.path().to_path_buf(),
            config_file: Some(config_path),
            overrides: AppConfig::builder()
                .output_path(Some(out.clone()))
                .deterministic(true)
                .build(),
            ecosystem: None,
        };
        assert_eq!(run_generate(&args).unwrap(), exit_codes::SUCCESS);
        let json = std::fs::read_to_string(out.with_extension("json")).unwrap();
        assert!(json.contains("pkg:pypi/flask@2.3.0"));
        assert!(out.with_extension("xml").exists());
    }
}
