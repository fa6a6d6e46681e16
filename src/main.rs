//! depbom: CycloneDX SBOM generator for package manager lockfiles
//!
//! Reads the manifests of a project and writes a CycloneDX 1.2 BOM.

use anyhow::Result;
use clap::Parser;
use depbom::{
    AppConfig,
    cli::{self, GenerateArgs},
    config::{OutputFormat, generate_example_config, generate_json_schema},
    model::Ecosystem,
    pipeline::{cleanup_registered, exit_codes},
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with ecosystem support info
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nOutput:",
        "\n  CycloneDX 1.2 (XML, JSON)",
        "\n\nEcosystems:",
        "\n  npm (package-lock, yarn, pnpm, rush), maven (mvn, gradle, sbt), pypi,",
        "\n  golang, crates, composer, rubygems, nuget"
    )
}

#[derive(Parser)]
#[command(name = "depbom")]
#[command(version, long_version = build_long_version())]
#[command(about = "Generate a CycloneDX SBOM from package manager lockfiles", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  BOM generated
    3  Error occurred

ENVIRONMENT:
    MVN_CMD, GRADLE_CMD, SBT_CMD   Build tool commands
    DEPBOM_TIMEOUT                 Build tool timeout in seconds
    DEPBOM_DEBUG                   Debug logging
    M2_REPO, GRADLE_USER_HOME      Build tool caches

EXAMPLES:
    # Print a JSON BOM for the current directory
    depbom

    # Write bom.xml and bom.json for a monorepo
    depbom -r -o bom ./workspace

    # Only the Python dependencies, reproducibly
    depbom -t python --deterministic -o sbom.json --format json")]
struct Cli {
    /// Project directory or manifest file
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Output file; `<stem>.xml` and `<stem>.json` unless --format narrows it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Encodings to write
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Only read manifests of this ecosystem (npm, java, python, go, rust, php, ruby, dotnet, ...)
    #[arg(short = 't', long = "type", value_parser = parse_ecosystem)]
    ecosystem: Option<Ecosystem>,

    /// Look for projects in subdirectories
    #[arg(short, long)]
    recurse: bool,

    /// Fixed timestamp and no serial number, for reproducible output
    #[arg(long)]
    deterministic: bool,

    /// Do not scan JS/TS sources to classify npm components
    #[arg(long)]
    no_imports: bool,

    /// BOM author recorded in metadata
    #[arg(long)]
    author: Option<String>,

    /// Submit the BOM to this server
    #[arg(long, env = "DEPBOM_SERVER_URL")]
    server_url: Option<String>,

    /// API key for the server
    #[arg(long, env = "DEPBOM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Project name on the server
    #[arg(long)]
    project_name: Option<String>,

    /// Path to configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the JSON schema of the config file and exit
    #[arg(long)]
    print_config_schema: bool,

    /// Print an example config file and exit
    #[arg(long)]
    print_example_config: bool,
}

fn parse_ecosystem(value: &str) -> std::result::Result<Ecosystem, String> {
    Ecosystem::from_name(value).ok_or_else(|| {
        format!("unknown ecosystem '{value}' (try npm, java, python, go, rust, php, ruby, dotnet)")
    })
}

impl Cli {
    fn overrides(&self) -> AppConfig {
        let mut config = AppConfig::builder()
            .output_path(self.output.clone())
            .deterministic(self.deterministic)
            .author(self.author.clone())
            .recurse(self.recurse)
            .scan_imports(!self.no_imports)
            .server_url(self.server_url.clone())
            .api_key(self.api_key.clone())
            .project_name(self.project_name.clone())
            .debug(self.verbose)
            .build();
        if let Some(format) = self.format {
            config.output.format = format;
        }
        config
    }
}

fn env_debug() -> bool {
    std::env::var("DEPBOM_DEBUG").is_ok_and(|v| matches!(v.trim(), "1" | "true" | "yes" | "on"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config_schema {
        println!("{}", generate_json_schema());
        return Ok(());
    }
    if cli.print_example_config {
        print!("{}", generate_example_config());
        return Ok(());
    }

    // Initialize logging; BOMs go to stdout, so logs go to stderr
    let log_level = if cli.quiet {
        "warn"
    } else if cli.verbose || env_debug() {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let args = GenerateArgs {
        path: cli.path.clone(),
        config_file: cli.config.clone(),
        overrides: cli.overrides(),
        ecosystem: cli.ecosystem,
    };

    let outcome = cli::run_generate(&args);
    cleanup_registered();
    match outcome {
        Ok(code) if code == exit_codes::SUCCESS => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(exit_codes::ERROR);
        }
    }
}
