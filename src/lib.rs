//! **Software bill of materials generation from package manager lockfiles.**
//!
//! `depbom` reads the manifests and lockfiles of a project, across npm, Maven,
//! Gradle, sbt, PyPI, Go, Cargo, Composer, RubyGems and NuGet, and produces a
//! CycloneDX 1.2 BOM in XML and JSON.
//!
//! ## Core Concepts & Modules
//!
//! - **[`parsers`]**: one parser per lockfile format, each producing a
//!   [`PackageSet`] of [`PackageRecord`]s. Malformed entries are skipped, never fatal.
//! - **[`assembly`]**: the [`ComponentAssembler`], which flattens record trees
//!   into one [`Component`] per package URL and fills in hashes, licenses and
//!   references.
//! - **[`bom`]**: the [`Bom`] envelope and its XML and JSON renderers.
//! - **[`pipeline`]**: discovery, build tool invocation and the end-to-end
//!   [`generate`](pipeline::generate) function.
//! - **[`imports`]**: a JS/TS source scanner deciding which npm packages are
//!   actually imported.
//! - **[`config`]**: the [`AppConfig`] loaded from file, environment and CLI.
//!
//! ## Getting Started
//!
//! ```
//! use depbom::{Bom, BomOptions, ComponentAssembler};
//! use depbom::parsers::parse_yarn_lock;
//!
//! let lock = "left-pad@^1.3.0:\n  version \"1.3.0\"\n";
//! let set = parse_yarn_lock(lock);
//!
//! let mut assembler = ComponentAssembler::new();
//! assembler.add_set(&set);
//! let bom = Bom::new(assembler.finish(), None, &BomOptions::default().deterministic(true));
//!
//! let json = bom.to_json()?;
//! assert!(json.contains("pkg:npm/left-pad@1.3.0"));
//! # Ok::<(), depbom::DepBomError>(())
//! ```
//!
//! Whole projects go through the pipeline:
//!
//! ```no_run
//! use depbom::{AppConfig, pipeline};
//! use std::path::Path;
//!
//! let config = AppConfig::builder().deterministic(true).build();
//! let generated = pipeline::generate(Path::new("path/to/project"), &config, None)?;
//! println!("{}", generated.json);
//! # Ok::<(), depbom::DepBomError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `server` (default): submission of the BOM to a server over HTTP via
//!   `reqwest`.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    // Doc completeness: # Errors / # Panics sections are aspirational
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::struct_excessive_bools,
    clippy::module_name_repetitions
)]

pub mod assembly;
pub mod bom;
pub mod cli;
pub mod config;
pub mod error;
pub mod imports;
pub mod model;
pub mod parsers;
pub mod pipeline;

// Re-export main types for convenience
pub use assembly::ComponentAssembler;
pub use bom::{Bom, BomOptions, render_json, render_xml};
pub use config::{AppConfig, AppConfigBuilder, ConfigError, OutputConfig, Validatable};
pub use error::{DepBomError, ErrorContext, Result};
pub use imports::{ImportMap, scan_imports};
pub use model::{Component, Ecosystem, PackageRecord, PackageSet, Purl};
pub use parsers::{FormatDetector, LockfileParser, ParserKind, parse_content, parse_file};
pub use pipeline::{Generated, generate};
