//! Manifest and lockfile parsers.
//!
//! One parser per format, each turning raw text into a [`PackageSet`]. The
//! parsers never depend on each other and never touch the network.
//!
//! ## Failure model
//!
//! A malformed line or block is skipped with a `warn!` and parsing goes on.
//! A file that cannot be parsed at all is reported by the dispatch functions
//! below as an empty set, so callers treat it like a missing manifest.
//!
//! ```
//! use depbom::parsers::{ParserKind, parse_content};
//!
//! let set = parse_content(ParserKind::GoSum, "golang.org/x/text v0.14.0 h1:ScX5w1eTa3QqT8oi6+ziP7dTV1S2+ALU0bI+0zXKWiQ=\n", None);
//! assert_eq!(set.packages.len(), 1);
//! ```

mod cargo;
mod common;
mod composer;
mod detection;
mod golang;
mod gradle;
mod maven;
mod npm;
mod nuget;
mod pnpm;
mod python;
mod ruby;
mod sbt;
mod traits;
mod tree;
mod yarn;

pub use cargo::{CargoLockParser, CargoTomlParser, parse_cargo_lock, parse_cargo_toml};
pub use composer::{ComposerJsonParser, ComposerLockParser, parse_composer_json, parse_composer_lock};
pub use detection::{FormatDetector, ManifestKind, ParserKind};
pub use golang::{GoModParser, GoSumParser, GopkgLockParser, parse_go_mod, parse_go_sum, parse_gopkg_lock};
pub use gradle::{GradleDependenciesParser, parse_gradle_dependencies};
pub use maven::{MavenTreeParser, PomParser, parse_maven_tree, parse_pom_xml};
pub use npm::{PackageJsonParser, PackageLockParser, parse_package_json, parse_package_lock};
pub use nuget::{CsprojParser, PackagesConfigParser, parse_csproj, parse_packages_config};
pub use pnpm::{PnpmLockParser, parse_pnpm_lock};
pub use python::{
    PipfileLockParser, PoetryLockParser, RequirementsParser, SetupPyParser, parse_pipfile_lock,
    parse_poetry_lock, parse_requirements, parse_setup_py,
};
pub use ruby::{GemfileLockParser, parse_gemfile_lock};
pub use sbt::{SbtDependencyListParser, parse_sbt_dependency_list};
pub use traits::{LockfileParser, ParseError};
pub use yarn::{YarnLockParser, parse_yarn_lock};

use crate::model::PackageSet;
use std::path::Path;
use tracing::{debug, warn};

/// Parse a file with the given parser, recovering from any failure.
///
/// Unreadable or unparseable files yield an empty set and a warning.
#[must_use]
pub fn parse_file(kind: ParserKind, path: &Path) -> PackageSet {
    match kind.parser().parse(path) {
        Ok(set) => {
            debug!(
                "Parsed {} records from {} ({})",
                set.record_count(),
                path.display(),
                kind.name()
            );
            set
        }
        Err(err) => {
            warn!("Could not parse {} as {}: {err}", path.display(), kind.name());
            PackageSet {
                source: Some(path.to_path_buf()),
                ..PackageSet::default()
            }
        }
    }
}

/// Parse in-memory content (tool output), recovering from any failure.
#[must_use]
pub fn parse_content(kind: ParserKind, content: &str, source: Option<&Path>) -> PackageSet {
    let mut set = match kind.parser().parse_str(content) {
        Ok(set) => set,
        Err(err) => {
            warn!("Could not parse {} output: {err}", kind.name());
            PackageSet::default()
        }
    };
    set.source = source.map(Path::to_path_buf);
    set
}
