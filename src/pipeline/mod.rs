//! Pipeline orchestration: discover → parse → assemble → render.
//!
//! [`generate`] is the whole run for one target path. The stages are public
//! so callers can stop after discovery or collection.

mod discover;
pub mod exec;
mod namespaces;
mod output;
#[cfg(feature = "server")]
mod submit;
mod temp;
mod tools;

pub use discover::{ProjectManifests, discover};
pub use exec::{ExecResult, run_command};
pub use namespaces::{NamespaceMap, jar_namespaces, jar_path, maven_repository, namespace_map};
pub use output::{OutputTarget, namespaces_path, output_paths, write_outputs};
#[cfg(feature = "server")]
pub use submit::{bom_endpoint, submit_bom};
pub use temp::{ScopedTempDir, cleanup_registered, install_interrupt_cleanup, registered_count};
pub use tools::{gradle_command, gradle_packages, maven_packages, sbt_packages};

use crate::assembly::{ComponentAssembler, root_component};
use crate::bom::{Bom, BomOptions};
use crate::config::AppConfig;
use crate::error::{DepBomError, ErrorContext, Result};
use crate::imports::scan_imports;
use crate::model::{Ecosystem, PackageRecord, PackageSet};
use crate::parsers::{ManifestKind, ParserKind, parse_file};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// An error occurred
    pub const ERROR: i32 = 3;
}

/// A generated BOM with both encodings rendered
#[derive(Debug, Clone)]
pub struct Generated {
    pub bom: Bom,
    pub xml: String,
    pub json: String,
    /// Class namespaces of Maven components found in the local repository
    pub namespaces: NamespaceMap,
}

impl Generated {
    /// Name of the root component, if there is one
    #[must_use]
    pub fn project_name(&self) -> Option<&str> {
        self.bom.metadata.component.as_ref().map(|c| c.name.as_str())
    }

    /// Version of the root component, if known
    #[must_use]
    pub fn project_version(&self) -> Option<&str> {
        self.bom
            .metadata
            .component
            .as_ref()
            .map(|c| c.version.as_str())
            .filter(|v| !v.is_empty())
    }
}

/// Package sets of one project directory, chosen by per-ecosystem precedence.
///
/// Build tools run at most once per directory tree: a nested `pom.xml` or
/// Gradle build under a directory already resolved by a tool is skipped.
#[derive(Debug)]
pub struct Collector<'a> {
    config: &'a AppConfig,
    tool_roots: Vec<PathBuf>,
}

impl<'a> Collector<'a> {
    #[must_use]
    pub const fn new(config: &'a AppConfig) -> Self {
        Self {
            config,
            tool_roots: Vec::new(),
        }
    }

    /// Collect every ecosystem present in the project.
    pub fn collect(&mut self, project: &ProjectManifests) -> Vec<PackageSet> {
        let mut sets = Vec::new();
        for ecosystem in project.ecosystems() {
            let before = sets.len();
            match ecosystem {
                Ecosystem::Npm => sets.extend(npm_set(project)),
                Ecosystem::Pypi => sets.extend(python_set(project)),
                Ecosystem::Golang => sets.extend(go_sets(project)),
                Ecosystem::Crates => sets.extend(cargo_set(project)),
                Ecosystem::Composer => sets.extend(composer_set(project)),
                Ecosystem::Rubygems => sets.extend(
                    project
                        .first(ManifestKind::GemfileLock)
                        .map(|p| parse_file(ParserKind::GemfileLock, p)),
                ),
                Ecosystem::Nuget => sets.extend(nuget_sets(project)),
                Ecosystem::Maven => sets.extend(self.jvm_sets(project)),
            }
            if sets[before..].iter().all(PackageSet::is_empty) {
                info!("No {ecosystem} packages found in {}", project.dir.display());
            }
        }
        sets
    }

    fn claim_tool_root(&mut self, dir: &Path) -> bool {
        if self.tool_roots.iter().any(|root| dir.starts_with(root)) {
            debug!("{} is covered by an enclosing build", dir.display());
            return false;
        }
        self.tool_roots.push(dir.to_path_buf());
        true
    }

    fn jvm_sets(&mut self, project: &ProjectManifests) -> Vec<PackageSet> {
        let mut sets = Vec::new();
        let dir = project.dir.clone();
        if let Some(pom) = project.first(ManifestKind::Pom) {
            if self.claim_tool_root(&dir) {
                sets.push(maven_packages(pom, self.config));
            }
        } else if let Some(build) = project.first(ManifestKind::GradleBuild) {
            if self.claim_tool_root(&dir) {
                sets.push(gradle_packages(build, self.config));
            }
        } else if project.has(ManifestKind::SbtBuild) && self.claim_tool_root(&dir) {
            sets.push(sbt_packages(&dir, self.config));
        }
        sets
    }
}

/// Collect package sets for a single project directory.
#[must_use]
pub fn collect_packages(project: &ProjectManifests, config: &AppConfig) -> Vec<PackageSet> {
    Collector::new(config).collect(project)
}

fn with_root(mut set: PackageSet, root: Option<PackageRecord>) -> PackageSet {
    if let Some(root) = root {
        set.root = Some(root);
    }
    set
}

fn root_from(
    project: &ProjectManifests,
    manifest: ManifestKind,
    parser: ParserKind,
) -> Option<PackageRecord> {
    project.first(manifest).and_then(|p| parse_file(parser, p).root)
}

/// Lockfile for a Rush monorepo
fn rush_lockfile(dir: &Path) -> Option<PathBuf> {
    let rush_dir = dir.join("common").join("config").join("rush");
    ["pnpm-lock.yaml", "shrinkwrap.yaml"]
        .into_iter()
        .map(|name| rush_dir.join(name))
        .find(|path| path.is_file())
}

fn npm_set(project: &ProjectManifests) -> Option<PackageSet> {
    let root = root_from(project, ManifestKind::PackageJson, ParserKind::PackageJson);

    let lockfile = [
        (ManifestKind::PackageLock, ParserKind::PackageLock),
        (ManifestKind::PnpmLock, ParserKind::PnpmLock),
        (ManifestKind::YarnLock, ParserKind::YarnLock),
    ]
    .into_iter()
    .find_map(|(manifest, parser)| project.first(manifest).map(|p| (parser, p.to_path_buf())))
    .or_else(|| {
        if !project.has(ManifestKind::RushJson) {
            return None;
        }
        let lock = rush_lockfile(&project.dir);
        if lock.is_none() {
            warn!(
                "rush.json found in {} but no common/config/rush lockfile; run `rush update` first",
                project.dir.display()
            );
        }
        lock.map(|p| (ParserKind::PnpmLock, p))
    });

    match lockfile {
        Some((parser, path)) => Some(with_root(parse_file(parser, &path), root)),
        None => {
            let root = root?;
            info!(
                "No lockfile in {}; install dependencies first for a complete inventory",
                project.dir.display()
            );
            Some(PackageSet::new().with_root(root))
        }
    }
}

/// Pipenv, then Poetry, then requirements files, then `setup.py`.
fn python_set(project: &ProjectManifests) -> Option<PackageSet> {
    let set = if let Some(lock) = project.first(ManifestKind::PipfileLock) {
        parse_file(ParserKind::PipfileLock, lock)
    } else if let Some(lock) = project.first(ManifestKind::PoetryLock) {
        parse_file(ParserKind::PoetryLock, lock)
    } else if project.has(ManifestKind::Requirements) {
        let mut merged = PackageSet::new();
        for path in project.of_kind(ManifestKind::Requirements) {
            let set = parse_file(ParserKind::Requirements, path);
            merged.source.get_or_insert_with(|| path.to_path_buf());
            merged.packages.extend(set.packages);
        }
        merged
    } else {
        return project
            .first(ManifestKind::SetupPy)
            .map(|setup| parse_file(ParserKind::SetupPy, setup));
    };

    // setup.py still names the project when a lockfile lists the packages
    let root = set
        .root
        .clone()
        .or_else(|| root_from(project, ManifestKind::SetupPy, ParserKind::SetupPy));
    Some(with_root(set, root))
}

fn go_sets(project: &ProjectManifests) -> Vec<PackageSet> {
    let mut sets = Vec::new();
    if let Some(sum) = project.first(ManifestKind::GoSum) {
        let root = root_from(project, ManifestKind::GoMod, ParserKind::GoMod);
        sets.push(with_root(parse_file(ParserKind::GoSum, sum), root));
    } else if let Some(module) = project.first(ManifestKind::GoMod) {
        sets.push(parse_file(ParserKind::GoMod, module));
    }
    if let Some(lock) = project.first(ManifestKind::GopkgLock) {
        sets.push(parse_file(ParserKind::GopkgLock, lock));
    }
    sets
}

fn cargo_set(project: &ProjectManifests) -> Option<PackageSet> {
    if let Some(lock) = project.first(ManifestKind::CargoLock) {
        let root = root_from(project, ManifestKind::CargoToml, ParserKind::CargoToml);
        let set = parse_file(ParserKind::CargoLock, lock);
        let root = root.or_else(|| set.root.clone());
        return Some(with_root(set, root));
    }
    project.first(ManifestKind::CargoToml).map(|manifest| {
        info!(
            "No Cargo.lock in {}; versions come from Cargo.toml requirements",
            project.dir.display()
        );
        parse_file(ParserKind::CargoToml, manifest)
    })
}

fn composer_set(project: &ProjectManifests) -> Option<PackageSet> {
    let root = root_from(project, ManifestKind::ComposerJson, ParserKind::ComposerJson);
    match project.first(ManifestKind::ComposerLock) {
        Some(lock) => Some(with_root(parse_file(ParserKind::ComposerLock, lock), root)),
        None => root.map(|root| PackageSet::new().with_root(root)),
    }
}

fn nuget_sets(project: &ProjectManifests) -> Vec<PackageSet> {
    project
        .of_kind(ManifestKind::PackagesConfig)
        .map(|p| parse_file(ParserKind::PackagesConfig, p))
        .chain(
            project
                .of_kind(ManifestKind::Csproj)
                .map(|p| parse_file(ParserKind::Csproj, p)),
        )
        .collect()
}

fn set_dir(set: &PackageSet) -> Option<&Path> {
    set.source.as_deref().and_then(Path::parent)
}

/// Pick the project record: a root from the target directory, then any
/// root, then a record named after the directory.
fn select_root(
    target: &Path,
    sets: &[PackageSet],
    ecosystem: Option<Ecosystem>,
) -> Option<PackageRecord> {
    if let Some(root) = sets
        .iter()
        .filter(|s| set_dir(s).is_some_and(|d| d == target))
        .find_map(|s| s.root.clone())
        .or_else(|| sets.iter().find_map(|s| s.root.clone()))
    {
        return Some(root);
    }

    let ecosystem = ecosystem.or_else(|| {
        sets.iter()
            .flat_map(|s| s.packages.first())
            .map(|r| r.ecosystem)
            .next()
    })?;
    let name = target.file_name()?.to_string_lossy().into_owned();
    debug!("No project manifest; naming the root after {name}");
    Some(PackageRecord::new(ecosystem, name))
}

fn uses_npm(sets: &[PackageSet]) -> bool {
    sets.iter()
        .flat_map(|s| s.root.iter().chain(&s.packages))
        .any(|r| r.ecosystem == Ecosystem::Npm)
}

/// BOM options derived from configuration
#[must_use]
pub fn bom_options(config: &AppConfig) -> BomOptions {
    let mut options = BomOptions::default().deterministic(config.output.deterministic);
    if let Some(author) = &config.output.author {
        options = options.with_author(author.clone());
    }
    options
}

/// Generate a BOM for `path`, optionally restricted to one ecosystem.
///
/// Fails only when the path cannot be accessed or rendering fails; a
/// directory without manifests yields a BOM with no components.
pub fn generate(path: &Path, config: &AppConfig, ecosystem: Option<Ecosystem>) -> Result<Generated> {
    let target = std::fs::canonicalize(path).map_err(|e| DepBomError::io(path, e))?;
    let project_dir = if target.is_file() {
        target.parent().map_or_else(|| target.clone(), Path::to_path_buf)
    } else {
        target.clone()
    };

    let projects = discover(&target, &config.scan);
    if projects.is_empty() {
        info!("No manifests found under {}", target.display());
    }

    let mut collector = Collector::new(config);
    let mut sets = Vec::new();
    for project in projects.into_values() {
        let project = match ecosystem {
            Some(eco) => project.restricted_to(eco),
            None => project,
        };
        sets.extend(collector.collect(&project));
    }

    let root = select_root(&project_dir, &sets, ecosystem);
    let imports = (config.scan.scan_imports && uses_npm(&sets))
        .then(|| scan_imports(&project_dir, &config.scan.exclude_dirs));

    let mut assembler = ComponentAssembler::new().with_imports(imports.as_ref());
    if let Some(root) = &root {
        assembler = assembler.with_root(root);
    }
    for set in &sets {
        assembler.add_set(set);
        // Subproject roots found while recursing are components too
        if let Some(sub_root) = &set.root {
            assembler.add_record(sub_root);
        }
    }
    let components = assembler.finish();
    info!(
        "Assembled {} components from {} package sets",
        components.len(),
        sets.len()
    );

    let bom = Bom::new(components, root.as_ref().map(root_component), &bom_options(config));
    let xml = bom.to_xml().context("rendering XML")?;
    let json = bom.to_json().context("rendering JSON")?;

    let namespaces = match maven_repository(config.cache.maven_repo.as_deref()) {
        Some(repo) if bom.components.iter().any(|c| c.ecosystem == Ecosystem::Maven) => {
            namespace_map(&bom.components, &repo)
        }
        _ => NamespaceMap::new(),
    };

    Ok(Generated {
        bom,
        xml,
        json,
        namespaces,
    })
}
