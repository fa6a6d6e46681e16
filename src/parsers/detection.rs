//! Manifest and lockfile recognition by file name.
//!
//! [`ManifestKind`] names what a file on disk is; [`ParserKind`] names which
//! parser reads a given text. Most manifests map straight to a parser, but
//! some only tell us which build tool to run (`build.gradle`, `build.sbt`)
//! or where the real lockfile lives (`rush.json`).

use super::cargo::{CargoLockParser, CargoTomlParser};
use super::composer::{ComposerJsonParser, ComposerLockParser};
use super::golang::{GoModParser, GoSumParser, GopkgLockParser};
use super::gradle::GradleDependenciesParser;
use super::maven::{MavenTreeParser, PomParser};
use super::npm::{PackageJsonParser, PackageLockParser};
use super::nuget::{CsprojParser, PackagesConfigParser};
use super::pnpm::PnpmLockParser;
use super::python::{PipfileLockParser, PoetryLockParser, RequirementsParser, SetupPyParser};
use super::ruby::GemfileLockParser;
use super::sbt::SbtDependencyListParser;
use super::traits::LockfileParser;
use super::yarn::YarnLockParser;
use crate::model::Ecosystem;
use std::path::{Path, PathBuf};

/// Parser selected for a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserKind {
    PackageLock,
    PackageJson,
    YarnLock,
    PnpmLock,
    Pom,
    MavenTree,
    GradleDependencies,
    SbtDependencyList,
    GoMod,
    GoSum,
    GopkgLock,
    CargoLock,
    CargoToml,
    ComposerLock,
    ComposerJson,
    GemfileLock,
    PackagesConfig,
    Csproj,
    Requirements,
    PipfileLock,
    PoetryLock,
    SetupPy,
}

impl ParserKind {
    /// The parser implementation for this kind.
    #[must_use]
    pub fn parser(self) -> &'static dyn LockfileParser {
        match self {
            Self::PackageLock => &PackageLockParser,
            Self::PackageJson => &PackageJsonParser,
            Self::YarnLock => &YarnLockParser,
            Self::PnpmLock => &PnpmLockParser,
            Self::Pom => &PomParser,
            Self::MavenTree => &MavenTreeParser,
            Self::GradleDependencies => &GradleDependenciesParser,
            Self::SbtDependencyList => &SbtDependencyListParser,
            Self::GoMod => &GoModParser,
            Self::GoSum => &GoSumParser,
            Self::GopkgLock => &GopkgLockParser,
            Self::CargoLock => &CargoLockParser,
            Self::CargoToml => &CargoTomlParser,
            Self::ComposerLock => &ComposerLockParser,
            Self::ComposerJson => &ComposerJsonParser,
            Self::GemfileLock => &GemfileLockParser,
            Self::PackagesConfig => &PackagesConfigParser,
            Self::Csproj => &CsprojParser,
            Self::Requirements => &RequirementsParser,
            Self::PipfileLock => &PipfileLockParser,
            Self::PoetryLock => &PoetryLockParser,
            Self::SetupPy => &SetupPyParser,
        }
    }

    /// Get the human-readable name for this parser.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.parser().format_name()
    }

    #[must_use]
    pub fn ecosystem(self) -> Ecosystem {
        self.parser().ecosystem()
    }
}

/// What a file on disk is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ManifestKind {
    PackageLock,
    PnpmLock,
    YarnLock,
    RushJson,
    PackageJson,
    Pom,
    GradleBuild,
    SbtBuild,
    GoSum,
    GoMod,
    GopkgLock,
    CargoLock,
    CargoToml,
    ComposerLock,
    ComposerJson,
    GemfileLock,
    PackagesConfig,
    Csproj,
    PipfileLock,
    PoetryLock,
    Requirements,
    SetupPy,
}

impl ManifestKind {
    #[must_use]
    pub const fn ecosystem(self) -> Ecosystem {
        match self {
            Self::PackageLock
            | Self::PnpmLock
            | Self::YarnLock
            | Self::RushJson
            | Self::PackageJson => Ecosystem::Npm,
            Self::Pom | Self::GradleBuild | Self::SbtBuild => Ecosystem::Maven,
            Self::GoSum | Self::GoMod | Self::GopkgLock => Ecosystem::Golang,
            Self::CargoLock | Self::CargoToml => Ecosystem::Crates,
            Self::ComposerLock | Self::ComposerJson => Ecosystem::Composer,
            Self::GemfileLock => Ecosystem::Rubygems,
            Self::PackagesConfig | Self::Csproj => Ecosystem::Nuget,
            Self::PipfileLock | Self::PoetryLock | Self::Requirements | Self::SetupPy => {
                Ecosystem::Pypi
            }
        }
    }

    /// Parser that reads this file directly, if any
    #[must_use]
    pub const fn direct_parser(self) -> Option<ParserKind> {
        match self {
            Self::PackageLock => Some(ParserKind::PackageLock),
            Self::PnpmLock => Some(ParserKind::PnpmLock),
            Self::YarnLock => Some(ParserKind::YarnLock),
            Self::PackageJson => Some(ParserKind::PackageJson),
            Self::Pom => Some(ParserKind::Pom),
            Self::GoSum => Some(ParserKind::GoSum),
            Self::GoMod => Some(ParserKind::GoMod),
            Self::GopkgLock => Some(ParserKind::GopkgLock),
            Self::CargoLock => Some(ParserKind::CargoLock),
            Self::CargoToml => Some(ParserKind::CargoToml),
            Self::ComposerLock => Some(ParserKind::ComposerLock),
            Self::ComposerJson => Some(ParserKind::ComposerJson),
            Self::GemfileLock => Some(ParserKind::GemfileLock),
            Self::PackagesConfig => Some(ParserKind::PackagesConfig),
            Self::Csproj => Some(ParserKind::Csproj),
            Self::PipfileLock => Some(ParserKind::PipfileLock),
            Self::PoetryLock => Some(ParserKind::PoetryLock),
            Self::Requirements => Some(ParserKind::Requirements),
            Self::SetupPy => Some(ParserKind::SetupPy),
            Self::RushJson | Self::GradleBuild | Self::SbtBuild => None,
        }
    }

    /// Directory of the project this manifest belongs to.
    ///
    /// sbt's `project/build.properties` and `project/*.scala` and
    /// `requirements/*.txt` describe the parent directory.
    #[must_use]
    pub fn project_dir(self, path: &Path) -> PathBuf {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let nested = matches!(self, Self::SbtBuild | Self::Requirements)
            && dir
                .file_name()
                .is_some_and(|n| n == "project" || n == "requirements");
        if nested {
            dir.parent().unwrap_or(dir).to_path_buf()
        } else {
            dir.to_path_buf()
        }
    }
}

/// Recognises manifests and lockfiles from their path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatDetector;

impl FormatDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Detect what kind of manifest `path` is, if any.
    #[must_use]
    pub fn detect(&self, path: &Path) -> Option<ManifestKind> {
        let file_name = path.file_name()?.to_str()?;
        let parent_name = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        let kind = match file_name {
            "package-lock.json" | "npm-shrinkwrap.json" => ManifestKind::PackageLock,
            "pnpm-lock.yaml" | "shrinkwrap.yaml" => ManifestKind::PnpmLock,
            "yarn.lock" => ManifestKind::YarnLock,
            "rush.json" => ManifestKind::RushJson,
            "package.json" => ManifestKind::PackageJson,
            "pom.xml" => ManifestKind::Pom,
            "build.gradle" | "build.gradle.kts" => ManifestKind::GradleBuild,
            "build.properties" if parent_name == "project" => ManifestKind::SbtBuild,
            "go.sum" => ManifestKind::GoSum,
            "go.mod" => ManifestKind::GoMod,
            "Gopkg.lock" => ManifestKind::GopkgLock,
            "Cargo.lock" => ManifestKind::CargoLock,
            "Cargo.toml" => ManifestKind::CargoToml,
            "composer.lock" => ManifestKind::ComposerLock,
            "composer.json" => ManifestKind::ComposerJson,
            "Gemfile.lock" => ManifestKind::GemfileLock,
            "packages.config" => ManifestKind::PackagesConfig,
            "Pipfile.lock" => ManifestKind::PipfileLock,
            "poetry.lock" => ManifestKind::PoetryLock,
            "setup.py" => ManifestKind::SetupPy,
            name if name.ends_with(".sbt") => ManifestKind::SbtBuild,
            name if name.ends_with(".scala") && parent_name == "project" => ManifestKind::SbtBuild,
            name if name.ends_with(".csproj") => ManifestKind::Csproj,
            name if name.starts_with("requirements") && name.ends_with(".txt") => {
                ManifestKind::Requirements
            }
            name if name.ends_with(".txt") && parent_name == "requirements" => {
                ManifestKind::Requirements
            }
            _ => return None,
        };
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_lockfiles() {
        let detector = FormatDetector::new();
        assert_eq!(detector.detect(Path::new("/w/yarn.lock")), Some(ManifestKind::YarnLock));
        assert_eq!(
            detector.detect(Path::new("common/config/rush/shrinkwrap.yaml")),
            Some(ManifestKind::PnpmLock)
        );
        assert_eq!(detector.detect(Path::new("App.csproj")), Some(ManifestKind::Csproj));
        assert_eq!(
            detector.detect(Path::new("requirements-dev.txt")),
            Some(ManifestKind::Requirements)
        );
        assert_eq!(
            detector.detect(Path::new("requirements/prod.txt")),
            Some(ManifestKind::Requirements)
        );
        assert_eq!(detector.detect(Path::new("notes.txt")), None);
        assert_eq!(detector.detect(Path::new("README.md")), None);
    }

    #[test]
    fn test_sbt_markers() {
        let detector = FormatDetector::new();
        let props = Path::new("/w/svc/project/build.properties");
        assert_eq!(detector.detect(props), Some(ManifestKind::SbtBuild));
        assert_eq!(ManifestKind::SbtBuild.project_dir(props), PathBuf::from("/w/svc"));
        assert_eq!(detector.detect(Path::new("/w/svc/build.properties")), None);
        assert_eq!(detector.detect(Path::new("/w/svc/src/Main.scala")), None);
        assert_eq!(
            detector.detect(Path::new("/w/svc/project/Dependencies.scala")),
            Some(ManifestKind::SbtBuild)
        );
    }

    #[test]
    fn test_parser_kind_metadata() {
        assert_eq!(ParserKind::GoSum.ecosystem(), Ecosystem::Golang);
        assert_eq!(ParserKind::CargoLock.name(), "Cargo.lock");
        assert_eq!(ManifestKind::GradleBuild.direct_parser(), None);
        assert_eq!(ManifestKind::Pom.direct_parser(), Some(ParserKind::Pom));
    }
}
