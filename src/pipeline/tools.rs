//! Build tool invocation for JVM projects.
//!
//! Maven, Gradle and sbt resolve their own dependency graphs; the output of
//! their dependency report tasks is fed to the matching text parser. Each
//! tool has a fallback: a plainer command line, then whatever can be read
//! without the tool.

use super::exec::{ExecResult, run_command};
use super::temp::ScopedTempDir;
use crate::config::AppConfig;
use crate::error::{DepBomError, Result};
use crate::model::PackageSet;
use crate::parsers::{ParserKind, parse_content, parse_file};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

fn timeout(config: &AppConfig) -> Duration {
    Duration::from_secs(config.tools.timeout_secs)
}

fn describe_failure(result: &ExecResult) -> String {
    let reason = result
        .error
        .as_ref()
        .map_or_else(|| "unknown failure".to_string(), ToString::to_string);
    let detail = result
        .stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(str::trim);
    match detail {
        Some(line) => format!("{reason} ({line})"),
        None => reason,
    }
}

/// Resolve a Maven project with `mvn dependency:tree`, falling back to the POM.
#[must_use]
pub fn maven_packages(pom: &Path, config: &AppConfig) -> PackageSet {
    let dir = pom.parent().unwrap_or_else(|| Path::new("."));
    match run_maven_tree(pom, dir, config) {
        Ok(set) => set,
        Err(err) => {
            let reason = std::error::Error::source(&err)
                .map_or_else(|| err.to_string(), ToString::to_string);
            warn!(
                "{err} for {}: {reason}; reading pom.xml directly, transitive dependencies will be missing",
                pom.display()
            );
            parse_file(ParserKind::Pom, pom)
        }
    }
}

fn run_maven_tree(pom: &Path, dir: &Path, config: &AppConfig) -> Result<PackageSet> {
    let temp = ScopedTempDir::new()?;
    let tree_file = temp.join("dependency-tree.txt");

    let mut args = vec![
        "-B".to_string(),
        "dependency:tree".to_string(),
        "-DoutputType=text".to_string(),
        "-DappendOutput=true".to_string(),
        format!("-DoutputFile={}", tree_file.display()),
    ];
    if let Some(repo) = &config.cache.maven_repo {
        args.push(format!("-Dmaven.repo.local={}", repo.display()));
    }

    let result = run_command(&config.tools.maven, &args, dir, &[], timeout(config));
    if !result.success() {
        debug!("{} dependency:tree: {}", config.tools.maven, describe_failure(&result));
    }
    result.into_stdout("maven dependency tree")?;
    let content =
        std::fs::read_to_string(&tree_file).map_err(|e| DepBomError::io(&tree_file, e))?;
    let mut set = parse_content(ParserKind::MavenTree, &content, Some(pom));
    // The tree carries coordinates only; the POM adds project metadata
    if let Some(pom_root) = parse_file(ParserKind::Pom, pom).root {
        set.root = Some(pom_root);
    }
    Ok(set)
}

/// Command used for Gradle: configured, the project wrapper, or `gradle`
#[must_use]
pub fn gradle_command(dir: &Path, config: &AppConfig) -> String {
    if let Some(cmd) = &config.tools.gradle {
        return cmd.clone();
    }
    let wrapper: PathBuf = if cfg!(windows) {
        dir.join("gradlew.bat")
    } else {
        dir.join("gradlew")
    };
    if wrapper.is_file() {
        wrapper.display().to_string()
    } else {
        "gradle".to_string()
    }
}

/// Resolve a Gradle project from its `dependencies` report.
///
/// `runtimeClasspath` is tried first; older builds without that
/// configuration get the full report.
#[must_use]
pub fn gradle_packages(build_file: &Path, config: &AppConfig) -> PackageSet {
    let dir = build_file.parent().unwrap_or_else(|| Path::new("."));
    let command = gradle_command(dir, config);
    let envs: Vec<(String, String)> = config
        .cache
        .gradle_home
        .iter()
        .map(|home| ("GRADLE_USER_HOME".to_string(), home.display().to_string()))
        .collect();

    let attempts: [&[&str]; 2] = [
        &["dependencies", "-q", "--configuration", "runtimeClasspath"],
        &["dependencies", "-q"],
    ];
    for args in attempts {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        let result = run_command(&command, &args, dir, &envs, timeout(config));
        if result.success() {
            return parse_content(ParserKind::GradleDependencies, &result.stdout, Some(build_file));
        }
        info!(
            "{command} {} failed: {}",
            args.join(" "),
            describe_failure(&result)
        );
    }

    warn!(
        "Could not resolve Gradle dependencies for {}; no packages recorded",
        dir.display()
    );
    PackageSet {
        source: Some(build_file.to_path_buf()),
        ..PackageSet::default()
    }
}

/// Resolve an sbt project with `dependencyList`.
///
/// The list is written to a file when the sbt version supports
/// `::toFile`; otherwise it is read from the console output.
#[must_use]
pub fn sbt_packages(dir: &Path, config: &AppConfig) -> PackageSet {
    let source = Some(dir);
    let temp = match ScopedTempDir::new() {
        Ok(temp) => temp,
        Err(e) => {
            warn!("Could not create a temp dir for sbt: {e}");
            return PackageSet::default();
        }
    };
    let list_file = temp.join("dependency-list.txt");

    let to_file = vec![
        "-batch".to_string(),
        format!("dependencyList::toFile {} --force", list_file.display()),
    ];
    let result = run_command(&config.tools.sbt, &to_file, dir, &[], timeout(config));
    if result.success()
        && let Ok(content) = std::fs::read_to_string(&list_file)
    {
        return parse_content(ParserKind::SbtDependencyList, &content, source);
    }

    let plain = vec!["-batch".to_string(), "dependencyList".to_string()];
    let result = run_command(&config.tools.sbt, &plain, dir, &[], timeout(config));
    if result.success() {
        return parse_content(ParserKind::SbtDependencyList, &result.stdout, source);
    }

    warn!(
        "{} dependencyList failed in {}: {}",
        config.tools.sbt,
        dir.display(),
        describe_failure(&result)
    );
    PackageSet::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolErrorKind;
    use tempfile::TempDir;

    fn missing_tools() -> AppConfig {
        let mut config = AppConfig::default();
        config.tools.maven = "depbom-test-no-mvn".to_string();
        config.tools.gradle = Some("depbom-test-no-gradle".to_string());
        config.tools.sbt = "depbom-test-no-sbt".to_string();
        config.tools.timeout_secs = 5;
        config
    }

    #[test]
    fn test_maven_falls_back_to_pom() {
        let tmp = TempDir::new().unwrap();
        let pom = tmp.path().join("pom.xml");
        std::fs::write(
            &pom,
            r"<project>
  <groupId>com.acme</groupId>
  <artifactId>app</artifactId>
  <version>1.0.0</version>
  <dependencies>
    <dependency>
      <groupId>org.slf4j</groupId>
      <artifactId>slf4j-api</artifactId>
      <version>2.0.9</version>
    </dependency>
  </dependencies>
</project>",
        )
        .unwrap();

        let set = maven_packages(&pom, &missing_tools());
        assert_eq!(set.root.as_ref().map(|r| r.name.as_str()), Some("app"));
        assert_eq!(set.packages.len(), 1);
        assert_eq!(set.packages[0].name, "slf4j-api");
    }

    #[test]
    fn test_maven_tree_spawn_failure_is_tool_error() {
        let tmp = TempDir::new().unwrap();
        let pom = tmp.path().join("pom.xml");
        std::fs::write(&pom, "<project/>").unwrap();
        let err = run_maven_tree(&pom, tmp.path(), &missing_tools()).unwrap_err();
        assert!(matches!(
            err,
            DepBomError::Tool {
                source: ToolErrorKind::Spawn { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_gradle_failure_is_empty() {
        let tmp = TempDir::new().unwrap();
        let build = tmp.path().join("build.gradle");
        std::fs::write(&build, "").unwrap();
        let set = gradle_packages(&build, &missing_tools());
        assert!(set.is_empty());
        assert_eq!(set.source.as_deref(), Some(build.as_path()));
    }

    #[test]
    fn test_sbt_failure_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(sbt_packages(tmp.path(), &missing_tools()).is_empty());
    }

    #[test]
    fn test_gradle_command_prefers_wrapper() {
        let tmp = TempDir::new().unwrap();
        let config = AppConfig::default();
        assert_eq!(gradle_command(tmp.path(), &config), "gradle");

        let wrapper = if cfg!(windows) { "gradlew.bat" } else { "gradlew" };
        std::fs::write(tmp.path().join(wrapper), "").unwrap();
        assert!(gradle_command(tmp.path(), &config).ends_with(wrapper));

        let configured = missing_tools();
        assert_eq!(gradle_command(tmp.path(), &configured), "depbom-test-no-gradle");
    }
}
