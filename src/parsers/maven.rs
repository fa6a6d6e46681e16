//! Maven parsing: `pom.xml` (best-effort fallback) and the text output of
//! `mvn dependency:tree`.

use super::traits::{LockfileParser, ParseError};
use super::tree::{TreeBuilder, tree_prefix_len};
use crate::model::{DependencyEdge, Ecosystem, LicenseObject, PackageRecord, PackageSet, RawLicense};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Parser for `pom.xml`
pub struct PomParser;

impl LockfileParser for PomParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        parse_pom_xml(content)
    }

    fn format_name(&self) -> &'static str {
        "pom.xml"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Maven
    }
}

/// Parser for `mvn dependency:tree` text output
pub struct MavenTreeParser;

impl LockfileParser for MavenTreeParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        Ok(parse_maven_tree(content))
    }

    fn format_name(&self) -> &'static str {
        "mvn dependency:tree"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Maven
    }
}

// ============================================================================
// pom.xml
// ============================================================================

#[derive(Debug, Default, Clone)]
struct PomDependency {
    group_id: String,
    artifact_id: String,
    version: String,
    dep_type: String,
    classifier: String,
}

#[derive(Debug, Default)]
struct PomState {
    group_id: String,
    artifact_id: String,
    version: String,
    parent_group_id: String,
    parent_version: String,
    description: String,
    url: String,
    scm_url: String,
    issues_url: String,
    properties: HashMap<String, String>,
    licenses: Vec<LicenseObject>,
    current_license: LicenseObject,
    dependencies: Vec<PomDependency>,
    managed: Vec<PomDependency>,
    current_dependency: PomDependency,
}

fn at(path: &[String], expected: &[&str]) -> bool {
    path.len() == expected.len() && path.iter().zip(expected).all(|(a, b)| a == b)
}

/// Parse a POM without running Maven.
///
/// Reads project coordinates (inheriting from `<parent>`), licenses, SCM and
/// issue-tracker URLs, and the direct dependencies. `${...}` property
/// references are substituted from `<properties>` and the project
/// coordinates; versions missing on a dependency are looked up in
/// `<dependencyManagement>`. Transitive dependencies are out of reach
/// without the build tool.
pub fn parse_pom_xml(content: &str) -> Result<PackageSet, ParseError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut state = PomState::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::End(_) => {
                close_element(&path, &mut state);
                path.pop();
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                set_text(&path, text, &mut state);
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                set_text(&path, text, &mut state);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if state.artifact_id.is_empty() {
        return Err(ParseError::MissingField("project/artifactId".to_string()));
    }
    Ok(build_pom_set(state))
}

fn set_text(path: &[String], text: String, state: &mut PomState) {
    let p: Vec<&str> = path.iter().map(String::as_str).collect();
    match p.as_slice() {
        ["project", "groupId"] => state.group_id = text,
        ["project", "artifactId"] => state.artifact_id = text,
        ["project", "version"] => state.version = text,
        ["project", "description"] => state.description = text,
        ["project", "url"] => state.url = text,
        ["project", "parent", "groupId"] => state.parent_group_id = text,
        ["project", "parent", "version"] => state.parent_version = text,
        ["project", "scm", "url"] => state.scm_url = text,
        ["project", "issueManagement", "url"] => state.issues_url = text,
        ["project", "properties", key] => {
            state.properties.insert((*key).to_string(), text);
        }
        ["project", "licenses", "license", "name"] => state.current_license.id = Some(text),
        ["project", "licenses", "license", "url"] => state.current_license.url = Some(text),
        ["project", "dependencies", "dependency", field]
        | ["project", "dependencyManagement", "dependencies", "dependency", field] => {
            let dep = &mut state.current_dependency;
            match *field {
                "groupId" => dep.group_id = text,
                "artifactId" => dep.artifact_id = text,
                "version" => dep.version = text,
                "type" => dep.dep_type = text,
                "classifier" => dep.classifier = text,
                _ => {}
            }
        }
        _ => {}
    }
}

fn close_element(path: &[String], state: &mut PomState) {
    if at(path, &["project", "licenses", "license"]) {
        let license = std::mem::take(&mut state.current_license);
        if license.id.is_some() || license.url.is_some() {
            state.licenses.push(license);
        }
    } else if at(path, &["project", "dependencies", "dependency"]) {
        let dep = std::mem::take(&mut state.current_dependency);
        state.dependencies.push(dep);
    } else if at(path, &["project", "dependencyManagement", "dependencies", "dependency"]) {
        let dep = std::mem::take(&mut state.current_dependency);
        state.managed.push(dep);
    }
}

fn build_pom_set(state: PomState) -> PackageSet {
    let group_id = if state.group_id.is_empty() {
        state.parent_group_id.clone()
    } else {
        state.group_id.clone()
    };
    let version = if state.version.is_empty() {
        state.parent_version.clone()
    } else {
        state.version.clone()
    };

    let mut props = state.properties.clone();
    for (key, value) in [
        ("project.groupId", &group_id),
        ("project.artifactId", &state.artifact_id),
        ("project.version", &version),
        ("project.parent.version", &state.parent_version),
        ("pom.version", &version),
    ] {
        props.insert(key.to_string(), value.clone());
    }
    let resolve = |s: &str| substitute_properties(s, &props);

    let mut root = PackageRecord::new(Ecosystem::Maven, resolve(&state.artifact_id))
        .with_group(resolve(&group_id))
        .with_version(resolve(&version))
        .with_qualifier("type", "jar");
    if !state.licenses.is_empty() {
        root.license = RawLicense::Structured(state.licenses.clone());
    }
    root.description = Some(state.description.clone()).filter(|s| !s.is_empty());
    root.homepage = Some(resolve(&state.url)).filter(|s| !s.is_empty());
    root.repository = Some(resolve(&state.scm_url)).filter(|s| !s.is_empty());
    root.bug_tracker = Some(resolve(&state.issues_url)).filter(|s| !s.is_empty());

    let managed: HashMap<(String, String), String> = state
        .managed
        .iter()
        .map(|d| {
            (
                (resolve(&d.group_id), resolve(&d.artifact_id)),
                resolve(&d.version),
            )
        })
        .collect();

    let mut set = PackageSet::new();
    for dep in &state.dependencies {
        let group = resolve(&dep.group_id);
        let artifact = resolve(&dep.artifact_id);
        if group.is_empty() || artifact.is_empty() {
            warn!("Skipping POM dependency without coordinates");
            continue;
        }
        let mut version = resolve(&dep.version);
        if version.is_empty()
            && let Some(v) = managed.get(&(group.clone(), artifact.clone()))
        {
            version.clone_from(v);
        }
        if version.contains("${") {
            debug!("Unresolved property in version of {group}:{artifact}: {version}");
        }

        let dep_type = if dep.dep_type.is_empty() {
            "jar".to_string()
        } else {
            resolve(&dep.dep_type)
        };
        let mut record = PackageRecord::new(Ecosystem::Maven, artifact)
            .with_group(group)
            .with_version(version)
            .with_qualifier("type", dep_type);
        if !dep.classifier.is_empty() {
            record = record.with_qualifier("classifier", resolve(&dep.classifier));
        }
        set.push(record);
    }

    set.with_root(root)
}

/// Replace `${name}` references, leaving unknown ones in place.
fn substitute_properties(value: &str, props: &HashMap<String, String>) -> String {
    let mut result = value.trim().to_string();
    // Bounded to stop self-referencing properties
    for _ in 0..8 {
        let Some(start) = result.find("${") else {
            break;
        };
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let key = &result[start + 2..start + len];
        let Some(replacement) = props.get(key) else {
            break;
        };
        result = format!("{}{}{}", &result[..start], replacement, &result[start + len + 1..]);
    }
    result
}

// ============================================================================
// dependency:tree text output
// ============================================================================

/// Parse `mvn dependency:tree -DoutputType=text` output.
///
/// The first unindented coordinate is the project; indented lines nest by
/// the width of their `+- ` / `|  ` prefix. Lines with no tree prefix that
/// follow the first root (multi-module builds, or output without tree
/// drawing) become top-level packages, so the project owns everything.
#[must_use]
pub fn parse_maven_tree(content: &str) -> PackageSet {
    let mut builder = TreeBuilder::new();

    for raw in content.lines() {
        let line = raw
            .strip_prefix("[INFO] ")
            .unwrap_or(raw)
            .trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let prefix = tree_prefix_len(line);
        let coordinate = line[prefix..].split_whitespace().next().unwrap_or_default();
        let Some(record) = parse_coordinate(coordinate) else {
            debug!("Skipping non-coordinate line in dependency tree: {line}");
            continue;
        };
        let depth = prefix.div_ceil(3);
        builder.push(depth, record);
    }

    let mut set = PackageSet::new();
    for (depth, mut record) in builder.finish() {
        if depth == 0 && set.root.is_none() {
            for (_, edge) in record.dependencies.drain(..) {
                if let DependencyEdge::Expanded(child) = edge {
                    set.push(*child);
                }
            }
            set.root = Some(record);
        } else {
            set.push(record);
        }
    }
    set
}

/// `group:artifact:type[:classifier]:version[:scope]`
fn parse_coordinate(coordinate: &str) -> Option<PackageRecord> {
    let parts: Vec<&str> = coordinate.split(':').collect();
    let (group, artifact, dep_type, classifier, version) = match parts.as_slice() {
        [g, a, t, v] | [g, a, t, v, _] => (*g, *a, *t, "", *v),
        [g, a, t, c, v, _] => (*g, *a, *t, *c, *v),
        _ => return None,
    };
    if group.is_empty() || artifact.is_empty() || version.is_empty() {
        return None;
    }
    let mut record = PackageRecord::new(Ecosystem::Maven, artifact)
        .with_group(group)
        .with_version(version)
        .with_qualifier("type", dep_type);
    if !classifier.is_empty() {
        record = record.with_qualifier("classifier", classifier);
    }
    Some(record)
}
