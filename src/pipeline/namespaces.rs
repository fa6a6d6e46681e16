//! Class namespaces of resolved Maven artifacts.
//!
//! For each Maven component whose jar sits in the local repository, the Java
//! packages holding its classes are listed under the component's purl. Only
//! the zip central directory is read; entries are never inflated. Components
//! without a jar on disk are left out.

use crate::model::{Component, Ecosystem};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
const EOCD_LEN: usize = 22;
const CENTRAL_HEADER_LEN: usize = 46;

/// Purl to sorted class namespaces
pub type NamespaceMap = IndexMap<String, Vec<String>>;

/// Local Maven repository: the configured one, else `~/.m2/repository`
#[must_use]
pub fn maven_repository(configured: Option<&Path>) -> Option<PathBuf> {
    configured
        .map(Path::to_path_buf)
        .or_else(|| dirs::home_dir().map(|home| home.join(".m2").join("repository")))
}

/// Location of a component's jar in the repository layout
#[must_use]
pub fn jar_path(repo: &Path, component: &Component) -> Option<PathBuf> {
    if component.ecosystem != Ecosystem::Maven
        || component.group.is_empty()
        || component.version.is_empty()
    {
        return None;
    }
    let mut path = repo.to_path_buf();
    path.extend(component.group.split('.'));
    path.push(&component.name);
    path.push(&component.version);
    path.push(format!("{}-{}.jar", component.name, component.version));
    Some(path)
}

/// Map every Maven component with a readable jar to its namespaces.
#[must_use]
pub fn namespace_map(components: &[Component], repo: &Path) -> NamespaceMap {
    let mut map = NamespaceMap::new();
    for component in components {
        let Some(jar) = jar_path(repo, component) else {
            continue;
        };
        if !jar.is_file() {
            debug!("No jar for {} at {}", component.purl, jar.display());
            continue;
        }
        match std::fs::read(&jar).and_then(|bytes| jar_namespaces(&bytes)) {
            Ok(namespaces) if !namespaces.is_empty() => {
                map.insert(component.purl.clone(), namespaces);
            }
            Ok(_) => {}
            Err(e) => warn!("Could not list classes in {}: {e}", jar.display()),
        }
    }
    map
}

/// Dotted package names of the `.class` entries in a jar, sorted.
pub fn jar_namespaces(bytes: &[u8]) -> io::Result<Vec<String>> {
    let eocd = find_eocd(bytes).ok_or_else(|| invalid("no end of central directory record"))?;
    let entries = read_u16(bytes, eocd + 10).ok_or_else(|| invalid("truncated directory record"))?;
    let mut offset = read_u32(bytes, eocd + 16)
        .ok_or_else(|| invalid("truncated directory record"))? as usize;

    let mut namespaces = BTreeSet::new();
    for _ in 0..entries {
        if read_u32(bytes, offset) != Some(CENTRAL_HEADER_SIGNATURE) {
            return Err(invalid(format!("bad central directory entry at {offset}")));
        }
        let field = |at: usize| {
            read_u16(bytes, offset + at)
                .map(usize::from)
                .ok_or_else(|| invalid("truncated central directory entry"))
        };
        let (name_len, extra_len, comment_len) = (field(28)?, field(30)?, field(32)?);
        let name_start = offset + CENTRAL_HEADER_LEN;
        let name = bytes
            .get(name_start..name_start + name_len)
            .ok_or_else(|| invalid("truncated entry name"))?;
        if let Some(namespace) = class_namespace(&String::from_utf8_lossy(name)) {
            namespaces.insert(namespace);
        }
        offset = name_start + name_len + extra_len + comment_len;
    }

    Ok(namespaces.into_iter().collect())
}

/// `org/slf4j/Logger.class` → `org.slf4j`. Default-package classes and
/// `META-INF` entries have no namespace.
fn class_namespace(entry: &str) -> Option<String> {
    let (dir, _) = entry.strip_suffix(".class")?.rsplit_once('/')?;
    if dir.starts_with("META-INF") {
        return None;
    }
    Some(dir.replace('/', "."))
}

/// The end record sits at the tail, followed by a comment of up to 64 KiB.
fn find_eocd(bytes: &[u8]) -> Option<usize> {
    let last = bytes.len().checked_sub(EOCD_LEN)?;
    let first = last.saturating_sub(usize::from(u16::MAX));
    (first..=last)
        .rev()
        .find(|&at| read_u32(bytes, at) == Some(EOCD_SIGNATURE))
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let b = bytes.get(at..at + 2)?;
    Some(u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}
