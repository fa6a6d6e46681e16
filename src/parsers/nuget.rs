//! .NET: `packages.config` and SDK/legacy-style `*.csproj` files.

use super::traits::{LockfileParser, ParseError};
use crate::model::{Ecosystem, PackageRecord, PackageSet};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::warn;

/// Parser for `packages.config`
pub struct PackagesConfigParser;

impl LockfileParser for PackagesConfigParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        parse_packages_config(content)
    }

    fn format_name(&self) -> &'static str {
        "packages.config"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Nuget
    }
}

/// Parser for `*.csproj`
pub struct CsprojParser;

impl LockfileParser for CsprojParser {
    fn parse_str(&self, content: &str) -> Result<PackageSet, ParseError> {
        parse_csproj(content)
    }

    fn format_name(&self) -> &'static str {
        "csproj"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Nuget
    }
}

/// Attribute value, or `None` when absent or undecodable so that the
/// element is skipped rather than the file.
fn attribute(element: &BytesStart<'_>, name: &str) -> Option<String> {
    for attr in element.attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(e) => {
                warn!(
                    "Malformed attribute on <{}>: {e}",
                    String::from_utf8_lossy(element.name().as_ref())
                );
                return None;
            }
        };
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return match attr.unescape_value() {
                Ok(value) => Some(value.trim().to_string()),
                Err(e) => {
                    warn!("Undecodable '{name}' attribute: {e}");
                    None
                }
            };
        }
    }
    None
}

fn nuget_record(id: &str, version: &str) -> PackageRecord {
    PackageRecord::new(Ecosystem::Nuget, id).with_version(version)
}

/// Parse `<package id=".." version=".."/>` entries.
pub fn parse_packages_config(content: &str) -> Result<PackageSet, ParseError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut set = PackageSet::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"package" => {
                match (attribute(&e, "id"), attribute(&e, "version")) {
                    (Some(id), Some(version)) if !id.is_empty() => {
                        set.push(nuget_record(&id, &version));
                    }
                    _ => warn!("Skipping packages.config entry without id or version"),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(set)
}

/// Parse `PackageReference` items (version as attribute or child element)
/// and legacy `Reference` items whose `Include` carries a `Version=` part.
pub fn parse_csproj(content: &str) -> Result<PackageSet, ParseError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut set = PackageSet::new();

    // Open <PackageReference> waiting for a child <Version>
    let mut pending: Option<(String, Option<String>)> = None;
    let mut in_version = false;

    loop {
        match reader.read_event()? {
            Event::Empty(e) => match e.local_name().as_ref() {
                b"PackageReference" => {
                    if let Some(id) = attribute(&e, "Include") {
                        push_reference(&mut set, id, attribute(&e, "Version"));
                    }
                }
                b"Reference" => push_legacy_reference(&mut set, attribute(&e, "Include")),
                _ => {}
            },
            Event::Start(e) => match e.local_name().as_ref() {
                b"PackageReference" => {
                    pending = attribute(&e, "Include").map(|id| (id, attribute(&e, "Version")));
                }
                b"Version" if pending.is_some() => in_version = true,
                b"Reference" => push_legacy_reference(&mut set, attribute(&e, "Include")),
                _ => {}
            },
            Event::Text(t) if in_version => {
                let text = t.unescape()?.trim().to_string();
                if let Some((_, version)) = pending.as_mut() {
                    *version = Some(text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"Version" => in_version = false,
                b"PackageReference" => {
                    if let Some((id, version)) = pending.take() {
                        push_reference(&mut set, id, version);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(set)
}

fn push_reference(set: &mut PackageSet, id: String, version: Option<String>) {
    match version.filter(|v| !v.is_empty()) {
        Some(version) if !id.is_empty() => set.push(nuget_record(&id, &version)),
        _ => warn!("Skipping PackageReference '{id}' without a version"),
    }
}

/// `log4net, Version=2.0.8.0, Culture=neutral` style includes
fn push_legacy_reference(set: &mut PackageSet, include: Option<String>) {
    let Some(include) = include else {
        return;
    };
    let mut parts = include.split(',').map(str::trim);
    let Some(name) = parts.next().filter(|n| !n.is_empty()) else {
        return;
    };
    if let Some(version) = parts.find_map(|p| p.strip_prefix("Version=")) {
        set.push(nuget_record(name, version));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packages_config() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<packages>
  <package id="Newtonsoft.Json" version="13.0.3" targetFramework="net48" />
  <package id="NUnit" version="3.14.0" targetFramework="net48" developmentDependency="true" />
  <package id="Broken" />
</packages>"#;
        let set = parse_packages_config(xml).unwrap();
        assert_eq!(set.packages.len(), 2);
        assert_eq!(set.packages[0].name, "Newtonsoft.Json");
        assert_eq!(set.packages[1].version.as_deref(), Some("3.14.0"));
    }

    #[test]
    fn test_undecodable_attribute_skips_entry() {
        let xml = r#"<packages>
  <package id="Newtonsoft.Json" version="13.0.3" />
  <package id="Odd" version="1.0&bogus;" />
  <package id="NUnit" version="3.14.0" />
</packages>"#;
        let set = parse_packages_config(xml).unwrap();
        let names: Vec<&str> = set.packages.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Newtonsoft.Json", "NUnit"]);
    }

    #[test]
    fn test_csproj_reference_styles() {
        let xml = r#"<Project Sdk="Microsoft.NET.Sdk">
  <ItemGroup>
    <PackageReference Include="Serilog" Version="3.1.1" />
    <PackageReference Include="Polly">
      <Version>8.2.0</Version>
    </PackageReference>
    <PackageReference Include="Floating" />
    <Reference Include="log4net, Version=2.0.8.0, Culture=neutral, PublicKeyToken=669e0ddf0bb1aa2a">
      <HintPath>..\packages\log4net.2.0.8\lib\net45\log4net.dll</HintPath>
    </Reference>
    <Reference Include="System.Xml" />
  </ItemGroup>
</Project>"#;
        let set = parse_csproj(xml).unwrap();
        let ids: Vec<(&str, Option<&str>)> = set
            .packages
            .iter()
            .map(|r| (r.name.as_str(), r.version.as_deref()))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("Serilog", Some("3.1.1")),
                ("Polly", Some("8.2.0")),
                ("log4net", Some("2.0.8.0")),
            ]
        );
    }
}
