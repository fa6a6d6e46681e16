//! XML encoding.
//!
//! Element order follows the CycloneDX 1.2 schema sequence. Descriptions
//! are written as CDATA.

use super::{Bom, XML_NAMESPACE};
use crate::error::{DepBomError, RenderErrorKind, Result};
use crate::model::{Component, ExternalReference, LicenseChoice};
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

type XmlWriter = Writer<Vec<u8>>;

fn xml_error(e: impl std::fmt::Display) -> DepBomError {
    DepBomError::render("writing XML", RenderErrorKind::Xml(e.to_string()))
}

fn start(writer: &mut XmlWriter, element: BytesStart<'_>) -> Result<()> {
    writer.write_event(Event::Start(element)).map_err(xml_error)
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

/// `<name>text</name>`, text escaped
fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<()> {
    start(writer, BytesStart::new(name))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    end(writer, name)
}

fn description_element(writer: &mut XmlWriter, text: &str) -> Result<()> {
    // A literal "]]>" cannot live inside CDATA
    if text.contains("]]>") {
        return text_element(writer, "description", text);
    }
    start(writer, BytesStart::new("description"))?;
    writer
        .write_event(Event::CData(BytesCData::new(text)))
        .map_err(xml_error)?;
    end(writer, "description")
}

fn write_external_refs(writer: &mut XmlWriter, refs: &[ExternalReference]) -> Result<()> {
    if refs.is_empty() {
        return Ok(());
    }
    start(writer, BytesStart::new("externalReferences"))?;
    for reference in refs {
        let ref_type = reference.ref_type.to_string();
        let mut element = BytesStart::new("reference");
        element.push_attribute(("type", ref_type.as_str()));
        start(writer, element)?;
        text_element(writer, "url", &reference.url)?;
        end(writer, "reference")?;
    }
    end(writer, "externalReferences")
}

fn write_licenses(writer: &mut XmlWriter, licenses: &[LicenseChoice]) -> Result<()> {
    if licenses.is_empty() {
        return Ok(());
    }
    start(writer, BytesStart::new("licenses"))?;
    for choice in licenses {
        match choice {
            LicenseChoice::License { id, name, url } => {
                start(writer, BytesStart::new("license"))?;
                if let Some(id) = id {
                    text_element(writer, "id", id)?;
                } else if let Some(name) = name {
                    text_element(writer, "name", name)?;
                }
                if let Some(url) = url {
                    text_element(writer, "url", url)?;
                }
                end(writer, "license")?;
            }
            LicenseChoice::Expression(expr) => text_element(writer, "expression", expr)?,
        }
    }
    end(writer, "licenses")
}

fn write_component(writer: &mut XmlWriter, component: &Component) -> Result<()> {
    let mut element = BytesStart::new("component");
    element.push_attribute(("type", component.component_type.as_str()));
    element.push_attribute(("bom-ref", component.bom_ref.as_str()));
    start(writer, element)?;

    text_element(writer, "group", &component.group)?;
    text_element(writer, "name", &component.name)?;
    text_element(writer, "version", &component.version)?;
    if let Some(description) = &component.description {
        description_element(writer, description)?;
    }
    if let Some(scope) = component.scope {
        text_element(writer, "scope", &scope.to_string())?;
    }
    if !component.hashes.is_empty() {
        start(writer, BytesStart::new("hashes"))?;
        for hash in &component.hashes {
            let alg = hash.algorithm.to_string();
            let mut element = BytesStart::new("hash");
            element.push_attribute(("alg", alg.as_str()));
            start(writer, element)?;
            writer
                .write_event(Event::Text(BytesText::new(&hash.value)))
                .map_err(xml_error)?;
            end(writer, "hash")?;
        }
        end(writer, "hashes")?;
    }
    write_licenses(writer, &component.licenses)?;
    text_element(writer, "purl", &component.purl)?;
    write_external_refs(writer, &component.external_refs)?;

    end(writer, "component")
}

/// Render the BOM as indented CycloneDX XML.
pub fn render_xml(bom: &Bom) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml_error)?;

    let version = bom.version.to_string();
    let mut root = BytesStart::new("bom");
    root.push_attribute(("xmlns", XML_NAMESPACE));
    if let Some(serial) = &bom.serial_number {
        root.push_attribute(("serialNumber", serial.as_str()));
    }
    root.push_attribute(("version", version.as_str()));
    start(&mut writer, root)?;

    start(&mut writer, BytesStart::new("metadata"))?;
    text_element(&mut writer, "timestamp", &bom.metadata.timestamp)?;
    start(&mut writer, BytesStart::new("tools"))?;
    for tool in &bom.metadata.tools {
        start(&mut writer, BytesStart::new("tool"))?;
        text_element(&mut writer, "vendor", &tool.vendor)?;
        text_element(&mut writer, "name", &tool.name)?;
        text_element(&mut writer, "version", &tool.version)?;
        end(&mut writer, "tool")?;
    }
    end(&mut writer, "tools")?;
    if !bom.metadata.authors.is_empty() {
        start(&mut writer, BytesStart::new("authors"))?;
        for author in &bom.metadata.authors {
            start(&mut writer, BytesStart::new("author"))?;
            text_element(&mut writer, "name", &author.name)?;
            end(&mut writer, "author")?;
        }
        end(&mut writer, "authors")?;
    }
    if let Some(component) = &bom.metadata.component {
        write_component(&mut writer, component)?;
    }
    end(&mut writer, "metadata")?;

    start(&mut writer, BytesStart::new("components"))?;
    for component in &bom.components {
        write_component(&mut writer, component)?;
    }
    end(&mut writer, "components")?;

    write_external_refs(&mut writer, &bom.external_refs)?;
    end(&mut writer, "bom")?;

    String::from_utf8(writer.into_inner()).map_err(xml_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::{BomOptions, DETERMINISTIC_TIMESTAMP};
    use crate::model::{DependencyScope, Ecosystem, ExternalRefType, Hash, HashAlgorithm};

    fn component() -> Component {
        let mut c = Component::new(Ecosystem::Maven, "guava", "pkg:maven/com.google.guava/guava@33.0.0-jre?type=jar");
        c.group = "com.google.guava".into();
        c.version = "33.0.0-jre".into();
        c.description = Some("Guava <core> libraries".into());
        c.scope = Some(DependencyScope::Optional);
        c.hashes.push(Hash::new(HashAlgorithm::Sha256, "ab12".into()));
        c.licenses.push(LicenseChoice::Expression("Apache-2.0 OR MIT".into()));
        c.external_refs
            .push(ExternalReference::new(ExternalRefType::Website, "https://github.com/google/guava"));
        c
    }

    #[test]
    fn test_xml_structure() {
        let bom = Bom::new(vec![component()], None, &BomOptions::default().deterministic(true));
        let xml = render_xml(&bom).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains(r#"<bom xmlns="http://cyclonedx.org/schema/bom/1.2" version="1">"#));
        assert!(!xml.contains("serialNumber"));
        assert!(xml.contains(&format!("<timestamp>{DETERMINISTIC_TIMESTAMP}</timestamp>")));
        assert!(xml.contains(r#"<component type="library" bom-ref="pkg:maven/com.google.guava/guava@33.0.0-jre?type=jar">"#));
        assert!(xml.contains("<description><![CDATA[Guava <core> libraries]]></description>"));
        assert!(xml.contains("<scope>optional</scope>"));
        assert!(xml.contains(r#"<hash alg="SHA-256">ab12</hash>"#));
        assert!(xml.contains("<expression>Apache-2.0 OR MIT</expression>"));
        assert!(xml.contains(r#"<reference type="website">"#));

        let group = xml.find("<group>").unwrap();
        let purl = xml.find("<purl>").unwrap();
        let refs = xml.find("<externalReferences>").unwrap();
        assert!(group < purl && purl < refs);
    }

    #[test]
    fn test_xml_parses_back() {
        let bom = Bom::new(vec![component()], None, &BomOptions::default());
        let xml = render_xml(&bom).unwrap();
        let mut reader = quick_xml::Reader::from_str(&xml);
        let mut components = 0;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.local_name().as_ref() == b"component" => components += 1,
                Event::Eof => break,
                _ => {}
            }
        }
        assert_eq!(components, 1);
    }

    #[test]
    fn test_cdata_terminator_escaped() {
        let mut c = component();
        c.description = Some("odd ]]> text".into());
        let bom = Bom::new(vec![c], None, &BomOptions::default().deterministic(true));
        let xml = render_xml(&bom).unwrap();
        assert!(xml.contains("<description>odd ]]&gt; text</description>"));
    }
}
