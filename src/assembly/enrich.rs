//! Per-record enrichment: hashes, licenses, external references, type.
//!
//! Every function here is a pure function of a [`PackageRecord`].

use crate::model::{
    Component, ComponentType, ExternalRefType, ExternalReference, Hash, HashAlgorithm,
    LicenseChoice, PackageRecord, Purl, RawLicense,
};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use tracing::debug;

/// Priority order for algorithms taken from an integrity string
const SRI_PRIORITY: [HashAlgorithm; 4] = [
    HashAlgorithm::Sha512,
    HashAlgorithm::Sha384,
    HashAlgorithm::Sha256,
    HashAlgorithm::Sha1,
];

/// Hex digest lengths passed through unchanged
const HEX_LENGTHS: [usize; 5] = [32, 40, 64, 96, 128];

/// Normalise a digest to lowercase hex.
///
/// Values that already look like a hex digest (32, 40, 64, 96 or 128 hex
/// characters) are lowercased; anything else is decoded as base64. Returns
/// `None` when the value is neither.
///
/// ```
/// use depbom::assembly::normalize_digest;
///
/// assert_eq!(normalize_digest("3q2+7w==").as_deref(), Some("deadbeef"));
/// ```
#[must_use]
pub fn normalize_digest(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if HEX_LENGTHS.contains(&value.len()) && value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Some(value.to_ascii_lowercase());
    }
    STANDARD
        .decode(value)
        .or_else(|_| STANDARD_NO_PAD.decode(value))
        .ok()
        .filter(|bytes| !bytes.is_empty())
        .map(hex::encode)
}

/// Extract hashes from a subresource-integrity string.
///
/// At most one hash per algorithm, ordered SHA-512, SHA-384, SHA-256, SHA-1
/// regardless of the order in the string. Other algorithms are ignored.
#[must_use]
pub fn parse_integrity(sri: &str) -> Vec<Hash> {
    let entries: Vec<(HashAlgorithm, &str)> = sri
        .split_whitespace()
        .filter_map(|token| {
            let (tag, value) = token.split_once('-')?;
            // Options after '?' are not part of the digest
            let value = value.split('?').next().unwrap_or(value);
            Some((HashAlgorithm::from_tag(tag)?, value))
        })
        .collect();

    SRI_PRIORITY
        .iter()
        .filter_map(|algorithm| {
            let (_, value) = entries.iter().find(|(a, _)| a == algorithm)?;
            match normalize_digest(value) {
                Some(hex) => Some(Hash::new(*algorithm, hex)),
                None => {
                    debug!("Ignoring undecodable {algorithm} integrity value");
                    None
                }
            }
        })
        .collect()
}

/// Resolve the hashes of a record.
///
/// A raw SHA-1 `shasum` is used exclusively. Otherwise the integrity string
/// is parsed, then explicit digests for algorithms not yet present follow.
#[must_use]
pub fn hashes_for(record: &PackageRecord) -> Vec<Hash> {
    let integrity = &record.integrity;
    if let Some(shasum) = integrity.shasum.as_deref()
        && let Some(hex) = normalize_digest(shasum)
    {
        return vec![Hash::new(HashAlgorithm::Sha1, hex)];
    }

    let mut hashes = integrity
        .sri
        .as_deref()
        .map(parse_integrity)
        .unwrap_or_default();

    for digest in &integrity.digests {
        if hashes.iter().any(|h| h.algorithm == digest.algorithm) {
            continue;
        }
        if let Some(hex) = normalize_digest(&digest.value) {
            hashes.push(Hash::new(digest.algorithm, hex));
        } else {
            debug!(
                "Ignoring undecodable {} digest for {}",
                digest.algorithm,
                record.display_name()
            );
        }
    }
    hashes
}

/// Map the record's license data to BOM license choices, without duplicates.
#[must_use]
pub fn licenses_for(record: &PackageRecord) -> Vec<LicenseChoice> {
    let choices: Vec<LicenseChoice> = match &record.license {
        RawLicense::None => Vec::new(),
        RawLicense::Text(text) => LicenseChoice::from_text(text).into_iter().collect(),
        RawLicense::List(items) => items
            .iter()
            .filter_map(|text| LicenseChoice::from_text(text))
            .collect(),
        RawLicense::Structured(objects) => objects
            .iter()
            .filter_map(|obj| {
                LicenseChoice::from_text_with_url(
                    obj.id.as_deref().unwrap_or_default(),
                    obj.url.as_deref(),
                )
            })
            .collect(),
    };

    let mut unique = Vec::with_capacity(choices.len());
    for choice in choices {
        if !unique.contains(&choice) {
            unique.push(choice);
        }
    }
    unique
}

/// Homepage, issue tracker and repository links, in that order.
#[must_use]
pub fn external_references_for(record: &PackageRecord) -> Vec<ExternalReference> {
    [
        (ExternalRefType::Website, record.homepage.as_deref()),
        (ExternalRefType::IssueTracker, record.bug_tracker.as_deref()),
        (ExternalRefType::Vcs, record.repository.as_deref()),
    ]
    .into_iter()
    .filter_map(|(ref_type, url)| {
        let url = url?.trim();
        (!url.is_empty()).then(|| ExternalReference::new(ref_type, url))
    })
    .collect()
}

/// `framework` when the keywords mention it, `library` otherwise.
#[must_use]
pub fn component_type_for(record: &PackageRecord) -> ComponentType {
    if record
        .keywords
        .iter()
        .any(|k| k.trim().eq_ignore_ascii_case("framework"))
    {
        ComponentType::Framework
    } else {
        ComponentType::Library
    }
}

/// Build a fully enriched component for a record (scope is left unset).
#[must_use]
pub fn component_for(record: &PackageRecord, purl: &Purl) -> Component {
    let mut component = Component::new(record.ecosystem, purl.name.clone(), purl.to_string());
    component.component_type = component_type_for(record);
    component.group.clone_from(&purl.namespace);
    component.version = record.version.clone().unwrap_or_default();
    component.description = record
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(ToString::to_string);
    component.hashes = hashes_for(record);
    component.licenses = licenses_for(record);
    component.external_refs = external_references_for(record);
    component
}

/// The project's own component for BOM metadata.
#[must_use]
pub fn root_component(record: &PackageRecord) -> Component {
    let mut component = component_for(record, &Purl::for_record(record));
    component.component_type = ComponentType::Application;
    component
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Ecosystem, LicenseObject, RawDigest};

    const SHA1_HEX: &str = "0123456789abcdef0123456789abcdef01234567";

    fn npm(name: &str) -> PackageRecord {
        PackageRecord::new(Ecosystem::Npm, name).with_version("1.0.0")
    }

    #[test]
    fn test_hex_passthrough_and_lowercase() {
        assert_eq!(normalize_digest(SHA1_HEX).as_deref(), Some(SHA1_HEX));
        assert_eq!(
            normalize_digest(&SHA1_HEX.to_uppercase()).as_deref(),
            Some(SHA1_HEX)
        );
    }

    #[test]
    fn test_base64_decoded_to_hex() {
        assert_eq!(normalize_digest("AAEC/w==").as_deref(), Some("000102ff"));
        assert_eq!(normalize_digest("not base64 !!"), None);
        assert_eq!(normalize_digest(""), None);
    }

    #[test]
    fn test_integrity_priority_order() {
        let sri = "sha1-AAEC/w== sha512-AQID sha256-BAUG md5-AAAA";
        let hashes = parse_integrity(sri);
        let algorithms: Vec<HashAlgorithm> = hashes.iter().map(|h| h.algorithm).collect();
        assert_eq!(
            algorithms,
            vec![HashAlgorithm::Sha512, HashAlgorithm::Sha256, HashAlgorithm::Sha1]
        );
        assert_eq!(hashes[0].value, "010203");
    }

    #[test]
    fn test_shasum_is_exclusive() {
        let mut record = npm("left-pad");
        record.integrity.shasum = Some(SHA1_HEX.to_string());
        record.integrity.sri = Some("sha512-AQID".to_string());
        let hashes = hashes_for(&record);
        assert_eq!(hashes, vec![Hash::new(HashAlgorithm::Sha1, SHA1_HEX.to_string())]);
    }

    #[test]
    fn test_digests_fill_missing_algorithms() {
        let mut record = npm("pkg")
            .with_digest(RawDigest::new(HashAlgorithm::Sha512, "AQID"))
            .with_digest(RawDigest::new(HashAlgorithm::Sha256, "BAUG"));
        record.integrity.sri = Some("sha512-CQkJ".to_string());
        let hashes = hashes_for(&record);
        assert_eq!(hashes.len(), 2);
        assert_eq!(hashes[0].value, "090909");
        assert_eq!(hashes[1].algorithm, HashAlgorithm::Sha256);
    }

    #[test]
    fn test_external_references_skip_absent() {
        let mut record = npm("pkg");
        record.homepage = Some("https://example.com".into());
        record.repository = Some("  ".into());
        let refs = external_references_for(&record);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].ref_type, ExternalRefType::Website);
    }

    #[test]
    fn test_framework_keyword() {
        let mut record = npm("express");
        record.keywords = vec!["web".into(), "Framework".into()];
        assert_eq!(component_type_for(&record), ComponentType::Framework);
        assert_eq!(component_type_for(&npm("lodash")), ComponentType::Library);
    }

    #[test]
    fn test_licenses_deduplicated_and_structured() {
        let record = npm("pkg").with_license(RawLicense::List(vec!["MIT".into(), "MIT".into()]));
        assert_eq!(licenses_for(&record).len(), 1);

        let record = npm("pkg").with_license(RawLicense::Structured(vec![LicenseObject {
            id: Some("BSD-3-Clause".into()),
            url: Some("https://opensource.org/licenses/BSD-3-Clause".into()),
        }]));
        assert_eq!(
            licenses_for(&record),
            vec![LicenseChoice::License {
                id: Some("BSD-3-Clause".into()),
                name: None,
                url: Some("https://opensource.org/licenses/BSD-3-Clause".into()),
            }]
        );
    }

    #[test]
    fn test_root_component_is_application() {
        let root = root_component(&npm("my-app"));
        assert_eq!(root.component_type, ComponentType::Application);
        assert_eq!(root.purl, "pkg:npm/my-app@1.0.0");
    }
}
