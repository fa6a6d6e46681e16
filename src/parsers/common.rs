//! Small helpers shared by the JSON-based parsers.

use crate::model::{LicenseObject, RawLicense};
use serde_json::Value;

/// Non-empty trimmed string field
pub(crate) fn json_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// A field that is either a URL string or an object with a `url` key
/// (`bugs`, `repository` in package.json).
pub(crate) fn json_url(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        obj @ Value::Object(_) => json_str(obj, "url").map(ToString::to_string),
        _ => None,
    }
}

/// Array of strings, ignoring non-string items
pub(crate) fn json_string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Read license data from `license` or the legacy `licenses` field.
///
/// Accepts a string, a `{type, url}` object, or an array of either.
pub(crate) fn json_license(value: &Value) -> RawLicense {
    let field = value.get("license").or_else(|| value.get("licenses"));
    match field {
        Some(Value::String(s)) => RawLicense::from_list(vec![s.clone()]),
        Some(obj @ Value::Object(_)) => license_object(obj)
            .map_or(RawLicense::None, |o| RawLicense::Structured(vec![o])),
        Some(Value::Array(items)) => {
            if items.iter().all(Value::is_string) {
                RawLicense::from_list(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(ToString::to_string)
                        .collect(),
                )
            } else {
                let objects: Vec<LicenseObject> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(LicenseObject {
                            id: Some(s.clone()),
                            url: None,
                        }),
                        obj @ Value::Object(_) => license_object(obj),
                        _ => None,
                    })
                    .collect();
                if objects.is_empty() {
                    RawLicense::None
                } else {
                    RawLicense::Structured(objects)
                }
            }
        }
        _ => RawLicense::None,
    }
}

fn license_object(obj: &Value) -> Option<LicenseObject> {
    let id = json_str(obj, "type")
        .or_else(|| json_str(obj, "name"))
        .map(ToString::to_string);
    let url = json_str(obj, "url").map(ToString::to_string);
    if id.is_none() && url.is_none() {
        None
    } else {
        Some(LicenseObject { id, url })
    }
}
