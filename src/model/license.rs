//! License choices as emitted in the BOM.
//!
//! Uses the `spdx` crate to map free-form license strings onto SPDX
//! identifiers and expressions, falling back to a plain license name.

use serde::{Deserialize, Serialize};

/// One entry of a component's `licenses` list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseChoice {
    /// A single license, identified by SPDX id or by name
    License {
        id: Option<String>,
        name: Option<String>,
        url: Option<String>,
    },
    /// A compound SPDX expression (`MIT OR Apache-2.0`)
    Expression(String),
}

impl LicenseChoice {
    /// Classify a license string.
    ///
    /// Exact SPDX ids win, then multi-term expressions that parse leniently,
    /// then imprecise id matches (`Apache 2`, `GPLv3`); anything else is kept
    /// as a license name.
    #[must_use]
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.trim().trim_start_matches('(').trim_end_matches(')').trim();
        if text.is_empty() || text.eq_ignore_ascii_case("UNLICENSED") {
            return None;
        }

        if let Some(id) = spdx::license_id(text) {
            return Some(Self::spdx_id(id.name));
        }

        if is_compound(text) && spdx::Expression::parse_mode(text, spdx::ParseMode::LAX).is_ok() {
            return Some(Self::Expression(text.to_string()));
        }

        if let Some((id, _)) = spdx::imprecise_license_id(text) {
            return Some(Self::spdx_id(id.name));
        }

        Some(Self::License {
            id: None,
            name: Some(text.to_string()),
            url: None,
        })
    }

    /// Same as [`LicenseChoice::from_text`] but carrying a license URL
    #[must_use]
    pub fn from_text_with_url(text: &str, url: Option<&str>) -> Option<Self> {
        let url = url.map(str::trim).filter(|u| !u.is_empty());
        match Self::from_text(text) {
            Some(Self::License { id, name, .. }) => Some(Self::License {
                id,
                name,
                url: url.map(ToString::to_string),
            }),
            Some(expr @ Self::Expression(_)) => Some(expr),
            None => url.map(|u| Self::License {
                id: None,
                name: None,
                url: Some(u.to_string()),
            }),
        }
    }

    fn spdx_id(id: &str) -> Self {
        Self::License {
            id: Some(id.to_string()),
            name: None,
            url: None,
        }
    }
}

fn is_compound(text: &str) -> bool {
    text.split_whitespace()
        .any(|word| matches!(word, "OR" | "AND" | "WITH" | "or" | "and"))
}
