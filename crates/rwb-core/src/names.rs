//! Display-name resolution for `RouteProperties.xml` / `ScenarioProperties.xml`.
//!
//! The files are exported by many different tools and language tagging is
//! inconsistent, so a name is picked in three tiers:
//! 1. the "other languages" table, matched against the requested tag
//!    (any regional Chinese variant counts for `zh`);
//! 2. the built-in language elements in fixed priority order, only those
//!    marked as `cDeltaString`;
//! 3. the same built-in scan without the marker.

use std::fs;
use std::path::Path;

use log::{debug, warn};
use roxmltree::{Document, Node};

use crate::error::NameError;

pub const ROUTE_PROPERTIES: &str = "RouteProperties.xml";
pub const SCENARIO_PROPERTIES: &str = "ScenarioProperties.xml";

/// Built-in language elements, in fallback priority order.
pub const BUILTIN_LANGUAGES: [&str; 8] = [
    "English", "French", "German", "Spanish", "Italian", "Russian", "Dutch", "Polish",
];

const DISPLAY_NAME: &str = "DisplayName";
const LOCALISED_STRING: &str = "Localisation-cUserLocalisedString";
const OTHER: &str = "Other";
const LANG_PAIR: &str = "Localisation-cUserLocalisedString-cOtherStringLangPair";
const DELTA_STRING: &str = "cDeltaString";

/// One `(language, string)` entry of the other-languages table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangPair {
    pub language: String,
    pub text: String,
}

/// A built-in language element that was present in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinString {
    pub language: &'static str,
    pub text: String,
    /// Carries the `cDeltaString` type marker.
    pub delta_string: bool,
}

/// Parsed localised-name container, source order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalisedName {
    pub other: Vec<LangPair>,
    /// Present built-ins, in `BUILTIN_LANGUAGES` order.
    pub builtin: Vec<BuiltinString>,
}

impl LocalisedName {
    pub fn parse(xml: &str) -> Result<Self, NameError> {
        let doc = Document::parse(xml)?;
        let display = find_descendant(doc.root_element(), DISPLAY_NAME)
            .ok_or(NameError::MissingElement(DISPLAY_NAME))?;
        let container = find_descendant(display, LOCALISED_STRING)
            .ok_or(NameError::MissingElement(LOCALISED_STRING))?;

        let mut other = Vec::new();
        if let Some(table) = find_descendant(container, OTHER) {
            for pair in table
                .descendants()
                .filter(|n| n.is_element() && n.tag_name().name() == LANG_PAIR)
            {
                let (Some(lang), Some(text)) = (
                    find_descendant(pair, "Language"),
                    find_descendant(pair, "String"),
                ) else {
                    continue;
                };
                other.push(LangPair {
                    language: element_text(lang),
                    text: element_text(text),
                });
            }
        }

        let builtin = BUILTIN_LANGUAGES
            .iter()
            .filter_map(|&language| {
                find_descendant(container, language).map(|node| BuiltinString {
                    language,
                    text: element_text(node),
                    delta_string: is_delta_string(node),
                })
            })
            .collect();

        Ok(Self { other, builtin })
    }

    /// Best name for `language`, or `None` when every tier comes up empty.
    pub fn pick(&self, language: &str) -> Option<&str> {
        self.other
            .iter()
            .find(|p| !p.text.is_empty() && language_matches(&p.language, language))
            .map(|p| p.text.as_str())
            .or_else(|| {
                self.builtin
                    .iter()
                    .find(|b| b.delta_string && !b.text.is_empty())
                    .map(|b| b.text.as_str())
            })
            .or_else(|| {
                self.builtin
                    .iter()
                    .find(|b| !b.text.is_empty())
                    .map(|b| b.text.as_str())
            })
    }
}

/// `zh`, `zh-*`, `zh_*`, `chinese` or `zhongwen`, ignoring case.
pub fn is_chinese_code(code: &str) -> bool {
    let code = code.trim().to_lowercase();
    code == "zh"
        || code.starts_with("zh-")
        || code.starts_with("zh_")
        || code == "chinese"
        || code == "zhongwen"
}

/// Whether a stored language code satisfies the requested tag.
pub fn language_matches(stored: &str, requested: &str) -> bool {
    let stored = stored.trim();
    let requested = requested.trim();
    if stored.is_empty() || requested.is_empty() {
        return false;
    }
    if requested.eq_ignore_ascii_case("zh") {
        return is_chinese_code(stored);
    }
    stored.to_lowercase() == requested.to_lowercase()
}

/// Resolve the display name stored in `path`; empty string when none is found.
///
/// Never fails: a missing file is silent, a malformed one is logged.
pub fn resolve_display_name(path: &Path, language: &str) -> String {
    match try_resolve_display_name(path, language) {
        Ok(name) => name.unwrap_or_default(),
        Err(NameError::MissingElement(el)) => {
            debug!("no <{}> in {}", el, path.display());
            String::new()
        }
        Err(e) => {
            warn!("cannot read display name from {}: {}", path.display(), e);
            String::new()
        }
    }
}

pub fn try_resolve_display_name(path: &Path, language: &str) -> Result<Option<String>, NameError> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = decode_text(&fs::read(path)?)?;
    let name = LocalisedName::parse(&text)?;
    Ok(name.pick(language).map(str::to_owned))
}

fn find_descendant<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn element_text(node: Node<'_, '_>) -> String {
    node.text().map(str::trim).unwrap_or_default().to_owned()
}

// The marker is normally spelled `d:type="cDeltaString"`; only the local name matters.
fn is_delta_string(node: Node<'_, '_>) -> bool {
    node.attributes()
        .any(|a| a.name() == "type" && a.value() == DELTA_STRING)
}

// Exporters write UTF-8 with or without a BOM, and occasionally UTF-16.
fn decode_text(bytes: &[u8]) -> Result<String, NameError> {
    let utf16 = |rest: &[u8], le: bool| {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| {
                if le {
                    u16::from_le_bytes([c[0], c[1]])
                } else {
                    u16::from_be_bytes([c[0], c[1]])
                }
            })
            .collect();
        String::from_utf16(&units).map_err(|e| invalid_data(e.to_string()))
    };
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => {
            String::from_utf8(rest.to_vec()).map_err(|e| invalid_data(e.to_string()))
        }
        [0xFF, 0xFE, rest @ ..] => utf16(rest, true),
        [0xFE, 0xFF, rest @ ..] => utf16(rest, false),
        _ => String::from_utf8(bytes.to_vec()).map_err(|e| invalid_data(e.to_string())),
    }
}

fn invalid_data(msg: String) -> NameError {
    NameError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, msg))
}
