//! Implementation references extracted from a source's payload.
//!
//! Payloads are authored independently by each source and only loosely
//! follow a shape. Every field is read defensively: a missing or mistyped
//! field is an empty collection, never an error.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::source::NormalizedSource;

/// Impact classification a source assigns to one area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImpactRating {
    Positive,
    Negative,
    #[default]
    Neutral,
    Mixed,
}

impl ImpactRating {
    pub const ALL: [ImpactRating; 4] = [
        ImpactRating::Positive,
        ImpactRating::Negative,
        ImpactRating::Neutral,
        ImpactRating::Mixed,
    ];

    /// Case-insensitive parse of the four rating names.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "neutral" => Some(Self::Neutral),
            "mixed" => Some(Self::Mixed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
            Self::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for ImpactRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One source's rating of one impact area.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaRating {
    pub impact: ImpactRating,
    pub description: String,
}

/// A concrete step an institution should take.
///
/// `source` holds the attribution; after deduplication it may name several
/// sources joined by the configured separator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionItem {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub source: String,
    /// Restricts the item to one institution type when set.
    #[serde(skip)]
    pub institution_type: Option<String>,
}

/// One structured annotation from a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImplementationReference {
    pub title: String,
    pub url: String,
    pub context: Option<String>,
    pub analysis: Option<String>,
    pub impact_areas: BTreeMap<String, AreaRating>,
    /// Institution type → guidance text.
    pub institution_guidance: BTreeMap<String, String>,
    /// Institution types this reference exempts.
    pub exemptions: Vec<String>,
    pub action_items: Vec<ActionItem>,
    pub key_takeaways: Vec<String>,
}

impl ImplementationReference {
    /// The reference's narrative: `analysis`, falling back to `context`.
    pub fn narrative(&self) -> Option<&str> {
        self.analysis.as_deref().or(self.context.as_deref())
    }
}

/// A normalised source together with the references found in its payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedSource {
    pub source: NormalizedSource,
    pub references: Vec<ImplementationReference>,
}

impl ExtractedSource {
    pub fn new(source: NormalizedSource) -> Self {
        let references = extract_references(&source);
        Self { source, references }
    }

    pub fn code(&self) -> &str {
        &self.source.abbreviation
    }
}

/// Read `metadata.implementation_references` into typed references.
///
/// Returns an empty list when the source has no payload or the key is not
/// an array. Array elements that are not objects are skipped.
pub fn extract_references(source: &NormalizedSource) -> Vec<ImplementationReference> {
    let Some(refs) = source
        .metadata
        .as_ref()
        .and_then(|m| m.get("implementation_references"))
        .and_then(Value::as_array)
    else {
        debug!(source = %source.name, "no implementation references");
        return Vec::new();
    };

    let references: Vec<ImplementationReference> = refs
        .iter()
        .filter_map(|item| match item.as_object() {
            Some(obj) => Some(reference_from_object(obj, &source.abbreviation)),
            None => {
                warn!(source = %source.name, "implementation reference is not an object, skipping");
                None
            }
        })
        .collect();

    debug!(
        source = %source.name,
        count = references.len(),
        "extracted implementation references"
    );
    references
}

fn reference_from_object(obj: &Map<String, Value>, source_code: &str) -> ImplementationReference {
    ImplementationReference {
        title: get_string(obj, "title").unwrap_or_default(),
        url: get_string(obj, "url").unwrap_or_default(),
        context: get_string(obj, "context"),
        analysis: get_string(obj, "analysis"),
        impact_areas: get_impact_areas(obj),
        institution_guidance: get_string_map(obj, "institution_specific_guidance"),
        exemptions: get_string_list(obj, "exemptions"),
        action_items: get_action_items(obj, source_code),
        key_takeaways: get_string_list(obj, "key_takeaways"),
    }
}

// ── Field extraction helpers ──

/// A non-blank string field, trimmed.
fn get_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// String elements of an array field. Other elements are ignored.
fn get_string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    let Some(arr) = obj.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// String-valued entries of an object field.
fn get_string_map(obj: &Map<String, Value>, key: &str) -> BTreeMap<String, String> {
    let Some(map) = obj.get(key).and_then(Value::as_object) else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(k, v)| {
            let text = v.as_str()?.trim();
            (!text.is_empty()).then(|| (k.trim().to_string(), text.to_string()))
        })
        .collect()
}

/// `impact_areas` entries: either `{impact, description}` or a bare rating string.
///
/// Unrecognised ratings are read as Neutral.
fn get_impact_areas(obj: &Map<String, Value>) -> BTreeMap<String, AreaRating> {
    let Some(map) = obj.get("impact_areas").and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    let mut areas = BTreeMap::new();
    for (name, value) in map {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let (impact, description) = match value {
            Value::Object(area) => (
                area.get("impact").and_then(Value::as_str),
                get_string(area, "description").unwrap_or_default(),
            ),
            Value::String(s) => (Some(s.as_str()), String::new()),
            _ => {
                debug!(area = name, "impact area is neither object nor string, skipping");
                continue;
            }
        };
        let impact = match impact {
            Some(raw) => ImpactRating::parse(raw).unwrap_or_else(|| {
                warn!(area = name, rating = raw, "unknown impact rating, reading as Neutral");
                ImpactRating::Neutral
            }),
            None => ImpactRating::Neutral,
        };
        areas.insert(name.to_string(), AreaRating { impact, description });
    }
    areas
}

/// `action_items` entries attributed to `source_code`. Items without a
/// title are dropped since titles are their identity.
fn get_action_items(obj: &Map<String, Value>, source_code: &str) -> Vec<ActionItem> {
    let Some(arr) = obj.get("action_items").and_then(Value::as_array) else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            let Some(title) = get_string(item, "title") else {
                debug!(source = source_code, "action item without title, skipping");
                return None;
            };
            Some(ActionItem {
                title,
                description: get_string(item, "description").unwrap_or_default(),
                deadline: get_string(item, "deadline"),
                source: source_code.to_string(),
                institution_type: get_string(item, "institution_type"),
            })
        })
        .collect()
}
