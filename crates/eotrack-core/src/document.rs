//! Policy documents and the raw source records attached to them.
//!
//! Both types are read from the storage collaborator as JSON. Fields the
//! engine does not interpret are kept in `extra` and carried through to the
//! exported record unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// An executive order with its narrative fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comprehensive_analysis: Option<String>,
    /// Free text such as "High" or "critical"; see [`ImpactLevel::parse`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_level: Option<String>,
    /// Institution type → impact scores (a number, a list, or an object of numbers).
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub differentiated_impact: BTreeMap<String, Value>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub key_takeaways: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PolicyDocument {
    pub fn impact_level(&self) -> ImpactLevel {
        self.impact_level
            .as_deref()
            .map(ImpactLevel::parse)
            .unwrap_or(ImpactLevel::Other)
    }
}

/// Declared impact level of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImpactLevel {
    Critical,
    High,
    Medium,
    Low,
    /// Missing or unrecognised.
    Other,
}

impl ImpactLevel {
    /// Case-insensitive parse. Anything unrecognised is [`ImpactLevel::Other`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" | "moderate" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Other,
        }
    }

    /// Starting point of the relevance score for every institution type.
    pub fn base_score(self) -> f64 {
        match self {
            Self::Critical => 5.0,
            Self::High => 4.0,
            Self::Medium => 3.0,
            Self::Low => 2.0,
            Self::Other => 1.0,
        }
    }
}

/// A source record as fetched for one document.
///
/// `specific_data` is the opaque payload. It may arrive as a JSON object, as
/// a string holding serialised JSON, or as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSource {
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub external_reference_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fetch_date: String,
    #[serde(default, rename = "specificData", alias = "specific_data")]
    pub specific_data: Option<Value>,
}

/// Reads an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
