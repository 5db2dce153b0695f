//! Source normalisation: canonical name, short code, and parsed payload.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AggregationConfig;
use crate::document::RawSource;

/// Code used when a source record carries no name at all.
const UNNAMED_SOURCE: &str = "UNK";

/// A source record in the uniform shape the rest of the engine consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedSource {
    pub name: String,
    /// Short code identifying the source in perspectives and attributions.
    pub abbreviation: String,
    pub url: String,
    pub reference_id: String,
    pub fetch_date: String,
    /// Parsed `specificData` object, `None` when absent or unusable.
    pub metadata: Option<Value>,
}

/// Maps raw source records onto [`NormalizedSource`] using the configured
/// abbreviation table.
pub struct SourceNormalizer<'a> {
    abbreviations: &'a BTreeMap<String, String>,
}

impl<'a> SourceNormalizer<'a> {
    pub fn new(config: &'a AggregationConfig) -> Self {
        Self {
            abbreviations: &config.abbreviations,
        }
    }

    /// Short code for a source name: the table entry if there is one,
    /// otherwise derived from the name's words.
    pub fn abbreviation(&self, name: &str) -> String {
        let name = name.trim();
        match self.abbreviations.get(name) {
            Some(code) => code.clone(),
            None => derive_abbreviation(name),
        }
    }

    pub fn normalize(&self, raw: RawSource) -> NormalizedSource {
        let name = raw.source_name.trim().to_string();
        let abbreviation = self.abbreviation(&name);
        let metadata = parse_metadata(&name, raw.specific_data);
        debug!(
            source = %name,
            code = %abbreviation,
            has_metadata = metadata.is_some(),
            "normalized source"
        );
        NormalizedSource {
            name,
            abbreviation,
            url: raw.source_url,
            reference_id: raw.external_reference_id,
            fetch_date: raw.fetch_date,
            metadata,
        }
    }
}

/// Words left out of derived abbreviations.
const CONNECTIVES: &[&str] = &["of", "and", "the", "for", "on", "in", "at", "to", "&"];

/// Derive a short code from the first letter of each word.
///
/// Connective words ("of", "and", "the") are skipped, so "Office of
/// Compliance Review" gives "OCR". A name made only of connectives uses
/// every word. Letter case is preserved.
pub fn derive_abbreviation(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    if words.is_empty() {
        return UNNAMED_SOURCE.to_string();
    }

    let significant: String = words
        .iter()
        .filter(|w| !CONNECTIVES.iter().any(|c| w.eq_ignore_ascii_case(c)))
        .filter_map(|w| w.chars().next())
        .collect();
    if !significant.is_empty() {
        return significant;
    }

    words.iter().filter_map(|w| w.chars().next()).collect()
}

/// Turn the opaque payload into a JSON object.
///
/// Strings are parsed as serialised JSON. Anything that does not end up as
/// an object is logged and dropped; the source then simply has no
/// structured data.
fn parse_metadata(source: &str, payload: Option<Value>) -> Option<Value> {
    match payload? {
        Value::Null => None,
        Value::Object(map) => Some(Value::Object(map)),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Some(Value::Object(map)),
            Ok(_) => {
                warn!(source, "specificData string is not a JSON object, ignoring");
                None
            }
            Err(e) => {
                warn!(source, error = %e, "unparsable specificData, ignoring");
                None
            }
        },
        other => {
            warn!(
                source,
                kind = json_kind(&other),
                "specificData is not an object, ignoring"
            );
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(name: &str, payload: Option<Value>) -> RawSource {
        RawSource {
            source_name: name.into(),
            source_url: "https://example.org/brief".into(),
            external_reference_id: "ref-1".into(),
            fetch_date: "2025-02-10".into(),
            specific_data: payload,
        }
    }

    #[test]
    fn known_source_uses_table() {
        let config = AggregationConfig::default();
        let normalizer = SourceNormalizer::new(&config);
        assert_eq!(normalizer.abbreviation("Council on Governmental Relations"), "COGR");
        assert_eq!(normalizer.abbreviation("  Federal Register "), "FR");
    }

    #[test]
    fn unknown_source_derives_initials() {
        let config = AggregationConfig::default();
        let normalizer = SourceNormalizer::new(&config);
        assert_eq!(normalizer.abbreviation("Office of Compliance Review"), "OCR");
    }

    #[test]
    fn derived_abbreviation_preserves_case() {
        assert_eq!(derive_abbreviation("Higher Ed Policy Watch"), "HEPW");
        assert_eq!(derive_abbreviation("eCampus News"), "eN");
        assert_eq!(derive_abbreviation("Institute for Research on the Economy"), "IRE");
        assert_eq!(derive_abbreviation("The Chronicle of Higher Education"), "CHE");
        assert_eq!(derive_abbreviation("of the"), "ot");
        assert_eq!(derive_abbreviation("research brief weekly"), "rbw");
    }

    #[test]
    fn empty_name_gets_placeholder_code() {
        assert_eq!(derive_abbreviation("   "), UNNAMED_SOURCE);
    }

    #[test]
    fn normalize_copies_fields() {
        let config = AggregationConfig::default();
        let normalizer = SourceNormalizer::new(&config);
        let src = normalizer.normalize(raw(
            "National Science Foundation",
            Some(json!({"implementation_references": []})),
        ));
        assert_eq!(src.name, "National Science Foundation");
        assert_eq!(src.abbreviation, "NSF");
        assert_eq!(src.reference_id, "ref-1");
        assert_eq!(src.fetch_date, "2025-02-10");
        assert!(src.metadata.unwrap().is_object());
    }

    #[test]
    fn missing_payload_gives_no_metadata() {
        let config = AggregationConfig::default();
        let normalizer = SourceNormalizer::new(&config);
        assert!(normalizer.normalize(raw("NIH", None)).metadata.is_none());
        assert!(normalizer.normalize(raw("NIH", Some(Value::Null))).metadata.is_none());
    }

    #[test]
    fn string_payload_is_parsed() {
        let config = AggregationConfig::default();
        let normalizer = SourceNormalizer::new(&config);
        let payload = Value::String(r#"{"implementation_references": [{"title": "x"}]}"#.into());
        let src = normalizer.normalize(raw("COGR", Some(payload)));
        let metadata = src.metadata.unwrap();
        assert_eq!(metadata["implementation_references"][0]["title"], "x");
    }

    #[test]
    fn malformed_payload_is_dropped() {
        let config = AggregationConfig::default();
        let normalizer = SourceNormalizer::new(&config);
        let garbled = Value::String("{implementation_references: [".into());
        assert!(normalizer.normalize(raw("COGR", Some(garbled))).metadata.is_none());
        assert!(normalizer.normalize(raw("COGR", Some(json!([1, 2])))).metadata.is_none());
    }
}
