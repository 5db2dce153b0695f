//! Aggregation settings: the source abbreviation table, the canonical impact
//! areas seeded into every document, and the text thresholds.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::CoreError;

/// Known source names and their short codes.
const KNOWN_SOURCES: &[(&str, &str)] = &[
    ("Federal Register", "FR"),
    ("White House", "WH"),
    ("Council on Governmental Relations", "COGR"),
    ("American Council on Education", "ACE"),
    ("Association of American Universities", "AAU"),
    ("Association of Public and Land-grant Universities", "APLU"),
    ("National Association of College and University Business Officers", "NACUBO"),
    ("National Institutes of Health", "NIH"),
    ("National Science Foundation", "NSF"),
    ("Department of Education", "ED"),
    ("EDUCAUSE", "EDUCAUSE"),
];

/// Impact areas every document is rated against, whether or not a source
/// comments on them.
const UNIVERSITY_IMPACT_AREAS: &[(&str, &str)] = &[
    (
        "Research Funding",
        "Federal grants, contracts, and indirect cost recovery for sponsored research",
    ),
    (
        "Student Aid & Access",
        "Financial aid, admissions, and enrollment of domestic and international students",
    ),
    (
        "Administrative Compliance",
        "Reporting, certification, and policy obligations placed on the institution",
    ),
    (
        "Workforce & Employment",
        "Hiring, visas, labor relations, and employee benefits",
    ),
    (
        "Diversity & Inclusion Programs",
        "Institutional programs, offices, and training tied to diversity initiatives",
    ),
    (
        "International Collaboration",
        "Foreign partnerships, export controls, and research security",
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalArea {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Settings for one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Source name → short code.
    pub abbreviations: BTreeMap<String, String>,
    pub canonical_impact_areas: Vec<CanonicalArea>,
    /// Contributions longer than this many characters become key perspectives.
    pub key_perspective_threshold: usize,
    pub teaser_length: usize,
    /// Characters of free text used as the dedup key for takeaways.
    pub fingerprint_length: usize,
    /// Joins source attributions of merged action items.
    pub attribution_separator: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            abbreviations: KNOWN_SOURCES
                .iter()
                .map(|(name, code)| (name.to_string(), code.to_string()))
                .collect(),
            canonical_impact_areas: UNIVERSITY_IMPACT_AREAS
                .iter()
                .map(|(name, description)| CanonicalArea {
                    name: name.to_string(),
                    description: description.to_string(),
                })
                .collect(),
            key_perspective_threshold: 100,
            teaser_length: 150,
            fingerprint_length: 50,
            attribution_separator: ", ".to_string(),
        }
    }
}

impl AggregationConfig {
    /// Parse a JSON config. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            sources = config.abbreviations.len(),
            areas = config.canonical_impact_areas.len(),
            "loaded aggregation config"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_seed_university_areas() {
        let config = AggregationConfig::default();
        assert_eq!(config.canonical_impact_areas.len(), UNIVERSITY_IMPACT_AREAS.len());
        assert_eq!(config.canonical_impact_areas[0].name, "Research Funding");
        assert_eq!(config.abbreviations["Federal Register"], "FR");
        assert_eq!(config.key_perspective_threshold, 100);
        assert_eq!(config.teaser_length, 150);
        assert_eq!(config.fingerprint_length, 50);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config =
            AggregationConfig::from_json_str(r#"{"key_perspective_threshold": 40}"#).unwrap();
        assert_eq!(config.key_perspective_threshold, 40);
        assert_eq!(config.attribution_separator, ", ");
        assert!(!config.canonical_impact_areas.is_empty());
    }

    #[test]
    fn custom_areas_replace_defaults() {
        let json = r#"{"canonical_impact_areas": [{"name": "Hospital Operations"}]}"#;
        let config = AggregationConfig::from_json_str(json).unwrap();
        assert_eq!(config.canonical_impact_areas.len(), 1);
        assert!(config.canonical_impact_areas[0].description.is_empty());
    }

    #[test]
    fn invalid_json_errors() {
        let result = AggregationConfig::from_json_str("{not json");
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn load_missing_file_errors() {
        let result = AggregationConfig::load(Path::new("/nonexistent/eotrack.json"));
        assert!(matches!(result, Err(CoreError::ConfigNotFound(_))));
    }
}
