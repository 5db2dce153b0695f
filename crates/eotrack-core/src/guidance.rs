//! Institution-specific guidance.
//!
//! For each institution type a document touches, combine the document's
//! impact level with any differentiated-impact scores into a bounded
//! relevance score, then gather the sources' guidance text, exemptions,
//! and action items aimed at that type.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::AggregationConfig;
use crate::dedup::merge_action_items;
use crate::document::{ImpactLevel, PolicyDocument};
use crate::reference::{ActionItem, ExtractedSource};

pub const MIN_RELEVANCE: u8 = 1;
pub const MAX_RELEVANCE: u8 = 10;

/// Guidance targeted at one institution type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstitutionGuidance {
    pub relevance_score: u8,
    pub action_items: Vec<ActionItem>,
    pub exemptions: Vec<String>,
    /// Source code → that source's guidance text.
    pub source_considerations: BTreeMap<String, String>,
}

/// Relevance of a document to one institution type, in `[1, 10]`.
///
/// The impact level's base score plus the mean of `scores`, rounded.
/// Non-finite scores are ignored.
pub fn relevance_score(level: ImpactLevel, scores: &[f64]) -> u8 {
    let finite: Vec<f64> = scores.iter().copied().filter(|s| s.is_finite()).collect();
    let mean = if finite.is_empty() {
        0.0
    } else {
        finite.iter().sum::<f64>() / finite.len() as f64
    };
    let score = (level.base_score() + mean).round();
    score.clamp(MIN_RELEVANCE as f64, MAX_RELEVANCE as f64) as u8
}

/// Numeric impact scores recorded for one institution type.
///
/// Accepts a bare number, an array, or an object; only numbers directly
/// inside an array or object count.
pub fn impact_scores(value: &Value) -> Vec<f64> {
    match value {
        Value::Number(n) => n.as_f64().into_iter().collect(),
        Value::Array(items) => items.iter().filter_map(Value::as_f64).collect(),
        Value::Object(fields) => fields.values().filter_map(Value::as_f64).collect(),
        _ => Vec::new(),
    }
}

fn same_institution(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Builds [`InstitutionGuidance`] per institution type for one document.
pub struct InstitutionGuidanceGenerator<'a> {
    config: &'a AggregationConfig,
}

impl<'a> InstitutionGuidanceGenerator<'a> {
    pub fn new(config: &'a AggregationConfig) -> Self {
        Self { config }
    }

    /// Institution types to produce guidance for: every differentiated-impact
    /// key plus every type a source wrote guidance for.
    fn institution_types(
        document: &PolicyDocument,
        sources: &[ExtractedSource],
    ) -> BTreeSet<String> {
        let mut types: BTreeSet<String> = BTreeSet::new();
        let mut add = |name: &str| {
            let name = name.trim();
            if !name.is_empty() && !types.iter().any(|t| same_institution(t, name)) {
                types.insert(name.to_string());
            }
        };
        for name in document.differentiated_impact.keys() {
            add(name);
        }
        for reference in sources.iter().flat_map(|s| &s.references) {
            for name in reference.institution_guidance.keys() {
                add(name);
            }
        }
        types
    }

    pub fn generate(
        &self,
        document: &PolicyDocument,
        sources: &[ExtractedSource],
    ) -> BTreeMap<String, InstitutionGuidance> {
        let level = document.impact_level();
        Self::institution_types(document, sources)
            .into_iter()
            .map(|inst| {
                let guidance = self.guidance_for(&inst, level, document, sources);
                debug!(
                    institution = %inst,
                    relevance = guidance.relevance_score,
                    actions = guidance.action_items.len(),
                    "built institution guidance"
                );
                (inst, guidance)
            })
            .collect()
    }

    fn guidance_for(
        &self,
        inst: &str,
        level: ImpactLevel,
        document: &PolicyDocument,
        sources: &[ExtractedSource],
    ) -> InstitutionGuidance {
        let scores: Vec<f64> = document
            .differentiated_impact
            .iter()
            .filter(|(name, _)| same_institution(name, inst))
            .flat_map(|(_, value)| impact_scores(value))
            .collect();

        let mut considerations: BTreeMap<String, String> = BTreeMap::new();
        let mut exemptions = Vec::new();
        let mut pending = Vec::new();

        for source in sources {
            for reference in &source.references {
                for (name, text) in &reference.institution_guidance {
                    if !same_institution(name, inst) {
                        continue;
                    }
                    let entry = considerations.entry(source.code().to_string()).or_default();
                    if entry.is_empty() {
                        entry.push_str(text);
                    } else if !entry.split("\n\n").any(|piece| piece == text.as_str()) {
                        entry.push_str("\n\n");
                        entry.push_str(text);
                    }
                }

                if reference.exemptions.iter().any(|e| same_institution(e, inst)) {
                    let basis = if reference.title.is_empty() {
                        source.source.name.as_str()
                    } else {
                        reference.title.as_str()
                    };
                    exemptions.push(format!("Exempt per {basis} ({})", source.code()));
                }

                pending.extend(
                    reference
                        .action_items
                        .iter()
                        .filter(|item| match &item.institution_type {
                            Some(t) => same_institution(t, inst),
                            None => true,
                        })
                        .cloned(),
                );
            }
        }

        InstitutionGuidance {
            relevance_score: relevance_score(level, &scores),
            action_items: merge_action_items(pending, &self.config.attribution_separator),
            exemptions,
            source_considerations: considerations,
        }
    }
}
