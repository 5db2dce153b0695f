//! Combined narrative analysis: the document's own narrative plus one
//! excerpt per source.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::config::AggregationConfig;
use crate::dedup::dedup_by_fingerprint;
use crate::document::PolicyDocument;
use crate::reference::ExtractedSource;

/// A source excerpt long enough to stand on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyPerspective {
    pub source: String,
    pub teaser: String,
    pub full_text: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CombinedAnalysis {
    pub summary: String,
    pub extended_analysis: String,
    /// Source code → excerpt.
    pub source_contributions: BTreeMap<String, String>,
    /// In source-processing order.
    pub key_perspectives: Vec<KeyPerspective>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub key_takeaways: Vec<String>,
}

/// The combined analysis with contributions exposed as `source_insights`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceAnalysis {
    pub summary: String,
    pub extended_analysis: String,
    pub source_insights: BTreeMap<String, String>,
    pub key_perspectives: Vec<KeyPerspective>,
}

impl From<&CombinedAnalysis> for SourceAnalysis {
    fn from(analysis: &CombinedAnalysis) -> Self {
        Self {
            summary: analysis.summary.clone(),
            extended_analysis: analysis.extended_analysis.clone(),
            source_insights: analysis.source_contributions.clone(),
            key_perspectives: analysis.key_perspectives.clone(),
        }
    }
}

/// Per-source overview attached to the exported record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceInsight {
    pub name: String,
    pub url: String,
    pub fetch_date: String,
    pub reference_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

/// A source's contribution: the first reference's analysis, or its context.
fn contribution(source: &ExtractedSource) -> Option<&str> {
    source.references.first().and_then(|r| r.narrative())
}

fn teaser(text: &str, len: usize) -> String {
    if text.chars().count() <= len {
        return text.to_string();
    }
    let mut out: String = text.chars().take(len).collect();
    out.push_str("...");
    out
}

pub fn compose(
    config: &AggregationConfig,
    document: &PolicyDocument,
    sources: &[ExtractedSource],
) -> CombinedAnalysis {
    let mut contributions: BTreeMap<String, String> = BTreeMap::new();
    let mut key_perspectives = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for source in sources {
        // The first record of a code speaks for it, even without a narrative.
        if !seen.insert(source.code()) {
            continue;
        }
        let Some(text) = contribution(source) else {
            continue;
        };
        contributions.insert(source.code().to_string(), text.to_string());

        if text.chars().count() > config.key_perspective_threshold {
            key_perspectives.push(KeyPerspective {
                source: source.code().to_string(),
                teaser: teaser(text, config.teaser_length),
                full_text: text.to_string(),
                url: source.source.url.clone(),
            });
        }
    }

    let takeaways: Vec<String> = document
        .key_takeaways
        .iter()
        .chain(
            sources
                .iter()
                .flat_map(|s| &s.references)
                .flat_map(|r| &r.key_takeaways),
        )
        .cloned()
        .collect();

    CombinedAnalysis {
        summary: document.summary.clone().unwrap_or_default(),
        extended_analysis: document.comprehensive_analysis.clone().unwrap_or_default(),
        source_contributions: contributions,
        key_perspectives,
        key_takeaways: dedup_by_fingerprint(takeaways, |t| t.as_str(), config.fingerprint_length),
    }
}

/// One [`SourceInsight`] per source code, first record wins.
pub fn source_insights(sources: &[ExtractedSource]) -> BTreeMap<String, SourceInsight> {
    let mut insights = BTreeMap::new();
    for source in sources {
        insights
            .entry(source.code().to_string())
            .or_insert_with(|| SourceInsight {
                name: source.source.name.clone(),
                url: source.source.url.clone(),
                fetch_date: source.source.fetch_date.clone(),
                reference_count: source.references.len(),
                excerpt: contribution(source).map(str::to_string),
            });
    }
    insights
}
