//! Batch export: aggregate every document against its own sources and
//! summarise the sources seen across the batch.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::analysis::{self, CombinedAnalysis, SourceAnalysis, SourceInsight};
use crate::config::AggregationConfig;
use crate::dedup::dedup_by_title;
use crate::document::{PolicyDocument, RawSource};
use crate::guidance::{InstitutionGuidance, InstitutionGuidanceGenerator};
use crate::impact::{self, ConsensusImpact};
use crate::reference::ExtractedSource;
use crate::source::{NormalizedSource, SourceNormalizer};
use crate::ExportError;

/// Fields added to every exported record. Base-document fields with these
/// names are dropped so the aggregate wins.
pub const EXPORT_FIELDS: &[&str] = &[
    "sources",
    "source_insights",
    "source_analysis",
    "simplified_impact_areas",
    "institution_specific_guidance",
    "source_aware_impact_analysis",
    "integrated_analysis",
    "implementation_resources",
];

/// Supplies the raw source records of a document.
///
/// Implemented by the storage collaborator; the only fallible step of an
/// export.
pub trait SourceProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    fn sources_for(&self, document: &PolicyDocument) -> Result<Vec<RawSource>, Self::Error>;
}

/// A reference's title and link, attributed to its source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
    pub source: String,
}

/// A document's base fields with the aggregate attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedDocument {
    #[serde(flatten)]
    pub document: PolicyDocument,
    pub sources: Vec<NormalizedSource>,
    pub source_insights: BTreeMap<String, SourceInsight>,
    pub source_analysis: SourceAnalysis,
    pub simplified_impact_areas: BTreeMap<String, ConsensusImpact>,
    pub institution_specific_guidance: BTreeMap<String, InstitutionGuidance>,
    pub source_aware_impact_analysis: BTreeMap<String, ConsensusImpact>,
    pub integrated_analysis: CombinedAnalysis,
    pub implementation_resources: Vec<ResourceLink>,
}

/// One row of the source-metadata summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub abbreviation: String,
    pub url: String,
    /// Documents referencing this source, each counted once.
    pub document_count: u64,
    pub latest_fetch_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportBatch {
    pub documents: Vec<ExportedDocument>,
    pub source_summary: Vec<SourceSummary>,
}

/// Runs normalisation, extraction, and aggregation for documents.
pub struct Exporter {
    config: AggregationConfig,
}

impl Exporter {
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Aggregate one document against its sources.
    #[instrument(skip_all, fields(document = %document.id, sources = raw_sources.len()))]
    pub fn aggregate(&self, mut document: PolicyDocument, raw_sources: Vec<RawSource>) -> ExportedDocument {
        for field in EXPORT_FIELDS {
            if document.extra.remove(*field).is_some() {
                debug!(field, "base field shadowed by aggregate, dropping");
            }
        }

        let normalizer = SourceNormalizer::new(&self.config);
        let extracted: Vec<ExtractedSource> = raw_sources
            .into_iter()
            .map(|raw| ExtractedSource::new(normalizer.normalize(raw)))
            .collect();

        let impact_areas =
            impact::aggregate_impact_areas(&self.config.canonical_impact_areas, &extracted);
        let guidance = InstitutionGuidanceGenerator::new(&self.config).generate(&document, &extracted);
        let combined = analysis::compose(&self.config, &document, &extracted);

        debug!(
            references = extracted.iter().map(|s| s.references.len()).sum::<usize>(),
            areas = impact_areas.len(),
            institutions = guidance.len(),
            "aggregated document"
        );

        ExportedDocument {
            source_insights: analysis::source_insights(&extracted),
            source_analysis: SourceAnalysis::from(&combined),
            simplified_impact_areas: impact::rated_areas(&impact_areas),
            institution_specific_guidance: guidance,
            source_aware_impact_analysis: impact_areas,
            integrated_analysis: combined,
            implementation_resources: resource_links(&extracted),
            sources: extracted.into_iter().map(|s| s.source).collect(),
            document,
        }
    }

    /// Fetch each document's sources, then aggregate the batch in parallel.
    ///
    /// Output order matches input order. A provider failure aborts the batch.
    pub fn export_batch<P: SourceProvider>(
        &self,
        documents: Vec<PolicyDocument>,
        provider: &P,
    ) -> Result<ExportBatch, ExportError> {
        let fetched = documents
            .into_iter()
            .map(|document| match provider.sources_for(&document) {
                Ok(sources) => Ok((document, sources)),
                Err(e) => Err(ExportError::Sources {
                    document_id: document.id.clone(),
                    source: Box::new(e),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(documents = fetched.len(), "aggregating batch");
        let documents: Vec<ExportedDocument> = fetched
            .into_par_iter()
            .map(|(document, sources)| self.aggregate(document, sources))
            .collect();

        let source_summary = summarize_sources(&documents);
        info!(
            documents = documents.len(),
            sources = source_summary.len(),
            "batch aggregated"
        );
        Ok(ExportBatch {
            documents,
            source_summary,
        })
    }
}

/// Title/URL links of every reference, deduplicated by title.
fn resource_links(sources: &[ExtractedSource]) -> Vec<ResourceLink> {
    let links: Vec<ResourceLink> = sources
        .iter()
        .flat_map(|s| s.references.iter().map(move |r| (s.code(), r)))
        .filter(|(_, r)| !r.title.is_empty() || !r.url.is_empty())
        .map(|(code, r)| ResourceLink {
            title: if r.title.is_empty() { r.url.clone() } else { r.title.clone() },
            url: r.url.clone(),
            source: code.to_string(),
        })
        .collect();
    dedup_by_title(links, |link| link.title.as_str())
}

/// Summarise sources across exported documents, sorted by name.
pub fn summarize_sources(documents: &[ExportedDocument]) -> Vec<SourceSummary> {
    let mut summary: BTreeMap<String, SourceSummary> = BTreeMap::new();

    for doc in documents {
        let mut counted: HashSet<&str> = HashSet::new();
        for source in &doc.sources {
            let row = summary
                .entry(source.name.clone())
                .or_insert_with(|| SourceSummary {
                    name: source.name.clone(),
                    abbreviation: source.abbreviation.clone(),
                    url: source.url.clone(),
                    document_count: 0,
                    latest_fetch_date: None,
                });
            if counted.insert(source.name.as_str()) {
                row.document_count += 1;
            }
            if row.url.is_empty() && !source.url.is_empty() {
                row.url = source.url.clone();
            }
            let date = source.fetch_date.trim();
            if date.is_empty() {
                continue;
            }
            let newer = match &row.latest_fetch_date {
                Some(current) => is_later(date, current),
                None => true,
            };
            if newer {
                row.latest_fetch_date = Some(date.to_string());
            }
        }
    }

    summary.into_values().collect()
}

fn fetch_timestamp(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Chronological when both dates parse; a parsable date beats an
/// unparsable one; otherwise lexical.
fn is_later(candidate: &str, current: &str) -> bool {
    match (fetch_timestamp(candidate), fetch_timestamp(current)) {
        (Some(a), Some(b)) => a > b,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => candidate > current,
    }
}
