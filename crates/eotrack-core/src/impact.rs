//! Impact-area consensus across sources.
//!
//! Every source rates impact areas independently. The aggregator gathers
//! each rating as a perspective under its area and settles the area's
//! consensus by plurality vote, with Neutral winning any tie.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::config::CanonicalArea;
use crate::reference::{ExtractedSource, ImpactRating, ImplementationReference};

/// One source's view of an impact area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Perspective {
    /// Source code.
    pub source: String,
    pub impact: ImpactRating,
    pub insight: String,
}

/// Consensus view of one impact area.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsensusImpact {
    pub description: String,
    pub consensus_rating: ImpactRating,
    pub perspectives: Vec<Perspective>,
}

/// Plurality vote over ratings.
///
/// The rating with strictly the most votes wins. Ties, including the empty
/// vote, resolve to Neutral.
pub fn consensus<I>(ratings: I) -> ImpactRating
where
    I: IntoIterator<Item = ImpactRating>,
{
    let mut tally = [0usize; 4];
    for rating in ratings {
        tally[bucket(rating)] += 1;
    }

    let top = tally.iter().copied().max().unwrap_or(0);
    let leaders: Vec<ImpactRating> = ImpactRating::ALL
        .into_iter()
        .filter(|r| tally[bucket(*r)] == top)
        .collect();
    match (top, leaders.as_slice()) {
        (0, _) => ImpactRating::Neutral,
        (_, [winner]) => *winner,
        _ => ImpactRating::Neutral,
    }
}

fn bucket(rating: ImpactRating) -> usize {
    match rating {
        ImpactRating::Positive => 0,
        ImpactRating::Negative => 1,
        ImpactRating::Neutral => 2,
        ImpactRating::Mixed => 3,
    }
}

/// Per-document accumulator of perspectives keyed by impact-area name.
///
/// Seeded with the canonical areas so they always appear in the output;
/// areas first named by a source are created on demand.
#[derive(Debug, Clone, Default)]
pub struct ImpactAreaAggregator {
    areas: BTreeMap<String, ConsensusImpact>,
}

impl ImpactAreaAggregator {
    pub fn seeded(canonical: &[CanonicalArea]) -> Self {
        let areas = canonical
            .iter()
            .map(|area| {
                (
                    area.name.clone(),
                    ConsensusImpact {
                        description: area.description.clone(),
                        ..Default::default()
                    },
                )
            })
            .collect();
        Self { areas }
    }

    /// Get or create the entry for `name`.
    ///
    /// A name that differs from an existing area only in letter case joins
    /// that area.
    fn entry(&mut self, name: &str) -> &mut ConsensusImpact {
        let key = self
            .areas
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
            .unwrap_or_else(|| {
                debug!(area = name, "impact area not pre-declared, adding");
                name.to_string()
            });
        self.areas.entry(key).or_default()
    }

    /// Record every area rating in `reference` as a perspective of `source_code`.
    pub fn add_reference(&mut self, source_code: &str, reference: &ImplementationReference) {
        for (name, rating) in &reference.impact_areas {
            let area = self.entry(name);
            if area.description.is_empty() {
                area.description = rating.description.clone();
            }
            area.perspectives.push(Perspective {
                source: source_code.to_string(),
                impact: rating.impact,
                insight: rating.description.clone(),
            });
        }
    }

    pub fn add_source(&mut self, extracted: &ExtractedSource) {
        for reference in &extracted.references {
            self.add_reference(extracted.code(), reference);
        }
    }

    /// Settle the consensus rating of every area.
    pub fn finish(self) -> BTreeMap<String, ConsensusImpact> {
        self.areas
            .into_iter()
            .map(|(name, mut area)| {
                area.consensus_rating = consensus(area.perspectives.iter().map(|p| p.impact));
                (name, area)
            })
            .collect()
    }
}

/// Aggregate the impact areas of one document's sources.
pub fn aggregate_impact_areas(
    canonical: &[CanonicalArea],
    sources: &[ExtractedSource],
) -> BTreeMap<String, ConsensusImpact> {
    let mut aggregator = ImpactAreaAggregator::seeded(canonical);
    for source in sources {
        aggregator.add_source(source);
    }
    aggregator.finish()
}

/// Only the areas at least one source rated.
pub fn rated_areas(areas: &BTreeMap<String, ConsensusImpact>) -> BTreeMap<String, ConsensusImpact> {
    areas
        .iter()
        .filter(|(_, area)| !area.perspectives.is_empty())
        .map(|(name, area)| (name.clone(), area.clone()))
        .collect()
}
