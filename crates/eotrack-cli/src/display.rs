//! Vertical card display for exported executive orders.
//!
//! Renders one aggregated record as grouped, human-readable sections:
//! identity, sources, impact consensus, institution guidance, analysis.

use std::io::{self, Write};

use eotrack_core::ExportedDocument;
use eotrack_core::impact::ConsensusImpact;

const MAX_LIST_ITEMS: usize = 10;
const MAX_TEXT_WIDTH: usize = 100;

// ── Public API ──

/// Print an exported record to stdout.
pub fn print_document_card(doc: &ExportedDocument) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_document_card(&mut out, doc)?;
    Ok(())
}

/// Write an exported record as a vertical card grouped by section.
pub fn write_document_card<W: Write>(out: &mut W, doc: &ExportedDocument) -> io::Result<()> {
    let base = &doc.document;
    writeln!(out, "=== {} ===", base.id)?;
    if !base.title.is_empty() {
        writeln!(out, "{}", base.title)?;
    }
    writeln!(out)?;

    write_identity(out, doc)?;
    write_sources(out, doc)?;
    write_impact_areas(out, doc)?;
    write_guidance(out, doc)?;
    write_analysis(out, doc)?;
    Ok(())
}

// ── Section rendering ──

fn field<W: Write>(out: &mut W, name: &str, value: &str) -> io::Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {:<26} {}", name, value)
}

fn write_identity<W: Write>(out: &mut W, doc: &ExportedDocument) -> io::Result<()> {
    let base = &doc.document;
    writeln!(out, "Identity")?;
    field(out, "signing_date", base.signing_date.as_deref().unwrap_or(""))?;
    field(out, "publication_date", base.publication_date.as_deref().unwrap_or(""))?;
    field(out, "impact_level", base.impact_level.as_deref().unwrap_or(""))?;
    writeln!(out)
}

fn write_sources<W: Write>(out: &mut W, doc: &ExportedDocument) -> io::Result<()> {
    if doc.sources.is_empty() {
        return Ok(());
    }
    writeln!(out, "Sources ({})", doc.sources.len())?;
    for source in doc.sources.iter().take(MAX_LIST_ITEMS) {
        let refs = doc
            .source_insights
            .get(&source.abbreviation)
            .map(|i| i.reference_count)
            .unwrap_or(0);
        writeln!(
            out,
            "  {:<10} {:<40} {} refs  {}",
            source.abbreviation,
            shorten(&source.name, 40),
            refs,
            source.fetch_date
        )?;
    }
    if doc.sources.len() > MAX_LIST_ITEMS {
        writeln!(out, "  ... and {} more", doc.sources.len() - MAX_LIST_ITEMS)?;
    }
    writeln!(out)
}

fn write_impact_areas<W: Write>(out: &mut W, doc: &ExportedDocument) -> io::Result<()> {
    writeln!(out, "Impact Consensus")?;
    for (name, area) in &doc.source_aware_impact_analysis {
        writeln!(
            out,
            "  {:<32} {:<9} {}",
            shorten(name, 32),
            area.consensus_rating,
            perspective_tally(area)
        )?;
        for p in area.perspectives.iter().take(MAX_LIST_ITEMS) {
            if p.insight.is_empty() {
                writeln!(out, "    [{}] {}", p.source, p.impact)?;
            } else {
                writeln!(out, "    [{}] {}: {}", p.source, p.impact, shorten(&p.insight, MAX_TEXT_WIDTH))?;
            }
        }
    }
    writeln!(out)
}

fn perspective_tally(area: &ConsensusImpact) -> String {
    match area.perspectives.len() {
        0 => "(no sources)".to_string(),
        1 => "(1 source)".to_string(),
        n => format!("({n} sources)"),
    }
}

fn write_guidance<W: Write>(out: &mut W, doc: &ExportedDocument) -> io::Result<()> {
    if doc.institution_specific_guidance.is_empty() {
        return Ok(());
    }
    writeln!(out, "Institution Guidance")?;
    for (inst, guidance) in &doc.institution_specific_guidance {
        writeln!(out, "  {} (relevance {}/10)", inst, guidance.relevance_score)?;
        for item in guidance.action_items.iter().take(MAX_LIST_ITEMS) {
            write!(out, "    - {} [{}]", item.title, item.source)?;
            if let Some(deadline) = &item.deadline {
                write!(out, "  due {}", deadline)?;
            }
            writeln!(out)?;
        }
        if guidance.action_items.len() > MAX_LIST_ITEMS {
            writeln!(out, "    ... and {} more", guidance.action_items.len() - MAX_LIST_ITEMS)?;
        }
        for note in &guidance.exemptions {
            writeln!(out, "    * {}", note)?;
        }
    }
    writeln!(out)
}

fn write_analysis<W: Write>(out: &mut W, doc: &ExportedDocument) -> io::Result<()> {
    let analysis = &doc.integrated_analysis;
    writeln!(out, "Analysis")?;
    field(out, "summary", &shorten(&analysis.summary, MAX_TEXT_WIDTH))?;
    for (code, excerpt) in &analysis.source_contributions {
        field(out, code, &shorten(excerpt, MAX_TEXT_WIDTH))?;
    }
    if !analysis.key_perspectives.is_empty() {
        writeln!(out, "  key perspectives ({}):", analysis.key_perspectives.len())?;
        for kp in &analysis.key_perspectives {
            writeln!(out, "    [{}] {}", kp.source, kp.teaser)?;
        }
    }
    writeln!(out)
}

// ── Helpers ──

/// Truncate to `max` characters, marking the cut with "...".
fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}
