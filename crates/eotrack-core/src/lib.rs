//! Multi-source aggregation for executive orders: source normalisation,
//! impact-area consensus, institution guidance, and combined analysis.

pub mod analysis;
pub mod config;
pub mod dedup;
pub mod document;
mod error;
pub mod export;
pub mod guidance;
pub mod impact;
pub mod reference;
pub mod schema;
pub mod source;

pub use config::{AggregationConfig, CanonicalArea};
pub use document::{ImpactLevel, PolicyDocument, RawSource};
pub use error::{CoreError, ExportError};
pub use export::{ExportBatch, ExportedDocument, Exporter, SourceProvider, SourceSummary};
pub use reference::{ActionItem, ImpactRating, ImplementationReference};
pub use schema::export as export_schema;
pub use source::{NormalizedSource, SourceNormalizer};
