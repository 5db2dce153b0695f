//! Storage layer: JSON document/source batches in, export artifacts out.

mod error;
mod json;
mod writer;

pub use error::StoreError;
pub use json::{read_documents, JsonSourceStore, SourceRecord};
pub use writer::{BatchWriter, ExportPaths, DOCUMENTS_FILE, SOURCE_SUMMARY_FILE};

#[cfg(feature = "parquet")]
mod columnar;
#[cfg(feature = "parquet")]
pub use columnar::{read_parquet, source_summary_batch, write_source_summary_parquet};
#[cfg(feature = "parquet")]
pub use writer::SOURCE_SUMMARY_PARQUET;
