//! Export artifacts: the enriched document array and the source-metadata
//! summary, each written through a temp file and renamed into place.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use eotrack_core::ExportBatch;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::StoreError;

pub const DOCUMENTS_FILE: &str = "executive_orders.json";
pub const SOURCE_SUMMARY_FILE: &str = "source_metadata.json";
#[cfg(feature = "parquet")]
pub const SOURCE_SUMMARY_PARQUET: &str = "source_metadata.parquet";

/// Where a batch was written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub documents: PathBuf,
    pub source_summary: PathBuf,
    pub source_summary_parquet: Option<PathBuf>,
}

/// Writes export batches into one output directory.
pub struct BatchWriter {
    out_dir: PathBuf,
}

impl BatchWriter {
    /// Create the writer, creating `out_dir` if needed.
    pub fn open(out_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(out_dir)?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Write both JSON artifacts.
    pub fn write(&self, batch: &ExportBatch) -> Result<ExportPaths, StoreError> {
        let documents = self.out_dir.join(DOCUMENTS_FILE);
        write_json_atomic(&documents, &batch.documents)?;
        info!(
            count = batch.documents.len(),
            path = %documents.display(),
            "wrote exported documents"
        );

        let source_summary = self.out_dir.join(SOURCE_SUMMARY_FILE);
        write_json_atomic(&source_summary, &batch.source_summary)?;
        info!(
            count = batch.source_summary.len(),
            path = %source_summary.display(),
            "wrote source metadata summary"
        );

        Ok(ExportPaths {
            documents,
            source_summary,
            source_summary_parquet: None,
        })
    }

    /// Write both JSON artifacts plus a Parquet copy of the source summary.
    #[cfg(feature = "parquet")]
    pub fn write_with_parquet(&self, batch: &ExportBatch) -> Result<ExportPaths, StoreError> {
        let mut paths = self.write(batch)?;
        let parquet = self.out_dir.join(SOURCE_SUMMARY_PARQUET);
        crate::columnar::write_source_summary_parquet(&parquet, &batch.source_summary)?;
        paths.source_summary_parquet = Some(parquet);
        Ok(paths)
    }
}

/// Temp file in the target's directory, so the final rename stays on one
/// filesystem.
pub(crate) fn temp_beside(path: &Path) -> Result<NamedTempFile, StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(NamedTempFile::new_in(dir)?)
}

pub(crate) fn persist(tmp: NamedTempFile, path: &Path) -> Result<(), StoreError> {
    tmp.persist(path)
        .map_err(|e| StoreError::Persist(path.to_path_buf(), e))?;
    Ok(())
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut tmp = temp_beside(path)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush()?;
    }
    persist(tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eotrack_core::{AggregationConfig, Exporter, PolicyDocument, RawSource, SourceProvider};
    use serde_json::Value;
    use tempfile::TempDir;

    struct OneSource;

    impl SourceProvider for OneSource {
        type Error = std::io::Error;

        fn sources_for(&self, _: &PolicyDocument) -> Result<Vec<RawSource>, Self::Error> {
            Ok(vec![RawSource {
                source_name: "Federal Register".into(),
                source_url: "https://www.federalregister.gov".into(),
                external_reference_id: "2025-02345".into(),
                fetch_date: "2025-02-12".into(),
                specific_data: None,
            }])
        }
    }

    fn batch() -> ExportBatch {
        let exporter = Exporter::new(AggregationConfig::default());
        let docs = vec![
            PolicyDocument {
                id: "EO-14173".into(),
                title: "Ending Illegal Discrimination".into(),
                ..Default::default()
            },
            PolicyDocument {
                id: "EO-14187".into(),
                ..Default::default()
            },
        ];
        exporter.export_batch(docs, &OneSource).unwrap()
    }

    fn read(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn open_creates_out_dir() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("nested").join("export");
        let writer = BatchWriter::open(&out).unwrap();
        assert!(out.is_dir());
        assert_eq!(writer.out_dir(), out.as_path());
    }

    #[test]
    fn write_both_artifacts() {
        let tmp = TempDir::new().unwrap();
        let writer = BatchWriter::open(tmp.path()).unwrap();
        let paths = writer.write(&batch()).unwrap();

        let docs = read(&paths.documents);
        let docs = docs.as_array().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["id"], "EO-14173");
        assert_eq!(docs[0]["sources"][0]["abbreviation"], "FR");
        assert!(docs[1]["source_aware_impact_analysis"].is_object());

        let summary = read(&paths.source_summary);
        assert_eq!(summary[0]["name"], "Federal Register");
        assert_eq!(summary[0]["document_count"], 2);
        assert_eq!(summary[0]["latest_fetch_date"], "2025-02-12");
        assert!(paths.source_summary_parquet.is_none());
    }

    #[test]
    fn rewrite_replaces_previous_export() {
        let tmp = TempDir::new().unwrap();
        let writer = BatchWriter::open(tmp.path()).unwrap();
        writer.write(&batch()).unwrap();
        let paths = writer.write(&ExportBatch::default()).unwrap();
        assert_eq!(read(&paths.documents), Value::Array(Vec::new()));

        let leftovers = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(leftovers, 2);
    }

    #[test]
    fn empty_batch_writes_empty_arrays() {
        let tmp = TempDir::new().unwrap();
        let writer = BatchWriter::open(tmp.path()).unwrap();
        let paths = writer.write(&ExportBatch::default()).unwrap();
        assert_eq!(read(&paths.source_summary), Value::Array(Vec::new()));
    }

    #[cfg(feature = "parquet")]
    #[test]
    fn write_with_parquet_adds_summary_file() {
        let tmp = TempDir::new().unwrap();
        let writer = BatchWriter::open(tmp.path()).unwrap();
        let paths = writer.write_with_parquet(&batch()).unwrap();

        assert_eq!(read(&paths.documents).as_array().unwrap().len(), 2);
        assert_eq!(read(&paths.source_summary)[0]["abbreviation"], "FR");

        let parquet = paths.source_summary_parquet.unwrap();
        assert_eq!(parquet, tmp.path().join(SOURCE_SUMMARY_PARQUET));
        let batches = crate::read_parquet(&parquet).unwrap();
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 1);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 3);
    }
}
