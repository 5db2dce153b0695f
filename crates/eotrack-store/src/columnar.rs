//! Parquet rendition of the source-metadata summary.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray, UInt64Array};
use arrow::record_batch::RecordBatch;
use eotrack_core::{export_schema, SourceSummary};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::info;

use crate::writer::{persist, temp_beside};
use crate::StoreError;

/// Build one RecordBatch from summary rows. Empty URLs and missing fetch
/// dates become nulls.
pub fn source_summary_batch(rows: &[SourceSummary]) -> Result<RecordBatch, StoreError> {
    let schema = Arc::new(export_schema::source_summary_schema());

    let names = StringArray::from_iter_values(rows.iter().map(|r| r.name.as_str()));
    let abbreviations = StringArray::from_iter_values(rows.iter().map(|r| r.abbreviation.as_str()));
    let urls: StringArray = rows
        .iter()
        .map(|r| (!r.url.is_empty()).then_some(r.url.as_str()))
        .collect();
    let counts = UInt64Array::from_iter_values(rows.iter().map(|r| r.document_count));
    let latest: StringArray = rows.iter().map(|r| r.latest_fetch_date.as_deref()).collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(names),
        Arc::new(abbreviations),
        Arc::new(urls),
        Arc::new(counts),
        Arc::new(latest),
    ];
    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Write the summary as a single-batch Parquet file.
pub fn write_source_summary_parquet(path: &Path, rows: &[SourceSummary]) -> Result<(), StoreError> {
    let batch = source_summary_batch(rows)?;
    let mut tmp = temp_beside(path)?;
    {
        let mut writer = ArrowWriter::try_new(tmp.as_file_mut(), batch.schema(), None)?;
        writer.write(&batch)?;
        writer.close()?;
    }
    persist(tmp, path)?;
    info!(rows = rows.len(), path = %path.display(), "wrote source summary parquet");
    Ok(())
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use tempfile::TempDir;

    fn rows() -> Vec<SourceSummary> {
        vec![
            SourceSummary {
                name: "Federal Register".into(),
                abbreviation: "FR".into(),
                url: "https://www.federalregister.gov".into(),
                document_count: 12,
                latest_fetch_date: Some("2025-03-01".into()),
            },
            SourceSummary {
                name: "Office of Compliance Review".into(),
                abbreviation: "OCR".into(),
                url: String::new(),
                document_count: 1,
                latest_fetch_date: None,
            },
        ]
    }

    #[test]
    fn batch_matches_schema() {
        let batch = source_summary_batch(&rows()).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 5);

        let urls = batch.column(2).as_any().downcast_ref::<StringArray>().unwrap();
        assert!(!urls.is_null(0));
        assert!(urls.is_null(1));
        let counts = batch.column(3).as_any().downcast_ref::<UInt64Array>().unwrap();
        assert_eq!(counts.value(0), 12);
    }

    #[test]
    fn empty_summary_is_valid() {
        let batch = source_summary_batch(&[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
    }

    #[test]
    fn parquet_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("source_metadata.parquet");
        write_source_summary_parquet(&path, &rows()).unwrap();

        let batches = read_parquet(&path).unwrap();
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 2);
        assert_eq!(batches[0].schema().field(0).name(), "name");
    }

    #[test]
    fn read_missing_file_errors() {
        let result = read_parquet(Path::new("/nonexistent/source_metadata.parquet"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
