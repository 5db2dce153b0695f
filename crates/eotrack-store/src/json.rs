//! JSON batch inputs: the document array and the flat list of source records.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use eotrack_core::{PolicyDocument, RawSource, SourceProvider};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::StoreError;

/// One row of the source query: a raw source tagged with its document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub document_id: String,
    #[serde(flatten)]
    pub source: RawSource,
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the document batch: a JSON array of documents.
pub fn read_documents(path: &Path) -> Result<Vec<PolicyDocument>, StoreError> {
    let documents: Vec<PolicyDocument> = read_json(path)?;
    info!(count = documents.len(), path = %path.display(), "loaded documents");
    Ok(documents)
}

/// In-memory source records grouped by document id.
///
/// Records keep their file order within each document.
#[derive(Debug, Clone, Default)]
pub struct JsonSourceStore {
    by_document: HashMap<String, Vec<RawSource>>,
}

impl JsonSourceStore {
    /// Load a JSON array of [`SourceRecord`]s.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let records: Vec<SourceRecord> = read_json(path)?;
        let store = Self::from_records(records);
        info!(
            documents = store.document_count(),
            records = store.record_count(),
            path = %path.display(),
            "loaded source records"
        );
        Ok(store)
    }

    pub fn from_records(records: Vec<SourceRecord>) -> Self {
        let mut by_document: HashMap<String, Vec<RawSource>> = HashMap::new();
        for record in records {
            by_document
                .entry(record.document_id)
                .or_default()
                .push(record.source);
        }
        Self { by_document }
    }

    /// Number of documents with at least one source record.
    pub fn document_count(&self) -> usize {
        self.by_document.len()
    }

    pub fn record_count(&self) -> usize {
        self.by_document.values().map(Vec::len).sum()
    }
}

impl SourceProvider for JsonSourceStore {
    type Error = StoreError;

    fn sources_for(&self, document: &PolicyDocument) -> Result<Vec<RawSource>, StoreError> {
        Ok(self
            .by_document
            .get(&document.id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SOURCES: &str = r#"[
        {
            "document_id": "EO-14151",
            "source_name": "Federal Register",
            "source_url": "https://www.federalregister.gov/d/2025-01953",
            "external_reference_id": "2025-01953",
            "fetch_date": "2025-01-29",
            "specificData": {"implementation_references": []}
        },
        {
            "document_id": "EO-14151",
            "source_name": "Council on Governmental Relations",
            "source_url": "https://www.cogr.edu",
            "external_reference_id": "cogr-14151",
            "fetch_date": "2025-02-03",
            "specificData": null
        },
        {
            "document_id": "EO-14173",
            "source_name": "American Council on Education",
            "source_url": "https://www.acenet.edu",
            "external_reference_id": "ace-14173",
            "fetch_date": "2025-02-05"
        }
    ]"#;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn doc(id: &str) -> PolicyDocument {
        PolicyDocument {
            id: id.into(),
            ..Default::default()
        }
    }

    #[test]
    fn open_groups_by_document() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "sources.json", SOURCES);
        let store = JsonSourceStore::open(&path).unwrap();
        assert_eq!(store.document_count(), 2);
        assert_eq!(store.record_count(), 3);

        let sources = store.sources_for(&doc("EO-14151")).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source_name, "Federal Register");
        assert!(sources[0].specific_data.is_some());
        assert!(sources[1].specific_data.is_none());
    }

    #[test]
    fn unknown_document_has_no_sources() {
        let store = JsonSourceStore::default();
        assert!(store.sources_for(&doc("EO-0")).unwrap().is_empty());
    }

    #[test]
    fn read_documents_from_array() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "documents.json",
            r#"[{"id": "EO-14151", "title": "Ending Radical Government DEI Programs", "impact_level": "Critical"}]"#,
        );
        let docs = read_documents(&path).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].impact_level.as_deref(), Some("Critical"));
    }

    #[test]
    fn missing_file_errors() {
        let result = read_documents(Path::new("/nonexistent/documents.json"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn invalid_json_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "documents.json", "[{");
        match read_documents(&path) {
            Err(StoreError::Json { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected JSON error, got {other:?}"),
        }
    }

    #[test]
    fn null_fields_do_not_abort_load() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "sources.json",
            r#"[
                {"document_id": "EO-14151", "source_name": "Federal Register", "fetch_date": null},
                {"document_id": "EO-14151", "source_name": null, "source_url": null, "specificData": null}
            ]"#,
        );
        let store = JsonSourceStore::open(&path).unwrap();
        let sources = store.sources_for(&doc("EO-14151")).unwrap();
        assert_eq!(sources.len(), 2);
        assert!(sources[0].fetch_date.is_empty());
        assert!(sources[1].source_name.is_empty());
    }
}
