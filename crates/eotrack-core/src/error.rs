use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config file not found: {}", .0.display())]
    ConfigNotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Failure surfaced by the batch driver. Aggregation itself never fails;
/// only the source collaborator can.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to fetch sources for document {document_id}: {source}")]
    Sources {
        document_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
