/// Arrow schema definitions for export artifacts.
pub mod export {
    use arrow::datatypes::{DataType, Field, Schema};

    /// Schema for the source-metadata summary.
    pub fn source_summary_schema() -> Schema {
        Schema::new(vec![
            Field::new("name", DataType::Utf8, false),
            Field::new("abbreviation", DataType::Utf8, false),
            Field::new("url", DataType::Utf8, true),
            Field::new("document_count", DataType::UInt64, false),
            Field::new("latest_fetch_date", DataType::Utf8, true),
        ])
    }
}
