//! I/O error types for phishnet-io.

use std::path::PathBuf;

/// Errors from dataset ingestion and artifact writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a required column is absent from the header.
    #[error("required column \"{column}\" not found in {path}")]
    MissingColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The first absent column, in canonical order.
        column: String,
    },

    /// Returned when a row has more cells than the header names.
    #[error("row {row_index} in {path} has {found} fields, header has {expected}")]
    ExtraFields {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Header field count.
        expected: usize,
        /// Field count of the offending row.
        found: usize,
    },

    /// Returned when a present feature cell is not a number.
    #[error("non-numeric value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonNumericValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Column name.
        column: String,
        /// The raw cell text.
        raw: String,
    },

    /// Returned when a feature cell parses to an infinite value.
    #[error("non-finite value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Column name.
        column: String,
        /// The raw cell text.
        raw: String,
    },

    /// Returned when the model directory cannot be created.
    #[error("cannot create model directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the metadata document cannot be encoded.
    #[error("cannot encode model metadata")]
    SerializeMetadata {
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when an artifact file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when an artifact file cannot be read back.
    #[error("cannot read file {path}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a metadata document is not valid JSON of the expected shape.
    #[error("malformed model metadata in {path}")]
    ParseMetadata {
        /// Path to the metadata file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}
