//! CSV reader that selects the URL feature columns, derives labels and imputes gaps.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{
    FEATURE_NAMES, MISSING_SENTINEL, STATUS_COLUMN, UrlClass, UrlDataset, is_missing,
};

/// Reads a URL feature table from a CSV file.
///
/// Expected CSV format:
/// - Header row required; columns are located by name, so extra columns and
///   column order do not matter
/// - Every name in [`FEATURE_NAMES`] plus `status` must be present
/// - Feature cells are numbers or missing markers (see [`is_missing`])
/// - A row shorter than the header is padded with missing cells; a longer
///   row is rejected
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::ExtraFields`] | A row has more cells than the header |
/// | [`IoError::MissingColumn`] | A required column is absent (checked before any row) |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::NonNumericValue`] | Present feature cell is not a number |
/// | [`IoError::NonFiniteValue`] | Feature cell parses to infinity |
pub struct UrlDatasetReader {
    path: PathBuf,
}

impl UrlDatasetReader {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn csv_error(&self, source: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: source.position().map_or(0, |p| p.byte()),
            source,
        }
    }

    /// Position of `name` in the header, or [`IoError::MissingColumn`].
    fn locate(&self, header: &csv::StringRecord, name: &str) -> Result<usize, IoError> {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| IoError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }

    /// `None` for a missing cell.
    fn parse_cell(
        &self,
        raw: &str,
        row_index: usize,
        column: &str,
    ) -> Result<Option<f64>, IoError> {
        if is_missing(raw) {
            return Ok(None);
        }
        let trimmed = raw.trim();
        let value: f64 = trimmed.parse().map_err(|_| IoError::NonNumericValue {
            path: self.path.clone(),
            row_index,
            column: column.to_string(),
            raw: raw.to_string(),
        })?;
        if !value.is_finite() {
            return Err(IoError::NonFiniteValue {
                path: self.path.clone(),
                row_index,
                column: column.to_string(),
                raw: raw.to_string(),
            });
        }
        Ok(Some(value))
    }

    /// Read, select and clean the dataset.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<UrlDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let mut feature_cols = [0usize; FEATURE_NAMES.len()];
        for (slot, name) in feature_cols.iter_mut().zip(FEATURE_NAMES) {
            *slot = self.locate(&header, name)?;
        }
        let status_col = self.locate(&header, STATUS_COLUMN)?;
        debug!(n_columns = header.len(), status_col, "required columns located");

        let mut features = Vec::new();
        let mut labels = Vec::new();
        let mut imputed = [0usize; FEATURE_NAMES.len()];

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() > header.len() {
                return Err(IoError::ExtraFields {
                    path: self.path.clone(),
                    row_index,
                    expected: header.len(),
                    found: record.len(),
                });
            }

            let mut row = Vec::with_capacity(FEATURE_NAMES.len());
            for (feature, (&col, name)) in feature_cols.iter().zip(FEATURE_NAMES).enumerate() {
                // Absent trailing cells read as missing.
                let raw = record.get(col).unwrap_or("");
                match self.parse_cell(raw, row_index, name)? {
                    Some(value) => row.push(value),
                    None => {
                        imputed[feature] += 1;
                        row.push(MISSING_SENTINEL);
                    }
                }
            }

            let status = record.get(status_col).unwrap_or("");
            labels.push(UrlClass::from_status(status).index());
            features.push(row);
        }

        if labels.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let total_imputed: usize = imputed.iter().sum();
        if total_imputed > 0 {
            for (name, &count) in FEATURE_NAMES.iter().zip(&imputed) {
                if count > 0 {
                    info!(column = name, count, "imputed missing values");
                }
            }
        }

        let dataset = UrlDataset {
            features,
            labels,
            imputed,
        };
        info!(
            n_samples = dataset.n_samples(),
            n_phishing = dataset.n_phishing(),
            total_imputed,
            "dataset loaded"
        );
        Ok(dataset)
    }
}
