//! Domain types for phishnet-io: the selected URL features and the loaded dataset.

/// Feature columns in canonical order. Model inputs, importances and
/// metadata all follow this order.
pub const FEATURE_NAMES: [&str; 15] = [
    "length_url",
    "length_hostname",
    "ip",
    "nb_dots",
    "nb_hyphens",
    "nb_qm",
    "nb_and",
    "nb_eq",
    "nb_underscore",
    "nb_percent",
    "nb_slash",
    "nb_semicolumn",
    "nb_www",
    "page_rank",
    "google_index",
];

/// The categorical outcome column.
pub const STATUS_COLUMN: &str = "status";

/// The exact `status` value that marks a phishing URL.
pub const PHISHING_STATUS: &str = "phishing";

/// Value written in place of a missing feature cell.
pub const MISSING_SENTINEL: f64 = -1.0;

/// Cell texts (after trimming) treated as missing, besides the empty string.
pub const MISSING_TOKENS: [&str; 18] = [
    "NA", "N/A", "NaN", "nan", "NULL", "null", "None", "-NaN", "-nan", "#N/A", "<NA>", "n/a",
    "-1.#IND", "1.#QNAN", "#NA", "-1.#QNAN", "#N/A N/A", "1.#IND",
];

/// Binary class of a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlClass {
    Legitimate = 0,
    Phishing = 1,
}

impl UrlClass {
    /// Exact, case-sensitive comparison against [`PHISHING_STATUS`]; every
    /// other value, the empty cell included, is legitimate.
    #[must_use]
    pub fn from_status(raw: &str) -> Self {
        if raw == PHISHING_STATUS {
            UrlClass::Phishing
        } else {
            UrlClass::Legitimate
        }
    }

    /// Zero-based class index used by the classifier.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Whether a feature cell counts as missing.
#[must_use]
pub fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed)
}

/// The selected, cleaned URL dataset.
///
/// `features[i]` holds the values of [`FEATURE_NAMES`] for row `i` and
/// `labels[i]` its class index. No missing cell survives loading.
#[derive(Debug, Clone)]
pub struct UrlDataset {
    pub(crate) features: Vec<Vec<f64>>,
    pub(crate) labels: Vec<usize>,
    pub(crate) imputed: [usize; FEATURE_NAMES.len()],
}

impl UrlDataset {
    /// Feature names in column order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        FEATURE_NAMES.iter().map(|&n| n.to_string()).collect()
    }

    /// Row-major feature matrix.
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Class indices (1 = phishing).
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        FEATURE_NAMES.len()
    }

    #[must_use]
    pub fn n_phishing(&self) -> usize {
        self.labels
            .iter()
            .filter(|&&l| l == UrlClass::Phishing.index())
            .count()
    }

    /// Number of imputed cells per feature column.
    #[must_use]
    pub fn imputed_counts(&self) -> &[usize] {
        &self.imputed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_exact() {
        assert_eq!(UrlClass::from_status("phishing"), UrlClass::Phishing);
        assert_eq!(UrlClass::from_status("Phishing"), UrlClass::Legitimate);
        assert_eq!(UrlClass::from_status(" phishing"), UrlClass::Legitimate);
        assert_eq!(UrlClass::from_status(""), UrlClass::Legitimate);
        assert_eq!(UrlClass::from_status("legitimate").index(), 0);
        assert_eq!(UrlClass::Phishing.index(), 1);
    }

    #[test]
    fn missing_markers() {
        for raw in ["", "  ", "NA", " NaN ", "null", "#N/A N/A", "<NA>"] {
            assert!(is_missing(raw), "{raw:?} should be missing");
        }
        for raw in ["0", "-1", "na", "none", "12.5"] {
            assert!(!is_missing(raw), "{raw:?} should be present");
        }
    }
}
