//! Per-class classification report with macro and weighted averages.

use std::fmt;

use crate::confusion::{ClassMetrics, ConfusionMatrix};
use crate::error::RfError;

/// Precision, recall and F1 averaged over classes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Evaluation summary for a classifier on a labelled set.
///
/// `Display` renders the usual fixed-width text table:
///
/// ```text
///               precision    recall  f1-score   support
///
///            0       0.60      0.75      0.67         4
///            1       0.80      0.67      0.73         6
///
///     accuracy                           0.70        10
///    macro avg       0.70      0.71      0.70        10
/// weighted avg       0.72      0.70      0.70        10
/// ```
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    classes: Vec<ClassMetrics>,
    accuracy: f64,
    total: usize,
    macro_avg: AveragedMetrics,
    weighted_avg: AveragedMetrics,
}

impl ClassificationReport {
    #[must_use]
    pub fn from_confusion(matrix: &ConfusionMatrix) -> Self {
        let classes = matrix.class_metrics();
        let total = matrix.total();
        let n = classes.len().max(1) as f64;

        let macro_avg = AveragedMetrics {
            precision: classes.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: classes.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: classes.iter().map(|m| m.f1).sum::<f64>() / n,
        };

        let weighted = |value: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                return 0.0;
            }
            classes
                .iter()
                .map(|m| value(m) * m.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = AveragedMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
        };

        Self {
            accuracy: matrix.accuracy(),
            classes,
            total,
            macro_avg,
            weighted_avg,
        }
    }

    /// Shorthand for [`ConfusionMatrix::from_labels`] followed by [`Self::from_confusion`].
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`ConfusionMatrix::from_labels`].
    pub fn from_labels(
        true_labels: &[usize],
        predicted: &[usize],
        n_classes: usize,
    ) -> Result<Self, RfError> {
        let matrix = ConfusionMatrix::from_labels(true_labels, predicted, n_classes)?;
        Ok(Self::from_confusion(&matrix))
    }

    #[must_use]
    pub fn classes(&self) -> &[ClassMetrics] {
        &self.classes
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn macro_avg(&self) -> AveragedMetrics {
        self.macro_avg
    }

    /// Averages weighted by class support.
    #[must_use]
    pub fn weighted_avg(&self) -> AveragedMetrics {
        self.weighted_avg
    }
}

const NAME_WIDTH: usize = "weighted avg".len();

fn write_row(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    m: AveragedMetrics,
    support: usize,
) -> fmt::Result {
    writeln!(
        f,
        "{name:>NAME_WIDTH$}  {:>9.2} {:>9.2} {:>9.2} {support:>9}",
        m.precision, m.recall, m.f1
    )
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>NAME_WIDTH$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.classes {
            let averaged = AveragedMetrics {
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
            };
            write_row(f, &m.class.to_string(), averaged, m.support)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>NAME_WIDTH$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        write_row(f, "macro avg", self.macro_avg, self.total)?;
        write_row(f, "weighted avg", self.weighted_avg, self.total)
    }
}
