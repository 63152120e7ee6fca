//! Gini impurity and the exact best-split search used while growing a tree.

use rand::Rng;

use crate::node::{FeatureIndex, Impurity};

/// Gini impurity `1 - Σ p_i²` of a node from its class counts.
///
/// An empty node has impurity 0.
pub(crate) fn gini(class_counts: &[usize], n_samples: usize) -> Impurity {
    if n_samples == 0 {
        return Impurity::new(0.0);
    }
    let n = n_samples as f64;
    let sum_sq: f64 = class_counts.iter().map(|&c| (c as f64 / n).powi(2)).sum();
    Impurity::new((1.0 - sum_sq).max(0.0))
}

/// The winning split of a node, after `samples` has been partitioned around it.
#[derive(Debug, Clone)]
pub(crate) struct BestSplit {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// `n·I(parent) − n_l·I(left) − n_r·I(right)`, the MDI contribution.
    pub(crate) impurity_decrease: f64,
    /// `samples[..n_left]` go left, `samples[n_left..]` go right.
    pub(crate) n_left: usize,
}

/// Exact CART split search over a random feature subset.
///
/// Holds the column-major training matrix for one tree and reusable scratch
/// buffers, so each node search only allocates its class-count vectors.
pub(crate) struct Splitter<'a> {
    columns: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    max_features: usize,
    min_samples_leaf: usize,
    feature_order: Vec<usize>,
    sorted: Vec<(f64, usize)>,
}

impl<'a> Splitter<'a> {
    /// `columns[feature][sample]` is column-major; `labels[sample]` is the class.
    pub(crate) fn new(
        columns: &'a [Vec<f64>],
        labels: &'a [usize],
        n_classes: usize,
        max_features: usize,
        min_samples_leaf: usize,
    ) -> Self {
        Self {
            columns,
            labels,
            n_classes,
            max_features,
            min_samples_leaf,
            feature_order: (0..columns.len()).collect(),
            sorted: Vec::new(),
        }
    }

    /// Count samples per class.
    pub(crate) fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &s in samples {
            counts[self.labels[s]] += 1;
        }
        counts
    }

    /// Find the best split of `samples` and partition them in place around it.
    ///
    /// Features are drawn without replacement in random order. Constant
    /// features are skipped without counting toward `max_features`, so the
    /// search keeps drawing until `max_features` informative columns were
    /// examined or the columns run out. Returns `None` (leaving `samples`
    /// untouched) when no split satisfies `min_samples_leaf`.
    pub(crate) fn split(
        &mut self,
        samples: &mut [usize],
        parent_counts: &[usize],
        parent_impurity: Impurity,
        rng: &mut impl Rng,
    ) -> Option<BestSplit> {
        let (columns, labels) = (self.columns, self.labels);
        let n = samples.len();
        let n_features = columns.len();
        if n < 2 * self.min_samples_leaf || n_features == 0 {
            return None;
        }

        let parent_weighted = n as f64 * parent_impurity.value();
        let mut best: Option<(usize, f64, f64)> = None;
        let mut informative_seen = 0usize;

        for drawn in 0..n_features {
            if informative_seen >= self.max_features {
                break;
            }
            let pick = rng.gen_range(drawn..n_features);
            self.feature_order.swap(drawn, pick);
            let feature = self.feature_order[drawn];
            let column = &columns[feature];

            self.sorted.clear();
            self.sorted
                .extend(samples.iter().map(|&s| (column[s], labels[s])));
            self.sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

            if self.sorted[0].0 == self.sorted[n - 1].0 {
                continue;
            }
            informative_seen += 1;

            let mut left = vec![0usize; self.n_classes];
            let mut right = parent_counts.to_vec();

            for i in 0..n - 1 {
                let (value, class) = self.sorted[i];
                left[class] += 1;
                right[class] -= 1;

                let next = self.sorted[i + 1].0;
                if value == next {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let decrease = parent_weighted
                    - n_left as f64 * gini(&left, n_left).value()
                    - n_right as f64 * gini(&right, n_right).value();

                if best.is_none_or(|(_, _, d)| decrease > d) {
                    let mut threshold = value / 2.0 + next / 2.0;
                    // Rounding can land the midpoint on `next`, which would send it left.
                    if threshold >= next || !threshold.is_finite() {
                        threshold = value;
                    }
                    best = Some((feature, threshold, decrease));
                }
            }
        }

        let (feature, threshold, impurity_decrease) = best?;
        let column = &columns[feature];
        let mut n_left = 0;
        for j in 0..n {
            if column[samples[j]] <= threshold {
                samples.swap(n_left, j);
                n_left += 1;
            }
        }

        Some(BestSplit {
            feature: FeatureIndex::new(feature),
            threshold,
            impurity_decrease,
            n_left,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{Splitter, gini};

    fn search(
        columns: &[Vec<f64>],
        labels: &[usize],
        max_features: usize,
        min_samples_leaf: usize,
    ) -> (Option<super::BestSplit>, Vec<usize>) {
        let mut splitter =
            Splitter::new(columns, labels, 2, max_features, min_samples_leaf);
        let mut samples: Vec<usize> = (0..labels.len()).collect();
        let counts = splitter.class_counts(&samples);
        let impurity = gini(&counts, samples.len());
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let best = splitter.split(&mut samples, &counts, impurity, &mut rng);
        (best, samples)
    }

    #[test]
    fn gini_values() {
        assert!(gini(&[10, 0], 10).value().abs() < f64::EPSILON);
        assert!((gini(&[5, 5], 10).value() - 0.5).abs() < f64::EPSILON);
        assert!((gini(&[3, 1], 4).value() - 0.375).abs() < 1e-12);
        assert!(gini(&[], 0).is_pure());
    }

    #[test]
    fn separable_column_is_split_at_midpoint() {
        let columns = vec![vec![1.0, 12.0, 2.0, 11.0, 3.0, 10.0]];
        let labels = vec![0, 1, 0, 1, 0, 1];
        let (best, samples) = search(&columns, &labels, 1, 1);

        let split = best.expect("separable data must split");
        assert_eq!(split.feature.index(), 0);
        assert!((split.threshold - 6.5).abs() < f64::EPSILON);
        assert_eq!(split.n_left, 3);
        // Gini 0.5 on 6 samples, both children pure.
        assert!((split.impurity_decrease - 3.0).abs() < 1e-12);
        assert!(samples[..3].iter().all(|&s| labels[s] == 0));
        assert!(samples[3..].iter().all(|&s| labels[s] == 1));
    }

    #[test]
    fn constant_columns_do_not_use_up_the_feature_budget() {
        // Column 0 is constant; with max_features = 1 the search must still reach column 1.
        let columns = vec![vec![4.0; 4], vec![0.0, 0.0, 9.0, 9.0]];
        let labels = vec![0, 0, 1, 1];
        let (best, _) = search(&columns, &labels, 1, 1);
        assert_eq!(best.expect("column 1 separates").feature.index(), 1);
    }

    #[test]
    fn all_constant_returns_none() {
        let columns = vec![vec![5.0; 4]];
        let labels = vec![0, 1, 0, 1];
        let (best, samples) = search(&columns, &labels, 1, 1);
        assert!(best.is_none());
        assert_eq!(samples, vec![0, 1, 2, 3]);
    }

    #[test]
    fn min_samples_leaf_blocks_small_children() {
        let columns = vec![vec![1.0, 10.0, 11.0]];
        let labels = vec![0, 1, 1];
        let (best, _) = search(&columns, &labels, 1, 2);
        assert!(best.is_none());
    }

    #[test]
    fn adjacent_floats_keep_threshold_below_next_value() {
        let a = 1.0_f64;
        let b = f64::from_bits(a.to_bits() + 1);
        let columns = vec![vec![a, b]];
        let labels = vec![0, 1];
        let (best, _) = search(&columns, &labels, 1, 1);
        let split = best.expect("two distinct values split");
        assert!(split.threshold < b);
        assert_eq!(split.n_left, 1);
    }
}
