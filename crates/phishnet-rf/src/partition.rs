//! Seeded shuffle-split into train and test partitions.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::error::RfError;

/// Row indices of a train/test partition.
///
/// Together the two lists are a permutation of `0..n_samples`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    train_indices: Vec<usize>,
    test_indices: Vec<usize>,
}

impl TrainTestSplit {
    #[must_use]
    pub fn train_indices(&self) -> &[usize] {
        &self.train_indices
    }

    #[must_use]
    pub fn test_indices(&self) -> &[usize] {
        &self.test_indices
    }

    #[must_use]
    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    #[must_use]
    pub fn n_test(&self) -> usize {
        self.test_indices.len()
    }

    /// Gather `(train, test)` rows of `data` in partition order.
    ///
    /// # Panics
    ///
    /// Panics if `data` is shorter than the sample count the split was drawn for.
    #[must_use]
    pub fn select<T: Clone>(&self, data: &[T]) -> (Vec<T>, Vec<T>) {
        let gather = |indices: &[usize]| -> Vec<T> {
            indices.iter().map(|&i| data[i].clone()).collect()
        };
        (gather(&self.train_indices), gather(&self.test_indices))
    }
}

/// Shuffle `0..n_samples` with a seeded RNG and hold out the first
/// `ceil(test_fraction · n_samples)` indices for testing.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`RfError::EmptyDataset`] | `n_samples == 0` |
/// | [`RfError::InvalidTestFraction`] | `test_fraction` not in (0.0, 1.0) |
/// | [`RfError::SplitTooSmall`] | train or test side would be empty |
#[instrument(level = "debug")]
pub fn train_test_split(
    n_samples: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit, RfError> {
    if n_samples == 0 {
        return Err(RfError::EmptyDataset);
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(RfError::InvalidTestFraction {
            fraction: test_fraction,
        });
    }

    let n_test = (test_fraction * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_train == 0 || n_test == 0 {
        return Err(RfError::SplitTooSmall {
            n_samples,
            n_train,
            n_test,
        });
    }

    let mut permutation: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);
    let train_indices = permutation.split_off(n_test);

    debug!(n_train, n_test, "partitioned samples");

    Ok(TrainTestSplit {
        train_indices,
        test_indices: permutation,
    })
}
