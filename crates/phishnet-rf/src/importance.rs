//! Feature importance ranking.

use std::fmt;

/// A feature paired with its importance score and rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    pub name: String,
    /// Normalized importance (sums to 1.0 across all features).
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// Pair `importances[i]` with `names[i]`, sort descending, assign 1-based ranks.
///
/// The sort is stable, so equal scores keep column order.
#[must_use]
pub fn rank_importances(importances: &[f64], names: &[String]) -> Vec<RankedFeature> {
    let mut ranked: Vec<RankedFeature> = names
        .iter()
        .zip(importances)
        .map(|(name, &importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();

    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feature) in ranked.iter_mut().enumerate() {
        feature.rank = i + 1;
    }
    ranked
}

/// Fixed-width table view over a ranking, for console output.
pub struct ImportanceTable<'a>(pub &'a [RankedFeature]);

impl fmt::Display for ImportanceTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .0
            .iter()
            .map(|r| r.name.len())
            .max()
            .unwrap_or(0)
            .max("feature".len());
        writeln!(f, "{:>4}  {:<width$}  {:>10}", "rank", "feature", "importance")?;
        for r in self.0 {
            writeln!(f, "{:>4}  {:<width$}  {:>10.6}", r.rank, r.name, r.importance)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sorted_descending_with_ranks() {
        let ranked = rank_importances(&[0.1, 0.6, 0.3], &names(&["a", "b", "c"]));
        let order: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
        assert_eq!(ranked.iter().map(|r| r.rank).collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[test]
    fn ties_keep_column_order() {
        let ranked = rank_importances(&[0.25, 0.5, 0.25], &names(&["x", "y", "z"]));
        assert_eq!(ranked[1].name, "x");
        assert_eq!(ranked[2].name, "z");
    }

    #[test]
    fn table_lists_every_feature() {
        let ranked = rank_importances(&[0.75, 0.25], &names(&["length_url", "ip"]));
        let text = ImportanceTable(&ranked).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("importance"));
        assert!(lines[1].contains("length_url") && lines[1].contains("0.750000"));
        assert!(lines[2].trim_start().starts_with('2'));
    }
}
