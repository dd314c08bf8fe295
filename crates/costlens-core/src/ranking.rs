//! Ranked cost breakdowns

use serde::{Deserialize, Serialize};

use crate::aggregation::{AggregateMap, GroupKey};

/// Entries kept in a ranking unless the caller asks otherwise
pub const DEFAULT_TOP_N: usize = 10;

/// One line of a ranked breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub key: GroupKey,
    pub total: f64,
    /// Share of the full grand total, 0 when the grand total is 0. Above 100
    /// when credits pull the grand total below this entry's total.
    pub percentage: f64,
}

/// `part / whole * 100`, or 0 when `whole` is not positive
pub fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Order positive aggregates by total, descending, and keep the first `top_n`.
///
/// Ties keep the aggregate map's first-seen order. Percentages stay relative
/// to `grand_total` after truncation. They fall within [0, 100] only when no
/// aggregate is negative; credits shrink `grand_total` and can push an entry
/// past 100.
pub fn rank(aggregates: &AggregateMap, grand_total: f64, top_n: usize) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = aggregates
        .iter()
        .filter(|aggregate| aggregate.total > 0.0)
        .map(|aggregate| RankedEntry {
            key: aggregate.key.clone(),
            total: aggregate.total,
            percentage: percentage_of(aggregate.total, grand_total),
        })
        .collect();

    // sort_by is stable
    entries.sort_by(|a, b| b.total.total_cmp(&a.total));
    entries.truncate(top_n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::Aggregate;

    fn map(entries: &[(&str, f64)]) -> AggregateMap {
        entries
            .iter()
            .map(|(key, total)| Aggregate {
                key: GroupKey::single(*key),
                total: *total,
                count: 1,
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn keys(ranking: &[RankedEntry]) -> Vec<String> {
        ranking.iter().map(|e| e.key.to_string()).collect()
    }

    #[test]
    fn test_rank_orders_descending() {
        let ranking = rank(&map(&[("S3", 1.0), ("EC2", 12.0), ("RDS", 4.0)]), 17.0, DEFAULT_TOP_N);
        assert_eq!(keys(&ranking), vec!["EC2", "RDS", "S3"]);
    }

    #[test]
    fn test_rank_percentages() {
        let ranking = rank(&map(&[("EC2", 12.0), ("S3", 1.0)]), 13.0, DEFAULT_TOP_N);
        assert!((ranking[0].percentage - 92.307_692).abs() < 1e-4);

        let sum: f64 = ranking.iter().map(|e| e.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let aggregates = map(&[("Lambda", 2.0), ("EC2", 5.0), ("RDS", 2.0), ("SQS", 2.0)]);
        let first = rank(&aggregates, 11.0, DEFAULT_TOP_N);
        let second = rank(&aggregates, 11.0, DEFAULT_TOP_N);

        assert_eq!(keys(&first), vec!["EC2", "Lambda", "RDS", "SQS"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rank_excludes_zero_and_credits() {
        let ranking = rank(&map(&[("EC2", 10.0), ("Tax", 0.0), ("Credits", -2.0)]), 8.0, DEFAULT_TOP_N);
        assert_eq!(keys(&ranking), vec!["EC2"]);
    }

    #[test]
    fn test_credits_push_percentage_past_hundred() {
        let aggregates = map(&[("EC2", 10.0), ("Credits", -2.0)]);
        let ranking = rank(&aggregates, aggregates.total(), DEFAULT_TOP_N);

        assert_eq!(keys(&ranking), vec!["EC2"]);
        assert_eq!(ranking[0].percentage, 125.0);
    }

    #[test]
    fn test_rank_truncates_without_renormalizing() {
        let ranking = rank(&map(&[("A", 5.0), ("B", 3.0), ("C", 2.0)]), 10.0, 2);
        assert_eq!(keys(&ranking), vec!["A", "B"]);
        assert_eq!(ranking[0].percentage, 50.0);
        assert_eq!(ranking[1].percentage, 30.0);
    }

    #[test]
    fn test_zero_grand_total_yields_zero_percentage() {
        assert_eq!(percentage_of(5.0, 0.0), 0.0);
        let ranking = rank(&map(&[("EC2", 5.0)]), 0.0, DEFAULT_TOP_N);
        assert_eq!(ranking[0].percentage, 0.0);
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(&AggregateMap::new(), 0.0, DEFAULT_TOP_N).is_empty());
    }
}
