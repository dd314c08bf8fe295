//! Per-dimension cost aggregation
//!
//! Reduces a record sequence into one [`Aggregate`] per distinct key in a
//! single pass. [`AggregateMap`] keeps keys in first-seen order so that ties
//! downstream resolve the same way on every run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::record::{CostRecord, Dimension, NormalizedBatch, DAY_FORMAT};

/// Composite key made of one value per grouped dimension
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(pub Vec<String>);

impl GroupKey {
    pub fn single(value: impl Into<String>) -> Self {
        Self(vec![value.into()])
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(" / "))
    }
}

/// Summed cost for one key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub key: GroupKey,
    pub total: f64,
    pub count: usize,
}

/// Insertion-ordered mapping from group key to aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Aggregate>", into = "Vec<Aggregate>")]
pub struct AggregateMap {
    entries: Vec<Aggregate>,
    index: HashMap<GroupKey, usize>,
}

impl AggregateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the aggregate for `key`, creating it on first sight
    pub fn add(&mut self, key: GroupKey, amount: f64) {
        match self.index.get(&key) {
            Some(&position) => {
                let entry = &mut self.entries[position];
                entry.total += amount;
                entry.count += 1;
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(Aggregate {
                    key,
                    total: amount,
                    count: 1,
                });
            }
        }
    }

    /// Register a key with a zero total if it is not present yet
    pub fn seed(&mut self, key: GroupKey) {
        if !self.index.contains_key(&key) {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push(Aggregate {
                key,
                total: 0.0,
                count: 0,
            });
        }
    }

    pub fn get(&self, key: &GroupKey) -> Option<&Aggregate> {
        self.index.get(key).map(|&position| &self.entries[position])
    }

    /// Lookup by a single-dimension value
    pub fn get_value(&self, value: &str) -> Option<&Aggregate> {
        self.get(&GroupKey::single(value))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Aggregate> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all aggregate totals
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|a| a.total).sum()
    }

    /// Highest-total aggregate; the first one seen wins a tie
    pub fn top(&self) -> Option<&Aggregate> {
        self.entries.iter().fold(None, |best: Option<&Aggregate>, entry| match best {
            Some(current) if entry.total <= current.total => Some(current),
            _ => Some(entry),
        })
    }

    /// Number of aggregates with a non-zero total
    pub fn non_zero_count(&self) -> usize {
        self.entries.iter().filter(|a| a.total != 0.0).count()
    }

    /// Totals in insertion order
    pub fn totals(&self) -> Vec<f64> {
        self.entries.iter().map(|a| a.total).collect()
    }

    fn sort_by_key(&mut self) {
        self.entries.sort_by(|a, b| a.key.0.cmp(&b.key.0));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.key.clone(), position))
            .collect();
    }
}

impl From<Vec<Aggregate>> for AggregateMap {
    fn from(aggregates: Vec<Aggregate>) -> Self {
        let mut map = AggregateMap::new();
        for aggregate in aggregates {
            match map.index.get(&aggregate.key) {
                Some(&position) => {
                    let entry = &mut map.entries[position];
                    entry.total += aggregate.total;
                    entry.count += aggregate.count;
                }
                None => {
                    map.index.insert(aggregate.key.clone(), map.entries.len());
                    map.entries.push(aggregate);
                }
            }
        }
        map
    }
}

impl From<AggregateMap> for Vec<Aggregate> {
    fn from(map: AggregateMap) -> Self {
        map.entries
    }
}

impl<'a> IntoIterator for &'a AggregateMap {
    type Item = &'a Aggregate;
    type IntoIter = std::slice::Iter<'a, Aggregate>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Group records by the given dimensions and sum their amounts
pub fn aggregate(records: &[CostRecord], group_by: &[Dimension]) -> AggregateMap {
    let mut map = AggregateMap::new();
    for record in records {
        let key = GroupKey(
            group_by
                .iter()
                .map(|dimension| record.dimension_value(dimension))
                .collect(),
        );
        map.add(key, record.amount);
    }
    map
}

/// Sum of every record amount, independent of any grouping
pub fn grand_total(records: &[CostRecord]) -> f64 {
    records.iter().map(|r| r.amount).sum()
}

/// Per-day totals ascending by date, with a zero entry for every empty period
pub fn daily_totals(batch: &NormalizedBatch) -> AggregateMap {
    let mut map = AggregateMap::new();
    for period in &batch.periods {
        map.seed(GroupKey::single(period.format(DAY_FORMAT).to_string()));
    }
    for record in &batch.records {
        map.add(GroupKey::single(record.dimension_value(&Dimension::Day)), record.amount);
    }
    // Day keys are ISO dates, so lexical order is chronological
    map.sort_by_key();
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(date: &str, service: &str, region: &str, amount: f64) -> CostRecord {
        CostRecord::new(day(date), amount)
            .with_dimension(Dimension::Service, service)
            .with_dimension(Dimension::Region, region)
    }

    fn sample_records() -> Vec<CostRecord> {
        vec![
            record("2025-01-01", "EC2", "us-east-1", 3.0),
            record("2025-01-01", "S3", "us-west-2", 1.0),
            record("2025-01-02", "EC2", "us-east-1", 9.0),
        ]
    }

    #[test]
    fn test_aggregate_by_service() {
        let by_service = aggregate(&sample_records(), &[Dimension::Service]);

        assert_eq!(by_service.len(), 2);
        let ec2 = by_service.get_value("EC2").unwrap();
        assert_eq!(ec2.total, 12.0);
        assert_eq!(ec2.count, 2);
        assert_eq!(by_service.get_value("S3").unwrap().total, 1.0);
    }

    #[test]
    fn test_aggregate_composite_key() {
        let by_both = aggregate(&sample_records(), &[Dimension::Service, Dimension::Region]);
        let key = GroupKey(vec!["EC2".to_string(), "us-east-1".to_string()]);

        assert_eq!(by_both.get(&key).unwrap().total, 12.0);
        assert_eq!(key.to_string(), "EC2 / us-east-1");
    }

    #[test]
    fn test_aggregate_preserves_first_seen_order() {
        let by_service = aggregate(&sample_records(), &[Dimension::Service]);
        let keys: Vec<String> = by_service.iter().map(|a| a.key.to_string()).collect();
        assert_eq!(keys, vec!["EC2", "S3"]);
    }

    #[test]
    fn test_missing_dimensions_use_sentinels() {
        let records = vec![CostRecord::new(day("2025-01-01"), 2.5)];

        let by_service = aggregate(&records, &[Dimension::Service]);
        let by_region = aggregate(&records, &[Dimension::Region]);

        assert_eq!(by_service.get_value("Unknown").unwrap().total, 2.5);
        assert_eq!(by_region.get_value("Global").unwrap().total, 2.5);
    }

    #[test]
    fn test_grand_total_matches_groupings() {
        let records = sample_records();
        let total = grand_total(&records);

        assert_eq!(total, 13.0);
        assert_eq!(aggregate(&records, &[Dimension::Service]).total(), total);
        assert_eq!(aggregate(&records, &[Dimension::Region]).total(), total);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(grand_total(&[]), 0.0);
        assert!(aggregate(&[], &[Dimension::Service]).is_empty());
        assert!(daily_totals(&NormalizedBatch::default()).is_empty());
    }

    #[test]
    fn test_top_prefers_first_on_tie() {
        let records = vec![
            record("2025-01-01", "Lambda", "us-east-1", 5.0),
            record("2025-01-01", "RDS", "us-east-1", 5.0),
            record("2025-01-01", "S3", "us-east-1", 1.0),
        ];
        let by_service = aggregate(&records, &[Dimension::Service]);
        assert_eq!(by_service.top().unwrap().key, GroupKey::single("Lambda"));
    }

    #[test]
    fn test_daily_totals_include_empty_days_in_order() {
        let batch = NormalizedBatch::new(
            vec![day("2025-01-03"), day("2025-01-01"), day("2025-01-02")],
            vec![
                record("2025-01-03", "EC2", "us-east-1", 9.0),
                record("2025-01-01", "EC2", "us-east-1", 3.0),
                record("2025-01-01", "S3", "us-east-1", 1.0),
            ],
        );

        let daily = daily_totals(&batch);
        let keys: Vec<String> = daily.iter().map(|a| a.key.to_string()).collect();
        assert_eq!(keys, vec!["2025-01-01", "2025-01-02", "2025-01-03"]);
        assert_eq!(daily.totals(), vec![4.0, 0.0, 9.0]);
        assert_eq!(daily.get_value("2025-01-02").unwrap().count, 0);
    }

    #[test]
    fn test_non_zero_count_ignores_zero_totals() {
        let records = vec![
            record("2025-01-01", "EC2", "us-east-1", 1.0),
            record("2025-01-01", "EC2", "eu-west-1", 0.0),
            record("2025-01-01", "EC2", "ap-south-1", 2.0),
        ];
        assert_eq!(aggregate(&records, &[Dimension::Region]).non_zero_count(), 2);
    }

    #[test]
    fn test_aggregate_map_serde_keeps_order() {
        let by_service = aggregate(&sample_records(), &[Dimension::Service]);
        let json = serde_json::to_string(&by_service).unwrap();
        let restored: AggregateMap = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, by_service);
    }
}
