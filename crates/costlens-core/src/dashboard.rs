//! Dashboard views
//!
//! Read-only summaries served by the web API: recent daily totals, the weekly
//! trend line, and positive-cost breakdowns by service or region.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregation::{aggregate, daily_totals, grand_total};
use crate::ranking::{rank, DEFAULT_TOP_N};
use crate::record::{CostRecord, Dimension, NormalizedBatch};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCost {
    pub date: String,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentCosts {
    pub total_cost: f64,
    pub daily_costs: Vec<DailyCost>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyCosts {
    pub weekly_total: f64,
    pub daily_breakdown: Vec<DailyCost>,
    pub average_daily: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub name: String,
    pub cost: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub dimension: String,
    /// Sum of positive amounts only
    pub total_cost: f64,
    pub entries: Vec<BreakdownEntry>,
}

fn daily_costs(batch: &NormalizedBatch) -> Vec<DailyCost> {
    daily_totals(batch)
        .iter()
        .map(|a| DailyCost {
            date: a.key.to_string(),
            cost: a.total,
        })
        .collect()
}

/// Per-day totals over the batch window
pub fn current_costs(batch: &NormalizedBatch, now: DateTime<Utc>) -> CurrentCosts {
    CurrentCosts {
        total_cost: grand_total(&batch.records),
        daily_costs: daily_costs(batch),
        last_updated: now,
    }
}

pub fn weekly_costs(batch: &NormalizedBatch) -> WeeklyCosts {
    let daily_breakdown = daily_costs(batch);
    let weekly_total = grand_total(&batch.records);
    let average_daily = if daily_breakdown.is_empty() {
        0.0
    } else {
        weekly_total / daily_breakdown.len() as f64
    };

    WeeklyCosts {
        weekly_total,
        daily_breakdown,
        average_daily,
    }
}

/// Breakdown over positive records only, percentages relative to their sum
pub fn breakdown(batch: &NormalizedBatch, dimension: &Dimension, top_n: usize) -> CostBreakdown {
    let positive: Vec<CostRecord> = batch
        .records
        .iter()
        .filter(|r| r.amount > 0.0)
        .cloned()
        .collect();
    let total_cost = grand_total(&positive);
    let aggregates = aggregate(&positive, std::slice::from_ref(dimension));

    CostBreakdown {
        dimension: dimension.name().to_string(),
        total_cost,
        entries: rank(&aggregates, total_cost, top_n)
            .into_iter()
            .map(|entry| BreakdownEntry {
                name: entry.key.to_string(),
                cost: entry.total,
                percentage: entry.percentage,
            })
            .collect(),
    }
}

pub fn service_breakdown(batch: &NormalizedBatch) -> CostBreakdown {
    breakdown(batch, &Dimension::Service, DEFAULT_TOP_N)
}

pub fn region_breakdown(batch: &NormalizedBatch) -> CostBreakdown {
    breakdown(batch, &Dimension::Region, DEFAULT_TOP_N)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn batch() -> NormalizedBatch {
        NormalizedBatch::new(
            vec![day(1), day(2), day(3)],
            vec![
                CostRecord::new(day(1), 6.0)
                    .with_dimension(Dimension::Service, "EC2")
                    .with_dimension(Dimension::Region, "us-east-1"),
                CostRecord::new(day(1), -1.0).with_dimension(Dimension::Service, "Credits"),
                CostRecord::new(day(3), 2.0)
                    .with_dimension(Dimension::Service, "S3")
                    .with_dimension(Dimension::Region, "eu-west-1"),
            ],
        )
    }

    #[test]
    fn test_current_costs() {
        let now = Utc.with_ymd_and_hms(2025, 1, 4, 0, 0, 0).unwrap();
        let current = current_costs(&batch(), now);

        assert_eq!(current.total_cost, 7.0);
        assert_eq!(current.daily_costs.len(), 3);
        assert_eq!(current.daily_costs[0].cost, 5.0);
        assert_eq!(current.daily_costs[1].cost, 0.0);
        assert_eq!(current.last_updated, now);
    }

    #[test]
    fn test_weekly_costs() {
        let weekly = weekly_costs(&batch());
        assert_eq!(weekly.weekly_total, 7.0);
        assert!((weekly.average_daily - 7.0 / 3.0).abs() < 1e-9);

        let empty = weekly_costs(&NormalizedBatch::default());
        assert_eq!(empty.average_daily, 0.0);
        assert!(empty.daily_breakdown.is_empty());
    }

    #[test]
    fn test_service_breakdown_ignores_credits() {
        let services = service_breakdown(&batch());

        assert_eq!(services.dimension, "service");
        assert_eq!(services.total_cost, 8.0);
        assert_eq!(services.entries.len(), 2);
        assert_eq!(services.entries[0].name, "EC2");
        assert_eq!(services.entries[0].percentage, 75.0);
        assert_eq!(services.entries[1].percentage, 25.0);
    }

    #[test]
    fn test_region_breakdown() {
        let regions = region_breakdown(&batch());
        let names: Vec<&str> = regions.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["us-east-1", "eu-west-1"]);
    }

    #[test]
    fn test_breakdown_top_n() {
        let limited = breakdown(&batch(), &Dimension::Service, 1);
        assert_eq!(limited.entries.len(), 1);
        assert_eq!(limited.total_cost, 8.0);
    }
}
