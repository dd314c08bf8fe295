//! Billing data source boundary
//!
//! The analysis core never talks to a billing provider itself. It receives a
//! [`BillingResponse`] from a [`BillingSource`]; the only source shipped here
//! reads a saved provider response from disk.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::record::{BillingResponse, Dimension};
use crate::Result;

/// Half-open date window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `days` full days before `end`, starting no earlier than `NaiveDate::MIN`
    pub fn last_days(end: NaiveDate, days: u32) -> Self {
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Time bucket size requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Granularity {
    Daily,
    Monthly,
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Daily => write!(f, "DAILY"),
            Granularity::Monthly => write!(f, "MONTHLY"),
        }
    }
}

/// What to ask the billing provider for
#[derive(Debug, Clone, PartialEq)]
pub struct BillingQuery {
    pub range: DateRange,
    pub granularity: Granularity,
    pub metric: String,
    pub group_by: Vec<Dimension>,
}

impl BillingQuery {
    pub fn daily(range: DateRange, metric: impl Into<String>) -> Self {
        Self {
            range,
            granularity: Granularity::Daily,
            metric: metric.into(),
            group_by: Vec::new(),
        }
    }

    pub fn group_by(mut self, dimension: Dimension) -> Self {
        self.group_by.push(dimension);
        self
    }
}

/// Supplier of raw billing responses
#[async_trait]
pub trait BillingSource: Send + Sync {
    async fn fetch(&self, query: &BillingQuery) -> Result<BillingResponse>;
}

/// Billing source backed by a provider response saved as JSON
#[derive(Debug, Clone)]
pub struct FileBillingSource {
    path: PathBuf,
}

impl FileBillingSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl BillingSource for FileBillingSource {
    async fn fetch(&self, query: &BillingQuery) -> Result<BillingResponse> {
        info!(path = %self.path.display(), range = %query.range, "Loading billing export");

        let contents = tokio::fs::read_to_string(&self.path).await?;
        let response = BillingResponse::from_json(&contents)?;
        let restricted = response.restricted_to(&query.range);

        debug!(
            buckets = restricted.results_by_time.len(),
            skipped = response.results_by_time.len() - restricted.results_by_time.len(),
            "Billing export filtered to query range"
        );

        Ok(restricted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_last_days() {
        let range = DateRange::last_days(day("2025-01-08"), 7);
        assert_eq!(range.start, day("2025-01-01"));
        assert_eq!(range.num_days(), 7);
        assert!(range.contains(day("2025-01-01")));
        assert!(range.contains(day("2025-01-07")));
        assert!(!range.contains(day("2025-01-08")));
    }

    #[test]
    fn test_last_days_clamps_huge_window() {
        let range = DateRange::last_days(day("2025-01-08"), u32::MAX);
        assert_eq!(range.start, NaiveDate::MIN);
        assert_eq!(range.end, day("2025-01-08"));
        assert!(range.contains(day("1970-01-01")));
        assert!(!range.contains(day("2025-01-08")));
    }

    #[test]
    fn test_granularity_to_string() {
        assert_eq!(Granularity::Daily.to_string(), "DAILY");
        assert_eq!(Granularity::Monthly.to_string(), "MONTHLY");
    }

    #[test]
    fn test_query_builder() {
        let query = BillingQuery::daily(DateRange::last_days(day("2025-01-08"), 1), "BlendedCost")
            .group_by(Dimension::Service);
        assert_eq!(query.granularity, Granularity::Daily);
        assert_eq!(query.group_by, vec![Dimension::Service]);
    }

    #[tokio::test]
    async fn test_file_source_filters_to_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"ResultsByTime": [
                {{"TimePeriod": {{"Start": "2025-01-01", "End": "2025-01-02"}}, "Groups": []}},
                {{"TimePeriod": {{"Start": "2025-01-07", "End": "2025-01-08"}}, "Groups": []}}
            ]}}"#
        )
        .unwrap();

        let source = FileBillingSource::new(file.path());
        let query = BillingQuery::daily(DateRange::last_days(day("2025-01-08"), 1), "BlendedCost");
        let response = source.fetch(&query).await.unwrap();

        assert_eq!(response.results_by_time.len(), 1);
        assert_eq!(response.results_by_time[0].time_period.start, "2025-01-07");
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = FileBillingSource::new("/nonexistent/billing.json");
        let query = BillingQuery::daily(DateRange::last_days(day("2025-01-08"), 1), "BlendedCost");
        assert!(matches!(source.fetch(&query).await, Err(crate::Error::Io(_))));
    }
}
