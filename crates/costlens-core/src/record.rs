//! Cost records and the billing response normalizer
//!
//! Converts the provider's time-bucketed, grouped response into a flat,
//! uniform sequence of [`CostRecord`]s. Missing dimension values are kept out
//! of the record so the per-dimension sentinel applies at aggregation time;
//! an amount that cannot be read fails the whole batch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::billing::DateRange;
use crate::{Error, Result};

/// Metric read from the provider response unless configured otherwise
pub const DEFAULT_METRIC: &str = "BlendedCost";

/// Date format used by the provider and in every rendered day key
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// A dimension records can be grouped by
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dimension {
    Service,
    Region,
    Day,
    Other(String),
}

impl Dimension {
    /// Lowercase dimension name used as the key in [`CostRecord::dimensions`]
    pub fn name(&self) -> &str {
        match self {
            Dimension::Service => "service",
            Dimension::Region => "region",
            Dimension::Day => "day",
            Dimension::Other(name) => name,
        }
    }

    /// Value assigned when a record does not carry this dimension
    pub fn sentinel(&self) -> &'static str {
        match self {
            Dimension::Region => "Global",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "" => Err("Dimension name cannot be empty".to_string()),
            "service" => Ok(Dimension::Service),
            "region" => Ok(Dimension::Region),
            "day" | "date" => Ok(Dimension::Day),
            _ => Ok(Dimension::Other(normalized)),
        }
    }
}

/// A single cost amount for one period and one combination of dimension values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub period: NaiveDate,
    pub dimensions: BTreeMap<String, String>,
    pub amount: f64,
}

impl CostRecord {
    pub fn new(period: NaiveDate, amount: f64) -> Self {
        Self {
            period,
            dimensions: BTreeMap::new(),
            amount,
        }
    }

    pub fn with_dimension(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.dimensions.insert(dimension.name().to_string(), value.into());
        self
    }

    /// Resolve the value of a dimension, falling back to its sentinel
    pub fn dimension_value(&self, dimension: &Dimension) -> String {
        if *dimension == Dimension::Day {
            return self.period.format(DAY_FORMAT).to_string();
        }
        match self.dimensions.get(dimension.name()) {
            Some(value) if !value.trim().is_empty() => value.clone(),
            _ => dimension.sentinel().to_string(),
        }
    }
}

/// Records of one provider response together with every period it covered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBatch {
    /// Bucket start dates, ascending, including buckets without any spend
    pub periods: Vec<NaiveDate>,
    pub records: Vec<CostRecord>,
}

impl NormalizedBatch {
    pub fn new(mut periods: Vec<NaiveDate>, records: Vec<CostRecord>) -> Self {
        periods.sort();
        periods.dedup();
        Self { periods, records }
    }

    /// Build a batch whose periods are exactly those the records mention
    pub fn from_records(records: Vec<CostRecord>) -> Self {
        let periods = records.iter().map(|r| r.period).collect();
        Self::new(periods, records)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Restrict the batch to the periods inside `range`
    pub fn within(&self, range: &DateRange) -> Self {
        Self {
            periods: self
                .periods
                .iter()
                .copied()
                .filter(|p| range.contains(*p))
                .collect(),
            records: self
                .records
                .iter()
                .filter(|r| range.contains(r.period))
                .cloned()
                .collect(),
        }
    }
}

// ==================== Provider wire format ====================

/// Cost-and-usage response as returned by the billing provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BillingResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_definitions: Vec<GroupDefinition>,
    #[serde(default)]
    pub results_by_time: Vec<ResultByTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupDefinition {
    #[serde(rename = "Type", default)]
    pub kind: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultByTime {
    pub time_period: TimePeriod,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub total: BTreeMap<String, MetricValue>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub estimated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimePeriod {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Group {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricValue {
    pub amount: String,
    #[serde(default)]
    pub unit: String,
}

impl BillingResponse {
    /// Parse a provider response from its JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Keep only the buckets starting inside `range`
    pub fn restricted_to(&self, range: &DateRange) -> Self {
        Self {
            group_definitions: self.group_definitions.clone(),
            results_by_time: self
                .results_by_time
                .iter()
                .filter(|bucket| {
                    NaiveDate::parse_from_str(&bucket.time_period.start, DAY_FORMAT)
                        .map(|start| range.contains(start))
                        // Unreadable dates are kept so the normalizer can reject them
                        .unwrap_or(true)
                })
                .cloned()
                .collect(),
        }
    }
}

/// Converts provider responses into [`NormalizedBatch`]es
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    metric: String,
    group_keys: Vec<Dimension>,
}

impl Default for RecordNormalizer {
    fn default() -> Self {
        Self {
            metric: DEFAULT_METRIC.to_string(),
            group_keys: vec![Dimension::Service, Dimension::Region],
        }
    }
}

impl RecordNormalizer {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            ..Self::default()
        }
    }

    /// Dimensions bound to group keys when the response carries no group definitions
    pub fn with_group_keys(mut self, group_keys: Vec<Dimension>) -> Self {
        self.group_keys = group_keys;
        self
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn normalize(&self, response: &BillingResponse) -> Result<NormalizedBatch> {
        let group_keys: Vec<Dimension> = if response.group_definitions.is_empty() {
            self.group_keys.clone()
        } else {
            response
                .group_definitions
                .iter()
                .map(|definition| {
                    definition
                        .key
                        .parse()
                        .unwrap_or_else(|_| Dimension::Other(definition.key.to_lowercase()))
                })
                .collect()
        };

        let mut periods = Vec::with_capacity(response.results_by_time.len());
        let mut records = Vec::new();

        for bucket in &response.results_by_time {
            let start = &bucket.time_period.start;
            let period = NaiveDate::parse_from_str(start, DAY_FORMAT)
                .map_err(|e| Error::malformed(start, format!("invalid period start: {}", e)))?;
            periods.push(period);

            if bucket.groups.is_empty() {
                if let Some(total) = bucket.total.get(&self.metric) {
                    let amount = parse_amount(start, &total.amount)?;
                    records.push(CostRecord::new(period, amount));
                }
                continue;
            }

            for group in &bucket.groups {
                let metric = group.metrics.get(&self.metric).ok_or_else(|| {
                    Error::malformed(
                        start,
                        format!("group {:?} has no {} metric", group.keys, self.metric),
                    )
                })?;
                let amount = parse_amount(start, &metric.amount)?;

                let mut record = CostRecord::new(period, amount);
                for (dimension, value) in group_keys.iter().zip(&group.keys) {
                    if !value.trim().is_empty() {
                        record = record.with_dimension(dimension.clone(), value.clone());
                    }
                }
                records.push(record);
            }
        }

        debug!(
            buckets = periods.len(),
            records = records.len(),
            metric = %self.metric,
            "Normalized billing response"
        );

        Ok(NormalizedBatch::new(periods, records))
    }
}

fn parse_amount(bucket: &str, raw: &str) -> Result<f64> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::malformed(bucket, format!("amount {:?} is not a number", raw)))?;
    if !amount.is_finite() {
        return Err(Error::malformed(bucket, format!("amount {:?} is not finite", raw)));
    }
    Ok(amount)
}
