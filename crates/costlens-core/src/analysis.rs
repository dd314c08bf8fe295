//! Cost analysis pipeline
//!
//! [`AnalysisResult`] is built once per batch: aggregate by service, region
//! and day, rank the breakdowns, detect the daily trend, then run the
//! recommendation rules over the result.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregation::{aggregate, daily_totals, grand_total, Aggregate, AggregateMap};
use crate::ranking::{rank, RankedEntry, DEFAULT_TOP_N};
use crate::recommendation::{self, Recommendation};
use crate::record::{Dimension, NormalizedBatch};
use crate::trend::{detect_trend, TrendSignal};

/// Everything derived from one batch of cost records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analyzed_at: DateTime<Utc>,
    pub grand_total: f64,
    pub by_service: AggregateMap,
    pub by_region: AggregateMap,
    pub by_day: AggregateMap,
    pub service_ranking: Vec<RankedEntry>,
    pub region_ranking: Vec<RankedEntry>,
    pub trend: Option<TrendSignal>,
    pub recommendations: Vec<Recommendation>,
}

impl AnalysisResult {
    pub fn from_batch(batch: &NormalizedBatch, analyzed_at: DateTime<Utc>) -> Self {
        Self::with_top_n(batch, analyzed_at, DEFAULT_TOP_N)
    }

    /// Run the pipeline keeping `top_n` entries in each ranking
    pub fn with_top_n(batch: &NormalizedBatch, analyzed_at: DateTime<Utc>, top_n: usize) -> Self {
        let grand_total = grand_total(&batch.records);
        let by_service = aggregate(&batch.records, &[Dimension::Service]);
        let by_region = aggregate(&batch.records, &[Dimension::Region]);
        let by_day = daily_totals(batch);

        let service_ranking = rank(&by_service, grand_total, top_n);
        let region_ranking = rank(&by_region, grand_total, top_n);
        let trend = detect_trend(&by_day.totals());

        let mut result = Self {
            analyzed_at,
            grand_total,
            by_service,
            by_region,
            by_day,
            service_ranking,
            region_ranking,
            trend,
            recommendations: Vec::new(),
        };
        result.recommendations = recommendation::generate(&result);

        debug!(
            grand_total = result.grand_total,
            services = result.by_service.len(),
            regions = result.by_region.len(),
            days = result.by_day.len(),
            recommendations = result.recommendations.len(),
            "Cost analysis complete"
        );

        result
    }

    /// ISO-8601 timestamp identifying this analysis in external storage
    pub fn id(&self) -> String {
        self.analyzed_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn top_service(&self) -> Option<&Aggregate> {
        self.by_service.top()
    }

    pub fn top_region(&self) -> Option<&Aggregate> {
        self.by_region.top()
    }

    /// Daily totals ascending by date
    pub fn daily_series(&self) -> Vec<f64> {
        self.by_day.totals()
    }

    /// True when the batch carried no cost records at all
    pub fn is_empty(&self) -> bool {
        self.by_service.is_empty()
    }
}
