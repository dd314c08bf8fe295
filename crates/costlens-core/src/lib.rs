//! Costlens Core - Cost aggregation and recommendation engine
//!
//! This crate turns batches of time-bucketed cost records into:
//! - Per-service, per-region and per-day aggregates
//! - Ranked breakdowns with percentages
//! - Daily trend signals and threshold decisions
//! - Prioritized optimization recommendations and rendered reports
//!
//! Billing data sources, historical storage and notification delivery are
//! boundaries: the crate defines their shapes, callers provide the I/O.

pub mod aggregation;
pub mod analysis;
pub mod billing;
pub mod dashboard;
pub mod error;
pub mod notification;
pub mod ranking;
pub mod recommendation;
pub mod record;
pub mod report;
pub mod storage;
pub mod threshold;
pub mod trend;

pub use error::{Error, Result};

// Re-export record types
pub use record::{
    BillingResponse, CostRecord, Dimension, NormalizedBatch, RecordNormalizer, DEFAULT_METRIC,
};

// Re-export aggregation and ranking types
pub use aggregation::{aggregate, daily_totals, grand_total, Aggregate, AggregateMap, GroupKey};
pub use ranking::{percentage_of, rank, RankedEntry, DEFAULT_TOP_N};

// Re-export signal types
pub use threshold::{evaluate_threshold, ThresholdEvaluation, DEFAULT_DAILY_THRESHOLD};
pub use trend::{detect_trend, TrendSignal, TREND_MULTIPLIER};

// Re-export analysis types
pub use analysis::AnalysisResult;
pub use recommendation::{Priority, Recommendation, RecommendationType};
pub use report::{format_analysis, format_currency, format_threshold_alert, Report};

// Re-export boundary types
pub use billing::{BillingQuery, BillingSource, DateRange, FileBillingSource, Granularity};
pub use notification::{should_notify, LogNotifier, Notification, Notifier};
pub use storage::StoredAnalysis;
