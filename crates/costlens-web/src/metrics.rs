//! Prometheus metrics collection and export
//!
//! Tracks API traffic and the outcome of every analysis served:
//! - HTTP requests by endpoint and status
//! - Analysis duration
//! - Last analyzed total cost
//! - Recommendations emitted by type

use costlens_core::AnalysisResult;
use prometheus::{
    CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};

/// Metrics collector for the cost API
pub struct MetricsCollector {
    registry: Registry,
    http_requests_total: CounterVec,
    analysis_duration_seconds: Histogram,
    analyzed_total_cost: Gauge,
    recommendations_total: CounterVec,
}

impl MetricsCollector {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = CounterVec::new(
            Opts::new("costlens_http_requests_total", "Total HTTP requests by endpoint and status"),
            &["endpoint", "status"],
        )?;

        let analysis_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "costlens_analysis_duration_seconds",
                "Time spent normalizing and analyzing a billing batch",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;

        let analyzed_total_cost = Gauge::with_opts(Opts::new(
            "costlens_analyzed_total_cost",
            "Grand total of the most recent analysis",
        ))?;

        let recommendations_total = CounterVec::new(
            Opts::new("costlens_recommendations_total", "Recommendations emitted by type"),
            &["type"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(analysis_duration_seconds.clone()))?;
        registry.register(Box::new(analyzed_total_cost.clone()))?;
        registry.register(Box::new(recommendations_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            analysis_duration_seconds,
            analyzed_total_cost,
            recommendations_total,
        })
    }

    pub fn record_http_request(&self, endpoint: &str, status: u16) {
        self.http_requests_total
            .with_label_values(&[endpoint, &status.to_string()])
            .inc();
    }

    /// Record the outcome of one analysis
    pub fn record_analysis(&self, analysis: &AnalysisResult, duration_seconds: f64) {
        self.analysis_duration_seconds.observe(duration_seconds);
        self.analyzed_total_cost.set(analysis.grand_total);
        for recommendation in &analysis.recommendations {
            self.recommendations_total
                .with_label_values(&[&recommendation.recommendation_type.to_string()])
                .inc();
        }
    }

    /// Encode all metrics to Prometheus text format
    pub fn gather(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;

        Ok(String::from_utf8(buffer)?)
    }
}
