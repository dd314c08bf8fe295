//! Costlens Web - Cost dashboard API
//!
//! This crate provides the HTTP shell around costlens-core:
//! - REST endpoints for current, weekly, per-service and per-region costs
//! - Weekly analysis with recommendations and a rendered report
//! - CORS for browser dashboards
//! - Prometheus metrics

pub mod api;
pub mod metrics;

pub use api::{create_router, AppState};
pub use metrics::MetricsCollector;
