//! REST API endpoints for the cost dashboard

use axum::{
    body::Body,
    extract::{MatchedPath, Path, State},
    http::{header, Method, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use costlens_core::{
    dashboard, format_analysis, AnalysisResult, BillingQuery, BillingResponse, BillingSource,
    DateRange, Dimension, NormalizedBatch, RecordNormalizer, DEFAULT_TOP_N,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::metrics::MetricsCollector;

/// Days covered by the `current` endpoint
pub const CURRENT_WINDOW_DAYS: u32 = 2;

/// Days covered by the weekly views and analysis
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl ApiError {
    fn endpoint_not_found() -> Self {
        Self {
            error: "Endpoint not found".to_string(),
            code: "not_found".to_string(),
        }
    }

    fn internal(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            code: "internal_error".to_string(),
        }
    }
}

impl From<costlens_core::Error> for ApiError {
    fn from(err: costlens_core::Error) -> Self {
        error!("API error: {}", err);
        let code = match &err {
            e if e.is_malformed_record() => "malformed_record",
            costlens_core::Error::Io(_) => "source_unavailable",
            _ => "internal_error",
        };
        Self {
            error: err.to_string(),
            code: code.to_string(),
        }
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn BillingSource>,
    pub normalizer: RecordNormalizer,
    pub window_days: u32,
    pub top_n: usize,
    /// Pinned reference date; the current UTC date when unset
    pub as_of: Option<NaiveDate>,
    pub metrics: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new(source: Arc<dyn BillingSource>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            source,
            normalizer: RecordNormalizer::default(),
            window_days: DEFAULT_WINDOW_DAYS,
            top_n: DEFAULT_TOP_N,
            as_of: None,
            metrics: Arc::new(MetricsCollector::new()?),
        })
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn with_window_days(mut self, window_days: u32) -> Self {
        self.window_days = window_days;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_normalizer(mut self, normalizer: RecordNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    fn today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn now(&self) -> DateTime<Utc> {
        match self.as_of {
            Some(date) => date.and_time(chrono::NaiveTime::MIN).and_utc(),
            None => Utc::now(),
        }
    }

    /// Fetch and normalize the last `days` days of billing data
    async fn load(&self, days: u32, group_by: &[Dimension]) -> Result<NormalizedBatch, ApiError> {
        let range = DateRange::last_days(self.today(), days);
        let mut query = BillingQuery::daily(range, self.normalizer.metric());
        for dimension in group_by {
            query = query.group_by(dimension.clone());
        }

        let response = self.source.fetch(&query).await?;
        Ok(self.normalizer.normalize(&response)?.within(&range))
    }

    fn analyze(&self, batch: &NormalizedBatch) -> AnalysisResponse {
        let started = Instant::now();
        let analysis = AnalysisResult::with_top_n(batch, self.now(), self.top_n);
        self.metrics
            .record_analysis(&analysis, started.elapsed().as_secs_f64());

        let report = format_analysis(&analysis, &analysis.recommendations);
        info!(
            id = %analysis.id(),
            total = analysis.grand_total,
            recommendations = analysis.recommendations.len(),
            "Analysis served"
        );

        AnalysisResponse {
            id: analysis.id(),
            subject: report.subject.clone(),
            report: report.render(),
            analysis,
        }
    }
}

/// Record request counts by matched route
async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    state
        .metrics
        .record_http_request(&endpoint, response.status().as_u16());
    response
}

/// Create the API router with CORS and request tracing
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/costs/:endpoint", get(costs))
        .route("/api/analysis", get(weekly_analysis))
        .route("/api/analyze", post(analyze_export))
        .route("/metrics", get(metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ==================== Handlers ====================

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn costs(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
) -> Result<Response, ApiError> {
    match endpoint.as_str() {
        "current" => {
            let batch = state.load(CURRENT_WINDOW_DAYS, &[]).await?;
            Ok(Json(dashboard::current_costs(&batch, state.now())).into_response())
        }
        "weekly" => {
            let batch = state.load(state.window_days, &[]).await?;
            Ok(Json(dashboard::weekly_costs(&batch)).into_response())
        }
        "services" => {
            let batch = state.load(state.window_days, &[Dimension::Service]).await?;
            Ok(Json(dashboard::breakdown(&batch, &Dimension::Service, state.top_n)).into_response())
        }
        "regions" => {
            let batch = state.load(state.window_days, &[Dimension::Region]).await?;
            Ok(Json(dashboard::breakdown(&batch, &Dimension::Region, state.top_n)).into_response())
        }
        _ => Err(ApiError::endpoint_not_found()),
    }
}

async fn weekly_analysis(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let batch = state
        .load(state.window_days, &[Dimension::Service, Dimension::Region])
        .await?;
    Ok(Json(state.analyze(&batch)))
}

async fn analyze_export(
    State(state): State<Arc<AppState>>,
    Json(response): Json<BillingResponse>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let batch = state.normalizer.normalize(&response)?;
    Ok(Json(state.analyze(&batch)))
}

async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .gather()
        .map_err(|e| ApiError::internal(format!("Metrics error: {}", e)))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

// ==================== Response Types ====================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub id: String,
    pub subject: String,
    pub report: String,
    pub analysis: AnalysisResult,
}
