//! HTTP trigger endpoints.
//!
//! | Method | Path | Action |
//! |--------|------|--------|
//! | `POST` | `/api/generate-content` | Bulk run now |
//! | `GET` | `/api/generate-content` | Start the periodic schedule |
//! | `DELETE` | `/api/generate-content` | Stop the periodic schedule |
//! | `GET` | `/api/generate-content/status` | Scheduler status |
//! | `GET` | `/api/health` | Health report, `?includeLogs=true` adds recent log lines |
//! | `GET` | `/api/categories/{category}` | Category index listing |
//!
//! Trigger responses are `{success, message, error?, timestamp}`; a failed
//! run answers 500 with the error's string form.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::error::Result;
use crate::models::{Category, CategoryIndexEntry};
use crate::monitoring::{HEALTH_LOG_LINES, HealthStatus, run_health_check};
use crate::scheduler::{Pipeline, Scheduler, SchedulerStatus, StartOutcome};

/// Shared handler state, built once by the composition root.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    scheduler: Arc<Scheduler>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, scheduler: Arc<Scheduler>) -> Self {
        Self {
            pipeline,
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub articles: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl TriggerResponse {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            error: None,
            articles: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    fn failed(message: &str, error: impl ToString) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            error: Some(error.to_string()),
            articles: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Only the literal `includeLogs=true` asks for log lines; any other value
/// is read as false.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthQuery {
    #[serde(default)]
    pub include_logs: Option<String>,
}

impl HealthQuery {
    pub fn wants_logs(&self) -> bool {
        self.include_logs.as_deref() == Some("true")
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub timestamp: DateTime<Utc>,
    pub status: HealthStatus,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
}

#[instrument(skip_all)]
async fn generate_now(State(app): State<AppState>) -> (StatusCode, Json<TriggerResponse>) {
    match app.pipeline.run_bulk().await {
        Ok(saved) => {
            let mut body = TriggerResponse::ok("Content generated successfully");
            body.articles = saved.into_iter().filter_map(|a| a.id).collect();
            (StatusCode::OK, Json(body))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TriggerResponse::failed("Failed to generate content", e)),
        ),
    }
}

async fn start_schedule(State(app): State<AppState>) -> Json<TriggerResponse> {
    let message = match app.scheduler.start().await {
        StartOutcome::Started => "Content generation scheduler started successfully",
        StartOutcome::AlreadyRunning => "Content generation scheduler is already running",
    };
    Json(TriggerResponse::ok(message))
}

async fn stop_schedule(State(app): State<AppState>) -> Json<TriggerResponse> {
    let message = if app.scheduler.stop().await {
        "Content generation scheduler stopped"
    } else {
        "Content generation scheduler was not running"
    };
    Json(TriggerResponse::ok(message))
}

async fn schedule_status(State(app): State<AppState>) -> Json<SchedulerStatus> {
    Json(app.scheduler.status().await)
}

async fn health(
    State(app): State<AppState>,
    Query(query): Query<HealthQuery>,
) -> Json<HealthResponse> {
    let log_book = app.pipeline.log_book();
    let report = run_health_check(app.pipeline.store(), log_book).await;
    let logs = if query.wants_logs() {
        Some(log_book.recent(HEALTH_LOG_LINES).await)
    } else {
        None
    };

    Json(HealthResponse {
        timestamp: Utc::now(),
        status: report.status,
        issues: report.issues,
        logs,
    })
}

async fn category_index(
    State(app): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<CategoryIndexEntry>>> {
    let category: Category = category.parse()?;
    Ok(Json(app.pipeline.store().category_index(category).await?))
}

/// Build the `/api` router bound to `app`.
pub fn setup_route(app: AppState) -> Router {
    let api = Router::new()
        .route(
            "/generate-content",
            get(start_schedule).post(generate_now).delete(stop_schedule),
        )
        .route("/generate-content/status", get(schedule_status))
        .route("/health", get(health))
        .route("/categories/{category}", get(category_index));

    Router::new().nest("/api", api).with_state(app)
}

/// Bind `addr` and serve the trigger endpoints until the process exits.
#[instrument(name = "http server", skip(app))]
pub async fn run_server(app: AppState, addr: &str) -> std::io::Result<()> {
    let router = add_middlewares(setup_route(app));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router).await
}

fn add_middlewares(router: Router) -> Router {
    fn log_failure(
        err: tower_http::classify::ServerErrorsFailureClass,
        _latency: std::time::Duration,
        _span: &tracing::Span,
    ) {
        tracing::error!(error = %err, "request failed");
    }

    router.layer(
        TraceLayer::new_for_http()
            .on_failure(log_failure)
            .on_request(|_req: &_, _span: &tracing::Span| {}),
    )
}
