// src/api.rs
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::config::AppConfig;
use crate::entities::{build_strategy, DynEntityStrategy, NoEntities};
use crate::export::{ics_filename, share_text, to_ics};
use crate::export::{google_url, outlook_url};
use crate::extract::EventRecord;
use crate::page;
use crate::pipeline::{ScanReport, ScanRequest, Scanner, DEFAULT_ENTITY_TIMEOUT};
use crate::segment::Granularity;

/// Shared state of the HTTP surface. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<Scanner>,
    pub strategy: DynEntityStrategy,
    pub entity_timeout: Duration,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            scanner: Arc::new(Scanner::new(cfg.segmenter.clone(), cfg.extractor.clone())),
            strategy: build_strategy(&cfg.entities),
            entity_timeout: cfg.entities.timeout(),
            http: page::http_client(cfg.server.fetch_timeout()),
        }
    }

    /// Defaults + pattern-only extraction (tests, offline runs).
    pub fn pattern_only() -> Self {
        Self {
            scanner: Arc::new(Scanner::default()),
            strategy: Arc::new(NoEntities),
            entity_timeout: DEFAULT_ENTITY_TIMEOUT,
            http: page::http_client(Duration::from_secs(8)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/scan", post(scan))
        .route("/scan/url", post(scan_url))
        .route("/export/ics", post(export_ics))
        .route("/export/links", post(export_links))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Upstream failure (page fetch) rendered as `502 { "error": ".." }`.
pub struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": format!("{:#}", self.0) }));
        (StatusCode::BAD_GATEWAY, body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

async fn scan(State(state): State<AppState>, Json(req): Json<ScanRequest>) -> Json<ScanReport> {
    let report = state
        .scanner
        .report(req, state.strategy.as_ref(), state.entity_timeout)
        .await;
    Json(report)
}

#[derive(Deserialize)]
struct ScanUrlReq {
    url: String,
    #[serde(default)]
    granularity: Option<Granularity>,
}

async fn scan_url(
    State(state): State<AppState>,
    Json(body): Json<ScanUrlReq>,
) -> Result<Json<ScanReport>, ApiError> {
    let page = page::fetch(&state.http, &body.url).await.map_err(|e| {
        warn!(target: "api", error = %e, "page fetch failed");
        ApiError(e)
    })?;
    let req = ScanRequest {
        text: page.text,
        title: Some(page.title),
        url: Some(body.url),
        granularity: body.granularity,
    };
    let report = state
        .scanner
        .report(req, state.strategy.as_ref(), state.entity_timeout)
        .await;
    Ok(Json(report))
}

async fn export_ics(Json(record): Json<EventRecord>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", ics_filename(&record.title));
    (
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        to_ics(&record),
    )
        .into_response()
}

#[derive(Serialize)]
struct LinksResp {
    google: String,
    outlook: String,
    share: String,
}

async fn export_links(Json(record): Json<EventRecord>) -> Json<LinksResp> {
    Json(LinksResp {
        google: google_url(&record),
        outlook: outlook_url(&record),
        share: share_text(&record),
    })
}
