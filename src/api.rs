// src/api.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::ai::{Summarizer, SummaryKind, TranslateService};
use crate::clock::SharedClock;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::event::Event;
use crate::outcome::{FallbackReason, Outcome};
use crate::query::QueryService;
use crate::snapshot::SnapshotStore;

pub const HEADER_FALLBACK_REASON: &str = "x-fallback-reason";
pub const HEADER_AI_USED: &str = "x-ai-used";

#[derive(Clone)]
pub struct AppState {
    pub query: QueryService,
    pub summarizer: Arc<Summarizer>,
    pub translator: Arc<TranslateService>,
    pub clock: SharedClock,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig, clock: SharedClock) -> anyhow::Result<Self> {
        Ok(Self {
            query: QueryService::new(SnapshotStore::new(&cfg.data_file), cfg.page_size),
            summarizer: Arc::new(Summarizer::from_config(&cfg.ai, clock.clone())?),
            translator: Arc::new(TranslateService::from_config(&cfg.translate)?),
            clock,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/articles", get(articles))
        .route("/api/ai-summary", post(ai_summary))
        .route("/api/translate", post(translate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn fallback_headers(reason: Option<FallbackReason>) -> HeaderMap {
    let mut h = HeaderMap::new();
    if let Some(r) = reason {
        h.insert(HEADER_FALLBACK_REASON, HeaderValue::from_static(r.as_str()));
    }
    h
}

#[derive(serde::Serialize)]
struct HealthOut {
    ok: bool,
    time: DateTime<Utc>,
}

async fn health(State(state): State<AppState>) -> Json<HealthOut> {
    Json(HealthOut {
        ok: true,
        time: state.clock.now(),
    })
}

#[derive(serde::Deserialize)]
struct ArticlesQuery {
    q: Option<String>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ArticlesOut {
    updated_at: Option<DateTime<Utc>>,
    events: Vec<Event>,
}

async fn articles(
    State(state): State<AppState>,
    query: Result<Query<ArticlesQuery>, axum::extract::rejection::QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(q) = query?;
    let outcome = state.query.list(q.q.as_deref()).await;
    let headers = fallback_headers(outcome.reason());
    let snap = outcome.into_value();
    Ok((
        headers,
        Json(ArticlesOut {
            updated_at: snap.updated_at,
            events: snap.events,
        }),
    )
        .into_response())
}

#[derive(serde::Deserialize)]
struct SummaryReq {
    content: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(serde::Serialize)]
struct SummaryOut {
    result: String,
}

fn ai_response(outcome: Outcome<String>, wrap: impl FnOnce(String) -> Response) -> Response {
    let mut headers = fallback_headers(outcome.reason());
    headers.insert(
        HEADER_AI_USED,
        HeaderValue::from_static(if outcome.is_fresh() { "1" } else { "0" }),
    );
    (headers, wrap(outcome.into_value())).into_response()
}

async fn ai_summary(
    State(state): State<AppState>,
    body: Result<Json<SummaryReq>, axum::extract::rejection::JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let content = req
        .content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing content".into()))?;
    let kind = SummaryKind::from_request(req.kind.as_deref());

    let outcome = state.summarizer.run(&content, kind).await;
    Ok(ai_response(outcome, |result| {
        Json(SummaryOut { result }).into_response()
    }))
}

#[derive(serde::Deserialize)]
struct TranslateReq {
    text: Option<String>,
    target: Option<String>,
}

#[derive(serde::Serialize)]
struct TranslateOut {
    translated: String,
}

async fn translate(
    State(state): State<AppState>,
    body: Result<Json<TranslateReq>, axum::extract::rejection::JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let (Some(text), Some(target)) = (
        req.text.filter(|t| !t.is_empty()),
        req.target.filter(|t| !t.trim().is_empty()),
    ) else {
        return Err(ApiError::BadRequest("missing fields".into()));
    };

    let outcome = state.translator.translate(&text, target.trim()).await;
    Ok(ai_response(outcome, |translated| {
        Json(TranslateOut { translated }).into_response()
    }))
}
