//! HTTP surface: read API over the store, on-demand rating, sync trigger.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::engine::{compute_rating, RawMatchInput};
use crate::error::{FetchError, RatingError, SyncError};
use crate::ingest::{self, types::MatchSource, SyncReport};
use crate::rating::{Category, LegendTier, RatingResult};
use crate::store::{sort_by_score_desc, MatchStore, StoredMatch};

const DEFAULT_TOP_LIMIT: usize = 10;
const MAX_TOP_LIMIT: usize = 100;

#[derive(Clone)]
pub struct AppState {
    store: Arc<MatchStore>,
    source: Option<Arc<dyn MatchSource>>,
}

impl AppState {
    pub fn new(store: Arc<MatchStore>) -> Self {
        Self {
            store,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn MatchSource>) -> Self {
        self.source = Some(source);
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/matches", get(list_matches))
        .route("/api/matches/top", get(top_matches))
        .route("/api/matches/{id}", get(get_match))
        .route("/api/rate", post(rate_match))
        .route("/api/legend", get(legend))
        .route("/api/sync", post(trigger_sync))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// ---- errors ----

#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    NotFound(String),
    Sync(SyncError),
}

impl From<RatingError> for ApiError {
    fn from(e: RatingError) -> Self {
        match e {
            RatingError::InvalidInput(msg) => ApiError::InvalidInput(msg),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        ApiError::Sync(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, retry_after) = match self {
            ApiError::InvalidInput(m) => (StatusCode::BAD_REQUEST, format!("invalid input: {m}"), None),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m, None),
            ApiError::Sync(e) => {
                let status = match &e {
                    SyncError::Fetch(FetchError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
                    SyncError::Fetch(FetchError::NotConfigured(_)) => StatusCode::SERVICE_UNAVAILABLE,
                    SyncError::Fetch(_) => StatusCode::BAD_GATEWAY,
                    SyncError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let retry = match &e {
                    SyncError::Fetch(FetchError::RateLimited { retry_after }) => {
                        Some(retry_after.as_secs())
                    }
                    _ => None,
                };
                (status, e.to_string(), retry)
            }
        };

        let mut resp = (status, Json(ErrorBody { error: message })).into_response();
        if let Some(secs) = retry_after {
            resp.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        resp
    }
}

// ---- handlers ----

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    competition: Option<String>,
    #[serde(default)]
    sort: Option<String>,
}

async fn list_matches(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<StoredMatch>>, ApiError> {
    let mut rows = match q.competition.as_deref() {
        Some(c) if !c.trim().is_empty() => state.store.by_competition(c),
        _ => state.store.all(),
    };

    match q.sort.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("date") => {}
        Some("score") => sort_by_score_desc(&mut rows),
        Some(other) => {
            return Err(ApiError::InvalidInput(format!(
                "sort must be 'date' or 'score', got '{other}'"
            )))
        }
    }
    Ok(Json(rows))
}

#[derive(Deserialize)]
struct TopQuery {
    #[serde(default)]
    limit: Option<usize>,
}

async fn top_matches(
    State(state): State<AppState>,
    Query(q): Query<TopQuery>,
) -> Json<Vec<StoredMatch>> {
    let n = q.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT);
    Json(state.store.top_rated(n))
}

async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<StoredMatch>, ApiError> {
    state
        .store
        .get(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("match {id} not found")))
}

async fn rate_match(
    payload: Result<Json<RawMatchInput>, JsonRejection>,
) -> Result<Json<RatingResult>, ApiError> {
    let Json(raw) = payload.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    let input = raw.validate()?;
    let rating = compute_rating(&input);
    counter!("ratings_computed_total").increment(1);
    tracing::debug!(
        score_line = %rating.match_summary.score_line,
        total_score = rating.total_score,
        "rated on demand"
    );
    Ok(Json(rating))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryOut {
    label: &'static str,
    min_score: u32,
}

#[derive(Serialize)]
struct LegendOut {
    label: &'static str,
    min: u32,
    max: u32,
}

#[derive(Serialize)]
struct LegendResp {
    /// Authoritative buckets used for `rating.category`.
    categories: Vec<CategoryOut>,
    /// Display-only legend.
    legend: Vec<LegendOut>,
}

async fn legend() -> Json<LegendResp> {
    let categories = Category::ALL
        .into_iter()
        .map(|c| CategoryOut {
            label: c.label(),
            min_score: c.min_score(),
        })
        .collect();
    let legend = LegendTier::ALL
        .into_iter()
        .map(|t| {
            let (min, max) = t.range();
            LegendOut {
                label: t.label(),
                min,
                max,
            }
        })
        .collect();
    Json(LegendResp { categories, legend })
}

async fn trigger_sync(State(state): State<AppState>) -> Result<Json<SyncReport>, ApiError> {
    let Some(source) = state.source.as_ref() else {
        return Err(SyncError::from(FetchError::NotConfigured(
            "no match source configured".into(),
        ))
        .into());
    };
    let report = ingest::sync_once(source.as_ref(), &state.store).await?;
    Ok(Json(report))
}
