//! Market endpoints: sourcing requests, worker callbacks and the read side.
//!
//! Mounted under both `/market` and `/api/market`.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sourcing_core::{AnalysisSubmission, RankingEntry};
use sourcing_db::AnalysisRow;

use crate::middleware::RequestId;

use super::{json_body, map_service_error, normalize_limit, ApiError, ApiResponse, AppState};

/// Client-facing routes under `prefix`; these share the rate limit.
pub(super) fn read_routes(prefix: &str) -> Router<AppState> {
    Router::new()
        .route(&format!("{prefix}/list"), get(list_analyses))
        .route(&format!("{prefix}/sourcing/request"), post(request_sourcing))
        .route(&format!("{prefix}/ranking"), get(get_ranking))
        .route(
            &format!("{prefix}/ranking/category"),
            get(get_ranking_by_category),
        )
}

/// Worker callback routes under `prefix`; exempt from the rate limit.
pub(super) fn callback_routes(prefix: &str) -> Router<AppState> {
    Router::new()
        .route(&format!("{prefix}/analysis"), post(receive_analysis))
        .route(&format!("{prefix}/ranking/receive"), post(receive_ranking))
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct SourcingRequestQuery {
    pub keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CategoryQuery {
    #[serde(rename = "categoryLabel")]
    pub category_label: Option<String>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Analysis record as exposed to dashboard clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnalysisItem {
    pub id: i64,
    pub search_keyword: String,
    pub category: Option<String>,
    pub average_price: i32,
    pub lowest_price: i32,
    pub sample_count: i32,
    pub top_item_name: Option<String>,
    pub total_listings: i32,
    pub competition_level: Option<String>,
    pub search_volume_ratio: i32,
    pub market_attractiveness: Option<String>,
    pub sourcing_score: i32,
    pub analysis_date: DateTime<Utc>,
}

impl From<AnalysisRow> for AnalysisItem {
    fn from(row: AnalysisRow) -> Self {
        Self {
            id: row.id,
            search_keyword: row.search_keyword,
            category: row.category,
            average_price: row.average_price,
            lowest_price: row.lowest_price,
            sample_count: row.sample_count,
            top_item_name: row.top_item_name,
            total_listings: row.total_listings,
            competition_level: row.competition_level,
            search_volume_ratio: row.search_volume_ratio,
            market_attractiveness: row.market_attractiveness,
            sourcing_score: row.sourcing_score,
            analysis_date: row.analysis_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CreatedAnalysis {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct SavedRanking {
    pub saved: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub(super) async fn list_analyses(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<AnalysisItem>>>, ApiError> {
    let rows = state
        .services
        .analyses
        .find_all_analysis(normalize_limit(params.limit))
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    let items = rows.into_iter().map(AnalysisItem::from).collect();
    Ok(Json(ApiResponse::new(req_id.0, items)))
}

/// Accepts a keyword for asynchronous analysis. The worker's result arrives
/// later through the callback routes; nothing is returned here.
pub(super) async fn request_sourcing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SourcingRequestQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .orchestrator
        .request_sourcing(params.keyword.as_deref())
        .await
        .map_err(|e| map_service_error(req_id.0, &e))?;

    Ok(StatusCode::ACCEPTED)
}

pub(super) async fn receive_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<AnalysisSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedAnalysis>>), ApiError> {
    let submission = json_body(&req_id.0, payload)?;

    let row = state
        .services
        .ingestion
        .ingest_analysis(submission)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(req_id.0, CreatedAnalysis { id: row.id })),
    ))
}

pub(super) async fn receive_ranking(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<Option<Vec<RankingEntry>>>, JsonRejection>,
) -> Result<Json<ApiResponse<SavedRanking>>, ApiError> {
    let batch = json_body(&req_id.0, payload)?;

    let saved = state
        .services
        .ingestion
        .ingest_ranking(batch)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, SavedRanking { saved })))
}

pub(super) async fn get_ranking(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<RankingEntry>>>, ApiError> {
    let entries = state
        .services
        .ranking
        .get_ranking()
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, entries)))
}

pub(super) async fn get_ranking_by_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<CategoryQuery>,
) -> Result<Json<ApiResponse<Vec<RankingEntry>>>, ApiError> {
    let entries = state
        .services
        .ranking
        .get_ranking_by_category(params.category_label.as_deref())
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, entries)))
}
