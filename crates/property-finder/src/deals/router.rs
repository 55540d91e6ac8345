use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::ZipCode;
use super::listing::{DealListing, DealQuery, SortKey, DEFAULT_LISTING_LIMIT};
use super::scoring::ScenarioId;
use super::service::{DealScoringService, DealServiceError};
use super::store::{ObservationSource, ScoreStore};

/// Router exposing batch scoring and the ranked deal listing.
pub fn deal_router<O, S>(service: Arc<DealScoringService<O, S>>) -> Router
where
    O: ObservationSource + 'static,
    S: ScoreStore + 'static,
{
    Router::new()
        .route("/api/v1/deals", get(list_handler::<O, S>))
        .route("/api/v1/deals/score", post(score_handler::<O, S>))
        .route("/api/v1/deals/:zip_code", get(detail_handler::<O, S>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ScoreRunRequest {
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    #[serde(default)]
    pub scenarios: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DealListParams {
    pub scenario: Option<String>,
    pub min_score: Option<u8>,
    pub sort_by: Option<String>,
    pub limit: Option<usize>,
}

impl DealListParams {
    fn into_query(self) -> DealQuery {
        DealQuery {
            scenario: self.scenario.as_deref().map(ScenarioId::new),
            min_score: self.min_score,
            sort_by: self
                .sort_by
                .as_deref()
                .map(SortKey::parse)
                .unwrap_or_default(),
            limit: self.limit.unwrap_or(DEFAULT_LISTING_LIMIT),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DealListResponse {
    pub deals: Vec<DealListing>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ScenarioId>,
}

pub(crate) async fn score_handler<O, S>(
    State(service): State<Arc<DealScoringService<O, S>>>,
    axum::Json(request): axum::Json<ScoreRunRequest>,
) -> Response
where
    O: ObservationSource + 'static,
    S: ScoreStore + 'static,
{
    let as_of = request
        .as_of
        .unwrap_or_else(|| Local::now().date_naive());

    match service.run_batch(as_of, request.scenarios.as_deref()) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<O, S>(
    State(service): State<Arc<DealScoringService<O, S>>>,
    Query(params): Query<DealListParams>,
) -> Response
where
    O: ObservationSource + 'static,
    S: ScoreStore + 'static,
{
    let query = params.into_query();
    match service.deals(&query) {
        Ok(deals) => {
            let body = DealListResponse {
                total: deals.len(),
                deals,
                scenario: query.scenario,
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn detail_handler<O, S>(
    State(service): State<Arc<DealScoringService<O, S>>>,
    Path(zip_code): Path<String>,
) -> Response
where
    O: ObservationSource + 'static,
    S: ScoreStore + 'static,
{
    let zip_code = match ZipCode::parse(&zip_code) {
        Ok(zip_code) => zip_code,
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    match service.deal(&zip_code) {
        Ok(Some(listing)) => (StatusCode::OK, axum::Json(listing)).into_response(),
        Ok(None) => {
            let payload = json!({
                "zip_code": zip_code,
                "error": "zip code has not been scored",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: DealServiceError) -> Response {
    let status = match err {
        DealServiceError::Scoring(_) | DealServiceError::NoValidScenarios { .. } => {
            StatusCode::BAD_REQUEST
        }
        DealServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
