//! API route handlers.
//!
//! Failures from the store are logged with their cause and reported to the
//! client as `500 {"error": "..."}` with a fixed short message.

use super::SharedState;
use crate::analysis::filter;
use crate::models::{
    CodeCatalogSummary, CodedResponse, DescriptiveCode, Participant, ParticipantSummary, Question,
    QuestionData, RawCodedResponse,
};
use crate::store::{queries, StoreError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Error body returned on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

fn internal_error(message: &str, err: StoreError) -> ApiError {
    error!("{}: {}", message, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Optional free-text search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// GET /status
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET /data/all
pub async fn all_responses(State(state): State<SharedState>) -> ApiResult<Vec<CodedResponse>> {
    queries::coded_responses(state.store.as_ref())
        .await
        .map(Json)
        .map_err(|e| internal_error("Failed to fetch data", e))
}

/// GET /data/by-question/:questionId - rows are returned unresolved
pub async fn responses_by_question(
    State(state): State<SharedState>,
    Path(question_id): Path<String>,
) -> ApiResult<Vec<RawCodedResponse>> {
    state
        .store
        .raw_responses_for_question(&question_id)
        .await
        .map(Json)
        .map_err(|e| internal_error("Failed to fetch data", e))
}

/// GET /data/by-participant/:participantId
pub async fn responses_by_participant(
    State(state): State<SharedState>,
    Path(participant_id): Path<String>,
) -> ApiResult<Vec<CodedResponse>> {
    queries::coded_responses_for_participant(state.store.as_ref(), &participant_id)
        .await
        .map(Json)
        .map_err(|e| internal_error("Failed to fetch responses", e))
}

/// GET /data/descriptive-codes?q=
pub async fn descriptive_codes(
    State(state): State<SharedState>,
    Query(search): Query<SearchQuery>,
) -> ApiResult<Vec<DescriptiveCode>> {
    let codes = state
        .store
        .descriptive_codes()
        .await
        .map_err(|e| internal_error("Failed to fetch descriptive codes", e))?;

    Ok(Json(filter::filter_descriptive_codes(codes, search.q.as_deref())))
}

/// GET /data/descriptive-codes/stats
pub async fn descriptive_code_stats(
    State(state): State<SharedState>,
) -> ApiResult<CodeCatalogSummary> {
    queries::code_catalog_summary(state.store.as_ref())
        .await
        .map(Json)
        .map_err(|e| internal_error("Failed to fetch descriptive codes", e))
}

/// GET /data/participants?q=
pub async fn participants(
    State(state): State<SharedState>,
    Query(search): Query<SearchQuery>,
) -> ApiResult<Vec<Participant>> {
    let participants = state
        .store
        .participants()
        .await
        .map_err(|e| internal_error("Failed to fetch participants", e))?;

    Ok(Json(filter::filter_participants(participants, search.q.as_deref())))
}

/// GET /data/participants/summary
pub async fn participant_summary(
    State(state): State<SharedState>,
) -> ApiResult<ParticipantSummary> {
    queries::participant_summary(state.store.as_ref())
        .await
        .map(Json)
        .map_err(|e| internal_error("Failed to fetch participants", e))
}

/// GET /data/questions
pub async fn questions(State(state): State<SharedState>) -> ApiResult<Vec<Question>> {
    state
        .store
        .questions()
        .await
        .map(Json)
        .map_err(|e| internal_error("Failed to fetch questions", e))
}

/// GET /data/question/:questionId - `null` when the id is unknown
pub async fn question(
    State(state): State<SharedState>,
    Path(question_id): Path<String>,
) -> ApiResult<Option<Question>> {
    state
        .store
        .question(&question_id)
        .await
        .map(Json)
        .map_err(|e| internal_error("Failed to fetch question", e))
}

/// GET /data/question-data
pub async fn question_data(State(state): State<SharedState>) -> ApiResult<Vec<QuestionData>> {
    queries::question_data(state.store.as_ref(), &state.options)
        .await
        .map(Json)
        .map_err(|e| internal_error("Failed to fetch question data", e))
}
