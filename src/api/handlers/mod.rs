use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::TrackerError;
use crate::export;
use crate::forms::*;
use crate::import;
use crate::models::*;
use crate::progress::{self, ResolveStats};
use crate::today;
use crate::views::*;

type ApiError = (StatusCode, String);

const DEFAULT_SESSION_PAGE: usize = 50;

// ============================================================
// Error Handling
// ============================================================

/// Map a store or import failure to a response.
///
/// Failures the user caused carry a [`TrackerError`] and are answered with
/// its message. Anything else is logged server-side and the client only sees
/// a generic message.
fn internal_error(e: anyhow::Error) -> ApiError {
    if let Some(err) = e.downcast_ref::<TrackerError>() {
        return rejected(err.clone());
    }

    tracing::error!("Internal error: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn rejected(err: TrackerError) -> ApiError {
    let status = match err {
        TrackerError::Invalid(_) => StatusCode::BAD_REQUEST,
        TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
        TrackerError::Conflict(_) => StatusCode::CONFLICT,
    };
    tracing::warn!("Request rejected: {}", err);
    (status, err.to_string())
}

fn not_found(what: &'static str) -> ApiError {
    (StatusCode::NOT_FOUND, TrackerError::NotFound(what).to_string())
}

/// Count returned by the import endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct Imported {
    pub imported: usize,
}

// ============================================================
// Health & statistics
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn dashboard(State(db): State<Database>) -> Result<Json<Dashboard>, ApiError> {
    Dashboard::load(&db, today()).map(Json).map_err(internal_error)
}

pub async fn stats(State(db): State<Database>) -> Result<Json<DailySeries>, ApiError> {
    DailySeries::load(&db, today()).map(Json).map_err(internal_error)
}

// ============================================================
// Topics
// ============================================================

pub async fn list_topics(State(db): State<Database>) -> Result<Json<Vec<TopicRow>>, ApiError> {
    topic_table(&db).map(Json).map_err(internal_error)
}

pub async fn create_topic(
    State(db): State<Database>,
    Json(form): Json<TopicForm>,
) -> Result<(StatusCode, Json<Topic>), ApiError> {
    let input = form.into_new().map_err(rejected)?;
    db.create_topic(input)
        .map(|t| (StatusCode::CREATED, Json(t)))
        .map_err(internal_error)
}

pub async fn delete_topic(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if db.delete_topic(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Topic"))
    }
}

// ============================================================
// Problems
// ============================================================

pub async fn problems_overview(
    State(db): State<Database>,
) -> Result<Json<ProblemsOverview>, ApiError> {
    ProblemsOverview::load(&db, today())
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_problem(
    State(db): State<Database>,
    Json(form): Json<ProblemForm>,
) -> Result<(StatusCode, Json<Problem>), ApiError> {
    let input = form.into_new(today()).map_err(rejected)?;
    db.create_problem(input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(internal_error)
}

pub async fn get_problem(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<Problem>, ApiError> {
    db.get_problem(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Problem"))
}

pub async fn update_problem(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(form): Json<ProblemForm>,
) -> Result<Json<Problem>, ApiError> {
    db.update_problem(id, form.into_edit())
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Problem"))
}

pub async fn delete_problem(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if db.delete_problem(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Problem"))
    }
}

pub async fn update_review(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(form): Json<ReviewForm>,
) -> Result<Json<Problem>, ApiError> {
    let update = form.into_update().map_err(rejected)?;
    db.update_review(id, update)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Problem"))
}

/// Attempts of one problem, most recent first, with derived statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProblemResolves {
    pub problem_id: i64,
    pub attempts: Vec<ResolveAttempt>,
    pub stats: ResolveStats,
}

pub async fn list_problem_resolves(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<ProblemResolves>, ApiError> {
    db.get_problem(id)
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Problem"))?;

    let mut attempts = db.list_attempts(id).map_err(internal_error)?;
    let stats = ResolveStats::from_attempts(&attempts);
    progress::sort_descending(&mut attempts);
    Ok(Json(ProblemResolves {
        problem_id: id,
        attempts,
        stats,
    }))
}

// ============================================================
// Resolve attempts
// ============================================================

pub async fn create_resolve(
    State(db): State<Database>,
    Json(form): Json<ResolveForm>,
) -> Result<(StatusCode, Json<ResolveAttempt>), ApiError> {
    let input = form.into_new(today()).map_err(rejected)?;
    db.create_attempt(input)
        .map(|a| (StatusCode::CREATED, Json(a)))
        .map_err(internal_error)
}

pub async fn update_outcome(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(form): Json<OutcomeForm>,
) -> Result<Json<ResolveAttempt>, ApiError> {
    let update = form.into_update().map_err(rejected)?;
    db.update_attempt_outcome(id, update)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Resolve attempt"))
}

#[derive(Debug, Deserialize)]
pub struct ReviewsQuery {
    /// Problem to focus the board on.
    pub problem_id: Option<i64>,
}

pub async fn reviews_board(
    State(db): State<Database>,
    Query(query): Query<ReviewsQuery>,
) -> Result<Json<ReviewsBoard>, ApiError> {
    ReviewsBoard::load(&db, query.problem_id)
        .map(Json)
        .map_err(internal_error)
}

// ============================================================
// Sessions
// ============================================================

#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    /// Defaults to 50.
    pub limit: Option<usize>,
}

pub async fn list_sessions(
    State(db): State<Database>,
    Query(query): Query<SessionsQuery>,
) -> Result<Json<Vec<SessionDetail>>, ApiError> {
    db.get_session_details(Some(query.limit.unwrap_or(DEFAULT_SESSION_PAGE)))
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_session(
    State(db): State<Database>,
    Json(form): Json<SessionForm>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    db.create_session(form.into_new(today()))
        .map(|s| (StatusCode::CREATED, Json(s)))
        .map_err(internal_error)
}

pub async fn delete_session(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if db.delete_session(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Session"))
    }
}

pub async fn bulk_sessions(
    State(db): State<Database>,
    Json(form): Json<BulkForm>,
) -> Result<Json<Imported>, ApiError> {
    db.import_session_lines(&form.bulk, today())
        .map(|imported| Json(Imported { imported }))
        .map_err(internal_error)
}

pub async fn export_sessions(State(db): State<Database>) -> Result<impl IntoResponse, ApiError> {
    let body = export::sessions_csv(&db).map_err(internal_error)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"dsa_sessions.csv\"",
            ),
        ],
        body,
    ))
}

// ============================================================
// Spreadsheet import
// ============================================================

/// Import a workbook sent as the raw request body.
pub async fn import_workbook(
    State(db): State<Database>,
    body: Bytes,
) -> Result<Json<Imported>, ApiError> {
    if body.is_empty() {
        return Err(rejected(TrackerError::invalid("No file uploaded")));
    }

    let sheets = import::read_workbook_bytes(body.to_vec()).map_err(|e| {
        tracing::warn!("Unreadable workbook: {:#}", e);
        rejected(TrackerError::invalid("Could not read workbook"))
    })?;

    db.import_sheets(&sheets)
        .map(|imported| Json(Imported { imported }))
        .map_err(internal_error)
}
