//! Access log CRUD endpoints
//!
//! Create and delete fire the audit trail after the mutation commits;
//! updates do not. The audit write happens before the response is sent, but
//! its failure never affects the response.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::{
    db::AccessLogRepository,
    models::{AccessLog, AccessLogFilter, CreateAccessLogRequest, UpdateAccessLogRequest},
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    let collection = get(list_access_logs).post(create_access_log);
    let detail = get(get_access_log)
        .put(update_access_log)
        .patch(partial_update_access_log)
        .delete(delete_access_log);

    // Full paths are registered here (rather than nesting under "/logs")
    // because axum's `nest` cannot match the trailing-slash form of the
    // nest prefix itself. Both bare and trailing-slash forms are served.
    Router::new()
        .route("/logs", collection.clone())
        .route("/logs/", collection)
        .route("/logs/{id}", detail.clone())
        .route("/logs/{id}/", detail)
}

async fn list_access_logs(
    State(state): State<AppState>,
    Query(filter): Query<AccessLogFilter>,
) -> Result<Json<Vec<AccessLog>>, AppError> {
    let repo = AccessLogRepository::new(&state.db);
    let logs = repo.list(&filter).await.map_err(|e| {
        tracing::error!("Failed to list access logs: {}", e);
        AppError::internal("Failed to list access logs")
    })?;

    Ok(Json(logs))
}

async fn create_access_log(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<AccessLog>), AppError> {
    let payload: CreateAccessLogRequest = decode(body)?;
    let new = payload.validate().map_err(AppError::Validation)?;

    let repo = AccessLogRepository::new(&state.db);
    let log = repo.insert(&new).await.map_err(|e| {
        tracing::error!("Failed to create access log: {}", e);
        AppError::internal("Failed to create access log")
    })?;

    state.audit.record_created(&log).await;

    Ok((StatusCode::CREATED, Json(log)))
}

async fn get_access_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AccessLog>, AppError> {
    let repo = AccessLogRepository::new(&state.db);
    let log = repo.get_by_id(id).await.map_err(|e| {
        tracing::error!("Failed to fetch access log {}: {}", id, e);
        AppError::internal("Failed to fetch access log")
    })?;

    match log {
        Some(log) => Ok(Json(log)),
        None => Err(AppError::not_found("Access log not found")),
    }
}

async fn update_access_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<AccessLog>, AppError> {
    apply_update(&state, id, decode(body)?, false).await
}

async fn partial_update_access_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<AccessLog>, AppError> {
    apply_update(&state, id, decode(body)?, true).await
}

/// Decode a JSON body into a request type, mapping type errors to 400
/// rather than the extractor's default 422
fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::bad_request(format!("Invalid request body: {}", e)))
}

async fn apply_update(
    state: &AppState,
    id: i64,
    payload: UpdateAccessLogRequest,
    partial: bool,
) -> Result<Json<AccessLog>, AppError> {
    let changes = payload.validate(partial).map_err(AppError::Validation)?;

    let repo = AccessLogRepository::new(&state.db);
    let updated = repo.update(id, &changes).await.map_err(|e| {
        tracing::error!("Failed to update access log {}: {}", id, e);
        AppError::internal("Failed to update access log")
    })?;

    match updated {
        Some(log) => Ok(Json(log)),
        None => Err(AppError::not_found("Access log not found")),
    }
}

async fn delete_access_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let repo = AccessLogRepository::new(&state.db);

    // Capture card_id before the row disappears; the audit line needs it
    let existing = repo
        .get_by_id(id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch access log {}: {}", id, e);
            AppError::internal("Failed to delete access log")
        })?
        .ok_or_else(|| AppError::not_found("Access log not found"))?;

    let deleted = repo.delete(id).await.map_err(|e| {
        tracing::error!("Failed to delete access log {}: {}", id, e);
        AppError::internal("Failed to delete access log")
    })?;

    if !deleted {
        return Err(AppError::not_found("Access log not found"));
    }

    state.audit.record_deleted(existing.id, &existing.card_id).await;

    Ok(StatusCode::NO_CONTENT)
}
