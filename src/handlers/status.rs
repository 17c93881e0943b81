//! Status endpoints: full CRUD. New statuses belong to the caller; writes are owner-only.

use super::profile::parse_id;
use crate::error::AppError;
use crate::extractors::{CurrentUser, FieldMap, RawBody};
use crate::models::StatusFilter;
use crate::service::check_object;
use crate::service::serializers::{status_text, StatusOut};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct StatusListParams {
    pub username: Option<String>,
    pub city: Option<String>,
}

impl From<StatusListParams> for StatusFilter {
    /// Empty parameter values do not filter.
    fn from(p: StatusListParams) -> Self {
        StatusFilter {
            username: p.username.filter(|s| !s.is_empty()),
            city: p.city.filter(|s| !s.is_empty()),
        }
    }
}

pub async fn list(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<StatusListParams>,
) -> Result<Json<Vec<StatusOut>>, AppError> {
    let filter = StatusFilter::from(params);
    let statuses = state.store.list_statuses(&filter).await?;
    Ok(Json(statuses.into_iter().map(StatusOut::from).collect()))
}

pub async fn create(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    FieldMap(body): FieldMap,
) -> Result<(StatusCode, Json<StatusOut>), AppError> {
    let text = status_text(&body, false)?
        .ok_or_else(|| AppError::field("status", crate::service::validation::REQUIRED))?;
    let status = state.store.create_status(user.id, &text).await?;
    tracing::info!(status_id = status.id, user_id = user.id, "status created");
    Ok((StatusCode::CREATED, Json(StatusOut::from(status))))
}

pub async fn retrieve(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<Json<StatusOut>, AppError> {
    let id = parse_id(&id_str)?;
    let status = state
        .store
        .status(id)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str))?;
    Ok(Json(StatusOut::from(status)))
}

/// PUT and PATCH. A PATCH without `status` keeps the text and only bumps `updated_at`.
pub async fn update(
    CurrentUser(user): CurrentUser,
    method: Method,
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: RawBody,
) -> Result<Json<StatusOut>, AppError> {
    let id = parse_id(&id_str)?;
    let current = state
        .store
        .status(id)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str.clone()))?;
    check_object(&method, &user, &current)?;
    let body = body.fields().await?;

    let text = status_text(&body, method == Method::PATCH)?.unwrap_or(current.status);
    let updated = state
        .store
        .update_status(id, &text)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str))?;
    tracing::info!(status_id = id, user_id = user.id, "status updated");
    Ok(Json(StatusOut::from(updated)))
}

pub async fn destroy(
    CurrentUser(user): CurrentUser,
    method: Method,
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id_str)?;
    let current = state
        .store
        .status(id)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str.clone()))?;
    check_object(&method, &user, &current)?;

    if !state.store.delete_status(id).await? {
        return Err(AppError::NotFound(id_str));
    }
    tracing::info!(status_id = id, user_id = user.id, "status deleted");
    Ok(StatusCode::NO_CONTENT)
}
