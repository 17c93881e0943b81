//! Profile endpoints: list (with city search), retrieve, update. Profiles are created with their user.

use crate::error::AppError;
use crate::extractors::{CurrentUser, RawBody};
use crate::service::check_object;
use crate::service::serializers::{profile_changes, ProfileOut};
use crate::sql::search_terms;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::Method,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ProfileListParams {
    pub search: Option<String>,
}

/// Record ids in the path. Anything that is not an integer cannot name a record.
pub(crate) fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::NotFound(id_str.to_string()))
}

pub async fn list(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ProfileListParams>,
) -> Result<Json<Vec<ProfileOut>>, AppError> {
    let terms = params.search.as_deref().map(search_terms).unwrap_or_default();
    let profiles = state.store.list_profiles(&terms).await?;
    Ok(Json(
        profiles
            .into_iter()
            .map(|p| ProfileOut::new(p, &state.media))
            .collect(),
    ))
}

pub async fn retrieve(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<Json<ProfileOut>, AppError> {
    let id = parse_id(&id_str)?;
    let profile = state
        .store
        .profile(id)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str))?;
    Ok(Json(ProfileOut::new(profile, &state.media)))
}

/// PUT and PATCH. Only the owner may write; the check runs before the body is validated.
pub async fn update(
    CurrentUser(user): CurrentUser,
    method: Method,
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: RawBody,
) -> Result<Json<ProfileOut>, AppError> {
    let id = parse_id(&id_str)?;
    let profile = state
        .store
        .profile(id)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str.clone()))?;
    check_object(&method, &user, &profile)?;
    let body = body.fields().await?;

    let changes = profile_changes(&body, method == Method::PATCH)?;
    let updated = state
        .store
        .update_profile(id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str))?;
    tracing::info!(profile_id = id, user_id = user.id, "profile updated");
    Ok(Json(ProfileOut::new(updated, &state.media)))
}
