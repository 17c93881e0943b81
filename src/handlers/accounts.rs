//! Registration and token endpoints.

use crate::error::AppError;
use crate::extractors::{CurrentUser, FieldMap};
use crate::service::accounts;
use crate::service::serializers::{TokenOut, UserOut};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

pub async fn register(
    State(state): State<AppState>,
    FieldMap(body): FieldMap,
) -> Result<(StatusCode, Json<TokenOut>), AppError> {
    let (_user, key) = accounts::register(state.store.as_ref(), &body).await?;
    Ok((StatusCode::CREATED, Json(TokenOut { key })))
}

pub async fn login(State(state): State<AppState>, FieldMap(body): FieldMap) -> Result<Json<TokenOut>, AppError> {
    let key = accounts::login(state.store.as_ref(), &body).await?;
    Ok(Json(TokenOut { key }))
}

pub async fn logout(CurrentUser(user): CurrentUser, State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.store.delete_token(user.id).await?;
    tracing::info!(user_id = user.id, "token revoked");
    Ok(Json(json!({ "detail": "Successfully logged out." })))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserOut> {
    Json(UserOut::from(&user))
}
