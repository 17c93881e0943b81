//! Avatar upload for the caller's own profile. The target comes from the token, never from the path.

use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::media::ImageKind;
use crate::service::serializers::AvatarOut;
use crate::state::AppState;
use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{Method, StatusCode},
    Json,
};

const AVATAR_FIELD: &str = "avatar";

/// PUT or PATCH `/avatar/` with a multipart `avatar` file field.
pub async fn update(
    CurrentUser(user): CurrentUser,
    method: Method,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AvatarOut>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let profile = state
        .store
        .profile_for_user(user.id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("user {} has no profile", user.id)))?;

    let limit = state.settings.max_avatar_bytes;
    let mut upload: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() == Some(AVATAR_FIELD) {
            upload = Some(read_capped(field, limit).await?);
            break;
        }
    }

    let Some(bytes) = upload else {
        if method == Method::PATCH {
            return Ok(Json(AvatarOut::new(&profile, &state.media)));
        }
        return Err(AppError::field(AVATAR_FIELD, "No file was submitted."));
    };
    if bytes.is_empty() {
        return Err(AppError::field(AVATAR_FIELD, "The submitted file is empty."));
    }
    let (kind, bytes) = tokio::task::spawn_blocking(move || (ImageKind::decode(&bytes), bytes))
        .await
        .map_err(|e| AppError::Internal(format!("avatar decode task: {}", e)))?;
    let kind = kind.ok_or_else(|| {
        AppError::field(
            AVATAR_FIELD,
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
        )
    })?;

    let name = state.media.save_avatar(kind, &bytes).await?;
    let updated = match state.store.set_avatar(profile.id, Some(&name)).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            discard(&state, &name).await;
            return Err(AppError::NotFound(profile.id.to_string()));
        }
        Err(e) => {
            discard(&state, &name).await;
            return Err(e);
        }
    };
    if let Some(previous) = profile.avatar.as_deref() {
        discard(&state, previous).await;
    }
    tracing::info!(profile_id = profile.id, user_id = user.id, avatar = %name, "avatar updated");
    Ok(Json(AvatarOut::new(&updated, &state.media)))
}

/// Read one file field, failing as soon as it grows past `limit` bytes.
async fn read_capped(mut field: Field<'_>, limit: usize) -> Result<Vec<u8>, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
        if data.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge { limit });
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

fn multipart_error(e: MultipartError, limit: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit }
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Remove a media file whose record no longer points at it. Failures are only logged.
async fn discard(state: &AppState, name: &str) {
    if let Err(e) = state.media.delete(name).await {
        tracing::warn!(name = %name, error = %e, "failed to remove media file");
    }
}
