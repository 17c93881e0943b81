//! Wire representations and inbound field parsing for profiles, statuses and avatars.

use crate::error::{AppError, FieldErrors};
use crate::media::MediaStorage;
use crate::models::{Profile, ProfileChanges, ProfileStatus, User};
use crate::service::validation::{text_field, TextRule};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

pub const BIO: TextRule = TextRule::optional(240);
pub const CITY: TextRule = TextRule::optional(30);
pub const STATUS: TextRule = TextRule::required(240);

#[derive(Debug, Serialize)]
pub struct ProfileOut {
    pub id: i64,
    /// Owner's username.
    pub user: String,
    pub bio: String,
    pub city: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileOut {
    pub fn new(profile: Profile, media: &MediaStorage) -> Self {
        ProfileOut {
            id: profile.id,
            user: profile.username,
            bio: profile.bio,
            city: profile.city,
            avatar: profile.avatar.as_deref().map(|name| media.url(name)),
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvatarOut {
    pub avatar: Option<String>,
}

impl AvatarOut {
    pub fn new(profile: &Profile, media: &MediaStorage) -> Self {
        AvatarOut {
            avatar: profile.avatar.as_deref().map(|name| media.url(name)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusOut {
    pub id: i64,
    /// Owner's username.
    pub profile: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileStatus> for StatusOut {
    fn from(s: ProfileStatus) -> Self {
        StatusOut {
            id: s.id,
            profile: s.username,
            status: s.status,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserOut {
    fn from(u: &User) -> Self {
        UserOut {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenOut {
    pub key: String,
}

/// Bio/city changes from a PUT (`partial == false`) or PATCH body. Other keys are ignored.
pub fn profile_changes(body: &HashMap<String, Value>, partial: bool) -> Result<ProfileChanges, AppError> {
    let mut errors = FieldErrors::new();
    let bio = text_field(body, "bio", BIO, partial, &mut errors);
    let city = text_field(body, "city", CITY, partial, &mut errors);
    errors.into_result()?;
    Ok(ProfileChanges { bio, city })
}

/// Status text from a create/PUT body, or `None` from a PATCH body that omits it.
pub fn status_text(body: &HashMap<String, Value>, partial: bool) -> Result<Option<String>, AppError> {
    let mut errors = FieldErrors::new();
    let status = text_field(body, "status", STATUS, partial, &mut errors);
    errors.into_result()?;
    Ok(status)
}
