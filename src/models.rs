//! Stored records. Serializers in `service::serializers` turn these into wire representations.

use chrono::{DateTime, Utc};

pub type UserId = i64;

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,
    pub user_id: UserId,
    /// Owner's username, joined in on read.
    pub username: String,
    pub bio: String,
    pub city: String,
    /// Path relative to the media root, e.g. `avatars/<uuid>.png`.
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct ProfileStatus {
    pub id: i64,
    pub user_id: UserId,
    /// Owner's username, joined in on read.
    pub username: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a user supplies at registration, already validated.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Bio/city change set. `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub bio: Option<String>,
    pub city: Option<String>,
}

/// Filters for listing statuses. Both present means both must match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusFilter {
    pub username: Option<String>,
    pub city: Option<String>,
}

/// Records whose writes are restricted to a single user.
pub trait Owned {
    fn owner_id(&self) -> UserId;
}

impl Owned for Profile {
    fn owner_id(&self) -> UserId {
        self.user_id
    }
}

impl Owned for ProfileStatus {
    fn owner_id(&self) -> UserId {
        self.user_id
    }
}
