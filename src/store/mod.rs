//! Persistence seam. `PgStore` is the production backend; `MemoryStore` serves tests and local runs.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, ensure_tables, PgStore};

use crate::error::AppError;
use crate::models::{NewUser, Profile, ProfileChanges, ProfileStatus, StatusFilter, User, UserId};
use async_trait::async_trait;

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap connectivity check for readiness checks.
    async fn ping(&self) -> Result<(), AppError>;

    /// Create a user, an empty profile for them and their token in one unit.
    /// A taken username is reported as a validation error on `username`.
    async fn create_user(&self, new_user: NewUser, token_key: &str) -> Result<User, AppError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn user_by_token(&self, key: &str) -> Result<Option<User>, AppError>;

    /// Return the user's token, storing `new_key` first when they have none.
    async fn get_or_create_token(&self, user_id: UserId, new_key: &str) -> Result<String, AppError>;

    async fn delete_token(&self, user_id: UserId) -> Result<(), AppError>;

    /// All profiles ordered by id; each search term must occur in `city`, ignoring case.
    async fn list_profiles(&self, search_terms: &[String]) -> Result<Vec<Profile>, AppError>;

    async fn profile(&self, id: i64) -> Result<Option<Profile>, AppError>;

    async fn profile_for_user(&self, user_id: UserId) -> Result<Option<Profile>, AppError>;

    async fn update_profile(&self, id: i64, changes: &ProfileChanges) -> Result<Option<Profile>, AppError>;

    async fn set_avatar(&self, id: i64, avatar: Option<&str>) -> Result<Option<Profile>, AppError>;

    /// Statuses ordered by id, narrowed by every filter that is set.
    async fn list_statuses(&self, filter: &StatusFilter) -> Result<Vec<ProfileStatus>, AppError>;

    async fn status(&self, id: i64) -> Result<Option<ProfileStatus>, AppError>;

    async fn create_status(&self, user_id: UserId, text: &str) -> Result<ProfileStatus, AppError>;

    async fn update_status(&self, id: i64, text: &str) -> Result<Option<ProfileStatus>, AppError>;

    /// Returns false when no such status existed.
    async fn delete_status(&self, id: i64) -> Result<bool, AppError>;
}

pub(crate) const USERNAME_TAKEN: &str = "A user with that username already exists.";
