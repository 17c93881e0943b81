//! In-process store with the same semantics as the PostgreSQL backend. Data is lost on restart.

use super::{Store, USERNAME_TAKEN};
use crate::error::AppError;
use crate::models::{NewUser, Profile, ProfileChanges, ProfileStatus, StatusFilter, User, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Clone)]
struct ProfileRow {
    id: i64,
    user_id: UserId,
    bio: String,
    city: String,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone)]
struct StatusRow {
    id: i64,
    user_id: UserId,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    /// token key -> user id
    tokens: BTreeMap<String, UserId>,
    profiles: BTreeMap<i64, ProfileRow>,
    statuses: BTreeMap<i64, StatusRow>,
    next_user_id: i64,
    next_profile_id: i64,
    next_status_id: i64,
}

impl Tables {
    fn username(&self, user_id: UserId) -> String {
        self.users.get(&user_id).map(|u| u.username.clone()).unwrap_or_default()
    }

    fn profile(&self, row: &ProfileRow) -> Profile {
        Profile {
            id: row.id,
            user_id: row.user_id,
            username: self.username(row.user_id),
            bio: row.bio.clone(),
            city: row.city.clone(),
            avatar: row.avatar.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn status(&self, row: &StatusRow) -> ProfileStatus {
        ProfileStatus {
            id: row.id,
            user_id: row.user_id,
            username: self.username(row.user_id),
            status: row.status.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn city_of(&self, user_id: UserId) -> Option<&str> {
        self.profiles
            .values()
            .find(|p| p.user_id == user_id)
            .map(|p| p.city.as_str())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }

    async fn create_user(&self, new_user: NewUser, token_key: &str) -> Result<User, AppError> {
        let mut t = self.lock()?;
        if t.users.values().any(|u| u.username == new_user.username) {
            return Err(AppError::field("username", USERNAME_TAKEN));
        }
        let now = Utc::now();
        t.next_user_id += 1;
        let user = User {
            id: t.next_user_id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            date_joined: now,
        };
        t.users.insert(user.id, user.clone());
        t.next_profile_id += 1;
        let profile = ProfileRow {
            id: t.next_profile_id,
            user_id: user.id,
            bio: String::new(),
            city: String::new(),
            avatar: None,
            created_at: now,
            updated_at: now,
        };
        t.profiles.insert(profile.id, profile);
        t.tokens.insert(token_key.to_string(), user.id);
        Ok(user)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let t = self.lock()?;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn user_by_token(&self, key: &str) -> Result<Option<User>, AppError> {
        let t = self.lock()?;
        Ok(t.tokens.get(key).and_then(|id| t.users.get(id)).cloned())
    }

    async fn get_or_create_token(&self, user_id: UserId, new_key: &str) -> Result<String, AppError> {
        let mut t = self.lock()?;
        if let Some((key, _)) = t.tokens.iter().find(|(_, uid)| **uid == user_id) {
            return Ok(key.clone());
        }
        t.tokens.insert(new_key.to_string(), user_id);
        Ok(new_key.to_string())
    }

    async fn delete_token(&self, user_id: UserId) -> Result<(), AppError> {
        let mut t = self.lock()?;
        t.tokens.retain(|_, uid| *uid != user_id);
        Ok(())
    }

    async fn list_profiles(&self, search_terms: &[String]) -> Result<Vec<Profile>, AppError> {
        let t = self.lock()?;
        let terms: Vec<String> = search_terms.iter().map(|s| s.to_lowercase()).collect();
        Ok(t
            .profiles
            .values()
            .filter(|p| {
                let city = p.city.to_lowercase();
                terms.iter().all(|term| city.contains(term.as_str()))
            })
            .map(|p| t.profile(p))
            .collect())
    }

    async fn profile(&self, id: i64) -> Result<Option<Profile>, AppError> {
        let t = self.lock()?;
        Ok(t.profiles.get(&id).map(|p| t.profile(p)))
    }

    async fn profile_for_user(&self, user_id: UserId) -> Result<Option<Profile>, AppError> {
        let t = self.lock()?;
        Ok(t.profiles.values().find(|p| p.user_id == user_id).map(|p| t.profile(p)))
    }

    async fn update_profile(&self, id: i64, changes: &ProfileChanges) -> Result<Option<Profile>, AppError> {
        let mut t = self.lock()?;
        let Some(row) = t.profiles.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(bio) = &changes.bio {
            row.bio = bio.clone();
        }
        if let Some(city) = &changes.city {
            row.city = city.clone();
        }
        row.updated_at = Utc::now();
        let row = row.clone();
        Ok(Some(t.profile(&row)))
    }

    async fn set_avatar(&self, id: i64, avatar: Option<&str>) -> Result<Option<Profile>, AppError> {
        let mut t = self.lock()?;
        let Some(row) = t.profiles.get_mut(&id) else {
            return Ok(None);
        };
        row.avatar = avatar.map(str::to_string);
        row.updated_at = Utc::now();
        let row = row.clone();
        Ok(Some(t.profile(&row)))
    }

    async fn list_statuses(&self, filter: &StatusFilter) -> Result<Vec<ProfileStatus>, AppError> {
        let t = self.lock()?;
        Ok(t
            .statuses
            .values()
            .filter(|s| match &filter.username {
                Some(username) => t.username(s.user_id) == *username,
                None => true,
            })
            .filter(|s| match &filter.city {
                Some(city) => t.city_of(s.user_id) == Some(city.as_str()),
                None => true,
            })
            .map(|s| t.status(s))
            .collect())
    }

    async fn status(&self, id: i64) -> Result<Option<ProfileStatus>, AppError> {
        let t = self.lock()?;
        Ok(t.statuses.get(&id).map(|s| t.status(s)))
    }

    async fn create_status(&self, user_id: UserId, text: &str) -> Result<ProfileStatus, AppError> {
        let mut t = self.lock()?;
        if !t.users.contains_key(&user_id) {
            return Err(AppError::Internal(format!("status owner {} does not exist", user_id)));
        }
        let now = Utc::now();
        t.next_status_id += 1;
        let row = StatusRow {
            id: t.next_status_id,
            user_id,
            status: text.to_string(),
            created_at: now,
            updated_at: now,
        };
        t.statuses.insert(row.id, row.clone());
        Ok(t.status(&row))
    }

    async fn update_status(&self, id: i64, text: &str) -> Result<Option<ProfileStatus>, AppError> {
        let mut t = self.lock()?;
        let Some(row) = t.statuses.get_mut(&id) else {
            return Ok(None);
        };
        row.status = text.to_string();
        row.updated_at = Utc::now();
        let row = row.clone();
        Ok(Some(t.status(&row)))
    }

    async fn delete_status(&self, id: i64) -> Result<bool, AppError> {
        let mut t = self.lock()?;
        Ok(t.statuses.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.into(),
            email: String::new(),
            password_hash: "x".into(),
        }
    }

    #[tokio::test]
    async fn registration_creates_empty_profile_and_token() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("ann"), "k1").await.unwrap();
        let profile = store.profile_for_user(user.id).await.unwrap().unwrap();
        assert_eq!(profile.username, "ann");
        assert_eq!(profile.bio, "");
        assert_eq!(profile.city, "");
        assert_eq!(profile.avatar, None);
        assert_eq!(store.user_by_token("k1").await.unwrap().map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn duplicate_username_is_a_field_error() {
        let store = MemoryStore::new();
        store.create_user(new_user("ann"), "k1").await.unwrap();
        match store.create_user(new_user("ann"), "k2").await {
            Err(AppError::Validation(errors)) => assert!(errors.get("username").is_some()),
            other => panic!("unexpected: {:?}", other.map(|u| u.username)),
        }
    }

    #[tokio::test]
    async fn existing_token_is_reused() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("ann"), "k1").await.unwrap();
        assert_eq!(store.get_or_create_token(user.id, "k2").await.unwrap(), "k1");
        store.delete_token(user.id).await.unwrap();
        assert!(store.user_by_token("k1").await.unwrap().is_none());
        assert_eq!(store.get_or_create_token(user.id, "k2").await.unwrap(), "k2");
    }

    #[tokio::test]
    async fn profile_search_requires_every_term() {
        let store = MemoryStore::new();
        let a = store.create_user(new_user("a"), "ka").await.unwrap();
        let b = store.create_user(new_user("b"), "kb").await.unwrap();
        let pa = store.profile_for_user(a.id).await.unwrap().unwrap();
        let pb = store.profile_for_user(b.id).await.unwrap().unwrap();
        let set_city = |c: &str| ProfileChanges { bio: None, city: Some(c.into()) };
        store.update_profile(pa.id, &set_city("New York")).await.unwrap();
        store.update_profile(pb.id, &set_city("York")).await.unwrap();

        let hits = store.list_profiles(&["york".into()]).await.unwrap();
        assert_eq!(hits.len(), 2);
        let hits = store.list_profiles(&["NEW".into(), "york".into()]).await.unwrap();
        assert_eq!(hits.iter().map(|p| p.username.as_str()).collect::<Vec<_>>(), vec!["a"]);
    }
}
