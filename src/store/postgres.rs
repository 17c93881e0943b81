//! PostgreSQL backend: table DDL, database bootstrap and the `Store` implementation.

use super::{Store, USERNAME_TAKEN};
use crate::error::AppError;
use crate::models::{NewUser, Profile, ProfileChanges, ProfileStatus, StatusFilter, User, UserId};
use crate::sql::{self, bind_all_as, quoted, AUTH_TOKENS, PROFILES, PROFILE_STATUSES, USERS};
use async_trait::async_trait;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

/// Create the service tables if they do not exist. Users own everything else via ON DELETE CASCADE.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), AppError> {
    let users_ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id BIGSERIAL PRIMARY KEY,
            username VARCHAR(150) NOT NULL UNIQUE,
            email TEXT NOT NULL DEFAULT '',
            password_hash TEXT NOT NULL,
            date_joined TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        quoted(USERS)
    );
    sqlx::query(&users_ddl).execute(pool).await?;

    let tokens_ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            key VARCHAR(40) PRIMARY KEY,
            user_id BIGINT NOT NULL UNIQUE REFERENCES {}(id) ON DELETE CASCADE,
            created TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        quoted(AUTH_TOKENS),
        quoted(USERS)
    );
    sqlx::query(&tokens_ddl).execute(pool).await?;

    let profiles_ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL UNIQUE REFERENCES {}(id) ON DELETE CASCADE,
            bio VARCHAR(240) NOT NULL DEFAULT '',
            city VARCHAR(30) NOT NULL DEFAULT '',
            avatar TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        quoted(PROFILES),
        quoted(USERS)
    );
    sqlx::query(&profiles_ddl).execute(pool).await?;

    let statuses_ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES {}(id) ON DELETE CASCADE,
            status VARCHAR(240) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        quoted(PROFILE_STATUSES),
        quoted(USERS)
    );
    sqlx::query(&statuses_ddl).execute(pool).await?;
    let status_index = format!(
        "CREATE INDEX IF NOT EXISTS profile_statuses_user_id_idx ON {} (user_id)",
        quoted(PROFILE_STATUSES)
    );
    sqlx::query(&status_index).execute(pool).await?;

    Ok(())
}

/// Connect to the server's `postgres` database and create the target database when missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::Internal(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await.map_err(AppError::Db)?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await
        .map_err(AppError::Db)?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await
            .map_err(AppError::Db)?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::Internal("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres", base);
    Ok((admin_url, db_name.to_string()))
}

fn username_taken(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::field("username", USERNAME_TAKEN),
        _ => AppError::Db(e),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser, token_key: &str) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;
        let insert_user = format!(
            "INSERT INTO {} (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, username, email, password_hash, date_joined",
            quoted(USERS)
        );
        let user = sqlx::query_as::<_, User>(&insert_user)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(username_taken)?;
        sqlx::query(&format!("INSERT INTO {} (user_id) VALUES ($1)", quoted(PROFILES)))
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("INSERT INTO {} (key, user_id) VALUES ($1, $2)", quoted(AUTH_TOKENS)))
            .bind(token_key)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT id, username, email, password_hash, date_joined FROM {} WHERE username = $1",
            quoted(USERS)
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_by_token(&self, key: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT u.id, u.username, u.email, u.password_hash, u.date_joined \
             FROM {} t JOIN {} u ON u.id = t.user_id WHERE t.key = $1",
            quoted(AUTH_TOKENS),
            quoted(USERS)
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_or_create_token(&self, user_id: UserId, new_key: &str) -> Result<String, AppError> {
        let insert = format!(
            "INSERT INTO {} (key, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING",
            quoted(AUTH_TOKENS)
        );
        sqlx::query(&insert)
            .bind(new_key)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        let (key,): (String,) = sqlx::query_as(&format!("SELECT key FROM {} WHERE user_id = $1", quoted(AUTH_TOKENS)))
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(key)
    }

    async fn delete_token(&self, user_id: UserId) -> Result<(), AppError> {
        sqlx::query(&format!("DELETE FROM {} WHERE user_id = $1", quoted(AUTH_TOKENS)))
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_profiles(&self, search_terms: &[String]) -> Result<Vec<Profile>, AppError> {
        let q = sql::select_profiles(search_terms);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let query = bind_all_as(sqlx::query_as::<_, Profile>(&q.sql), &q.params);
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn profile(&self, id: i64) -> Result<Option<Profile>, AppError> {
        Ok(sqlx::query_as::<_, Profile>(&sql::select_profile_by("id"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn profile_for_user(&self, user_id: UserId) -> Result<Option<Profile>, AppError> {
        Ok(sqlx::query_as::<_, Profile>(&sql::select_profile_by("user_id"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_profile(&self, id: i64, changes: &ProfileChanges) -> Result<Option<Profile>, AppError> {
        let q = sql::update_profile(id, changes);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let query = bind_all_as(sqlx::query_as::<_, Profile>(&q.sql), &q.params);
        Ok(query.fetch_optional(&self.pool).await?)
    }

    async fn set_avatar(&self, id: i64, avatar: Option<&str>) -> Result<Option<Profile>, AppError> {
        Ok(sqlx::query_as::<_, Profile>(&sql::update_avatar())
            .bind(id)
            .bind(avatar)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_statuses(&self, filter: &StatusFilter) -> Result<Vec<ProfileStatus>, AppError> {
        let q = sql::select_statuses(filter);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let query = bind_all_as(sqlx::query_as::<_, ProfileStatus>(&q.sql), &q.params);
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn status(&self, id: i64) -> Result<Option<ProfileStatus>, AppError> {
        Ok(sqlx::query_as::<_, ProfileStatus>(&sql::select_status_by_id())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_status(&self, user_id: UserId, text: &str) -> Result<ProfileStatus, AppError> {
        Ok(sqlx::query_as::<_, ProfileStatus>(&sql::insert_status())
            .bind(user_id)
            .bind(text)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_status(&self, id: i64, text: &str) -> Result<Option<ProfileStatus>, AppError> {
        Ok(sqlx::query_as::<_, ProfileStatus>(&sql::update_status())
            .bind(id)
            .bind(text)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_status(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", quoted(PROFILE_STATUSES)))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
