//! Builds the parameterized SELECT/UPDATE statements whose shape depends on request input.

use super::params::SqlParam;
use crate::models::{ProfileChanges, StatusFilter};

pub const USERS: &str = "users";
pub const AUTH_TOKENS: &str = "auth_tokens";
pub const PROFILES: &str = "profiles";
pub const PROFILE_STATUSES: &str = "profile_statuses";

/// Quote identifier for PostgreSQL (identifiers are constants in this module).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: SqlParam) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

/// Profile columns (aliased `p`) plus the owner's username (aliased `u`).
fn profile_columns() -> &'static str {
    "p.id, p.user_id, u.username, p.bio, p.city, p.avatar, p.created_at, p.updated_at"
}

/// Status columns (aliased `s`) plus the owner's username (aliased `u`).
fn status_columns() -> &'static str {
    "s.id, s.user_id, u.username, s.status, s.created_at, s.updated_at"
}

/// Escape `%`, `_` and `\` so the term matches literally inside ILIKE.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Split a search string into terms on whitespace and commas, dropping empties.
pub fn search_terms(search: &str) -> Vec<String> {
    search
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// SELECT profiles; every search term must appear in `city` (case-insensitive). ORDER BY id.
pub fn select_profiles(terms: &[String]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for term in terms {
        let n = q.push_param(SqlParam::Text(format!("%{}%", escape_like(term))));
        where_parts.push(format!("p.{} ILIKE ${}", quoted("city"), n));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    q.sql = format!(
        "SELECT {} FROM {} p JOIN {} u ON u.id = p.user_id{} ORDER BY p.id",
        profile_columns(),
        quoted(PROFILES),
        quoted(USERS),
        where_clause
    );
    q
}

/// SELECT one profile by the given key column (`id` or `user_id`). Caller binds the key as `$1`.
pub fn select_profile_by(column: &str) -> String {
    format!(
        "SELECT {} FROM {} p JOIN {} u ON u.id = p.user_id WHERE p.{} = $1",
        profile_columns(),
        quoted(PROFILES),
        quoted(USERS),
        quoted(column)
    )
}

/// UPDATE profile by id: SET only the fields present in `changes`, always bumping `updated_at`.
/// Returns the joined row so the owner's username comes back with it.
pub fn update_profile(id: i64, changes: &ProfileChanges) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    if let Some(bio) = &changes.bio {
        let n = q.push_param(SqlParam::Text(bio.clone()));
        sets.push(format!("{} = ${}", quoted("bio"), n));
    }
    if let Some(city) = &changes.city {
        let n = q.push_param(SqlParam::Text(city.clone()));
        sets.push(format!("{} = ${}", quoted("city"), n));
    }
    sets.push(format!("{} = NOW()", quoted("updated_at")));
    let id_param = q.push_param(SqlParam::BigInt(id));
    q.sql = format!(
        "WITH p AS (UPDATE {} SET {} WHERE {} = ${} RETURNING *) \
         SELECT {} FROM p JOIN {} u ON u.id = p.user_id",
        quoted(PROFILES),
        sets.join(", "),
        quoted("id"),
        id_param,
        profile_columns(),
        quoted(USERS)
    );
    q
}

/// UPDATE avatar of profile `$1` to `$2` (NULL clears it), returning the joined row.
pub fn update_avatar() -> String {
    format!(
        "WITH p AS (UPDATE {} SET avatar = $2, updated_at = NOW() WHERE id = $1 RETURNING *) \
         SELECT {} FROM p JOIN {} u ON u.id = p.user_id",
        quoted(PROFILES),
        profile_columns(),
        quoted(USERS)
    )
}

/// SELECT statuses with optional exact-match username and city filters joined by AND. ORDER BY id.
pub fn select_statuses(filter: &StatusFilter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut joins = format!(" JOIN {} u ON u.id = s.user_id", quoted(USERS));
    let mut where_parts = Vec::new();
    if let Some(username) = &filter.username {
        let n = q.push_param(SqlParam::Text(username.clone()));
        where_parts.push(format!("u.{} = ${}", quoted("username"), n));
    }
    if let Some(city) = &filter.city {
        joins.push_str(&format!(" JOIN {} p ON p.user_id = s.user_id", quoted(PROFILES)));
        let n = q.push_param(SqlParam::Text(city.clone()));
        where_parts.push(format!("p.{} = ${}", quoted("city"), n));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    q.sql = format!(
        "SELECT {} FROM {} s{}{} ORDER BY s.id",
        status_columns(),
        quoted(PROFILE_STATUSES),
        joins,
        where_clause
    );
    q
}

/// SELECT one status by id. Caller binds the id as `$1`.
pub fn select_status_by_id() -> String {
    format!(
        "SELECT {} FROM {} s JOIN {} u ON u.id = s.user_id WHERE s.id = $1",
        status_columns(),
        quoted(PROFILE_STATUSES),
        quoted(USERS)
    )
}

/// INSERT a status for `$1` (user id) with text `$2`, returning the joined row.
pub fn insert_status() -> String {
    format!(
        "WITH s AS (INSERT INTO {} (user_id, status) VALUES ($1, $2) RETURNING *) \
         SELECT {} FROM s JOIN {} u ON u.id = s.user_id",
        quoted(PROFILE_STATUSES),
        status_columns(),
        quoted(USERS)
    )
}

/// UPDATE status `$1` with text `$2`, returning the joined row.
pub fn update_status() -> String {
    format!(
        "WITH s AS (UPDATE {} SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *) \
         SELECT {} FROM s JOIN {} u ON u.id = s.user_id",
        quoted(PROFILE_STATUSES),
        status_columns(),
        quoted(USERS)
    )
}
