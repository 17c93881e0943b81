//! Process settings read from the environment. A `.env` file is honored by the server binary.

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/profiles";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_MEDIA_ROOT: &str = "media";
const DEFAULT_MEDIA_URL: &str = "/media/";
const DEFAULT_MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Which `Store` implementation backs the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::UnknownStore(s.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    /// Directory uploaded avatars are written under.
    pub media_root: PathBuf,
    /// URL prefix media files are served from. Always starts and ends with `/`.
    pub media_url: String,
    pub max_avatar_bytes: usize,
    pub store: StoreBackend,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: DEFAULT_DATABASE_URL.into(),
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            media_root: PathBuf::from(DEFAULT_MEDIA_ROOT),
            media_url: DEFAULT_MEDIA_URL.into(),
            max_avatar_bytes: DEFAULT_MAX_AVATAR_BYTES,
            store: StoreBackend::Postgres,
        }
    }
}

impl Settings {
    /// Build settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset or empty keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr: SocketAddr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key: "BIND_ADDR", value: bind_raw.clone() })?;

        let max_avatar_bytes: usize = match get("MAX_AVATAR_BYTES") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "MAX_AVATAR_BYTES", value: v.clone() })?,
            None => DEFAULT_MAX_AVATAR_BYTES,
        };

        let database_max_connections: u32 = match get("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DATABASE_MAX_CONNECTIONS",
                value: v.clone(),
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let store = match get("STORE") {
            Some(v) => v.parse()?,
            None => StoreBackend::Postgres,
        };

        Ok(Settings {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            database_max_connections,
            bind_addr,
            media_root: PathBuf::from(get("MEDIA_ROOT").unwrap_or_else(|| DEFAULT_MEDIA_ROOT.into())),
            media_url: normalize_url_prefix(&get("MEDIA_URL").unwrap_or_else(|| DEFAULT_MEDIA_URL.into())),
            max_avatar_bytes,
            store,
        })
    }
}

fn normalize_url_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".into()
    } else {
        format!("/{}/", trimmed)
    }
}
