//! Profiles service: user profiles, avatars and status updates over a token-authenticated REST API.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod media;
pub mod models;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use app::{build_app, API_PREFIX};
pub use config::{Settings, StoreBackend};
pub use error::{AppError, ConfigError, FieldErrors};
pub use media::MediaStorage;
pub use routes::{api_routes, common_routes};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_tables, MemoryStore, PgStore, Store};
