//! Liveness, readiness and build info, mounted outside `/api`.

use crate::config::StoreBackend;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Serialize)]
struct Readiness {
    status: &'static str,
    store: &'static str,
    media: &'static str,
}

fn backend_name(backend: StoreBackend) -> &'static str {
    match backend {
        StoreBackend::Postgres => "postgres",
        StoreBackend::Memory => "memory",
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// 503 unless the store answers and the media root is a directory.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let store_ok = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "store not ready");
            false
        }
    };
    let media_ok = tokio::fs::metadata(state.media.root())
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !media_ok {
        tracing::warn!(root = %state.media.root().display(), "media root missing");
    }

    let code = if store_ok && media_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = Readiness {
        status: if code == StatusCode::OK { "ok" } else { "degraded" },
        store: if store_ok { backend_name(state.settings.store) } else { "unavailable" },
        media: if media_ok { "ok" } else { "unavailable" },
    };
    (code, Json(body))
}

async fn version() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /health, /ready, /version.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
