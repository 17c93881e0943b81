//! API routes: profiles, status updates, avatar upload and account endpoints.
//! Paths carry a trailing slash; unsupported methods get 405 from the router.

use crate::handlers::{accounts, avatar, profile, status};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

/// Multipart framing on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn api_routes(state: AppState) -> Router {
    let avatar_limit = state.settings.max_avatar_bytes + MULTIPART_OVERHEAD;
    let avatar = Router::new()
        .route("/avatar/", put(avatar::update).patch(avatar::update))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(avatar_limit));

    Router::new()
        .route("/profiles/", get(profile::list))
        .route(
            "/profiles/:id/",
            get(profile::retrieve).put(profile::update).patch(profile::update),
        )
        .route("/status/", get(status::list).post(status::create))
        .route(
            "/status/:id/",
            get(status::retrieve)
                .put(status::update)
                .patch(status::update)
                .delete(status::destroy),
        )
        .route("/rest-auth/registration/", post(accounts::register))
        .route("/rest-auth/login/", post(accounts::login))
        .route("/rest-auth/logout/", post(accounts::logout))
        .route("/rest-auth/user/", get(accounts::me))
        .merge(avatar)
        .with_state(state)
}
