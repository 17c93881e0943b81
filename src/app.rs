//! Full application router: common routes at the root, the API under `/api`, media files under the
//! configured media URL.

use crate::routes::{api_routes, common_routes};
use crate::state::AppState;
use axum::Router;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub const API_PREFIX: &str = "/api";

pub fn build_app(state: AppState) -> Router {
    let media_prefix = state.settings.media_url.trim_end_matches('/').to_string();
    let media_dir = ServeDir::new(state.media.root());

    let mut app = Router::new()
        .merge(common_routes(state.clone()))
        .nest(API_PREFIX, api_routes(state));
    if !media_prefix.is_empty() {
        app = app.nest_service(&media_prefix, media_dir);
    }
    app.layer(TraceLayer::new_for_http())
}
