pub mod orgs;

use axum::{routing::get, Router};

use crate::db::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(orgs::router(state.clone()))
        .with_state(state)
}
