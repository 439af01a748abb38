mod departments;
mod members;
mod organizations;
mod users;

pub use departments::*;
pub use members::*;
pub use organizations::*;
pub use users::*;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::db::AppState;
use crate::middleware::require_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // Organizations
        .route("/organizations", post(create_org))
        .route("/organizations/{org_id}", get(get_org))
        // User listing and search
        .route("/orgs/{org_id}/users/search", post(search_org_users))
        .route("/orgs/{org_id}/users/stats", get(get_org_user_stats))
        .route("/orgs/{org_id}/users/{user_id}", get(get_org_user))
        // Membership management
        .route("/orgs/{org_id}/members", post(create_org_member))
        .route("/orgs/{org_id}/members/{member_id}/role", put(update_member_role))
        .route("/orgs/{org_id}/members/{member_id}", delete(deactivate_member))
        .route(
            "/orgs/{org_id}/members/{member_id}/reactivate",
            post(reactivate_member),
        )
        // Departments
        .route(
            "/orgs/{org_id}/departments",
            get(list_org_departments).post(create_org_department),
        )
        .layer(middleware::from_fn_with_state(state, require_auth))
}
