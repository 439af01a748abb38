//! Bearer API-key authentication.
//!
//! Resolves the calling user from the Authorization header and stores it
//! as a request extension. Authorization (membership, role, permission) is
//! checked per handler against the org in the path; this layer only
//! establishes identity.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::db::{queries, AppState};
use crate::error::AppError;
use crate::models::User;
use crate::util;

/// The authenticated caller, available to handlers via `Extension`.
#[derive(Clone)]
pub struct AuthContext {
    pub user: User,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = util::extract_bearer_token(request.headers())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    let conn = state.db.get()?;

    let user = queries::get_user_by_api_key(&conn, &api_key)?
        .ok_or(AppError::Unauthorized)?;

    // Release the connection before dispatching so handlers can check one
    // out even from a single-connection pool.
    drop(conn);

    request.extensions_mut().insert(AuthContext { user });

    Ok(next.run(request).await)
}
