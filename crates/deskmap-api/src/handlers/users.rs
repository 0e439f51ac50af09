//! User account HTTP handlers.
//!
//! Identity here is intentionally minimal: an account plus an opaque bearer
//! token issued once at registration. The middleware resolves that token to
//! the request's actor; everything else about authentication is out of
//! scope for this service.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{ApiError, AppState};
use deskmap_core::{Actor, UserRepository};

/// Request body for registering a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
}

/// Registration response; the token is shown exactly once.
#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub id: uuid::Uuid,
    pub username: String,
    pub token: String,
}

/// Who the current bearer token belongs to.
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub id: uuid::Uuid,
    pub username: String,
}

/// Register a user and issue its bearer token.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), ApiError> {
    let (user, token) = state.db.users.insert(&req.username).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            id: user.id,
            username: user.username,
            token,
        }),
    ))
}

/// Echo the authenticated actor.
pub async fn current_user(
    Extension(actor): Extension<Actor>,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    match actor {
        Actor::User { id, username } => Ok(Json(CurrentUserResponse { id, username })),
        Actor::Anonymous => Err(ApiError::Unauthorized(
            "authentication required".to_string(),
        )),
    }
}
