// handlers/users.rs - read-only user queries
//
// `users` and `user(id)` return the public user shape; an unknown or
// malformed id fails with code NOT_FOUND.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::User;
use crate::state::AppState;

/// GET /users
pub async fn users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.list_all().await?))
}

/// GET /users/:id
pub async fn user(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<User>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::not_found("User not found"))?;
    Ok(Json(state.users.get_by_id(id).await?))
}
