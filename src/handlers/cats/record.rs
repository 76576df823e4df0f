use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::middleware::{MessageResponse, MessageResult};
use crate::models::{Cat, CatWithOwner, UpdateCatBody};
use crate::state::AppState;

/// GET /cats/:id - a single cat
pub async fn get(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<CatWithOwner>, ApiError> {
    Ok(Json(state.cat_service().get(&ctx, &id).await?))
}

/// PUT /cats/:id - update a cat the caller owns
pub async fn put(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCatBody>, JsonRejection>,
) -> MessageResult<Cat> {
    let Json(body) = payload?;
    let cat = state.cat_service().update_owned(&ctx, &id, body).await?;
    Ok(MessageResponse::new("Cat updated", cat))
}

/// DELETE /cats/:id - delete a cat the caller owns
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> MessageResult<Cat> {
    let cat = state.cat_service().delete_owned(&ctx, &id).await?;
    Ok(MessageResponse::new("Cat deleted", cat))
}
