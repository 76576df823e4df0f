use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::context::RequestContext;
use crate::middleware::{MessageResponse, MessageResult};
use crate::models::{Cat, UpdateCatBody};
use crate::state::AppState;

/// PUT /cats/admin/:id - update any cat, including its owner
pub async fn put(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCatBody>, JsonRejection>,
) -> MessageResult<Cat> {
    let Json(body) = payload?;
    let cat = state.cat_service().update_any(&ctx, &id, body).await?;
    Ok(MessageResponse::new("Cat updated", cat))
}

/// DELETE /cats/admin/:id - delete any cat
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> MessageResult<Cat> {
    let cat = state.cat_service().delete_any(&ctx, &id).await?;
    Ok(MessageResponse::new("Cat deleted", cat))
}
