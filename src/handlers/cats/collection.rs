use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::Deserialize;

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::middleware::{MessageResponse, MessageResult};
use crate::models::{Cat, CatWithOwner, CreateCatBody};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaQuery {
    /// Top-right corner as `lon,lat`
    pub top_right: Option<String>,
    /// Bottom-left corner as `lon,lat`
    pub bottom_left: Option<String>,
}

/// GET /cats - every cat
pub async fn list(State(state): State<AppState>, ctx: RequestContext) -> Result<Json<Vec<CatWithOwner>>, ApiError> {
    Ok(Json(state.cat_service().list_all(&ctx).await?))
}

/// GET /cats/user - cats owned by the caller
pub async fn list_owned(State(state): State<AppState>, ctx: RequestContext) -> Result<Json<Vec<CatWithOwner>>, ApiError> {
    Ok(Json(state.cat_service().list_owned(&ctx).await?))
}

/// GET /cats/area?topRight=lon,lat&bottomLeft=lon,lat - cats inside a bounding box
pub async fn list_area(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<AreaQuery>,
) -> Result<Json<Vec<CatWithOwner>>, ApiError> {
    let cats = state
        .cat_service()
        .list_by_area(&ctx, query.bottom_left.as_deref(), query.top_right.as_deref())
        .await?;
    Ok(Json(cats))
}

/// POST /cats - create a cat owned by the caller from the uploaded image
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<CreateCatBody>, JsonRejection>,
) -> MessageResult<Cat> {
    let Json(body) = payload?;
    let cat = state.cat_service().create(&ctx, body).await?;
    Ok(MessageResponse::new("Cat added", cat))
}
