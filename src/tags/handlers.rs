use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{auth::AuthUser, error::ApiError, state::AppState, tags::repo::Tag};

#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    /// 1 restricts the listing to tags attached to at least one recipe.
    #[serde(default)]
    pub assigned_only: i32,
}

#[derive(Debug, Deserialize)]
pub struct TagBody {
    #[serde(default)]
    pub name: String,
}

#[instrument(skip(state))]
pub async fn list_tags(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ListTagsQuery>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    let tags = Tag::list_by_user(&state.db, user_id, q.assigned_only != 0).await?;
    Ok(Json(tags))
}

#[instrument(skip(state, payload))]
pub async fn create_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<TagBody>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    let tag = Tag::create(&state.db, user_id, name).await?;
    info!(user_id = %user_id, tag_id = tag.id, "tag created");
    Ok((StatusCode::CREATED, Json(tag)))
}

#[instrument(skip(state, payload))]
pub async fn update_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<TagBody>,
) -> Result<Json<Tag>, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    let tag = Tag::rename(&state.db, user_id, id, name)
        .await?
        .ok_or_else(|| ApiError::not_found("tag not found"))?;
    Ok(Json(tag))
}

#[instrument(skip(state))]
pub async fn delete_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !Tag::delete(&state.db, user_id, id).await? {
        return Err(ApiError::not_found("tag not found"));
    }
    info!(user_id = %user_id, tag_id = id, "tag deleted");
    Ok(StatusCode::NO_CONTENT)
}
