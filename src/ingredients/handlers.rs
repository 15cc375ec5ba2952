use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{
    auth::AuthUser, error::ApiError, ingredients::repo::Ingredient, state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListIngredientsQuery {
    #[serde(default)]
    pub assigned_only: i32,
}

#[derive(Debug, Deserialize)]
pub struct IngredientBody {
    #[serde(default)]
    pub name: String,
}

#[instrument(skip(state))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ListIngredientsQuery>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let ingredients = Ingredient::list_by_user(&state.db, user_id, q.assigned_only != 0).await?;
    Ok(Json(ingredients))
}

#[instrument(skip(state, payload))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<IngredientBody>,
) -> Result<(StatusCode, Json<Ingredient>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    let ingredient = Ingredient::create(&state.db, user_id, name).await?;
    info!(user_id = %user_id, ingredient_id = ingredient.id, "ingredient created");
    Ok((StatusCode::CREATED, Json(ingredient)))
}

#[instrument(skip(state, payload))]
pub async fn update_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<IngredientBody>,
) -> Result<Json<Ingredient>, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    let ingredient = Ingredient::rename(&state.db, user_id, id, name)
        .await?
        .ok_or_else(|| ApiError::not_found("ingredient not found"))?;
    Ok(Json(ingredient))
}

#[instrument(skip(state))]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !Ingredient::delete(&state.db, user_id, id).await? {
        return Err(ApiError::not_found("ingredient not found"));
    }
    info!(user_id = %user_id, ingredient_id = id, "ingredient deleted");
    Ok(StatusCode::NO_CONTENT)
}
