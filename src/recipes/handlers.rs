use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    Json,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{
    auth::AuthUser,
    error::ApiError,
    recipes::{
        dto::{
            parse_id_csv, validate_price, validate_time_minutes, CreateRecipeRequest,
            RecipeDetail, RecipeListQuery, RecipeSummary, UpdateRecipeRequest,
        },
        images,
        repo::{NewRecipe, Recipe, RecipeChanges},
    },
    state::AppState,
};

/// Presigned image URLs stay valid for ten minutes.
const IMAGE_URL_TTL_SECS: u64 = 600;

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<RecipeListQuery>,
) -> Result<Json<Vec<RecipeSummary>>, ApiError> {
    let tag_filter = q.tags.as_deref().map(parse_id_csv).transpose()?;
    let ingredient_filter = q.ingredients.as_deref().map(parse_id_csv).transpose()?;

    let recipes = Recipe::list(
        &state.db,
        user_id,
        tag_filter.as_deref(),
        ingredient_filter.as_deref(),
        q.limit,
        q.offset,
    )
    .await?;

    let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
    let mut tags_by_recipe = Recipe::tag_ids_for(&state.db, &ids).await?;
    let mut ingredients_by_recipe = Recipe::ingredient_ids_for(&state.db, &ids).await?;

    let items = recipes
        .into_iter()
        .map(|r| RecipeSummary {
            tags: tags_by_recipe.remove(&r.id).unwrap_or_default(),
            ingredients: ingredients_by_recipe.remove(&r.id).unwrap_or_default(),
            id: r.id,
            title: r.title,
            price: r.price,
            time_minutes: r.time_minutes,
            link: r.link,
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetail>, ApiError> {
    let recipe = Recipe::get_by_id(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("recipe not found"))?;

    let tags = Recipe::tags_for(&state.db, recipe.id).await?;
    let ingredients = Recipe::ingredients_for(&state.db, recipe.id).await?;

    Ok(Json(RecipeDetail {
        id: recipe.id,
        title: recipe.title,
        price: recipe.price,
        time_minutes: recipe.time_minutes,
        tags,
        ingredients,
        link: recipe.link,
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, HeaderMap, Json<RecipeSummary>), ApiError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("title must not be empty"));
    }
    let price = payload
        .price
        .ok_or_else(|| ApiError::validation("price is required"))
        .and_then(validate_price)?;
    let time_minutes = payload
        .time_minutes
        .ok_or_else(|| ApiError::validation("time_minutes is required"))
        .and_then(validate_time_minutes)?;

    let recipe = Recipe::create(
        &state.db,
        user_id,
        NewRecipe {
            title,
            price,
            time_minutes,
            link: payload.link.as_deref(),
            tag_ids: &payload.tag_ids,
            ingredient_ids: &payload.ingredient_ids,
        },
    )
    .await?;

    let tags = Recipe::tag_ids_for(&state.db, &[recipe.id])
        .await?
        .remove(&recipe.id)
        .unwrap_or_default();
    let ingredients = Recipe::ingredient_ids_for(&state.db, &[recipe.id])
        .await?
        .remove(&recipe.id)
        .unwrap_or_default();

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/recipes/{}", recipe.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }

    info!(user_id = %user_id, recipe_id = recipe.id, "recipe created");
    Ok((
        StatusCode::CREATED,
        headers,
        Json(RecipeSummary {
            id: recipe.id,
            title: recipe.title,
            price: recipe.price,
            time_minutes: recipe.time_minutes,
            tags,
            ingredients,
            link: recipe.link,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> Result<Json<RecipeSummary>, ApiError> {
    if let Some(title) = payload.title.as_deref() {
        if title.trim().is_empty() {
            return Err(ApiError::validation("title must not be empty"));
        }
    }
    let price = payload.price.map(validate_price).transpose()?;
    let time_minutes = payload.time_minutes.map(validate_time_minutes).transpose()?;

    let recipe = Recipe::update(
        &state.db,
        user_id,
        id,
        RecipeChanges {
            title: payload.title.as_deref().map(str::trim),
            price,
            time_minutes,
            link: payload.link.as_deref(),
            tag_ids: payload.tag_ids.as_deref(),
            ingredient_ids: payload.ingredient_ids.as_deref(),
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("recipe not found"))?;

    let tags = Recipe::tag_ids_for(&state.db, &[recipe.id])
        .await?
        .remove(&recipe.id)
        .unwrap_or_default();
    let ingredients = Recipe::ingredient_ids_for(&state.db, &[recipe.id])
        .await?
        .remove(&recipe.id)
        .unwrap_or_default();

    info!(user_id = %user_id, recipe_id = recipe.id, "recipe updated");
    Ok(Json(RecipeSummary {
        id: recipe.id,
        title: recipe.title,
        price: recipe.price,
        time_minutes: recipe.time_minutes,
        tags,
        ingredients,
        link: recipe.link,
    }))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let image_key = Recipe::delete(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("recipe not found"))?;

    if let Some(key) = image_key {
        if let Err(e) = state.storage.delete_object(&key).await {
            warn!(error = %e, key = %key, "failed to delete recipe image");
        }
    }

    info!(user_id = %user_id, recipe_id = id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/{id}/image — multipart upload, field `image`.
#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    mut mp: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let recipe = Recipe::get_by_id(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("recipe not found"))?;

    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().map(|s| s.to_string());
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        let body = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("invalid upload: {e}")))?;

        let key =
            images::store_recipe_image(&state, &recipe, body, &content_type, filename.as_deref())
                .await?;

        info!(user_id = %user_id, recipe_id = recipe.id, key = %key, "image uploaded");
        return Ok(Json(json!({ "id": recipe.id, "image": key })));
    }

    Err(ApiError::validation("image field is required"))
}

/// GET /recipes/{id}/image — 302 to a presigned URL.
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = Recipe::get_by_id(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("recipe not found"))?;

    let key = recipe
        .image_key
        .ok_or_else(|| ApiError::not_found("recipe has no image"))?;

    let url = state.storage.presign_get(&key, IMAGE_URL_TTL_SECS).await?;
    Ok(Redirect::temporary(&url))
}
