use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::ApiError;
use crate::ingredients::repo::Ingredient;
use crate::tags::repo::Tag;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub time_minutes: i32,
    pub link: Option<String>,
    pub image_key: Option<String>,
}

pub struct NewRecipe<'a> {
    pub title: &'a str,
    pub price: Decimal,
    pub time_minutes: i32,
    pub link: Option<&'a str>,
    pub tag_ids: &'a [i64],
    pub ingredient_ids: &'a [i64],
}

pub struct RecipeChanges<'a> {
    pub title: Option<&'a str>,
    pub price: Option<Decimal>,
    pub time_minutes: Option<i32>,
    pub link: Option<&'a str>,
    pub tag_ids: Option<&'a [i64]>,
    pub ingredient_ids: Option<&'a [i64]>,
}

impl Recipe {
    /// Insert a recipe and its association rows in one transaction. Unknown
    /// tag/ingredient ids abort the whole insert.
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        new: NewRecipe<'_>,
    ) -> Result<Recipe, ApiError> {
        let mut tx = db.begin().await.map_err(ApiError::Database)?;

        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes (user_id, title, price, time_minutes, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, title, price, time_minutes, link, image_key
            "#,
        )
        .bind(user_id)
        .bind(new.title)
        .bind(new.price)
        .bind(new.time_minutes)
        .bind(new.link)
        .fetch_one(&mut *tx)
        .await
        .map_err(ApiError::Database)?;

        set_tags(&mut tx, recipe.id, new.tag_ids).await?;
        set_ingredients(&mut tx, recipe.id, new.ingredient_ids).await?;

        tx.commit().await.map_err(ApiError::Database)?;
        Ok(recipe)
    }

    /// Caller's recipes, most-recently-created first, optionally restricted to
    /// those carrying any of the given tag/ingredient ids.
    pub async fn list(
        db: &PgPool,
        user_id: Uuid,
        tag_filter: Option<&[i64]>,
        ingredient_filter: Option<&[i64]>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Recipe>, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(
            r#"
            SELECT r.id, r.user_id, r.title, r.price, r.time_minutes, r.link, r.image_key
            FROM recipes r
            WHERE r.user_id = $1
              AND ($2::bigint[] IS NULL OR EXISTS (
                    SELECT 1 FROM recipe_tags rt
                    WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2)))
              AND ($3::bigint[] IS NULL OR EXISTS (
                    SELECT 1 FROM recipe_ingredients ri
                    WHERE ri.recipe_id = r.id AND ri.ingredient_id = ANY($3)))
            ORDER BY r.id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(tag_filter)
        .bind(ingredient_filter)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn get_by_id(
        db: &PgPool,
        user_id: Uuid,
        id: i64,
    ) -> Result<Option<Recipe>, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, user_id, title, price, time_minutes, link, image_key
            FROM recipes
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Partial update; `Some` id sets replace the whole association set.
    /// `None` when the recipe is not owned by `user_id`.
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        id: i64,
        changes: RecipeChanges<'_>,
    ) -> Result<Option<Recipe>, ApiError> {
        let mut tx = db.begin().await.map_err(ApiError::Database)?;

        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            UPDATE recipes
            SET title = COALESCE($3, title),
                price = COALESCE($4, price),
                time_minutes = COALESCE($5, time_minutes),
                link = COALESCE($6, link)
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, price, time_minutes, link, image_key
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(changes.title)
        .bind(changes.price)
        .bind(changes.time_minutes)
        .bind(changes.link)
        .fetch_optional(&mut *tx)
        .await
        .map_err(ApiError::Database)?;

        let Some(recipe) = recipe else {
            return Ok(None);
        };

        if let Some(tag_ids) = changes.tag_ids {
            clear_tags(&mut tx, recipe.id).await?;
            set_tags(&mut tx, recipe.id, tag_ids).await?;
        }
        if let Some(ingredient_ids) = changes.ingredient_ids {
            clear_ingredients(&mut tx, recipe.id).await?;
            set_ingredients(&mut tx, recipe.id, ingredient_ids).await?;
        }

        tx.commit().await.map_err(ApiError::Database)?;
        Ok(Some(recipe))
    }

    /// Delete the caller's recipe. Returns the stored image key (if any) so
    /// the handler can drop the object; `None` when nothing was deleted.
    pub async fn delete(
        db: &PgPool,
        user_id: Uuid,
        id: i64,
    ) -> Result<Option<Option<String>>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<String>>(
            r#"
            DELETE FROM recipes
            WHERE id = $1 AND user_id = $2
            RETURNING image_key
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Swap the stored image key, returning the previous one. Outer `None`
    /// when the recipe is not owned by `user_id`.
    pub async fn swap_image_key(
        db: &PgPool,
        user_id: Uuid,
        id: i64,
        key: &str,
    ) -> Result<Option<Option<String>>, sqlx::Error> {
        let mut tx = db.begin().await?;

        let old: Option<Option<String>> = sqlx::query_scalar(
            r#"
            SELECT image_key FROM recipes
            WHERE id = $1 AND user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(old) = old else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE recipes SET image_key = $3
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(key)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(old))
    }

    /// Association ids for a batch of recipes, grouped by recipe id.
    pub async fn tag_ids_for(
        db: &PgPool,
        recipe_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<i64>>, sqlx::Error> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT recipe_id, tag_id FROM recipe_tags
            WHERE recipe_id = ANY($1)
            ORDER BY tag_id
            "#,
        )
        .bind(recipe_ids)
        .fetch_all(db)
        .await?;
        Ok(group_pairs(rows))
    }

    pub async fn ingredient_ids_for(
        db: &PgPool,
        recipe_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<i64>>, sqlx::Error> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT recipe_id, ingredient_id FROM recipe_ingredients
            WHERE recipe_id = ANY($1)
            ORDER BY ingredient_id
            "#,
        )
        .bind(recipe_ids)
        .fetch_all(db)
        .await?;
        Ok(group_pairs(rows))
    }

    /// Expanded tag objects for one recipe.
    pub async fn tags_for(db: &PgPool, recipe_id: i64) -> Result<Vec<Tag>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.user_id, t.name
            FROM tags t
            JOIN recipe_tags rt ON rt.tag_id = t.id
            WHERE rt.recipe_id = $1
            ORDER BY t.id
            "#,
        )
        .bind(recipe_id)
        .fetch_all(db)
        .await
    }

    pub async fn ingredients_for(
        db: &PgPool,
        recipe_id: i64,
    ) -> Result<Vec<Ingredient>, sqlx::Error> {
        sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT i.id, i.user_id, i.name
            FROM ingredients i
            JOIN recipe_ingredients ri ON ri.ingredient_id = i.id
            WHERE ri.recipe_id = $1
            ORDER BY i.id
            "#,
        )
        .bind(recipe_id)
        .fetch_all(db)
        .await
    }
}

fn group_pairs(rows: Vec<(i64, i64)>) -> HashMap<i64, Vec<i64>> {
    let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
    for (recipe_id, other_id) in rows {
        grouped.entry(recipe_id).or_default().push(other_id);
    }
    grouped
}

fn dedup(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Referenced tags must exist; they are not required to belong to the
/// recipe's owner.
async fn set_tags(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    tag_ids: &[i64],
) -> Result<(), ApiError> {
    let ids = dedup(tag_ids);
    if ids.is_empty() {
        return Ok(());
    }

    let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_one(&mut **tx)
        .await
        .map_err(ApiError::Database)?;
    if found != ids.len() as i64 {
        return Err(ApiError::validation("one or more tag ids do not exist"));
    }

    sqlx::query(
        r#"
        INSERT INTO recipe_tags (recipe_id, tag_id)
        SELECT $1, unnest($2::bigint[])
        "#,
    )
    .bind(recipe_id)
    .bind(&ids)
    .execute(&mut **tx)
    .await
    .map_err(ApiError::Database)?;
    Ok(())
}

async fn set_ingredients(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    ingredient_ids: &[i64],
) -> Result<(), ApiError> {
    let ids = dedup(ingredient_ids);
    if ids.is_empty() {
        return Ok(());
    }

    let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_one(&mut **tx)
        .await
        .map_err(ApiError::Database)?;
    if found != ids.len() as i64 {
        return Err(ApiError::validation(
            "one or more ingredient ids do not exist",
        ));
    }

    sqlx::query(
        r#"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id)
        SELECT $1, unnest($2::bigint[])
        "#,
    )
    .bind(recipe_id)
    .bind(&ids)
    .execute(&mut **tx)
    .await
    .map_err(ApiError::Database)?;
    Ok(())
}

async fn clear_tags(tx: &mut Transaction<'_, Postgres>, recipe_id: i64) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await
        .map_err(ApiError::Database)?;
    Ok(())
}

async fn clear_ingredients(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await
        .map_err(ApiError::Database)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_sorts_and_removes_duplicates() {
        assert_eq!(dedup(&[3, 1, 2, 1, 3]), vec![1, 2, 3]);
        assert!(dedup(&[]).is_empty());
    }

    #[test]
    fn group_pairs_collects_per_recipe() {
        let grouped = group_pairs(vec![(1, 10), (1, 11), (2, 10)]);
        assert_eq!(grouped[&1], vec![10, 11]);
        assert_eq!(grouped[&2], vec![10]);
        assert!(!grouped.contains_key(&3));
    }
}
