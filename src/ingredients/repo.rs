use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Ingredient owned by a single user. Serializes as `{id, name}`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
}

impl Ingredient {
    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        assigned_only: bool,
    ) -> Result<Vec<Ingredient>, sqlx::Error> {
        if assigned_only {
            sqlx::query_as::<_, Ingredient>(
                r#"
                SELECT DISTINCT i.id, i.user_id, i.name
                FROM ingredients i
                JOIN recipe_ingredients ri ON ri.ingredient_id = i.id
                WHERE i.user_id = $1
                ORDER BY i.name
                "#,
            )
            .bind(user_id)
            .fetch_all(db)
            .await
        } else {
            sqlx::query_as::<_, Ingredient>(
                r#"
                SELECT id, user_id, name
                FROM ingredients
                WHERE user_id = $1
                ORDER BY name
                "#,
            )
            .bind(user_id)
            .fetch_all(db)
            .await
        }
    }

    pub async fn create(db: &PgPool, user_id: Uuid, name: &str) -> Result<Ingredient, sqlx::Error> {
        sqlx::query_as::<_, Ingredient>(
            r#"
            INSERT INTO ingredients (user_id, name)
            VALUES ($1, $2)
            RETURNING id, user_id, name
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(db)
        .await
    }

    pub async fn rename(
        db: &PgPool,
        user_id: Uuid,
        id: i64,
        name: &str,
    ) -> Result<Option<Ingredient>, sqlx::Error> {
        sqlx::query_as::<_, Ingredient>(
            r#"
            UPDATE ingredients
            SET name = $3
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, user_id: Uuid, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM ingredients
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
