use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Tag owned by a single user. Serializes as `{id, name}`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
}

impl Tag {
    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        assigned_only: bool,
    ) -> Result<Vec<Tag>, sqlx::Error> {
        if assigned_only {
            sqlx::query_as::<_, Tag>(
                r#"
                SELECT DISTINCT t.id, t.user_id, t.name
                FROM tags t
                JOIN recipe_tags rt ON rt.tag_id = t.id
                WHERE t.user_id = $1
                ORDER BY t.name
                "#,
            )
            .bind(user_id)
            .fetch_all(db)
            .await
        } else {
            sqlx::query_as::<_, Tag>(
                r#"
                SELECT id, user_id, name
                FROM tags
                WHERE user_id = $1
                ORDER BY name
                "#,
            )
            .bind(user_id)
            .fetch_all(db)
            .await
        }
    }

    pub async fn create(db: &PgPool, user_id: Uuid, name: &str) -> Result<Tag, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (user_id, name)
            VALUES ($1, $2)
            RETURNING id, user_id, name
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(db)
        .await
    }

    /// Rename a tag owned by `user_id`; `None` when no such tag.
    pub async fn rename(
        db: &PgPool,
        user_id: Uuid,
        id: i64,
        name: &str,
    ) -> Result<Option<Tag>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            UPDATE tags
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

    /// Delete a tag owned by `user_id`; false when no such tag.
    pub async fn delete(db: &PgPool, user_id: Uuid, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM tags
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_serializes_without_owner() {
        let tag = Tag {
            id: 7,
            user_id: Uuid::new_v4(),
            name: "Main Course".into(),
        };
        let value: serde_json::Value = serde_json::to_value(&tag).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["id"], 7);
        assert_eq!(obj["name"], "Main Course");
    }
}
