use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{on_unique_violation, AppError};

#[derive(Debug, Clone, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const TAG_COLUMNS: &str = "id, name, slug, created_at, updated_at";

pub async fn create_tag(db: &PgPool, name: &str, slug: &str) -> Result<Tag, AppError> {
    let tag = sqlx::query_as::<_, Tag>(&format!(
        r#"
        INSERT INTO tags (name, slug)
        VALUES ($1, $2)
        RETURNING {TAG_COLUMNS}
        "#
    ))
    .bind(name)
    .bind(slug)
    .fetch_one(db)
    .await
    .map_err(|e| on_unique_violation(e, "Tag with this slug already exists"))?;
    Ok(tag)
}

pub async fn list_tags(
    db: &PgPool,
    search: Option<&str>,
    ascending: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Tag>, AppError> {
    let order = if ascending { "ASC" } else { "DESC" };
    let tags = sqlx::query_as::<_, Tag>(&format!(
        r#"
        SELECT {TAG_COLUMNS}
        FROM tags
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR slug ILIKE '%' || $1 || '%')
        ORDER BY created_at {order}
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(search)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(tags)
}

pub async fn get_tag(db: &PgPool, id: Uuid) -> Result<Option<Tag>, AppError> {
    let tag = sqlx::query_as::<_, Tag>(&format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(tag)
}

pub async fn update_tag(
    db: &PgPool,
    id: Uuid,
    name: Option<&str>,
    slug: Option<&str>,
) -> Result<Option<Tag>, AppError> {
    let tag = sqlx::query_as::<_, Tag>(&format!(
        r#"
        UPDATE tags
        SET name = COALESCE($2, name),
            slug = COALESCE($3, slug),
            updated_at = now()
        WHERE id = $1
        RETURNING {TAG_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name)
    .bind(slug)
    .fetch_optional(db)
    .await
    .map_err(|e| on_unique_violation(e, "Tag with this slug already exists"))?;
    Ok(tag)
}

/// Join rows cascade with the tag.
pub async fn delete_tag(db: &PgPool, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM tags WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn search_tags(db: &PgPool, term: &str) -> Result<Vec<Tag>, AppError> {
    let tags = sqlx::query_as::<_, Tag>(&format!(
        r#"
        SELECT {TAG_COLUMNS}
        FROM tags
        WHERE name ILIKE '%' || $1 || '%' OR slug ILIKE '%' || $1 || '%'
        ORDER BY name
        LIMIT 20
        "#
    ))
    .bind(term)
    .fetch_all(db)
    .await?;
    Ok(tags)
}
