use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{on_unique_violation, AppError};
use crate::tags::repo::Tag;

#[derive(Debug, Clone, FromRow)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub published: bool,
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const BLOG_COLUMNS: &str = "id, title, content, slug, published, author_id, created_at, updated_at";

/// Filters for the blog listing; all optional, combined with AND.
#[derive(Debug, Default)]
pub struct BlogFilter {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub published: Option<bool>,
    pub author_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

pub async fn create_blog(
    db: &PgPool,
    author_id: Uuid,
    title: &str,
    content: &str,
    slug: &str,
    published: bool,
    tag_ids: &[Uuid],
) -> Result<Blog, AppError> {
    let mut tx = db.begin().await?;

    let blog = sqlx::query_as::<_, Blog>(&format!(
        r#"
        INSERT INTO blogs (title, content, slug, published, author_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {BLOG_COLUMNS}
        "#
    ))
    .bind(title)
    .bind(content)
    .bind(slug)
    .bind(published)
    .bind(author_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| on_unique_violation(e, "Blog with this slug already exists"))?;

    for tag_id in tag_ids {
        sqlx::query(
            r#"
            INSERT INTO blog_tags (blog_id, tag_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(blog.id)
        .bind(tag_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(blog)
}

pub async fn list_blogs(db: &PgPool, filter: &BlogFilter) -> Result<Vec<Blog>, AppError> {
    let blogs = sqlx::query_as::<_, Blog>(&format!(
        r#"
        SELECT {BLOG_COLUMNS}
        FROM blogs b
        WHERE ($1::text IS NULL OR b.title ILIKE '%' || $1 || '%' OR b.content ILIKE '%' || $1 || '%')
          AND ($2::text IS NULL OR EXISTS (
                SELECT 1 FROM blog_tags bt
                JOIN tags t ON t.id = bt.tag_id
                WHERE bt.blog_id = b.id AND (t.slug = $2 OR t.name = $2)))
          AND ($3::bool IS NULL OR b.published = $3)
          AND ($4::uuid IS NULL OR b.author_id = $4)
        ORDER BY b.created_at DESC
        LIMIT $5 OFFSET $6
        "#
    ))
    .bind(&filter.search)
    .bind(&filter.tag)
    .bind(filter.published)
    .bind(filter.author_id)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(db)
    .await?;
    Ok(blogs)
}

pub async fn get_blog(db: &PgPool, id: Uuid) -> Result<Option<(Blog, Vec<Tag>)>, AppError> {
    let blog = sqlx::query_as::<_, Blog>(&format!(
        "SELECT {BLOG_COLUMNS} FROM blogs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;

    let Some(blog) = blog else {
        return Ok(None);
    };
    let tags = tags_for(db, id).await?;
    Ok(Some((blog, tags)))
}

pub async fn tags_for(db: &PgPool, blog_id: Uuid) -> Result<Vec<Tag>, AppError> {
    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.id, t.name, t.slug, t.created_at, t.updated_at
        FROM tags t
        JOIN blog_tags bt ON bt.tag_id = t.id
        WHERE bt.blog_id = $1
        ORDER BY t.name
        "#,
    )
    .bind(blog_id)
    .fetch_all(db)
    .await?;
    Ok(tags)
}

/// Partial update; when `tag_ids` is present the tag set is replaced.
pub async fn update_blog(
    db: &PgPool,
    id: Uuid,
    title: Option<&str>,
    content: Option<&str>,
    slug: Option<&str>,
    tag_ids: Option<&[Uuid]>,
) -> Result<Option<Blog>, AppError> {
    let mut tx = db.begin().await?;

    let blog = sqlx::query_as::<_, Blog>(&format!(
        r#"
        UPDATE blogs
        SET title = COALESCE($2, title),
            content = COALESCE($3, content),
            slug = COALESCE($4, slug),
            updated_at = now()
        WHERE id = $1
        RETURNING {BLOG_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(title)
    .bind(content)
    .bind(slug)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| on_unique_violation(e, "Blog with this slug already exists"))?;

    let Some(blog) = blog else {
        return Ok(None);
    };

    if let Some(tag_ids) = tag_ids {
        sqlx::query("DELETE FROM blog_tags WHERE blog_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for tag_id in tag_ids {
            sqlx::query(
                r#"
                INSERT INTO blog_tags (blog_id, tag_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(Some(blog))
}

pub async fn toggle_publish(db: &PgPool, id: Uuid) -> Result<Option<Blog>, AppError> {
    let blog = sqlx::query_as::<_, Blog>(&format!(
        r#"
        UPDATE blogs SET published = NOT published, updated_at = now()
        WHERE id = $1
        RETURNING {BLOG_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(blog)
}

/// Join rows go with the blog via `ON DELETE CASCADE`.
pub async fn delete_blog(db: &PgPool, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
