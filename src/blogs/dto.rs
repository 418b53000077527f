use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::blogs::repo::Blog;
use crate::tags::dto::TagDto;
use crate::tags::repo::Tag;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogRequest {
    pub title: String,
    pub content: String,
    pub slug: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Listing filters; `page` is 1-based like the original API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub search: Option<String>,
    pub tag: Option<String>,
    pub published: Option<bool>,
    pub author_id: Option<Uuid>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDto {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub published: bool,
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagDto>>,
}

impl From<Blog> for BlogDto {
    fn from(b: Blog) -> Self {
        Self {
            id: b.id,
            title: b.title,
            content: b.content,
            slug: b.slug,
            published: b.published,
            author_id: b.author_id,
            created_at: b.created_at,
            updated_at: b.updated_at,
            tags: None,
        }
    }
}

impl From<(Blog, Vec<Tag>)> for BlogDto {
    fn from((b, tags): (Blog, Vec<Tag>)) -> Self {
        let mut dto: BlogDto = b.into();
        dto.tags = Some(tags.into_iter().map(Into::into).collect());
        dto
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults() {
        let q: BlogListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
        assert!(q.search.is_none());
        assert!(q.published.is_none());
    }

    #[test]
    fn blog_without_tags_omits_the_field() {
        let now = OffsetDateTime::now_utc();
        let dto = BlogDto::from(Blog {
            id: Uuid::new_v4(),
            title: "T".into(),
            content: "C".into(),
            slug: "t".into(),
            published: false,
            author_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        });
        let json = serde_json::to_string(&dto).unwrap();
        assert!(!json.contains("\"tags\""));
        assert!(json.contains("\"authorId\""));
    }
}
