use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Post, PostStatus};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub body: Option<String>,
    /// Posts default to draft; set true to publish immediately
    #[serde(default)]
    pub published: bool,
}

/// Create a content post with a collision-free slug derived from the title
pub async fn create_post(pool: &PgPool, new: NewPost) -> Result<Post, ApiError> {
    if new.title.trim().is_empty() {
        return Err(ApiError::validation("title is required"));
    }

    let slug = unique_slug(pool, &slugify(&new.title)).await?;
    let status = if new.published { PostStatus::Published } else { PostStatus::Draft };

    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (id, title, slug, body, status, published_at, created_at)
        VALUES ($1, $2, $3, $4, $5,
                CASE WHEN $5 = 'PUBLISHED'::post_status THEN NOW() ELSE NULL END,
                NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.title.trim())
    .bind(&slug)
    .bind(&new.body)
    .bind(status)
    .fetch_one(pool)
    .await?;

    tracing::info!(post_id = %post.id, slug = %post.slug, "post created");
    Ok(post)
}

/// Derive a URL-safe slug: lowercase ASCII alphanumerics with single dashes
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("post");
    }
    slug
}

/// Append a counter suffix until the slug is free. Bounded probe; falls back
/// to a random suffix if somebody has squatted every numbered variant.
async fn unique_slug(pool: &PgPool, base: &str) -> Result<String, ApiError> {
    let mut candidate = base.to_string();
    for n in 2..=20 {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1)")
                .bind(&candidate)
                .fetch_one(pool)
                .await?;
        if !taken {
            return Ok(candidate);
        }
        candidate = format!("{}-{}", base, n);
    }
    Ok(format!("{}-{}", base, &Uuid::new_v4().simple().to_string()[..8]))
}
