use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::media::MediaRef;

/// Post record in the database. A row exists only if its media upload
/// already succeeded; the three media columns always change together.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub caption: String,
    pub media_url: String,
    pub media_name: String,
    pub media_kind: String,
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    id: Uuid,
    user_id: Uuid,
    caption: &str,
    media: &MediaRef,
) -> sqlx::Result<Post> {
    sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (id, user_id, caption, media_url, media_name, media_kind)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, caption, media_url, media_name, media_kind, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(caption)
    .bind(&media.url)
    .bind(&media.name)
    .bind(media.kind.as_str())
    .fetch_one(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Post>> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, user_id, caption, media_url, media_name, media_kind, created_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Writes caption and media columns in one statement; `created_at` and
/// ownership are immutable. Returns `None` when the row vanished between
/// the caller's existence check and the write.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    caption: &str,
    media_url: &str,
    media_name: &str,
    media_kind: &str,
) -> sqlx::Result<Option<Post>> {
    sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts
        SET caption = $2, media_url = $3, media_name = $4, media_kind = $5
        WHERE id = $1
        RETURNING id, user_id, caption, media_url, media_name, media_kind, created_at
        "#,
    )
    .bind(id)
    .bind(caption)
    .bind(media_url)
    .bind(media_name)
    .bind(media_kind)
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query(r#"DELETE FROM posts WHERE id = $1"#)
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Every post, newest first. The feed has no pagination in current scope.
pub async fn list_feed(db: &PgPool) -> sqlx::Result<Vec<Post>> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, user_id, caption, media_url, media_name, media_kind, created_at
        FROM posts
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(db)
    .await
}
