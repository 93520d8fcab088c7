use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Post;

/// Wire shape of a post. Field names follow what the frontend consumes:
/// `url`, `file_type` and `file_name` describe the hosted asset.
#[derive(Debug, Serialize)]
pub struct PostOut {
    pub id: Uuid,
    pub caption: String,
    pub url: String,
    pub file_type: String,
    pub file_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Post> for PostOut {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            caption: p.caption,
            url: p.media_url,
            file_type: p.media_kind,
            file_name: p.media_name,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub posts: Vec<PostOut>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}
