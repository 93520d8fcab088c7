use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{DeleteResponse, FeedResponse, PostOut};
use super::services::{self, UploadPart};
use super::repo;
use crate::auth::extractors::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/feed", get(feed))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/posts/:post_id", put(update_post).delete(delete_post))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[instrument(skip(state, mp, user), fields(user_id = %user.id))]
pub async fn upload(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mp: Multipart,
) -> Result<Json<PostOut>, AppError> {
    let (caption, file) = read_post_form(mp).await?;
    let file = file.ok_or_else(|| AppError::Validation("file is required".into()))?;

    let post = services::create_post(&state, user.id, caption.unwrap_or_default(), file).await?;
    Ok(Json(post.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn feed(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<FeedResponse>, AppError> {
    let posts = repo::list_feed(&state.db).await?;
    Ok(Json(FeedResponse {
        posts: posts.into_iter().map(PostOut::from).collect(),
    }))
}

#[instrument(skip(state, mp, user), fields(user_id = %user.id))]
pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    mp: Multipart,
) -> Result<Json<PostOut>, AppError> {
    let post_id = parse_post_id(&post_id)?;
    let (caption, file) = read_post_form(mp).await?;

    let post = services::update_post(&state, user.id, post_id, caption, file).await?;
    Ok(Json(post.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let post_id = parse_post_id(&post_id)?;
    services::delete_post(&state, user.id, post_id).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "post deleted".into(),
    }))
}

/// Malformed ids short-circuit before any store or storage round-trip.
fn parse_post_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId)
}

/// Pulls the `caption` and `file` fields out of a multipart body. Both are
/// optional here; each handler decides what it requires.
async fn read_post_form(
    mut mp: Multipart,
) -> Result<(Option<String>, Option<UploadPart>), AppError> {
    let mut caption = None;
    let mut file = None;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|_| AppError::Validation("malformed multipart body".into()))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("caption") => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| AppError::Validation("malformed caption field".into()))?;
                caption = Some(text);
            }
            Some("file") => {
                let filename = field
                    .file_name()
                    .unwrap_or("upload.bin")
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::Validation("malformed file field".into()))?;
                file = Some(UploadPart {
                    body,
                    filename,
                    content_type,
                });
            }
            _ => {}
        }
    }

    Ok((caption, file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_post_id_parses() {
        let id = Uuid::new_v4();
        assert_eq!(parse_post_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn malformed_post_id_is_invalid_id() {
        for raw in ["42", "not-a-uuid", ""] {
            assert!(matches!(
                parse_post_id(raw).unwrap_err(),
                AppError::InvalidId
            ));
        }
    }
}
