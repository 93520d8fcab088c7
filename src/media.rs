use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::storage::StorageClient;

/// Classification of an uploaded asset, derived from its declared
/// content type at upload time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Durable description of a remotely hosted asset.
#[derive(Debug, Clone)]
pub struct MediaRef {
    pub url: String,
    /// Name assigned by the store, unique per upload; distinct from the
    /// client's original filename.
    pub name: String,
    pub kind: MediaKind,
}

/// Wraps the object store: one call turns raw bytes plus a filename into a
/// MediaRef, or fails without constructing one. The byte buffer is the only
/// staging resource and is dropped on every exit path.
#[derive(Clone)]
pub struct MediaGateway {
    storage: Arc<dyn StorageClient>,
}

impl MediaGateway {
    pub fn new(storage: Arc<dyn StorageClient>) -> Self {
        Self { storage }
    }

    /// Transfers the bytes to the remote store. No idempotency: retrying the
    /// same content yields a new object under a new canonical name.
    #[instrument(skip(self, body), fields(len = body.len()))]
    pub async fn upload(
        &self,
        body: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<MediaRef, AppError> {
        let kind = MediaKind::from_content_type(content_type);
        let name = canonical_name(filename, content_type);
        self.storage
            .put_object(&name, body, content_type)
            .await
            .map_err(AppError::UploadFailed)?;
        let url = self.storage.object_url(&name);
        debug!(%name, %url, kind = kind.as_str(), "media uploaded");
        Ok(MediaRef { url, name, kind })
    }

    /// Reconciliation hook for replaced or deleted posts. Nothing calls this
    /// in the request path today; the sweep that will is future work.
    pub async fn delete(&self, canonical_name: &str) -> Result<(), AppError> {
        self.storage
            .delete_object(canonical_name)
            .await
            .map_err(AppError::UploadFailed)
    }
}

fn canonical_name(filename: &str, content_type: &str) -> String {
    let ext = ext_from_mime(content_type)
        .or_else(|| filename.rsplit_once('.').map(|(_, e)| e))
        .unwrap_or("bin");
    format!("posts/{}.{}", Uuid::new_v4(), ext)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        "video/quicktime" => Some("mov"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::async_trait;

    struct OkStorage;

    #[async_trait]
    impl StorageClient for OkStorage {
        async fn put_object(&self, _k: &str, _b: Bytes, _ct: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn delete_object(&self, _k: &str) -> anyhow::Result<()> {
            Ok(())
        }
        fn object_url(&self, key: &str) -> String {
            format!("https://media.local/{}", key)
        }
    }

    struct FailStorage;

    #[async_trait]
    impl StorageClient for FailStorage {
        async fn put_object(&self, _k: &str, _b: Bytes, _ct: &str) -> anyhow::Result<()> {
            anyhow::bail!("connection reset")
        }
        async fn delete_object(&self, _k: &str) -> anyhow::Result<()> {
            anyhow::bail!("connection reset")
        }
        fn object_url(&self, key: &str) -> String {
            format!("https://media.local/{}", key)
        }
    }

    #[test]
    fn kind_from_content_type() {
        assert_eq!(MediaKind::from_content_type("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_content_type("video/webm"), MediaKind::Video);
        assert_eq!(MediaKind::from_content_type("image/png"), MediaKind::Image);
        // anything that is not video/* counts as image
        assert_eq!(
            MediaKind::from_content_type("application/octet-stream"),
            MediaKind::Image
        );
    }

    #[test]
    fn ext_prefers_mime_then_filename() {
        assert!(canonical_name("cat.heic", "image/png").ends_with(".png"));
        assert!(canonical_name("clip.mov", "application/octet-stream").ends_with(".mov"));
        assert!(canonical_name("blob", "application/octet-stream").ends_with(".bin"));
    }

    #[test]
    fn canonical_names_are_unique_per_upload() {
        let a = canonical_name("a.png", "image/png");
        let b = canonical_name("a.png", "image/png");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn upload_builds_media_ref() {
        let gw = MediaGateway::new(Arc::new(OkStorage));
        let media = gw
            .upload(Bytes::from_static(b"bytes"), "clip.mp4", "video/mp4")
            .await
            .expect("upload");
        assert_eq!(media.kind, MediaKind::Video);
        assert!(media.name.starts_with("posts/"));
        assert!(media.url.contains(&media.name));
    }

    #[tokio::test]
    async fn failed_transfer_yields_no_media_ref() {
        let gw = MediaGateway::new(Arc::new(FailStorage));
        let err = gw
            .upload(Bytes::from_static(b"bytes"), "a.png", "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UploadFailed(_)));
    }
}
