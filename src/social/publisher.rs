//! Caption, upload and post one captured image.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use super::caption::caption_for;
use super::client::{PostRecord, SocialApi, SocialError};

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The image can no longer be read. Retrying will not help.
    #[error("cannot read {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Api(#[from] SocialError),
}

impl PublishError {
    /// Whether publishing the same file again might succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PublishError::Artifact { .. })
    }
}

/// Publishes one image file. Failures are returned, never retried here.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, path: &Path) -> Result<PostRecord, PublishError>;
}

/// Posts through a [`SocialApi`] account.
#[derive(Debug)]
pub struct MediaPublisher<A> {
    api: A,
}

impl<A: SocialApi> MediaPublisher<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

#[async_trait]
impl<A: SocialApi> Publisher for MediaPublisher<A> {
    async fn publish(&self, path: &Path) -> Result<PostRecord, PublishError> {
        let artifact = |source: io::Error| PublishError::Artifact {
            path: path.to_path_buf(),
            source,
        };
        let caption = caption_for(path).map_err(artifact)?;
        let bytes = tokio::fs::read(path).await.map_err(artifact)?;

        log::debug!("Uploading {} ({} bytes)", path.display(), bytes.len());
        let media_id = self.api.upload_media(bytes).await?;
        let post = self.api.create_post(&caption, &media_id).await?;
        log::info!("Posted {} as {} \"{}\"", path.display(), post.id, post.text);
        Ok(post)
    }
}

/// Logs what would be posted and succeeds without touching the network.
#[derive(Debug, Default)]
pub struct DryRunPublisher {
    published: AtomicU64,
}

impl DryRunPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of publish calls so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, path: &Path) -> Result<PostRecord, PublishError> {
        let n = self.published.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!("[dry-run] would publish {}", path.display());
        Ok(PostRecord {
            id: format!("dry-run-{}", n),
            text: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::client::MediaId;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        uploads: Mutex<Vec<usize>>,
        posts: Mutex<Vec<(String, MediaId)>>,
        fail_upload: bool,
    }

    #[async_trait]
    impl SocialApi for FakeApi {
        async fn upload_media(&self, bytes: Vec<u8>) -> Result<MediaId, SocialError> {
            if self.fail_upload {
                return Err(SocialError::ApiError {
                    status: 503,
                    message: "over capacity".to_string(),
                });
            }
            self.uploads.lock().unwrap().push(bytes.len());
            Ok(MediaId("42".to_string()))
        }

        async fn create_post(
            &self,
            text: &str,
            media_id: &MediaId,
        ) -> Result<PostRecord, SocialError> {
            self.posts
                .lock()
                .unwrap()
                .push((text.to_string(), media_id.clone()));
            Ok(PostRecord {
                id: "1".to_string(),
                text: text.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_publish_uploads_then_posts_with_caption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motion-20261019-140322.jpg");
        std::fs::write(&path, b"0123456789").unwrap();

        let publisher = MediaPublisher::new(FakeApi::default());
        let post = publisher.publish(&path).await.unwrap();

        assert_eq!(*publisher.api().uploads.lock().unwrap(), vec![10]);
        let posts = publisher.api().posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].1, MediaId("42".to_string()));
        assert!(posts[0].0.contains(" UTC"));
        assert_eq!(post.text, posts[0].0);
    }

    #[tokio::test]
    async fn test_vanished_file_is_not_retryable() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = MediaPublisher::new(FakeApi::default());

        let err = publisher
            .publish(&dir.path().join("motion-gone.jpg"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Artifact { .. }));
        assert!(!err.is_retryable());
        assert!(publisher.api().uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_api_failure_is_retryable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motion-20261019-140322.jpg");
        std::fs::write(&path, b"jpeg").unwrap();
        let publisher = MediaPublisher::new(FakeApi {
            fail_upload: true,
            ..FakeApi::default()
        });

        let err = publisher.publish(&path).await.unwrap_err();

        assert!(matches!(err, PublishError::Api(SocialError::ApiError { status: 503, .. })));
        assert!(err.is_retryable());
        assert!(publisher.api().posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_counts_without_reading_file() {
        let publisher = DryRunPublisher::new();
        publisher.publish(Path::new("/nonexistent/a.jpg")).await.unwrap();
        let post = publisher.publish(Path::new("/nonexistent/b.jpg")).await.unwrap();
        assert_eq!(publisher.published(), 2);
        assert_eq!(post.id, "dry-run-2");
    }
}
