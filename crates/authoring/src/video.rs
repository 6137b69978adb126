//! Lazily fetched secure video URLs.

use backend::{AuthToken, BackendError, ContentApi};
use common::{TopicId, preview};

use crate::error::{AuthoringError, Result};

/// What the video viewer currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoState {
    Loading,
    /// A short-lived playable URL.
    Ready(String),
    Failed(String),
}

/// Viewer for one topic's video.
///
/// The URL is requested when the viewer opens and dropped when it closes;
/// it is never cached across openings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoViewer {
    topic_id: TopicId,
    state: VideoState,
}

impl VideoViewer {
    /// Opens the viewer and resolves the secure URL.
    #[tracing::instrument(skip(backend, token))]
    pub async fn open<B: ContentApi + ?Sized>(
        backend: &B,
        token: Option<&AuthToken>,
        topic_id: TopicId,
    ) -> Self {
        let state = match Self::resolve(backend, token, topic_id).await {
            Ok(url) => VideoState::Ready(url),
            Err(e) => VideoState::Failed(e.to_string()),
        };
        Self { topic_id, state }
    }

    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    pub fn state(&self) -> &VideoState {
        &self.state
    }

    /// The playable URL, if resolved.
    pub fn url(&self) -> Option<&str> {
        match &self.state {
            VideoState::Ready(url) => Some(url),
            _ => None,
        }
    }

    /// Fetches the URL, mapping failures to operator-facing errors.
    pub async fn resolve<B: ContentApi + ?Sized>(
        backend: &B,
        token: Option<&AuthToken>,
        topic_id: TopicId,
    ) -> Result<String> {
        let token = token.ok_or(AuthoringError::NotAuthenticated)?;
        match backend.secure_video_url(token, topic_id).await {
            Ok(url) => {
                tracing::debug!(%topic_id, "secure video url resolved");
                Ok(url)
            }
            Err(e) => {
                tracing::warn!(%topic_id, error = %e, "secure video url unavailable");
                Err(match e {
                    BackendError::Forbidden { .. } => AuthoringError::NotAuthorized,
                    BackendError::MissingField(_) => AuthoringError::VideoUnavailable(
                        "Secure video endpoint did not provide a redirect URL.".to_string(),
                    ),
                    BackendError::Network(_) => AuthoringError::VideoUnavailable(
                        "Network error: Could not connect to the video service.".to_string(),
                    ),
                    other => AuthoringError::VideoUnavailable(format!(
                        "Failed to fetch secure video URL. Status: {}. Message: {}",
                        other
                            .status()
                            .map_or_else(|| "unknown".to_string(), |s| s.to_string()),
                        preview(other.server_message().unwrap_or_default())
                    )),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use backend::{InMemoryBackend, Operation};
    use common::TopicId;

    use super::*;

    #[tokio::test]
    async fn test_no_token_makes_no_request() {
        let backend = InMemoryBackend::new();
        let viewer = VideoViewer::open(&backend, None, TopicId::new(1)).await;
        assert_eq!(
            viewer.state(),
            &VideoState::Failed("Authentication token missing. Please log in.".into())
        );
        assert_eq!(backend.call_count(Operation::SecureVideo).await, 0);
    }

    #[tokio::test]
    async fn test_server_error_is_previewed() {
        let backend = InMemoryBackend::new();
        let token = backend.seed_user("Asha", "Rao", "asha@example.com").await;
        let long = "e".repeat(300);
        backend
            .set_failure(Operation::SecureVideo, 500, Some(&long))
            .await;

        let err = VideoViewer::resolve(&backend, Some(&token), TopicId::new(1))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Failed to fetch secure video URL. Status: 500. Message: "));
        assert!(message.ends_with(&"e".repeat(100)));
        assert!(!message.ends_with(&"e".repeat(101)));
    }
}
