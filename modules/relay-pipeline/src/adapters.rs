//! Live implementations of the collaborator seams, wrapping the narrow
//! client crates.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use ai_captioner::CaptionOptimizer;
use instagram_client::{InstagramError, Session};
use reddit_client::RedditClient;
use relay_common::{CandidateItem, ContentAnalysis, Intensity, SortOrder};

use crate::error::{FetchError, PublishError};
use crate::traits::{CaptionTransformer, ContentSource, PublisherSession};

// --- Reddit ---

pub struct RedditSource {
    client: RedditClient,
}

impl RedditSource {
    pub fn new(client: RedditClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentSource for RedditSource {
    async fn fetch(
        &self,
        channel: &str,
        limit: u32,
        sort: SortOrder,
    ) -> Result<Vec<CandidateItem>, FetchError> {
        self.client
            .listing(channel, sort, limit)
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

// --- OpenAI captioner ---

pub struct OpenAiTransformer {
    optimizer: CaptionOptimizer,
}

impl OpenAiTransformer {
    pub fn new(optimizer: CaptionOptimizer) -> Self {
        Self { optimizer }
    }
}

#[async_trait]
impl CaptionTransformer for OpenAiTransformer {
    async fn rewrite(
        &self,
        original_caption: &str,
        channel: &str,
        title: &str,
        intensity: Intensity,
    ) -> Result<String> {
        self.optimizer
            .rewrite(original_caption, channel, title, intensity)
            .await
    }

    async fn tags(
        &self,
        channel: &str,
        title: &str,
        caption_prefix: &str,
        count: u32,
    ) -> Result<String> {
        self.optimizer
            .tags(channel, title, caption_prefix, count)
            .await
    }

    async fn analyze(&self, title: &str, caption: &str) -> Result<ContentAnalysis> {
        self.optimizer.analyze(title, caption).await
    }
}

// --- Instagram ---

/// Owns the authenticated session for the run. `close` takes the session
/// out, so a publish after close maps to `Unknown` rather than panicking.
pub struct InstagramPublisher {
    session: Mutex<Option<Session>>,
}

impl InstagramPublisher {
    pub fn new(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

#[async_trait]
impl PublisherSession for InstagramPublisher {
    async fn publish(&self, media_path: &Path, caption: &str) -> Result<(), PublishError> {
        let guard = self.session.lock().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| PublishError::Unknown("session already closed".to_string()))?;
        session
            .publish_photo(media_path, caption)
            .await
            .map_err(map_instagram_error)
    }

    async fn close(&self) -> Result<(), PublishError> {
        if let Some(session) = self.session.lock().await.take() {
            session.close().await.map_err(map_instagram_error)?;
        }
        Ok(())
    }
}

pub(crate) fn map_instagram_error(err: InstagramError) -> PublishError {
    if err.is_auth() {
        return PublishError::Authentication(err.to_string());
    }
    match err {
        InstagramError::Network(msg) => PublishError::Transport(msg),
        InstagramError::Api { status, message } if (400..500).contains(&status) => {
            PublishError::RejectedByPlatform(format!("status {status}: {message}"))
        }
        InstagramError::Api { status, message } => {
            PublishError::Transport(format!("status {status}: {message}"))
        }
        other => PublishError::Unknown(other.to_string()),
    }
}

// --- Dry run ---

/// Publisher that logs instead of posting. Lets the whole pipeline run
/// against live sources without touching the destination account.
pub struct DryRunPublisher;

#[async_trait]
impl PublisherSession for DryRunPublisher {
    async fn publish(&self, media_path: &Path, caption: &str) -> Result<(), PublishError> {
        info!(
            media = %media_path.display(),
            caption_chars = caption.len(),
            "[dry-run] would publish"
        );
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_authentication() {
        let err = map_instagram_error(InstagramError::Auth("bad password".into()));
        assert!(matches!(err, PublishError::Authentication(_)));

        let err = map_instagram_error(InstagramError::Api {
            status: 401,
            message: "expired".into(),
        });
        assert!(matches!(err, PublishError::Authentication(_)));
    }

    #[test]
    fn client_errors_map_to_rejection() {
        let err = map_instagram_error(InstagramError::Api {
            status: 422,
            message: "bad media".into(),
        });
        assert!(matches!(err, PublishError::RejectedByPlatform(_)));
    }

    #[test]
    fn server_and_network_errors_map_to_transport() {
        let err = map_instagram_error(InstagramError::Api {
            status: 503,
            message: "down".into(),
        });
        assert!(matches!(err, PublishError::Transport(_)));

        let err = map_instagram_error(InstagramError::Network("reset".into()));
        assert!(matches!(err, PublishError::Transport(_)));
    }

    #[test]
    fn io_errors_map_to_unknown() {
        let err = map_instagram_error(InstagramError::Io("missing file".into()));
        assert!(matches!(err, PublishError::Unknown(_)));
    }
}
