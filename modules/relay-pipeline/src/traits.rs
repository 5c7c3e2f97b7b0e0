//! Collaborator seams for the pipeline.
//!
//! Each has a live network-backed implementation in `adapters` and test
//! doubles in the integration test harness. The orchestrator depends only
//! on these contracts.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use relay_common::{CandidateItem, ContentAnalysis, Intensity, SortOrder};

use crate::error::{FetchError, PublishError};
use crate::media::TempMedia;

/// Yields candidate posts per named channel. Finite; a channel listing is
/// not restartable across calls.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(
        &self,
        channel: &str,
        limit: u32,
        sort: SortOrder,
    ) -> Result<Vec<CandidateItem>, FetchError>;
}

/// Optional text-transform collaborator. All three calls are enrichment
/// only: the orchestrator falls back to the untouched original content
/// whenever one of them errors.
#[async_trait]
pub trait CaptionTransformer: Send + Sync {
    async fn rewrite(
        &self,
        original_caption: &str,
        channel: &str,
        title: &str,
        intensity: Intensity,
    ) -> Result<String>;

    async fn tags(
        &self,
        channel: &str,
        title: &str,
        caption_prefix: &str,
        count: u32,
    ) -> Result<String>;

    async fn analyze(&self, title: &str, caption: &str) -> Result<ContentAnalysis>;
}

/// Retrieves a remote media resource into a scoped temporary handle and
/// normalizes it for the destination platform.
#[async_trait]
pub trait MediaFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<TempMedia, FetchError>;

    /// Bound dimensions and color model to the platform's limits. The
    /// default is a pass-through for sources that already comply.
    async fn normalize(&self, media: TempMedia) -> Result<TempMedia, FetchError> {
        Ok(media)
    }
}

/// Human checkpoint before publish. Pass-through in fully automated mode.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn decide(&self, candidate: &CandidateItem, caption: &str) -> bool;
}

/// An authenticated destination-platform session. Exactly one owner (the
/// orchestrator) for the lifetime of a run; no other component publishes.
#[async_trait]
pub trait PublisherSession: Send + Sync {
    async fn publish(&self, media_path: &Path, caption: &str) -> Result<(), PublishError>;

    /// Teardown (logout). Called on every run exit path.
    async fn close(&self) -> Result<(), PublishError>;
}
