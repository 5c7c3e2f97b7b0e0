//! Sequential repost pipeline: fetch candidates from forum channels,
//! dedupe, normalize media, optionally rewrite captions, gate, publish
//! with pacing, and report run statistics.

pub mod adapters;
pub mod approval;
pub mod dedup;
pub mod error;
pub mod media;
pub mod pacing;
pub mod pipeline;
pub mod stats;
pub mod traits;

pub use adapters::{DryRunPublisher, InstagramPublisher, OpenAiTransformer, RedditSource};
pub use approval::{AutoApprove, FnGate, StdinGate};
pub use dedup::DedupSet;
pub use error::{FetchError, PublishError, RunError};
pub use media::{HttpMediaFetcher, TempMedia, MEDIA_MAX_DIMENSION};
pub use pacing::PacingController;
pub use pipeline::{compose_caption, Pipeline, PipelineSettings, RunOutcome, DEFAULT_TAGS};
pub use stats::RunStats;
pub use traits::{ApprovalGate, CaptionTransformer, ContentSource, MediaFetch, PublisherSession};
