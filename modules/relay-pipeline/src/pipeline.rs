//! The pipeline orchestrator.
//!
//! One run walks fetch → filter → prepare → approve → publish → cooldown
//! over a merged candidate queue, strictly sequentially: a candidate is
//! fully resolved (published, rejected, or failed) before the next begins.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use relay_common::{
    CandidateItem, Config, ConfigError, ContentAnalysis, Intensity, MediaKind, SortOrder,
};

use crate::approval::AutoApprove;
use crate::dedup::DedupSet;
use crate::error::{FetchError, RunError};
use crate::media::{HttpMediaFetcher, TempMedia};
use crate::pacing::PacingController;
use crate::stats::RunStats;
use crate::traits::{
    ApprovalGate, CaptionTransformer, ContentSource, MediaFetch, PublisherSession,
};

/// Fallback hashtags when no transformer is available or its tags call fails.
pub const DEFAULT_TAGS: &str = "#viral #trending #reddit";

/// Hashtags requested from the transformer per post.
const TAG_COUNT: u32 = 10;

/// The caption a candidate gets before any optional rewriting.
pub fn compose_caption(title: &str) -> String {
    format!("{title} 🔥🔥🔥\n\n{DEFAULT_TAGS}")
}

/// Settings consumed by the pipeline core. The caller (CLI/web layer)
/// supplies them; see `Config` for the env surface.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub channels: Vec<String>,
    pub limit_per_channel: u32,
    pub media_kind_filter: MediaKind,
    pub intensity: Intensity,
    pub sort: SortOrder,
    pub publish_cooldown: Duration,
    pub session_cooldown: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            channels: config.channels.clone(),
            limit_per_channel: config.limit_per_channel,
            media_kind_filter: config.media_kind_filter,
            intensity: config.optimization_intensity,
            sort: SortOrder::Hot,
            publish_cooldown: Duration::from_secs(config.publish_cooldown_secs),
            session_cooldown: Duration::from_secs(config.session_cooldown_secs),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        Ok(())
    }
}

/// A candidate made ready to publish: finalized caption plus the scoped
/// media handle. Owned exclusively by the orchestrator for one publish
/// attempt; dropping it removes the temp media on every exit path.
struct PreparedPost {
    caption: String,
    media: TempMedia,
    analysis: ContentAnalysis,
}

/// Result of one run: the statistics are always populated, and a run-fatal
/// error (authentication, configuration) rides beside them instead of
/// replacing them.
#[derive(Debug)]
pub struct RunOutcome {
    pub stats: RunStats,
    pub fatal: Option<RunError>,
}

impl RunOutcome {
    pub fn is_failed(&self) -> bool {
        self.fatal.is_some()
    }
}

pub struct Pipeline {
    settings: PipelineSettings,
    source: Box<dyn ContentSource>,
    session: Box<dyn PublisherSession>,
    transformer: Option<Box<dyn CaptionTransformer>>,
    gate: Box<dyn ApprovalGate>,
    fetcher: Box<dyn MediaFetch>,
    pacing: PacingController,
    dedup: DedupSet,
    cancel: Option<watch::Receiver<bool>>,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        source: Box<dyn ContentSource>,
        session: Box<dyn PublisherSession>,
    ) -> Self {
        let pacing = PacingController::new(settings.publish_cooldown, settings.session_cooldown);
        Self {
            settings,
            source,
            session,
            transformer: None,
            gate: Box::new(AutoApprove),
            fetcher: Box::new(HttpMediaFetcher::new()),
            pacing,
            dedup: DedupSet::new(),
            cancel: None,
        }
    }

    pub fn with_transformer(mut self, transformer: Box<dyn CaptionTransformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    pub fn with_gate(mut self, gate: Box<dyn ApprovalGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_media_fetcher(mut self, fetcher: Box<dyn MediaFetch>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Replace the dedup set, e.g. pre-seeded with identifiers published by
    /// an earlier invocation.
    pub fn with_dedup(mut self, dedup: DedupSet) -> Self {
        self.dedup = dedup;
        self
    }

    /// External stop signal, checked at candidate boundaries.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Run the pipeline to completion. Consumes the pipeline: the session
    /// is closed on every exit path, fatal or not.
    pub async fn run(mut self) -> RunOutcome {
        let mut stats = RunStats::default();

        if let Err(e) = self.settings.validate() {
            error!(error = %e, "Refusing to run with invalid settings");
            self.teardown().await;
            return RunOutcome {
                stats,
                fatal: Some(RunError::Config(e)),
            };
        }

        self.pacing.cooldown_after_login().await;

        let mut candidates = self.fetch_all(&mut stats).await;
        rank(&mut candidates);
        info!(total = candidates.len(), "Candidate queue assembled");

        let mut fatal = None;
        for candidate in candidates {
            if self.cancelled() {
                info!("Stop requested, ending run at candidate boundary");
                break;
            }

            // Filtering. Survivors are marked seen here, not at publish, so
            // a failure later in the cycle cannot re-offer the same item.
            if candidate.media_kind != self.settings.media_kind_filter {
                stats.skipped_wrong_kind += 1;
                continue;
            }
            if self.dedup.seen(&candidate.id) {
                stats.skipped_duplicate += 1;
                continue;
            }
            self.dedup.mark(&candidate.id);

            // Preparing.
            let prepared = match self.prepare(&candidate).await {
                Ok(p) => p,
                Err(e) => {
                    warn!(
                        id = candidate.id.as_str(),
                        channel = candidate.channel.as_str(),
                        stage = "prepare",
                        error = %e,
                        "Candidate preparation failed"
                    );
                    stats.failed += 1;
                    continue;
                }
            };

            // AwaitingApproval. A rejection has no side effects beyond the
            // counter; the media handle is released by the drop.
            if !self.gate.decide(&candidate, &prepared.caption).await {
                info!(
                    id = candidate.id.as_str(),
                    channel = candidate.channel.as_str(),
                    "Rejected at approval gate"
                );
                stats.skipped_rejected += 1;
                continue;
            }

            // Publishing. One attempt; no per-candidate retry.
            match self
                .session
                .publish(prepared.media.path(), &prepared.caption)
                .await
            {
                Ok(()) => {
                    stats.published += 1;
                    info!(
                        id = candidate.id.as_str(),
                        channel = candidate.channel.as_str(),
                        score = candidate.score,
                        sentiment = prepared.analysis.sentiment.as_str(),
                        engagement = prepared.analysis.engagement_estimate.as_str(),
                        "Published"
                    );
                    // Release the media before cooling so the handle never
                    // outlives its candidate.
                    drop(prepared);
                    self.pacing.cooldown_after_publish().await;
                }
                Err(e) if e.is_fatal() => {
                    error!(
                        id = candidate.id.as_str(),
                        channel = candidate.channel.as_str(),
                        error = %e,
                        "Session unusable, halting run"
                    );
                    stats.failed += 1;
                    fatal = Some(RunError::Authentication(e.to_string()));
                    break;
                }
                Err(e) => {
                    warn!(
                        id = candidate.id.as_str(),
                        channel = candidate.channel.as_str(),
                        stage = "publish",
                        error = %e,
                        "Publish failed"
                    );
                    stats.failed += 1;
                }
            }
        }

        self.teardown().await;
        info!("{stats}");
        RunOutcome { stats, fatal }
    }

    /// Pull up to N candidates per channel and merge. The only point where
    /// channels are combined; per-channel fetch failures are logged and the
    /// remaining channels still contribute.
    async fn fetch_all(&self, stats: &mut RunStats) -> Vec<CandidateItem> {
        let mut all = Vec::new();
        for channel in &self.settings.channels {
            match self
                .source
                .fetch(channel, self.settings.limit_per_channel, self.settings.sort)
                .await
            {
                Ok(items) => {
                    info!(channel = channel.as_str(), count = items.len(), "Fetched listing");
                    stats.fetched += items.len() as u32;
                    all.extend(items);
                }
                Err(e) => {
                    warn!(channel = channel.as_str(), error = %e, "Channel fetch failed");
                }
            }
        }
        all
    }

    async fn prepare(&self, candidate: &CandidateItem) -> Result<PreparedPost, FetchError> {
        let media = self.fetcher.fetch(&candidate.media_url).await?;
        let media = self.fetcher.normalize(media).await?;

        let base_caption = compose_caption(&candidate.title);
        let (caption, analysis) = match &self.transformer {
            None => (base_caption, ContentAnalysis::neutral()),
            Some(transformer) => {
                self.transform(transformer.as_ref(), candidate, base_caption)
                    .await
            }
        };

        Ok(PreparedPost {
            caption,
            media,
            analysis,
        })
    }

    /// Apply the optional enrichment calls, falling back to the untouched
    /// original content whenever one of them errors.
    async fn transform(
        &self,
        transformer: &dyn CaptionTransformer,
        candidate: &CandidateItem,
        base_caption: String,
    ) -> (String, ContentAnalysis) {
        let caption = match transformer
            .rewrite(
                &base_caption,
                &candidate.channel,
                &candidate.title,
                self.settings.intensity,
            )
            .await
        {
            Ok(rewritten) => {
                let prefix: String = rewritten.chars().take(100).collect();
                let tags = match transformer
                    .tags(&candidate.channel, &candidate.title, &prefix, TAG_COUNT)
                    .await
                {
                    Ok(tags) if !tags.trim().is_empty() => tags,
                    Ok(_) => DEFAULT_TAGS.to_string(),
                    Err(e) => {
                        warn!(
                            id = candidate.id.as_str(),
                            stage = "tags",
                            error = %e,
                            "Tag generation failed, using defaults"
                        );
                        DEFAULT_TAGS.to_string()
                    }
                };
                format!("{rewritten}\n\n{tags}")
            }
            Err(e) => {
                // Pass the original through byte-for-byte; a failed
                // enrichment never costs the candidate.
                warn!(
                    id = candidate.id.as_str(),
                    stage = "rewrite",
                    error = %e,
                    "Caption rewrite failed, keeping original"
                );
                base_caption
            }
        };

        let analysis = match transformer.analyze(&candidate.title, &caption).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(
                    id = candidate.id.as_str(),
                    stage = "analyze",
                    error = %e,
                    "Content analysis failed, using neutral record"
                );
                ContentAnalysis::neutral()
            }
        };

        (caption, analysis)
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    async fn teardown(&self) {
        if let Err(e) = self.session.close().await {
            warn!(error = %e, "Session close failed");
        }
    }
}

/// Highest popularity score first; ties keep source fetch order (the sort
/// is stable).
fn rank(candidates: &mut [CandidateItem]) {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
}
