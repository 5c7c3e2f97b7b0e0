//! End-to-end pipeline runs against in-memory doubles.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tokio::time::Instant;

use relay_common::{CandidateItem, ContentAnalysis, Intensity, MediaKind, SortOrder};
use relay_pipeline::{
    compose_caption, CaptionTransformer, ContentSource, DedupSet, FetchError,
    FnGate, MediaFetch, Pipeline, PipelineSettings, PublishError, PublisherSession, RunError,
    TempMedia, DEFAULT_TAGS,
};

// --- Doubles ---

/// Canned listings per channel; channels in `failing` error out.
struct FixtureSource {
    listings: HashMap<String, Vec<CandidateItem>>,
    failing: HashSet<String>,
}

impl FixtureSource {
    fn new(listings: Vec<(&str, Vec<CandidateItem>)>) -> Self {
        Self {
            listings: listings
                .into_iter()
                .map(|(c, items)| (c.to_string(), items))
                .collect(),
            failing: HashSet::new(),
        }
    }

    fn with_failing(mut self, channel: &str) -> Self {
        self.failing.insert(channel.to_string());
        self
    }
}

#[async_trait]
impl ContentSource for FixtureSource {
    async fn fetch(
        &self,
        channel: &str,
        limit: u32,
        _sort: SortOrder,
    ) -> Result<Vec<CandidateItem>, FetchError> {
        if self.failing.contains(channel) {
            return Err(FetchError::Transport("listing unavailable".to_string()));
        }
        Ok(self
            .listings
            .get(channel)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(limit as usize)
            .collect())
    }
}

/// Shared probe into a [`ScriptedPublisher`], inspectable after the run.
#[derive(Default)]
struct PublisherLog {
    captions: Mutex<Vec<String>>,
    publish_calls: AtomicU32,
    closed: AtomicBool,
}

impl PublisherLog {
    fn captions(&self) -> Vec<String> {
        self.captions.lock().unwrap().clone()
    }

    fn publish_calls(&self) -> u32 {
        self.publish_calls.load(Ordering::SeqCst)
    }

    fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Publisher whose outcomes are scripted per call; Ok once the script is
/// exhausted.
struct ScriptedPublisher {
    log: Arc<PublisherLog>,
    script: Mutex<VecDeque<Result<(), PublishError>>>,
}

impl ScriptedPublisher {
    fn ok() -> (Self, Arc<PublisherLog>) {
        Self::scripted(vec![])
    }

    fn scripted(script: Vec<Result<(), PublishError>>) -> (Self, Arc<PublisherLog>) {
        let log = Arc::new(PublisherLog::default());
        (
            Self {
                log: log.clone(),
                script: Mutex::new(script.into()),
            },
            log,
        )
    }
}

#[async_trait]
impl PublisherSession for ScriptedPublisher {
    async fn publish(&self, media_path: &Path, caption: &str) -> Result<(), PublishError> {
        assert!(
            media_path.exists(),
            "media file must exist at publish time"
        );
        self.log.publish_calls.fetch_add(1, Ordering::SeqCst);
        self.log.captions.lock().unwrap().push(caption.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.log.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Media fetcher that never touches the network. Records every temp path
/// it issues so tests can assert cleanup after the run.
struct MemoryMediaFetcher {
    issued: Arc<Mutex<Vec<PathBuf>>>,
}

impl MemoryMediaFetcher {
    fn new() -> (Self, Arc<Mutex<Vec<PathBuf>>>) {
        let issued = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                issued: issued.clone(),
            },
            issued,
        )
    }
}

#[async_trait]
impl MediaFetch for MemoryMediaFetcher {
    async fn fetch(&self, _url: &str) -> Result<TempMedia, FetchError> {
        let media = TempMedia::from_bytes(b"media payload")?;
        self.issued
            .lock()
            .unwrap()
            .push(media.path().to_path_buf());
        Ok(media)
    }
}

/// Transformer that always succeeds with fixed output.
struct StaticTransformer;

#[async_trait]
impl CaptionTransformer for StaticTransformer {
    async fn rewrite(&self, _: &str, _: &str, _: &str, _: Intensity) -> Result<String> {
        Ok("rewritten caption".to_string())
    }

    async fn tags(&self, _: &str, _: &str, _: &str, _: u32) -> Result<String> {
        Ok("#one #two".to_string())
    }

    async fn analyze(&self, _: &str, _: &str) -> Result<ContentAnalysis> {
        Ok(ContentAnalysis {
            sentiment: "positive".to_string(),
            topics: vec!["sports".to_string()],
            engagement_estimate: "high".to_string(),
        })
    }
}

/// Transformer whose every call errors.
struct FailingTransformer;

#[async_trait]
impl CaptionTransformer for FailingTransformer {
    async fn rewrite(&self, _: &str, _: &str, _: &str, _: Intensity) -> Result<String> {
        Err(anyhow!("model unavailable"))
    }

    async fn tags(&self, _: &str, _: &str, _: &str, _: u32) -> Result<String> {
        Err(anyhow!("model unavailable"))
    }

    async fn analyze(&self, _: &str, _: &str) -> Result<ContentAnalysis> {
        Err(anyhow!("model unavailable"))
    }
}

// --- Helpers ---

fn candidate(id: &str, channel: &str, score: i64, kind: MediaKind) -> CandidateItem {
    CandidateItem {
        id: id.to_string(),
        title: format!("Title for {id}"),
        channel: channel.to_string(),
        author: "poster".to_string(),
        score,
        url: format!("https://example.com/{id}"),
        media_url: format!("https://example.com/{id}.jpg"),
        media_kind: kind,
        created_at: Utc::now(),
        permalink: format!("https://reddit.com/r/{channel}/{id}"),
    }
}

fn image(id: &str, channel: &str, score: i64) -> CandidateItem {
    candidate(id, channel, score, MediaKind::Image)
}

fn settings(channels: &[&str]) -> PipelineSettings {
    PipelineSettings {
        channels: channels.iter().map(|c| c.to_string()).collect(),
        limit_per_channel: 10,
        media_kind_filter: MediaKind::Image,
        intensity: Intensity::Moderate,
        sort: SortOrder::Hot,
        publish_cooldown: Duration::ZERO,
        session_cooldown: Duration::ZERO,
    }
}

fn pipeline(
    settings: PipelineSettings,
    source: FixtureSource,
    publisher: ScriptedPublisher,
) -> (Pipeline, Arc<Mutex<Vec<PathBuf>>>) {
    let (fetcher, issued) = MemoryMediaFetcher::new();
    let pipeline = Pipeline::new(settings, Box::new(source), Box::new(publisher))
        .with_media_fetcher(Box::new(fetcher));
    (pipeline, issued)
}

fn assert_all_removed(issued: &Mutex<Vec<PathBuf>>) {
    for path in issued.lock().unwrap().iter() {
        assert!(!path.exists(), "leaked temp media at {}", path.display());
    }
}

// --- Tests ---

#[tokio::test]
async fn publishes_every_accepted_candidate() {
    let source = FixtureSource::new(vec![(
        "mma",
        vec![image("a", "mma", 10), image("b", "mma", 5), image("c", "mma", 1)],
    )]);
    let (publisher, log) = ScriptedPublisher::ok();
    let (pipeline, issued) = pipeline(settings(&["mma"]), source, publisher);

    let outcome = pipeline.run().await;

    assert!(outcome.fatal.is_none());
    assert_eq!(outcome.stats.fetched, 3);
    assert_eq!(outcome.stats.published, 3);
    assert_eq!(outcome.stats.accounted(), outcome.stats.fetched);
    assert!(log.closed());
    // No transformer wired: the base caption goes out untouched.
    assert_eq!(log.captions()[0], compose_caption("Title for a"));
    assert_all_removed(&issued);
}

#[tokio::test]
async fn preseeded_ids_are_never_republished() {
    let source = FixtureSource::new(vec![("mma", vec![image("a", "mma", 10), image("b", "mma", 5)])]);
    let (publisher, log) = ScriptedPublisher::ok();
    let (pipeline, _) = pipeline(settings(&["mma"]), source, publisher);
    let pipeline = pipeline.with_dedup(DedupSet::preseeded(["a", "b"]));

    let outcome = pipeline.run().await;

    assert_eq!(outcome.stats.skipped_duplicate, 2);
    assert_eq!(outcome.stats.published, 0);
    assert_eq!(log.publish_calls(), 0);
    assert!(log.closed());
}

#[tokio::test]
async fn same_id_across_channels_publishes_once() {
    let source = FixtureSource::new(vec![
        ("mma", vec![image("x1", "mma", 10)]),
        ("ufc", vec![image("x1", "ufc", 8)]),
    ]);
    let (publisher, log) = ScriptedPublisher::ok();
    let (pipeline, _) = pipeline(settings(&["mma", "ufc"]), source, publisher);

    let outcome = pipeline.run().await;

    assert_eq!(outcome.stats.fetched, 2);
    assert_eq!(outcome.stats.published, 1);
    assert_eq!(outcome.stats.skipped_duplicate, 1);
    assert_eq!(log.publish_calls(), 1);
}

#[tokio::test]
async fn wrong_media_kind_is_counted_separately() {
    let source = FixtureSource::new(vec![(
        "mma",
        vec![
            image("a", "mma", 10),
            candidate("v", "mma", 9, MediaKind::Video),
            candidate("t", "mma", 8, MediaKind::Text),
        ],
    )]);
    let (publisher, _) = ScriptedPublisher::ok();
    let (pipeline, _) = pipeline(settings(&["mma"]), source, publisher);

    let outcome = pipeline.run().await;

    assert_eq!(outcome.stats.skipped_wrong_kind, 2);
    assert_eq!(outcome.stats.skipped_duplicate, 0);
    assert_eq!(outcome.stats.published, 1);
}

#[tokio::test]
async fn failed_channel_does_not_sink_the_run() {
    let source = FixtureSource::new(vec![("mma", vec![image("a", "mma", 10)])])
        .with_failing("down");
    let (publisher, _) = ScriptedPublisher::ok();
    let (pipeline, _) = pipeline(settings(&["down", "mma"]), source, publisher);

    let outcome = pipeline.run().await;

    assert!(outcome.fatal.is_none());
    assert_eq!(outcome.stats.fetched, 1);
    assert_eq!(outcome.stats.published, 1);
}

#[tokio::test]
async fn publish_failure_cleans_media_and_continues() {
    let source = FixtureSource::new(vec![("mma", vec![image("a", "mma", 10), image("b", "mma", 5)])]);
    let (publisher, log) = ScriptedPublisher::scripted(vec![Err(PublishError::Transport(
        "connection reset".to_string(),
    ))]);
    let (pipeline, issued) = pipeline(settings(&["mma"]), source, publisher);

    let outcome = pipeline.run().await;

    assert!(outcome.fatal.is_none());
    assert_eq!(outcome.stats.failed, 1);
    assert_eq!(outcome.stats.published, 1);
    assert_eq!(log.publish_calls(), 2);
    assert_all_removed(&issued);
}

#[tokio::test]
async fn authentication_failure_halts_the_run() {
    let source = FixtureSource::new(vec![(
        "mma",
        vec![image("a", "mma", 10), image("b", "mma", 5), image("c", "mma", 1)],
    )]);
    let (publisher, log) = ScriptedPublisher::scripted(vec![Err(PublishError::Authentication(
        "session expired".to_string(),
    ))]);
    let (pipeline, issued) = pipeline(settings(&["mma"]), source, publisher);

    let outcome = pipeline.run().await;

    assert!(matches!(outcome.fatal, Some(RunError::Authentication(_))));
    assert_eq!(outcome.stats.published, 0);
    assert_eq!(outcome.stats.failed, 1);
    // Remaining candidates are untouched.
    assert_eq!(log.publish_calls(), 1);
    assert!(log.closed(), "session must be closed even on a fatal run");
    assert_all_removed(&issued);
}

#[tokio::test(start_paused = true)]
async fn cooldown_runs_after_every_publish() {
    let source = FixtureSource::new(vec![("mma", vec![image("a", "mma", 10), image("b", "mma", 5)])]);
    let (publisher, _) = ScriptedPublisher::ok();
    let mut settings = settings(&["mma"]);
    settings.publish_cooldown = Duration::from_secs(5);
    let (pipeline, _) = pipeline(settings, source, publisher);

    let before = Instant::now();
    let outcome = pipeline.run().await;

    assert_eq!(outcome.stats.published, 2);
    assert!(before.elapsed() >= Duration::from_secs(10));
}

#[tokio::test]
async fn rewrite_failure_publishes_original_caption_untouched() {
    let source = FixtureSource::new(vec![("mma", vec![image("a", "mma", 10)])]);
    let (publisher, log) = ScriptedPublisher::ok();
    let (pipeline, _) = pipeline(settings(&["mma"]), source, publisher);
    let pipeline = pipeline.with_transformer(Box::new(FailingTransformer));

    let outcome = pipeline.run().await;

    assert_eq!(outcome.stats.published, 1);
    assert_eq!(log.captions(), vec![compose_caption("Title for a")]);
}

#[tokio::test]
async fn rewrite_success_appends_generated_tags() {
    let source = FixtureSource::new(vec![("mma", vec![image("a", "mma", 10)])]);
    let (publisher, log) = ScriptedPublisher::ok();
    let (pipeline, _) = pipeline(settings(&["mma"]), source, publisher);
    let pipeline = pipeline.with_transformer(Box::new(StaticTransformer));

    let outcome = pipeline.run().await;

    assert_eq!(outcome.stats.published, 1);
    assert_eq!(log.captions(), vec!["rewritten caption\n\n#one #two".to_string()]);
}

/// Rewrite works but tag generation fails; the default block fills in.
struct TaglessTransformer;

#[async_trait]
impl CaptionTransformer for TaglessTransformer {
    async fn rewrite(&self, _: &str, _: &str, _: &str, _: Intensity) -> Result<String> {
        Ok("rewritten caption".to_string())
    }

    async fn tags(&self, _: &str, _: &str, _: &str, _: u32) -> Result<String> {
        Err(anyhow!("model unavailable"))
    }

    async fn analyze(&self, _: &str, _: &str) -> Result<ContentAnalysis> {
        Ok(ContentAnalysis::neutral())
    }
}

#[tokio::test]
async fn tag_failure_falls_back_to_default_tags() {
    let source = FixtureSource::new(vec![("mma", vec![image("a", "mma", 10)])]);
    let (publisher, log) = ScriptedPublisher::ok();
    let (pipeline, _) = pipeline(settings(&["mma"]), source, publisher);
    let pipeline = pipeline.with_transformer(Box::new(TaglessTransformer));

    let outcome = pipeline.run().await;

    assert_eq!(outcome.stats.published, 1);
    assert_eq!(
        log.captions(),
        vec![format!("rewritten caption\n\n{DEFAULT_TAGS}")]
    );
}

#[tokio::test]
async fn rejection_leaves_no_trace() {
    let source = FixtureSource::new(vec![("mma", vec![image("a", "mma", 10)])]);
    let (publisher, log) = ScriptedPublisher::ok();
    let (pipeline, issued) = pipeline(settings(&["mma"]), source, publisher);
    let pipeline = pipeline.with_gate(Box::new(FnGate(|_: &CandidateItem, _: &str| false)));

    let outcome = pipeline.run().await;

    assert_eq!(outcome.stats.skipped_rejected, 1);
    assert_eq!(outcome.stats.published, 0);
    assert_eq!(log.publish_calls(), 0);
    assert_all_removed(&issued);
}

#[tokio::test]
async fn approval_gate_sees_the_final_caption() {
    let source = FixtureSource::new(vec![("mma", vec![image("a", "mma", 10)])]);
    let (publisher, _) = ScriptedPublisher::ok();
    let (pipeline, _) = pipeline(settings(&["mma"]), source, publisher);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let captured = seen.clone();
    let pipeline = pipeline
        .with_transformer(Box::new(StaticTransformer))
        .with_gate(Box::new(FnGate(move |_: &CandidateItem, caption: &str| {
            captured.lock().unwrap().push(caption.to_string());
            true
        })));

    pipeline.run().await;

    assert_eq!(
        seen.lock().unwrap().clone(),
        vec!["rewritten caption\n\n#one #two".to_string()]
    );
}

#[tokio::test]
async fn cancellation_stops_before_the_next_candidate() {
    let source = FixtureSource::new(vec![("mma", vec![image("a", "mma", 10), image("b", "mma", 5)])]);
    let (publisher, log) = ScriptedPublisher::ok();
    let (pipeline, _) = pipeline(settings(&["mma"]), source, publisher);

    let (tx, rx) = watch::channel(true);
    let pipeline = pipeline.with_cancellation(rx);

    let outcome = pipeline.run().await;
    drop(tx);

    assert!(outcome.fatal.is_none());
    assert_eq!(outcome.stats.fetched, 2);
    assert_eq!(outcome.stats.accounted(), 0);
    assert_eq!(log.publish_calls(), 0);
    assert!(log.closed());
}

#[tokio::test]
async fn higher_scores_publish_first() {
    let source = FixtureSource::new(vec![(
        "mma",
        vec![image("low", "mma", 1), image("high", "mma", 100), image("mid", "mma", 50)],
    )]);
    let (publisher, log) = ScriptedPublisher::ok();
    let (pipeline, _) = pipeline(settings(&["mma"]), source, publisher);

    pipeline.run().await;

    assert_eq!(
        log.captions(),
        vec![
            compose_caption("Title for high"),
            compose_caption("Title for mid"),
            compose_caption("Title for low"),
        ]
    );
}

#[tokio::test]
async fn empty_channel_list_is_a_config_error() {
    let source = FixtureSource::new(vec![]);
    let (publisher, log) = ScriptedPublisher::ok();
    let (pipeline, _) = pipeline(settings(&[]), source, publisher);

    let outcome = pipeline.run().await;

    assert!(matches!(outcome.fatal, Some(RunError::Config(_))));
    assert_eq!(outcome.stats.fetched, 0);
    assert!(log.closed());
}
