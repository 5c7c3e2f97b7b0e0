use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_captioner::CaptionOptimizer;
use instagram_client::{Credentials, InstagramClient};
use reddit_client::RedditClient;
use relay_common::{ApprovalMode, Config};
use relay_pipeline::{
    AutoApprove, DryRunPublisher, InstagramPublisher, OpenAiTransformer, Pipeline,
    PipelineSettings, PublisherSession, RedditSource, StdinGate,
};

/// Forum-to-Instagram repost pipeline.
#[derive(Parser, Debug)]
#[command(name = "relay", version)]
struct Args {
    /// Channels to fetch, comma-separated. Overrides RELAY_CHANNELS.
    #[arg(long, value_delimiter = ',')]
    channels: Vec<String>,

    /// Log instead of posting; no Instagram session is opened.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("relay_pipeline=info".parse()?))
        .init();

    info!("Relay starting...");

    let args = Args::parse();

    // Load config
    let mut config = Config::from_env()?;
    if !args.channels.is_empty() {
        config.channels = args.channels.clone();
    }
    config.log_redacted();

    let settings = PipelineSettings::from_config(&config);

    let source = RedditSource::new(RedditClient::new(&config.reddit_user_agent));

    // Open the destination session up front so a bad credential fails fast.
    let session: Box<dyn PublisherSession> = if args.dry_run {
        info!("Dry run: publishes will be logged, not sent");
        Box::new(DryRunPublisher)
    } else {
        let client = InstagramClient::new();
        let session = client
            .authenticate(&Credentials {
                username: config.instagram_username.clone(),
                password: config.instagram_password.clone(),
            })
            .await?;
        Box::new(InstagramPublisher::new(session))
    };

    let mut pipeline = Pipeline::new(settings, Box::new(source), session);

    if !config.openai_api_key.is_empty() {
        let optimizer = CaptionOptimizer::new(&config.openai_api_key);
        pipeline = pipeline.with_transformer(Box::new(OpenAiTransformer::new(optimizer)));
    }

    pipeline = match config.approval_mode {
        ApprovalMode::Manual => pipeline.with_gate(Box::new(StdinGate)),
        ApprovalMode::Auto => pipeline.with_gate(Box::new(AutoApprove)),
    };

    let outcome = pipeline.run().await;
    println!("{}", outcome.stats);

    if let Some(fatal) = outcome.fatal {
        return Err(fatal.into());
    }
    Ok(())
}
