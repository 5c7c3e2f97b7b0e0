mod client;
pub mod types;

use anyhow::Result;
use tracing::debug;

use relay_common::{ContentAnalysis, Intensity};

use crate::client::OpenAiClient;
use crate::types::{AnalysisPayload, ChatMessage, ChatRequest, ResponseFormat};

const CAPTION_MODEL: &str = "gpt-4o-mini";
const TAG_MODEL: &str = "gpt-3.5-turbo";
const ANALYSIS_MODEL: &str = "gpt-4o-mini";

/// Caption optimizer backed by OpenAI chat completions.
///
/// Every method returns a plain `Result`; the pipeline's fail-soft fallback
/// (original caption, default tags, neutral analysis) lives at the call
/// site so it also covers transformers that are not OpenAI-backed.
pub struct CaptionOptimizer {
    client: OpenAiClient,
}

impl CaptionOptimizer {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: OpenAiClient::new(api_key),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.client = self.client.with_base_url(url);
        self
    }

    /// Rewrite a caption for the destination platform.
    pub async fn rewrite(
        &self,
        original_caption: &str,
        channel: &str,
        title: &str,
        intensity: Intensity,
    ) -> Result<String> {
        let personality = match intensity {
            Intensity::Light => "Make minimal improvements to grammar and clarity.",
            Intensity::Moderate => {
                "Make it engaging and Instagram-friendly while maintaining the original message."
            }
            Intensity::Creative => {
                "Transform this into a highly engaging, viral-worthy Instagram caption with personality."
            }
        };

        let request = ChatRequest {
            model: CAPTION_MODEL.to_string(),
            messages: vec![
                ChatMessage::system(format!(
                    "You are an expert Instagram content creator specializing in \
                     optimizing Reddit content for Instagram. {personality}"
                )),
                ChatMessage::user(format!(
                    "This is a Reddit post from r/{channel} with the title: '{title}'\n\n\
                     The current caption is: '{original_caption}'\n\n\
                     Create an optimized Instagram caption that will maximize engagement. \
                     Keep it under 2200 characters and include relevant hashtags."
                )),
            ],
            response_format: None,
        };

        let caption = self.client.chat(&request).await?;
        debug!(channel, intensity = %intensity, "Caption rewritten");
        Ok(caption)
    }

    /// Generate a hashtag string for the post.
    pub async fn tags(
        &self,
        channel: &str,
        title: &str,
        caption_prefix: &str,
        count: u32,
    ) -> Result<String> {
        let request = ChatRequest {
            model: TAG_MODEL.to_string(),
            messages: vec![
                ChatMessage::system(
                    "You are an expert at creating targeted Instagram hashtags that \
                     maximize reach and engagement.",
                ),
                ChatMessage::user(format!(
                    "Generate {count} optimized hashtags for an Instagram post converted \
                     from Reddit r/{channel}. The post title is '{title}' and the caption \
                     starts with '{caption_prefix}...' Return ONLY the hashtags without \
                     explanation, separated by spaces, including the # symbol."
                )),
            ],
            response_format: None,
        };

        Ok(self.client.chat(&request).await?.trim().to_string())
    }

    /// Analyze sentiment, topics, and expected engagement.
    pub async fn analyze(&self, title: &str, caption: &str) -> Result<ContentAnalysis> {
        let request = ChatRequest {
            model: ANALYSIS_MODEL.to_string(),
            messages: vec![
                ChatMessage::system(
                    "You are an expert social media content analyzer. Provide analysis \
                     in JSON format only.",
                ),
                ChatMessage::user(format!(
                    "Analyze this content for Instagram - Title: '{title}', \
                     Caption: '{caption}'. Return a JSON object with these keys: \
                     sentiment (positive, negative, neutral), topics (array of relevant \
                     topics), and engagement_prediction (high, medium, low)."
                )),
            ],
            response_format: Some(ResponseFormat::json_object()),
        };

        let raw = self.client.chat(&request).await?;
        let payload: AnalysisPayload = serde_json::from_str(&raw)?;

        Ok(ContentAnalysis {
            sentiment: payload.sentiment,
            topics: if payload.topics.is_empty() {
                vec!["general".to_string()]
            } else {
                payload.topics
            },
            engagement_estimate: if payload.engagement_prediction.is_empty() {
                "medium".to_string()
            } else {
                payload.engagement_prediction
            },
        })
    }
}
