pub mod error;
pub mod types;

pub use error::{RedditError, Result};
pub use types::{Listing, RedditPost};

use std::time::Duration;

use tracing::debug;

use relay_common::{CandidateItem, SortOrder};

const BASE_URL: &str = "https://www.reddit.com";

/// Client for Reddit's public JSON listing API. Read-only; no OAuth flow is
/// needed for subreddit listings, only a descriptive User-Agent.
pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
}

impl RedditClient {
    pub fn new(user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch up to `limit` posts from one subreddit listing.
    pub async fn listing(
        &self,
        subreddit: &str,
        sort: SortOrder,
        limit: u32,
    ) -> Result<Vec<CandidateItem>> {
        let url = format!("{}/r/{}/{}.json", self.base_url, subreddit, sort);

        debug!(subreddit, sort = %sort, limit, "Fetching subreddit listing");

        let resp = self
            .client
            .get(&url)
            .query(&[("limit", limit.to_string()), ("raw_json", "1".to_string())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RedditError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let listing: Listing = resp.json().await?;
        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data.into_candidate())
            .collect())
    }
}
