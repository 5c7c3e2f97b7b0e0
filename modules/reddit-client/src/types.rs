use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use relay_common::{CandidateItem, MediaKind};

/// Envelope around every Reddit listing response.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData {
    pub children: Vec<ListingChild>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingChild {
    pub data: RedditPost,
}

/// A single post from a subreddit listing. Only the fields the relay
/// consumes; Reddit sends far more.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub subreddit: String,
    pub author: Option<String>,
    pub score: i64,
    pub url: String,
    pub permalink: String,
    /// Seconds since epoch, sent as a float.
    pub created_utc: f64,
    /// "image", "hosted:video", "rich:video", "link", "self"...
    pub post_hint: Option<String>,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub is_self: bool,
}

impl RedditPost {
    /// Classify the attached media from the hint fields and URL extension,
    /// the same signals the listing exposes for thumbnailing.
    pub fn media_kind(&self) -> MediaKind {
        if self.is_video || self.post_hint.as_deref() == Some("hosted:video") {
            return MediaKind::Video;
        }
        if self.is_self {
            return MediaKind::Text;
        }
        let url = self.url.to_lowercase();
        let path = url.split('?').next().unwrap_or(&url);
        if path.ends_with(".gif") || path.ends_with(".gifv") {
            MediaKind::Gif
        } else if path.ends_with(".jpg") || path.ends_with(".jpeg") || path.ends_with(".png") {
            MediaKind::Image
        } else if path.ends_with(".mp4") {
            MediaKind::Video
        } else if self.post_hint.as_deref() == Some("image") {
            MediaKind::Image
        } else {
            MediaKind::Other
        }
    }

    /// Convert to the pipeline's candidate type.
    pub fn into_candidate(self) -> CandidateItem {
        let media_kind = self.media_kind();
        let created_at: DateTime<Utc> = Utc
            .timestamp_opt(self.created_utc as i64, 0)
            .single()
            .unwrap_or_else(Utc::now);
        CandidateItem {
            permalink: format!("https://reddit.com{}", self.permalink),
            media_url: self.url.clone(),
            id: self.id,
            title: self.title,
            channel: self.subreddit,
            author: self.author.unwrap_or_else(|| "[deleted]".to_string()),
            score: self.score,
            url: self.url,
            media_kind,
            created_at,
        }
    }
}
