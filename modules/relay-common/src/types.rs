use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Enums ---

/// Kind of media attached to a candidate post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Gif,
    Text,
    Other,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Gif => write!(f, "gif"),
            MediaKind::Text => write!(f, "text"),
            MediaKind::Other => write!(f, "other"),
        }
    }
}

/// Listing sort order supported by content sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Hot,
    Top,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Hot => write!(f, "hot"),
            SortOrder::Top => write!(f, "top"),
        }
    }
}

/// How aggressively the caption transformer rewrites text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Light,
    Moderate,
    Creative,
}

impl Intensity {
    /// Parse a config value. Unrecognized values fall back to `Moderate`.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "light" => Intensity::Light,
            "creative" => Intensity::Creative,
            _ => Intensity::Moderate,
        }
    }
}

impl std::fmt::Display for Intensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intensity::Light => write!(f, "light"),
            Intensity::Moderate => write!(f, "moderate"),
            Intensity::Creative => write!(f, "creative"),
        }
    }
}

/// Whether a human confirms each candidate before publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    Manual,
    Auto,
}

// --- Candidate ---

/// One post fetched from a content source. Immutable once fetched;
/// everything downstream reads it, nothing mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateItem {
    /// Source-assigned identifier, unique per source.
    pub id: String,
    pub title: String,
    /// Channel (subreddit) the item came from.
    pub channel: String,
    pub author: String,
    /// Popularity score at fetch time. Higher ranks earlier.
    pub score: i64,
    /// Origin URL of the post itself.
    pub url: String,
    /// URL of the attached media resource.
    pub media_url: String,
    pub media_kind: MediaKind,
    pub created_at: DateTime<Utc>,
    pub permalink: String,
}

// --- Content analysis ---

/// Sentiment/topic insights from the caption transformer's analyze call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub sentiment: String,
    pub topics: Vec<String>,
    pub engagement_estimate: String,
}

impl ContentAnalysis {
    /// Neutral record used whenever the analyze call fails or is disabled.
    pub fn neutral() -> Self {
        Self {
            sentiment: "neutral".to_string(),
            topics: vec!["general".to_string()],
            engagement_estimate: "medium".to_string(),
        }
    }
}
