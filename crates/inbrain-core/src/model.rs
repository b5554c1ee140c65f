//! Records shared by the store, the clustering client, and the insights engine.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

/// Source platform of a comment or import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Youtube,
    Tiktok,
    Email,
    Other,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Instagram,
        Platform::Youtube,
        Platform::Tiktok,
        Platform::Email,
        Platform::Other,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Email => "email",
            Platform::Other => "other",
        }
    }

    /// Parse a stored platform value, mapping anything unrecognized to
    /// [`Platform::Other`].
    #[must_use]
    pub fn from_stored(raw: &str) -> Self {
        raw.parse().unwrap_or(Platform::Other)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "youtube" => Ok(Platform::Youtube),
            "tiktok" => Ok(Platform::Tiktok),
            "email" => Ok(Platform::Email),
            "other" => Ok(Platform::Other),
            _ => Err(CoreError::InvalidPlatform(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Question,
}

impl Sentiment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Question => "question",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "question" => Ok(Sentiment::Question),
            _ => Err(CoreError::InvalidSentiment(s.to_string())),
        }
    }
}

/// A single audience comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: Platform,
    pub content: String,
    pub author_name: Option<String>,
    pub author_handle: Option<String>,
    pub post_url: Option<String>,
    pub post_title: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub import_id: Option<Uuid>,
    pub cluster_id: Option<Uuid>,
    pub is_processed: bool,
    pub original_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A named batch of comments ingested together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub platform: Platform,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentIdea {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Free-form tag such as `video`, `reel`, `post`, or `story`.
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
}

/// A stored insight cluster, or a consolidated view of several.
///
/// Fields default on deserialization so that partially populated upstream
/// records can still be consolidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Uuid,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sample_comments: Vec<String>,
    #[serde(default)]
    pub content_ideas: Vec<ContentIdea>,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub primary_platform: Option<Platform>,
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub import_ids: Vec<Uuid>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Last write to the stored row; reset bumps it.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Linked comments grouped by platform and import. Filled from
    /// `cluster_comments` when the cluster is read for display.
    #[serde(default, skip_serializing)]
    pub link_counts: Vec<LinkCount>,
    /// Linked comments per platform.
    #[serde(default)]
    pub platform_breakdown: BTreeMap<Platform, i64>,
    /// Comments counted under the active filter. Equals `comment_count` when
    /// no filter is applied.
    #[serde(default)]
    pub filtered_comment_count: i64,
}

/// Number of a cluster's linked comments sharing one platform and import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCount {
    pub platform: Platform,
    pub import_id: Option<Uuid>,
    pub count: i64,
}

impl Default for Cluster {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            theme: String::new(),
            summary: None,
            sample_comments: Vec::new(),
            content_ideas: Vec::new(),
            comment_count: 0,
            primary_platform: None,
            platforms: Vec::new(),
            import_ids: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
            link_counts: Vec::new(),
            platform_breakdown: BTreeMap::new(),
            filtered_comment_count: 0,
        }
    }
}

fn default_active() -> bool {
    true
}

impl Cluster {
    /// `true` if the cluster represents `platform` either in its platform set
    /// or as its primary platform.
    #[must_use]
    pub fn mentions_platform(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform) || self.primary_platform == Some(platform)
    }
}

/// A cluster produced by the clustering service, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCluster {
    pub theme: String,
    pub summary: Option<String>,
    pub sample_comments: Vec<String>,
    pub content_ideas: Vec<ContentIdea>,
    pub comment_count: i64,
    pub primary_platform: Option<Platform>,
    pub platforms: Vec<Platform>,
    pub import_ids: Vec<Uuid>,
    /// Comments assigned to this cluster by the service.
    pub comment_ids: Vec<Uuid>,
}

/// Aggregate comment counts for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentStats {
    pub total: i64,
    pub unprocessed: i64,
    pub by_platform: BTreeMap<Platform, i64>,
    pub by_sentiment: BTreeMap<Sentiment, i64>,
}

impl CommentStats {
    #[must_use]
    pub fn processed(&self) -> i64 {
        (self.total - self.unprocessed).max(0)
    }
}
