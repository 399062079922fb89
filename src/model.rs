//! Data models for collected video metadata and analytics results.
//!
//! Persisted entities mirror the `SQLite` schema in [`crate::storage`]. The
//! analytics structures are ephemeral and recomputed on every call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A collected video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub published_at: DateTime<Utc>,
    pub channel_id: String,
    pub channel_title: String,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub thumbnail_default: Option<String>,
    pub thumbnail_medium: Option<String>,
    pub thumbnail_high: Option<String>,
    pub collected_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A raw video record as produced by a [`crate::ingest::VideoSource`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawVideo {
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub thumbnail_default: Option<String>,
    #[serde(default)]
    pub thumbnail_medium: Option<String>,
    #[serde(default)]
    pub thumbnail_high: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One `(tag, views, likes)` row of the hashtag/video join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashtagRow {
    pub tag: String,
    pub view_count: i64,
    pub like_count: i64,
}

/// Hashtag usage count within a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagFrequency {
    pub tag: String,
    pub frequency: i64,
}

/// Persisted per-category aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSnapshot {
    pub category: String,
    pub snapshot_date: DateTime<Utc>,
    pub total_videos: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub avg_views: f64,
    pub avg_engagement_rate: f64,
}

/// Summary metric cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub avg_views: String,
    pub trending_topics: usize,
    pub recommended_hashtags: usize,
    pub total_videos: usize,
}

impl Metrics {
    /// The result for an unknown category or empty corpus.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            avg_views: "0".to_string(),
            trending_topics: 0,
            recommended_hashtags: 0,
            total_videos: 0,
        }
    }
}

/// One trend bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Period label, e.g. "3일 전" or "이번 주"
    pub date: String,
    /// Summed views in thousands, one decimal
    pub views: f64,
    /// Summed likes + comments
    pub engagement: i64,
    pub videos: usize,
}

/// A trending topic extracted from titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingTopic {
    pub topic: String,
    pub count: usize,
    pub growth: String,
}

/// Hashtag effectiveness row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashtagStat {
    pub tag: String,
    pub avg_views: i64,
    pub avg_likes: f64,
    pub video_count: usize,
    pub engagement_rate: f64,
    pub correlation: f64,
    pub growth: String,
}

/// Recommended hashtag combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagCombination {
    pub tags: Vec<String>,
    pub expected_views: String,
    pub correlation: String,
}

impl HashtagCombination {
    /// The combination reported when no hashtag qualifies.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tags: vec![],
            expected_views: "0".to_string(),
            correlation: "낮음".to_string(),
        }
    }
}

/// Hashtag scorer output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashtagAnalysis {
    pub hashtag_stats: Vec<HashtagStat>,
    pub recommended_hashtags: HashtagCombination,
    /// Category-wide `sum(likes) / sum(views) * 100`
    pub baseline_engagement: f64,
}

impl HashtagAnalysis {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            hashtag_stats: vec![],
            recommended_hashtags: HashtagCombination::empty(),
            baseline_engagement: 0.0,
        }
    }
}

/// Title pattern effectiveness row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitlePattern {
    pub pattern: String,
    pub avg_views: i64,
    pub count: usize,
}

/// Keyword sentiment tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Neutral => write!(f, "neutral"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

/// An effective title keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveKeyword {
    pub word: String,
    pub sentiment: Sentiment,
    pub frequency: usize,
}

/// Title pattern miner output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleAnalysis {
    pub title_patterns: Vec<TitlePattern>,
    pub effective_keywords: Vec<EffectiveKeyword>,
    pub recommendation: String,
}

/// Trend bucketizer plus topic extractor output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub trend_data: Vec<TrendPoint>,
    pub trending_topics: Vec<TrendingTopic>,
}

/// A wordcloud entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordcloudEntry {
    pub word: String,
    pub size: u32,
    pub frequency: i64,
}

/// Full analysis bundle for one category and window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub category: String,
    pub time_range: String,
    pub total_videos: usize,
    pub avg_views: String,
    pub trending_topics: Vec<TrendingTopic>,
    pub trend_data: Vec<TrendPoint>,
    pub hashtag_stats: Vec<HashtagStat>,
    pub recommended_hashtags: HashtagCombination,
    pub title_patterns: Vec<TitlePattern>,
    pub effective_keywords: Vec<EffectiveKeyword>,
    pub recommendation: String,
}
