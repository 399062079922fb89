//! Supplementary reads: keyword video lookup, collection probe and trend
//! snapshots.
//!
//! Unlike the analytics entry points these are lookups, so an unknown
//! category is a [`TubeError::NotFound`] rather than an empty result.

use crate::model::{TrendSnapshot, Video};
use crate::storage::Storage;
use crate::{Result, TubeError};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

/// Default number of videos returned by [`keyword_videos`].
pub const DEFAULT_KEYWORD_VIDEO_LIMIT: usize = 10;

/// Videos in `category` whose title contains `keyword`, sampled at random
/// down to `limit` when more match.
///
/// # Errors
///
/// Returns [`TubeError::NotFound`] for an unknown category, or a storage error.
pub fn keyword_videos(
    storage: &Storage,
    category: &str,
    keyword: &str,
    limit: usize,
) -> Result<Vec<Video>> {
    keyword_videos_with_rng(storage, category, keyword, limit, &mut rand::thread_rng())
}

/// [`keyword_videos`] with a caller-supplied random source.
///
/// # Errors
///
/// Returns [`TubeError::NotFound`] for an unknown category, or a storage error.
pub fn keyword_videos_with_rng<R: Rng + ?Sized>(
    storage: &Storage,
    category: &str,
    keyword: &str,
    limit: usize,
    rng: &mut R,
) -> Result<Vec<Video>> {
    let category_id = storage
        .category_id(category)?
        .ok_or_else(|| TubeError::not_found("category", category))?;

    let matches = storage.videos_with_title_keyword(category_id, keyword)?;
    debug!(category, keyword, matches = matches.len(), "Keyword lookup");
    if matches.len() <= limit {
        return Ok(matches);
    }
    Ok(matches.choose_multiple(rng, limit).cloned().collect())
}

/// Latest collection time across all categories.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn last_collection_time(storage: &Storage) -> Result<Option<DateTime<Utc>>> {
    Ok(storage.last_collection_time()?)
}

/// Aggregate the whole category corpus into a snapshot and persist it.
///
/// `avg_engagement_rate` is `(likes + comments) / views * 100`.
///
/// # Errors
///
/// Returns [`TubeError::NotFound`] for an unknown category, or a storage error.
pub fn record_snapshot(
    storage: &Storage,
    category: &str,
    now: DateTime<Utc>,
) -> Result<TrendSnapshot> {
    let category_id = storage
        .category_id(category)?
        .ok_or_else(|| TubeError::not_found("category", category))?;
    let totals = storage.category_totals(category_id)?;

    #[allow(clippy::cast_precision_loss)]
    let (avg_views, avg_engagement_rate) = (
        if totals.videos > 0 {
            totals.views as f64 / totals.videos as f64
        } else {
            0.0
        },
        if totals.views > 0 {
            (totals.likes + totals.comments) as f64 / totals.views as f64 * 100.0
        } else {
            0.0
        },
    );

    let snapshot = TrendSnapshot {
        category: category.to_string(),
        snapshot_date: now,
        total_videos: totals.videos,
        total_views: totals.views,
        total_likes: totals.likes,
        total_comments: totals.comments,
        avg_views,
        avg_engagement_rate,
    };
    storage.store_snapshot(&snapshot)?;
    info!(category, videos = totals.videos, "Recorded trend snapshot");
    Ok(snapshot)
}

/// Stored snapshots for `category`, oldest first.
///
/// # Errors
///
/// Returns [`TubeError::NotFound`] for an unknown category, or a storage error.
pub fn snapshots(storage: &Storage, category: &str) -> Result<Vec<TrendSnapshot>> {
    if storage.category_id(category)?.is_none() {
        return Err(TubeError::not_found("category", category));
    }
    Ok(storage.snapshots(category)?)
}
