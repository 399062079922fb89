//! Category and time-window corpus selection.
//!
//! Every analytics component reads through here. A window holding fewer than
//! [`MIN_WINDOW_ROWS`] rows is widened to the category's whole corpus.

use crate::Result;
use crate::model::{HashtagRow, Video};
use crate::storage::Storage;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Windows smaller than this fall back to the whole category.
pub const MIN_WINDOW_ROWS: usize = 10;

/// Start of a `days`-long window ending at `now`. Windows reaching past the
/// representable range start at [`DateTime::<Utc>::MIN_UTC`], i.e. no cutoff.
#[must_use]
pub fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Return `strict` unless it is sparse, in which case `widen` supplies the
/// replacement. The flag reports whether widening happened.
///
/// # Errors
///
/// Propagates the error from `widen`.
pub fn widen_if_sparse<T, F>(strict: Vec<T>, widen: F) -> Result<(Vec<T>, bool)>
where
    F: FnOnce() -> Result<Vec<T>>,
{
    if strict.len() >= MIN_WINDOW_ROWS {
        return Ok((strict, false));
    }
    Ok((widen()?, true))
}

/// A category resolved against storage, with the window cutoff fixed.
///
/// `resolve` returns `None` for categories that have never been stored, which
/// callers turn into their empty result.
pub struct Corpus<'a> {
    storage: &'a Storage,
    category: &'a str,
    category_id: i64,
    since: DateTime<Utc>,
}

impl<'a> Corpus<'a> {
    /// Resolve `category` and compute the window start from `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the category lookup fails.
    pub fn resolve(
        storage: &'a Storage,
        category: &'a str,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>> {
        let Some(category_id) = storage.category_id(category)? else {
            debug!(category, "Unknown category, returning empty corpus");
            return Ok(None);
        };
        Ok(Some(Self {
            storage,
            category,
            category_id,
            since: window_start(now, days),
        }))
    }

    #[must_use]
    pub const fn category(&self) -> &str {
        self.category
    }

    #[must_use]
    pub const fn since(&self) -> DateTime<Utc> {
        self.since
    }

    /// Window videos, widened to the whole category when sparse.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn videos(&self) -> Result<Vec<Video>> {
        let strict = self.storage.category_videos(self.category_id, Some(self.since))?;
        let (videos, widened) = widen_if_sparse(strict, || {
            Ok(self.storage.category_videos(self.category_id, None)?)
        })?;
        if widened {
            debug!(category = self.category, rows = videos.len(), "Widened video window");
        }
        Ok(videos)
    }

    /// Hashtag join rows, widened independently of the video window.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn hashtag_rows(&self) -> Result<Vec<HashtagRow>> {
        let strict = self.storage.hashtag_rows(self.category_id, Some(self.since))?;
        let (rows, widened) = widen_if_sparse(strict, || {
            Ok(self.storage.hashtag_rows(self.category_id, None)?)
        })?;
        if widened {
            debug!(category = self.category, rows = rows.len(), "Widened hashtag window");
        }
        Ok(rows)
    }

    /// Distinct hashtags in the strict window.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn strict_distinct_hashtags(&self) -> Result<usize> {
        let count = self
            .storage
            .distinct_hashtag_count(self.category_id, Some(self.since))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Hashtag frequencies in the strict window, capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn strict_tag_frequencies(&self, limit: usize) -> Result<Vec<crate::model::TagFrequency>> {
        Ok(self
            .storage
            .tag_frequencies(self.category_id, Some(self.since), limit)?)
    }
}
