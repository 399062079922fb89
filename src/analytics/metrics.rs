//! Summary metric cards.

use super::{AnalysisOptions, mean};
use crate::Result;
use crate::corpus::Corpus;
use crate::model::{HashtagRow, Metrics, Video};
use crate::storage::Storage;
use std::collections::BTreeMap;

/// A hashtag counts as recommended when its mean views reach this.
pub const RECOMMENDED_MIN_AVG_VIEWS: f64 = 30_000.0;

/// Metric cards for `category` over the last `days` days.
///
/// # Errors
///
/// Returns an error if a storage query fails.
pub fn calculate_metrics(storage: &Storage, category: &str, days: u32) -> Result<Metrics> {
    calculate_metrics_with(storage, category, days, &AnalysisOptions::default())
}

/// [`calculate_metrics`] with explicit options.
///
/// # Errors
///
/// Returns an error if a storage query fails.
pub fn calculate_metrics_with(
    storage: &Storage,
    category: &str,
    days: u32,
    options: &AnalysisOptions,
) -> Result<Metrics> {
    let Some(corpus) = Corpus::resolve(storage, category, days, options.now)? else {
        return Ok(Metrics::empty());
    };

    let videos = corpus.videos()?;
    if videos.is_empty() {
        return Ok(Metrics::empty());
    }

    let distinct = corpus.strict_distinct_hashtags()?;
    let rows = corpus.hashtag_rows()?;
    Ok(summarize(&videos, &rows, distinct))
}

/// Build the cards from an already selected corpus.
#[must_use]
pub fn summarize(videos: &[Video], rows: &[HashtagRow], distinct_hashtags: usize) -> Metrics {
    #[allow(clippy::cast_precision_loss)]
    let Some(avg) = mean(videos.iter().map(|v| v.view_count as f64)) else {
        return Metrics::empty();
    };

    Metrics {
        avg_views: format_avg_views(avg),
        trending_topics: distinct_hashtags,
        recommended_hashtags: count_recommended_hashtags(rows),
        total_videos: videos.len(),
    }
}

/// "812" below a thousand, "1.5K" from a thousand up.
#[must_use]
pub fn format_avg_views(avg: f64) -> String {
    if avg >= 1000.0 {
        format!("{:.1}K", avg / 1000.0)
    } else {
        #[allow(clippy::cast_possible_truncation)]
        let whole = avg.trunc() as i64;
        whole.to_string()
    }
}

/// Hashtags whose mean views over `rows` reach [`RECOMMENDED_MIN_AVG_VIEWS`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn count_recommended_hashtags(rows: &[HashtagRow]) -> usize {
    let mut per_tag: BTreeMap<&str, (i64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = per_tag.entry(row.tag.as_str()).or_default();
        entry.0 += row.view_count;
        entry.1 += 1;
    }

    per_tag
        .values()
        .filter(|(views, count)| *views as f64 / *count as f64 >= RECOMMENDED_MIN_AVG_VIEWS)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tag: &str, views: i64) -> HashtagRow {
        HashtagRow {
            tag: tag.to_string(),
            view_count: views,
            like_count: 0,
        }
    }

    #[test]
    fn avg_views_formatting() {
        assert_eq!(format_avg_views(800.0), "800");
        assert_eq!(format_avg_views(999.9), "999");
        assert_eq!(format_avg_views(1500.0), "1.5K");
        assert_eq!(format_avg_views(1000.0), "1.0K");
        assert_eq!(format_avg_views(123_456.0), "123.5K");
        assert_eq!(format_avg_views(0.0), "0");
    }

    #[test]
    fn avg_views_has_one_decimal_before_k() {
        for avg in [1000.0, 2345.6, 99_999.0, 1_234_567.0] {
            let s = format_avg_views(avg);
            let digits = s.trim_end_matches('K');
            assert!(s.ends_with('K'));
            assert_eq!(digits.split('.').nth(1).map(str::len), Some(1), "{s}");
        }
    }

    #[test]
    fn recommended_hashtags_use_tag_means() {
        let rows = vec![
            row("a", 40_000),
            row("a", 20_000),
            row("b", 29_999),
            row("c", 100_000),
        ];
        // a averages 30,000 exactly, b falls short, c clears it.
        assert_eq!(count_recommended_hashtags(&rows), 2);
        assert_eq!(count_recommended_hashtags(&[]), 0);
    }
}
