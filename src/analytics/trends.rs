//! Trend bucketing: daily for a 7-day window, weekly otherwise.

use super::{AnalysisOptions, round_to, topics};
use crate::Result;
use crate::corpus::Corpus;
use crate::model::{TrendAnalysis, TrendPoint, Video};
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// The only window length bucketed per day.
pub const DAILY_WINDOW_DAYS: u32 = 7;

/// Trend buckets plus trending topics for `category`.
///
/// # Errors
///
/// Returns an error if a storage query fails.
pub fn analyze_trends(storage: &Storage, category: &str, days: u32) -> Result<TrendAnalysis> {
    analyze_trends_with(storage, category, days, &AnalysisOptions::default())
}

/// [`analyze_trends`] with explicit options.
///
/// # Errors
///
/// Returns an error if a storage query fails.
pub fn analyze_trends_with(
    storage: &Storage,
    category: &str,
    days: u32,
    options: &AnalysisOptions,
) -> Result<TrendAnalysis> {
    let empty = TrendAnalysis {
        trend_data: vec![],
        trending_topics: vec![],
    };
    let Some(corpus) = Corpus::resolve(storage, category, days, options.now)? else {
        return Ok(empty);
    };

    let videos = corpus.videos()?;
    if videos.is_empty() {
        return Ok(empty);
    }

    Ok(TrendAnalysis {
        trend_data: bucketize(&videos, days, options.now),
        trending_topics: topics::extract_topics(&videos, category),
    })
}

#[derive(Debug, Default, Clone, Copy)]
struct BucketTotals {
    views: i64,
    likes: i64,
    comments: i64,
    videos: usize,
}

/// Whole days between publication and `now`, clamped to `[0, days]`.
fn days_ago(published_at: DateTime<Utc>, now: DateTime<Utc>, days: u32) -> i64 {
    (now - published_at)
        .num_days()
        .clamp(0, i64::from(days))
}

fn week_index(days_ago: i64) -> i64 {
    match days_ago {
        ..=6 => 0,
        7..=13 => 1,
        14..=20 => 2,
        21..=27 => 3,
        _ => 4,
    }
}

fn daily_label(days_ago: i64) -> String {
    if days_ago == 0 {
        "오늘".to_string()
    } else {
        format!("{days_ago}일 전")
    }
}

fn weekly_label(weeks_ago: i64) -> String {
    if weeks_ago == 0 {
        "이번 주".to_string()
    } else {
        format!("{weeks_ago}주 전")
    }
}

/// Aggregate videos into labelled buckets ordered oldest first.
///
/// The daily layout always has eight buckets ("7일 전" .. "오늘"), empty ones
/// zero-filled. The weekly layout only reports buckets that hold videos.
#[must_use]
pub fn bucketize(videos: &[Video], days: u32, now: DateTime<Utc>) -> Vec<TrendPoint> {
    let daily = days == DAILY_WINDOW_DAYS;

    // Keyed by age, so reverse iteration runs oldest to newest.
    let mut buckets: BTreeMap<i64, BucketTotals> = BTreeMap::new();
    if daily {
        for age in 0..=i64::from(DAILY_WINDOW_DAYS) {
            buckets.insert(age, BucketTotals::default());
        }
    }

    for video in videos {
        let age = days_ago(video.published_at, now, days);
        let key = if daily { age } else { week_index(age) };
        let bucket = buckets.entry(key).or_default();
        bucket.views += video.view_count;
        bucket.likes += video.like_count;
        bucket.comments += video.comment_count;
        bucket.videos += 1;
    }

    buckets
        .into_iter()
        .rev()
        .map(|(key, totals)| {
            #[allow(clippy::cast_precision_loss)]
            let views = round_to(totals.views as f64 / 1000.0, 1);
            TrendPoint {
                date: if daily { daily_label(key) } else { weekly_label(key) },
                views,
                engagement: totals.likes + totals.comments,
                videos: totals.videos,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 20, 15, 0, 0).single().unwrap()
    }

    fn video(hours_ago: i64, views: i64) -> Video {
        Video {
            video_id: format!("v{hours_ago}"),
            title: "제목".to_string(),
            description: None,
            category: Some("음악".to_string()),
            published_at: now() - Duration::hours(hours_ago),
            channel_id: "c".to_string(),
            channel_title: "C".to_string(),
            view_count: views,
            like_count: 10,
            comment_count: 2,
            thumbnail_default: None,
            thumbnail_medium: None,
            thumbnail_high: None,
            collected_at: now(),
            updated_at: None,
        }
    }

    #[test]
    fn daily_layout_has_eight_zero_filled_buckets() {
        let videos = vec![video(1, 1500), video(2, 500), video(50, 2000)];
        let points = bucketize(&videos, 7, now());

        let labels: Vec<&str> = points.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(
            labels,
            ["7일 전", "6일 전", "5일 전", "4일 전", "3일 전", "2일 전", "1일 전", "오늘"]
        );
        let today = &points[7];
        assert_eq!(today.videos, 2);
        assert!((today.views - 2.0).abs() < 1e-9);
        assert_eq!(today.engagement, 24);
        assert_eq!(points[5].videos, 1);
        assert_eq!(points[0].videos, 0);
    }

    #[test]
    fn old_and_future_videos_are_clamped() {
        let videos = vec![video(24 * 40, 100), video(-5, 100)];
        let points = bucketize(&videos, 7, now());
        assert_eq!(points[0].videos, 1);
        assert_eq!(points[7].videos, 1);
        assert_eq!(points.iter().map(|p| p.videos).sum::<usize>(), 2);
    }

    #[test]
    fn weekly_layout_skips_empty_weeks() {
        let videos = vec![
            video(24, 1000),
            video(24 * 8, 1000),
            video(24 * 29, 1000),
            video(24 * 90, 1000),
        ];
        let points = bucketize(&videos, 30, now());
        let labels: Vec<&str> = points.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(labels, ["4주 전", "1주 전", "이번 주"]);
        assert_eq!(points[0].videos, 2);
    }

    #[test]
    fn views_are_thousands_with_one_decimal() {
        let points = bucketize(&[video(1, 12_345), video(2, 10)], 30, now());
        assert_eq!(points.len(), 1);
        assert!((points[0].views - 12.4).abs() < 1e-9);
    }

    #[test]
    fn week_boundaries() {
        assert_eq!(week_index(0), 0);
        assert_eq!(week_index(6), 0);
        assert_eq!(week_index(7), 1);
        assert_eq!(week_index(20), 2);
        assert_eq!(week_index(27), 3);
        assert_eq!(week_index(28), 4);
    }
}
