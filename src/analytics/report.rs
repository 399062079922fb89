//! Full analysis bundle for one category and window.

use super::{
    AnalysisOptions, analyze_hashtags_with, analyze_title_patterns_with, analyze_trends_with,
    calculate_metrics_with, range_label,
};
use crate::Result;
use crate::model::AnalysisReport;
use crate::storage::Storage;
use tracing::debug;

/// Metrics, trends, hashtags and title analysis in one report.
///
/// # Errors
///
/// Returns an error if a storage query fails.
pub fn analysis_report(storage: &Storage, category: &str, days: u32) -> Result<AnalysisReport> {
    analysis_report_with(storage, category, days, &AnalysisOptions::default())
}

/// [`analysis_report`] with explicit options. Every component reads its own
/// corpus, exactly as when called on its own.
///
/// # Errors
///
/// Returns an error if a storage query fails.
pub fn analysis_report_with(
    storage: &Storage,
    category: &str,
    days: u32,
    options: &AnalysisOptions,
) -> Result<AnalysisReport> {
    let metrics = calculate_metrics_with(storage, category, days, options)?;
    let trends = analyze_trends_with(storage, category, days, options)?;
    let hashtags = analyze_hashtags_with(storage, category, days, options)?;
    let titles = analyze_title_patterns_with(storage, category, days, options)?;

    debug!(
        category,
        days,
        videos = metrics.total_videos,
        "Built analysis report"
    );

    Ok(AnalysisReport {
        category: category.to_string(),
        time_range: range_label(days),
        total_videos: metrics.total_videos,
        avg_views: metrics.avg_views,
        trending_topics: trends.trending_topics,
        trend_data: trends.trend_data,
        hashtag_stats: hashtags.hashtag_stats,
        recommended_hashtags: hashtags.recommended_hashtags,
        title_patterns: titles.title_patterns,
        effective_keywords: titles.effective_keywords,
        recommendation: titles.recommendation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HashtagCombination;

    #[test]
    fn unknown_category_report_is_empty() {
        let storage = Storage::open_memory().unwrap();
        let report = analysis_report(&storage, "없는카테고리", 7).unwrap();
        assert_eq!(report.category, "없는카테고리");
        assert_eq!(report.time_range, "7days");
        assert_eq!(report.total_videos, 0);
        assert_eq!(report.avg_views, "0");
        assert!(report.trend_data.is_empty());
        assert!(report.hashtag_stats.is_empty());
        assert_eq!(report.recommended_hashtags, HashtagCombination::empty());
        assert_eq!(report.recommendation, "");
    }
}
