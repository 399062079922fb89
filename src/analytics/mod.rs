//! Creator-facing analytics over a category corpus.
//!
//! Each entry point takes `(storage, category, days)` and recomputes from a
//! fresh read; nothing is cached between calls. The `_with` variants accept
//! [`AnalysisOptions`] so callers can pin `now` and extend the denylist.
//!
//! Unknown categories and empty corpora produce each component's documented
//! empty result instead of an error.

pub mod hashtags;
pub mod metrics;
pub mod report;
pub mod title_patterns;
pub mod topics;
pub mod trends;
pub mod wordcloud;

pub use hashtags::{HashtagScoring, HeuristicScoring, analyze_hashtags, analyze_hashtags_with};
pub use metrics::{calculate_metrics, calculate_metrics_with};
pub use report::{analysis_report, analysis_report_with};
pub use title_patterns::{analyze_title_patterns, analyze_title_patterns_with};
pub use trends::{analyze_trends, analyze_trends_with};
pub use wordcloud::{wordcloud, wordcloud_with};

use crate::config::{Config, DenylistConfig};
use chrono::{DateTime, Utc};

/// Wordcloud size cap when the caller does not give one.
pub const DEFAULT_WORDCLOUD_LIMIT: usize = 20;

/// Per-call knobs shared by every analytics entry point.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Reference time for window cutoffs and day buckets.
    pub now: DateTime<Utc>,
    /// Extra hashtag denylist entries merged over the built-in table.
    pub denylist: DenylistConfig,
    /// Maximum wordcloud entries.
    pub wordcloud_limit: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            now: Utc::now(),
            denylist: DenylistConfig::default(),
            wordcloud_limit: DEFAULT_WORDCLOUD_LIMIT,
        }
    }
}

impl AnalysisOptions {
    /// Default options evaluated at a fixed instant.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// Options taking the denylist and wordcloud limit from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            now: Utc::now(),
            denylist: config.denylist.clone(),
            wordcloud_limit: config.analytics.wordcloud_limit,
        }
    }
}

/// Window length for a range name: "7days" is a week, anything else 30 days.
#[must_use]
pub fn days_for_range(range: &str) -> u32 {
    if range == "7days" { 7 } else { 30 }
}

/// Range label reported alongside a window length.
#[must_use]
pub fn range_label(days: u32) -> String {
    format!("{days}days")
}

/// Arithmetic mean, `None` for an empty input.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0_usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Median of a non-empty slice, averaging the middle pair for even lengths.
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(f64::midpoint(sorted[mid - 1], sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

/// Round half-to-even at `decimals` places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}
