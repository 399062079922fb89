//! Hashtag effectiveness scoring and combination recommendation.
//!
//! Growth and correlation are heuristic scores, not statistics. Both sit
//! behind [`HashtagScoring`] so a different model can replace
//! [`HeuristicScoring`] without touching selection or recommendation.

use super::{AnalysisOptions, mean, median, round_to};
use crate::Result;
use crate::categories::HashtagDenylist;
use crate::corpus::Corpus;
use crate::model::{HashtagAnalysis, HashtagCombination, HashtagRow, HashtagStat};
use crate::storage::Storage;
use std::collections::BTreeMap;
use tracing::debug;

/// Tags used on fewer videos than this are ignored.
pub const MIN_TAG_VIDEOS: usize = 2;
/// Most hashtags reported after diversity selection.
pub const MAX_REPORTED_TAGS: usize = 8;

const TOP_BY_VIEWS: usize = 4;
const TOP_BY_ENGAGEMENT: usize = 4;
const BOTTOM_BY_ENGAGEMENT: usize = 2;

pub const CORRELATION_FLOOR: f64 = 0.5;
pub const CORRELATION_CEILING: f64 = 0.95;

/// Recommendation significance: correlation at or above this...
pub const SIGNIFICANT_CORRELATION: f64 = 0.65;
/// ...or mean views at this multiple of the reported tags' mean.
pub const SIGNIFICANT_VIEW_FACTOR: f64 = 1.3;
const MAX_SIGNIFICANT_COMBINATION: usize = 5;
const FALLBACK_COMBINATION: usize = 3;

/// Per-tag aggregate over the hashtag join rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TagAggregate {
    pub tag: String,
    pub avg_views: f64,
    pub avg_likes: f64,
    pub video_count: usize,
    /// `avg_likes / avg_views * 100`, zero when the tag has no views
    pub engagement_rate: f64,
}

impl TagAggregate {
    fn selection_score(&self) -> f64 {
        0.5 * self.avg_views + 0.5 * (self.engagement_rate * 10_000.0)
    }
}

/// Growth and correlation models.
pub trait HashtagScoring {
    /// Growth percentage for each candidate, in order.
    fn growth(&self, candidates: &[TagAggregate]) -> Vec<f64>;

    /// Correlation score for each selected tag, in order. `candidates` is the
    /// full set the selection was drawn from.
    fn correlation(&self, selected: &[TagAggregate], candidates: &[TagAggregate]) -> Vec<f64>;
}

/// The fixed-weight heuristic: 0.6 view ratio + 0.4 engagement ratio for
/// growth, engagement rate rescaled into `[0.5, 0.95]` for correlation.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScoring;

impl HeuristicScoring {
    const GROWTH_MIN: f64 = 5.0;
    const GROWTH_SPAN: f64 = 20.0;
    const VIEW_WEIGHT: f64 = 0.6;
    const ENGAGEMENT_WEIGHT: f64 = 0.4;
    /// Selected range must cover this share of the full range to be used.
    const SELECTED_RANGE_SHARE: f64 = 0.3;
    /// Narrower ranges are widened around the median.
    const MIN_RANGE: f64 = 0.05;
    const MEDIAN_HALF_WIDTH: f64 = 0.15;

    /// Step growth used when every combined score is identical.
    fn step_growth(avg_views: f64, category_avg: f64) -> f64 {
        if avg_views >= category_avg * 1.5 {
            20.0
        } else if avg_views >= category_avg * 1.2 {
            15.0
        } else if avg_views >= category_avg {
            12.0
        } else if avg_views >= category_avg * 0.8 {
            8.0
        } else {
            5.0
        }
    }

    /// Normalization bounds for engagement rate.
    fn engagement_bounds(selected: &[TagAggregate], candidates: &[TagAggregate]) -> (f64, f64) {
        let (all_min, all_max) = min_max(candidates.iter().map(|t| t.engagement_rate));
        let (sel_min, sel_max) = if selected.is_empty() {
            (all_min, all_max)
        } else {
            min_max(selected.iter().map(|t| t.engagement_rate))
        };
        let full_range = all_max - all_min;
        let selected_range = sel_max - sel_min;

        let (mut low, mut high) =
            if full_range > 0.0 && selected_range >= full_range * Self::SELECTED_RANGE_SHARE {
                (sel_min, sel_max)
            } else {
                (all_min, all_max)
            };

        if high - low < Self::MIN_RANGE {
            let rates: Vec<f64> = candidates.iter().map(|t| t.engagement_rate).collect();
            let mid = median(&rates).unwrap_or(0.0);
            low = (mid - Self::MEDIAN_HALF_WIDTH).max(0.0);
            high = mid + Self::MEDIAN_HALF_WIDTH;
        }
        (low, high)
    }
}

impl HashtagScoring for HeuristicScoring {
    fn growth(&self, candidates: &[TagAggregate]) -> Vec<f64> {
        let category_avg = mean(candidates.iter().map(|t| t.avg_views)).unwrap_or(0.0);
        let max_rate = candidates
            .iter()
            .map(|t| t.engagement_rate)
            .fold(f64::NEG_INFINITY, f64::max);
        let max_rate = if max_rate > 0.0 { max_rate } else { 1.0 };

        let combined: Vec<f64> = candidates
            .iter()
            .map(|t| {
                let view_ratio = if category_avg > 0.0 {
                    t.avg_views / category_avg
                } else {
                    1.0
                };
                Self::VIEW_WEIGHT * view_ratio
                    + Self::ENGAGEMENT_WEIGHT * (t.engagement_rate / max_rate)
            })
            .collect();

        let (low, high) = min_max(combined.iter().copied());
        if high > low {
            combined
                .iter()
                .map(|c| Self::GROWTH_MIN + (c - low) / (high - low) * Self::GROWTH_SPAN)
                .collect()
        } else {
            candidates
                .iter()
                .map(|t| Self::step_growth(t.avg_views, category_avg))
                .collect()
        }
    }

    fn correlation(&self, selected: &[TagAggregate], candidates: &[TagAggregate]) -> Vec<f64> {
        let (low, high) = Self::engagement_bounds(selected, candidates);
        // The median fallback guarantees high > low.
        selected
            .iter()
            .map(|t| {
                let scaled = CORRELATION_FLOOR
                    + (t.engagement_rate - low) / (high - low)
                        * (CORRELATION_CEILING - CORRELATION_FLOOR);
                scaled.clamp(CORRELATION_FLOOR, CORRELATION_CEILING)
            })
            .collect()
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (low, high) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if low > high { (0.0, 0.0) } else { (low, high) }
}

/// Hashtag statistics and a recommended combination for `category`.
///
/// # Errors
///
/// Returns an error if a storage query fails.
pub fn analyze_hashtags(storage: &Storage, category: &str, days: u32) -> Result<HashtagAnalysis> {
    analyze_hashtags_with(storage, category, days, &AnalysisOptions::default())
}

/// [`analyze_hashtags`] with explicit options, scored by [`HeuristicScoring`].
///
/// # Errors
///
/// Returns an error if a storage query fails.
pub fn analyze_hashtags_with(
    storage: &Storage,
    category: &str,
    days: u32,
    options: &AnalysisOptions,
) -> Result<HashtagAnalysis> {
    let Some(corpus) = Corpus::resolve(storage, category, days, options.now)? else {
        return Ok(HashtagAnalysis::empty());
    };
    let rows = corpus.hashtag_rows()?;
    let denylist = HashtagDenylist::for_category(category, &options.denylist);
    Ok(score_hashtags(&rows, &denylist, &HeuristicScoring))
}

/// Aggregate join rows per tag, in tag order.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_tags(rows: &[HashtagRow]) -> Vec<TagAggregate> {
    let mut per_tag: BTreeMap<&str, (i64, i64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = per_tag.entry(row.tag.as_str()).or_default();
        entry.0 += row.view_count;
        entry.1 += row.like_count;
        entry.2 += 1;
    }

    per_tag
        .into_iter()
        .map(|(tag, (views, likes, count))| {
            let avg_views = views as f64 / count as f64;
            let avg_likes = likes as f64 / count as f64;
            let engagement_rate = if avg_views > 0.0 {
                avg_likes / avg_views * 100.0
            } else {
                0.0
            };
            TagAggregate {
                tag: tag.to_string(),
                avg_views,
                avg_likes,
                video_count: count,
                engagement_rate,
            }
        })
        .collect()
}

/// Pick a diverse subset: top views, top and bottom engagement, then the
/// best [`MAX_REPORTED_TAGS`] by combined score.
fn select_diverse(candidates: &[TagAggregate]) -> Vec<TagAggregate> {
    let mut by_views: Vec<&TagAggregate> = candidates.iter().collect();
    by_views.sort_by(|a, b| b.avg_views.total_cmp(&a.avg_views));

    let mut by_rate: Vec<&TagAggregate> = candidates.iter().collect();
    by_rate.sort_by(|a, b| b.engagement_rate.total_cmp(&a.engagement_rate));

    let mut by_rate_asc: Vec<&TagAggregate> = candidates.iter().collect();
    by_rate_asc.sort_by(|a, b| a.engagement_rate.total_cmp(&b.engagement_rate));

    let mut pool: Vec<&TagAggregate> = Vec::new();
    for tag in by_views
        .into_iter()
        .take(TOP_BY_VIEWS)
        .chain(by_rate.into_iter().take(TOP_BY_ENGAGEMENT))
        .chain(by_rate_asc.into_iter().take(BOTTOM_BY_ENGAGEMENT))
    {
        if !pool.iter().any(|p| p.tag == tag.tag) {
            pool.push(tag);
        }
    }

    pool.sort_by(|a, b| b.selection_score().total_cmp(&a.selection_score()));
    pool.into_iter().take(MAX_REPORTED_TAGS).cloned().collect()
}

/// Full hashtag pipeline over join rows.
#[must_use]
pub fn score_hashtags(
    rows: &[HashtagRow],
    denylist: &HashtagDenylist,
    scoring: &dyn HashtagScoring,
) -> HashtagAnalysis {
    let rows: Vec<HashtagRow> = rows
        .iter()
        .filter(|r| !denylist.matches_pattern(&r.tag))
        .cloned()
        .collect();
    if rows.is_empty() {
        return HashtagAnalysis::empty();
    }

    let candidates: Vec<TagAggregate> = aggregate_tags(&rows)
        .into_iter()
        .filter(|t| t.video_count >= MIN_TAG_VIDEOS)
        .filter(|t| !denylist.matches_exact(&t.tag))
        .collect();
    if candidates.is_empty() {
        return HashtagAnalysis::empty();
    }

    let total_views: i64 = rows.iter().map(|r| r.view_count).sum();
    let total_likes: i64 = rows.iter().map(|r| r.like_count).sum();
    #[allow(clippy::cast_precision_loss)]
    let baseline_engagement = if total_views > 0 {
        total_likes as f64 / total_views as f64 * 100.0
    } else {
        0.0
    };

    let growth: BTreeMap<&str, f64> = candidates
        .iter()
        .map(|t| t.tag.as_str())
        .zip(scoring.growth(&candidates))
        .collect();

    let selected = select_diverse(&candidates);
    let correlation = scoring.correlation(&selected, &candidates);
    debug!(
        candidates = candidates.len(),
        selected = selected.len(),
        "Hashtag selection"
    );

    let hashtag_stats: Vec<HashtagStat> = selected
        .iter()
        .zip(correlation)
        .map(|(tag, corr)| HashtagStat {
            tag: format!("#{}", tag.tag.trim_start_matches('#')),
            avg_views: round_views(tag.avg_views),
            avg_likes: round_to(tag.avg_likes, 1),
            video_count: tag.video_count,
            engagement_rate: round_to(tag.engagement_rate, 2),
            correlation: round_to(corr, 2),
            growth: format_growth(growth.get(tag.tag.as_str()).copied().unwrap_or(0.0)),
        })
        .collect();

    let recommended_hashtags = recommend_combination(&hashtag_stats);
    HashtagAnalysis {
        hashtag_stats,
        recommended_hashtags,
        baseline_engagement: round_to(baseline_engagement, 2),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round_views(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// "+N%" with N rounded half-to-even.
#[must_use]
pub fn format_growth(percent: f64) -> String {
    format!("+{}%", round_views(percent))
}

/// Qualitative label for a mean correlation.
#[must_use]
pub fn correlation_label(avg_correlation: f64) -> &'static str {
    if avg_correlation > 0.8 {
        "높음"
    } else if avg_correlation > 0.6 {
        "보통"
    } else {
        "낮음"
    }
}

/// "aK~bK" where b is a 20% uplift on a; both truncated to whole thousands.
#[must_use]
pub fn expected_views_range(mean_views: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let low = (mean_views / 1000.0).trunc() as i64;
    #[allow(clippy::cast_possible_truncation)]
    let high = (mean_views / 1000.0 * 1.2).trunc() as i64;
    format!("{low}K~{high}K")
}

fn is_significant(stat: &HashtagStat, mean_views: f64) -> bool {
    #[allow(clippy::cast_precision_loss)]
    let views = stat.avg_views as f64;
    stat.correlation >= SIGNIFICANT_CORRELATION || views >= mean_views * SIGNIFICANT_VIEW_FACTOR
}

/// Recommend a combination from the reported stats.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn recommend_combination(stats: &[HashtagStat]) -> HashtagCombination {
    let Some(mean_views) = mean(stats.iter().map(|s| s.avg_views as f64)) else {
        return HashtagCombination::empty();
    };

    let mut significant: Vec<&HashtagStat> = stats
        .iter()
        .filter(|s| is_significant(s, mean_views))
        .collect();

    let picks: Vec<&HashtagStat> = if significant.len() >= 2 {
        let rank = |s: &HashtagStat| {
            let view_ratio = if mean_views > 0.0 {
                s.avg_views as f64 / mean_views
            } else {
                0.0
            };
            0.6 * s.correlation + 0.4 * view_ratio
        };
        significant.sort_by(|a, b| rank(*b).total_cmp(&rank(*a)));
        significant.truncate(MAX_SIGNIFICANT_COMBINATION);
        significant
    } else {
        let mut by_corr: Vec<&HashtagStat> = stats.iter().collect();
        by_corr.sort_by(|a, b| b.correlation.total_cmp(&a.correlation));
        by_corr.truncate(FALLBACK_COMBINATION);
        by_corr
    };

    let combo_views = mean(picks.iter().map(|s| s.avg_views as f64)).unwrap_or(0.0);
    let combo_corr = mean(picks.iter().map(|s| s.correlation)).unwrap_or(0.0);

    HashtagCombination {
        tags: picks
            .iter()
            .map(|s| format!("#{}", s.tag.replace('#', "")))
            .collect(),
        expected_views: expected_views_range(combo_views),
        correlation: correlation_label(combo_corr).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DenylistConfig;

    fn rows(tag: &str, samples: &[(i64, i64)]) -> Vec<HashtagRow> {
        samples
            .iter()
            .map(|&(views, likes)| HashtagRow {
                tag: tag.to_string(),
                view_count: views,
                like_count: likes,
            })
            .collect()
    }

    fn no_denylist() -> HashtagDenylist {
        HashtagDenylist::for_category("음식", &DenylistConfig::default())
    }

    #[test]
    fn two_tag_reference_case() {
        let mut data = rows("a", &[(1000, 10), (1000, 10)]);
        data.extend(rows("b", &[(3000, 90), (3000, 90)]));

        let analysis = score_hashtags(&data, &no_denylist(), &HeuristicScoring);
        let stats = &analysis.hashtag_stats;
        assert_eq!(stats.len(), 2);

        assert_eq!(stats[0].tag, "#b");
        assert_eq!(stats[0].avg_views, 3000);
        assert_eq!(stats[0].growth, "+25%");
        assert!((stats[0].correlation - 0.95).abs() < 1e-9);

        assert_eq!(stats[1].tag, "#a");
        assert_eq!(stats[1].growth, "+5%");
        assert!((stats[1].correlation - 0.5).abs() < 1e-9);

        let combo = &analysis.recommended_hashtags;
        assert_eq!(combo.tags, vec!["#b", "#a"]);
        assert_eq!(combo.expected_views, "2K~2K");
        assert_eq!(combo.correlation, "보통");
        assert!((analysis.baseline_engagement - 2.5).abs() < 1e-9);
    }

    #[test]
    fn single_use_tags_are_dropped() {
        let mut data = rows("once", &[(5000, 50)]);
        data.extend(rows("twice", &[(100, 1), (200, 2)]));
        let analysis = score_hashtags(&data, &no_denylist(), &HeuristicScoring);
        assert_eq!(analysis.hashtag_stats.len(), 1);
        assert_eq!(analysis.hashtag_stats[0].tag, "#twice");
    }

    #[test]
    fn empty_input_yields_empty_combination() {
        let analysis = score_hashtags(&[], &no_denylist(), &HeuristicScoring);
        assert_eq!(analysis, HashtagAnalysis::empty());
        assert_eq!(analysis.recommended_hashtags.expected_views, "0");
        assert_eq!(analysis.recommended_hashtags.correlation, "낮음");
    }

    #[test]
    fn equal_scores_use_step_growth() {
        let mut data = rows("x", &[(1000, 20), (1000, 20)]);
        data.extend(rows("y", &[(1000, 20), (1000, 20)]));
        let analysis = score_hashtags(&data, &no_denylist(), &HeuristicScoring);
        for stat in &analysis.hashtag_stats {
            assert_eq!(stat.growth, "+12%");
            assert!(stat.correlation >= 0.72 && stat.correlation <= 0.73);
        }
    }

    #[test]
    fn correlation_stays_in_bounds() {
        let mut data = Vec::new();
        for i in 0..15_i64 {
            let views = 1_000 + i * 7_919 % 50_000;
            let likes = (i * i * 37) % 900;
            data.extend(rows(&format!("tag{i}"), &[(views, likes), (views * 2, likes + 5)]));
        }
        let analysis = score_hashtags(&data, &no_denylist(), &HeuristicScoring);
        assert!(analysis.hashtag_stats.len() <= MAX_REPORTED_TAGS);
        for stat in &analysis.hashtag_stats {
            assert!((0.5..=0.95).contains(&stat.correlation), "{stat:?}");
            let pct: i64 = stat
                .growth
                .trim_start_matches('+')
                .trim_end_matches('%')
                .parse()
                .unwrap();
            assert!((5..=25).contains(&pct));
        }
        assert!(analysis.recommended_hashtags.tags.len() <= 5);
    }

    #[test]
    fn zero_view_tags_do_not_divide_by_zero() {
        let mut data = rows("dead", &[(0, 0), (0, 0)]);
        data.extend(rows("live", &[(100, 5), (100, 5)]));
        let analysis = score_hashtags(&data, &no_denylist(), &HeuristicScoring);
        for stat in &analysis.hashtag_stats {
            assert!(stat.correlation.is_finite());
            assert!(stat.engagement_rate.is_finite());
        }
    }

    #[test]
    fn denylist_applies_to_rows_and_tags() {
        let mut extra = DenylistConfig::default();
        extra
            .patterns
            .insert("뷰티".to_string(), vec!["spam".to_string()]);
        let deny = HashtagDenylist::for_category("뷰티", &extra);

        let mut data = rows("#SpamTag", &[(100, 1), (100, 1)]);
        data.extend(rows("专业教程", &[(100, 1), (100, 1)]));
        data.extend(rows("립스틱", &[(100, 1), (100, 1)]));

        let analysis = score_hashtags(&data, &deny, &HeuristicScoring);
        let tags: Vec<&str> = analysis.hashtag_stats.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, vec!["#립스틱"]);
    }

    #[test]
    fn existing_hash_prefix_is_not_doubled() {
        let data = rows("#먹방", &[(100, 1), (100, 1)]);
        let analysis = score_hashtags(&data, &no_denylist(), &HeuristicScoring);
        assert_eq!(analysis.hashtag_stats[0].tag, "#먹방");
        assert_eq!(analysis.recommended_hashtags.tags, vec!["#먹방"]);
    }

    struct FlatScoring;

    impl HashtagScoring for FlatScoring {
        fn growth(&self, candidates: &[TagAggregate]) -> Vec<f64> {
            vec![10.0; candidates.len()]
        }

        fn correlation(&self, selected: &[TagAggregate], _: &[TagAggregate]) -> Vec<f64> {
            vec![0.9; selected.len()]
        }
    }

    #[test]
    fn scoring_model_is_swappable() {
        let mut data = rows("a", &[(1000, 10), (1000, 10)]);
        data.extend(rows("b", &[(3000, 90), (3000, 90)]));
        let analysis = score_hashtags(&data, &no_denylist(), &FlatScoring);
        assert!(analysis.hashtag_stats.iter().all(|s| s.growth == "+10%"));
        assert_eq!(analysis.recommended_hashtags.correlation, "높음");
    }

    #[test]
    fn labels_and_ranges() {
        assert_eq!(correlation_label(0.81), "높음");
        assert_eq!(correlation_label(0.8), "보통");
        assert_eq!(correlation_label(0.6), "낮음");
        assert_eq!(expected_views_range(25_500.0), "25K~30K");
        assert_eq!(expected_views_range(999.0), "0K~1K");
        assert_eq!(format_growth(12.5), "+12%");
        assert_eq!(format_growth(13.5), "+14%");
    }

    fn aggregate(tag: &str, engagement_rate: f64) -> TagAggregate {
        TagAggregate {
            tag: tag.to_string(),
            avg_views: 1_000.0,
            avg_likes: engagement_rate * 10.0,
            video_count: 2,
            engagement_rate,
        }
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn narrow_selection_normalizes_over_all_candidates() {
        let candidates = vec![
            aggregate("a", 0.0),
            aggregate("b", 1.0),
            aggregate("c", 9.0),
            aggregate("d", 10.0),
        ];
        let selected = vec![candidates[2].clone(), candidates[3].clone()];

        // Selected range 1.0 is under 30% of the full range 10.0.
        let (low, high) = HeuristicScoring::engagement_bounds(&selected, &candidates);
        assert_close(&[low, high], &[0.0, 10.0]);
        let corr = HeuristicScoring.correlation(&selected, &candidates);
        assert_close(&corr, &[0.905, 0.95]);
    }

    #[test]
    fn wide_selection_normalizes_over_itself() {
        let candidates = vec![
            aggregate("a", 0.0),
            aggregate("b", 4.0),
            aggregate("c", 10.0),
        ];
        let selected = vec![candidates[1].clone(), candidates[2].clone()];

        // Selected range 6.0 covers 60% of the full range.
        let corr = HeuristicScoring.correlation(&selected, &candidates);
        assert_close(&corr, &[0.5, 0.95]);
    }

    #[test]
    fn tight_rates_are_recentered_on_the_median() {
        let candidates = vec![
            aggregate("a", 2.00),
            aggregate("b", 2.02),
            aggregate("c", 2.04),
        ];

        // Range 0.04 is under 0.05, so the bounds become 2.02 +/- 0.15.
        let (low, high) = HeuristicScoring::engagement_bounds(&candidates, &candidates);
        assert_close(&[low, high], &[1.87, 2.17]);
        let corr = HeuristicScoring.correlation(&candidates, &candidates);
        assert_close(&corr, &[0.695, 0.725, 0.755]);
    }

    #[test]
    fn recentering_floors_the_low_bound_at_zero() {
        let candidates = vec![aggregate("a", 0.01), aggregate("b", 0.03)];
        let (low, high) = HeuristicScoring::engagement_bounds(&candidates, &candidates);
        assert_close(&[low, high], &[0.0, 0.17]);
    }
}
