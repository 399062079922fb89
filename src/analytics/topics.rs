//! Trending topic extraction from video titles.

use super::mean;
use crate::categories;
use crate::model::{TrendingTopic, Video};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Anything that is not a word character, whitespace or a Hangul syllable.
static NON_TOPIC_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s가-힣]").expect("valid topic character class"));

static HANGUL_SYLLABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[가-힣]").expect("valid hangul class"));

/// A topic must be mentioned at least this many times.
pub const MIN_TOPIC_MENTIONS: usize = 3;
/// Significant when mean views reach this multiple of the candidates' mean.
pub const VIEW_SIGNIFICANCE_FACTOR: f64 = 1.2;
/// Significant when mentions reach this multiple of the candidates' mean.
pub const COUNT_SIGNIFICANCE_FACTOR: f64 = 1.5;
/// Fewer significant topics than this falls back to plain frequency.
pub const MIN_SIGNIFICANT_TOPICS: usize = 3;
pub const MAX_SIGNIFICANT_TOPICS: usize = 10;
pub const FALLBACK_TOPICS: usize = 5;

/// Strip a leading `#` and punctuation; `None` for tokens of one char or less.
#[must_use]
pub fn clean_token(word: &str) -> Option<String> {
    let stripped = word.trim_start_matches('#').trim();
    let cleaned = NON_TOPIC_CHARS.replace_all(stripped, "");
    let cleaned = cleaned.trim();
    (cleaned.chars().count() > 1).then(|| cleaned.to_string())
}

/// Grouping key for a cleaned token, merging known spelling variants.
#[must_use]
pub fn topic_key(token: &str) -> String {
    match token.to_lowercase().as_str() {
        "브이로그" | "vlog" => "브이로그/VLOG".to_string(),
        "메이크업" | "makeup" => "메이크업 / makeup".to_string(),
        _ => token.to_string(),
    }
}

/// Growth label tier from a topic's mean views.
#[must_use]
pub fn growth_tier(avg_views: f64) -> &'static str {
    if avg_views > 10_000.0 {
        "+45%"
    } else if avg_views > 5_000.0 {
        "+30%"
    } else {
        "+15%"
    }
}

#[derive(Debug, Clone)]
struct TopicStats {
    key: String,
    forms: BTreeSet<String>,
    count: usize,
    total_views: i64,
}

impl TopicStats {
    #[allow(clippy::cast_precision_loss)]
    fn avg_views(&self) -> f64 {
        self.total_views as f64 / self.count as f64
    }

    #[allow(clippy::cast_precision_loss)]
    fn score(&self) -> f64 {
        0.6 * self.avg_views() + 0.4 * (self.count as f64 * 1000.0)
    }
}

/// True when `text` equals, contains or is contained in any exclusion.
fn overlaps_exclusion(text: &str, exclusions: &[String]) -> bool {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return false;
    }
    exclusions
        .iter()
        .any(|ex| lower.contains(ex.as_str()) || ex.contains(lower.as_str()))
}

fn is_excluded(stats: &TopicStats, exclusions: &[String]) -> bool {
    overlaps_exclusion(&stats.key, exclusions)
        || stats
            .forms
            .iter()
            .any(|form| overlaps_exclusion(form, exclusions))
}

/// Significance test against the candidate means.
#[allow(clippy::cast_precision_loss)]
fn is_significant(stats: &TopicStats, mean_avg_views: f64, mean_count: f64) -> bool {
    stats.avg_views() >= mean_avg_views * VIEW_SIGNIFICANCE_FACTOR
        || stats.count as f64 >= mean_count * COUNT_SIGNIFICANCE_FACTOR
}

/// Surface forms joined with " / ", Hangul forms first.
fn display_label(forms: &BTreeSet<String>) -> String {
    forms
        .iter()
        .sorted_by_key(|form| (!HANGUL_SYLLABLE.is_match(form), form.to_lowercase()))
        .join(" / ")
}

/// Trending topics mentioned in the titles of `videos`.
///
/// The category's own name and its translations never appear.
#[must_use]
pub fn extract_topics(videos: &[Video], category: &str) -> Vec<TrendingTopic> {
    let mut by_key: BTreeMap<String, TopicStats> = BTreeMap::new();
    for video in videos {
        for word in video.title.split_whitespace() {
            let Some(token) = clean_token(word) else {
                continue;
            };
            let key = topic_key(&token);
            let stats = by_key.entry(key.clone()).or_insert_with(|| TopicStats {
                key,
                forms: BTreeSet::new(),
                count: 0,
                total_views: 0,
            });
            stats.forms.insert(token);
            stats.count += 1;
            stats.total_views += video.view_count;
        }
    }

    let exclusions = categories::topic_exclusions(category);
    let candidates: Vec<TopicStats> = by_key
        .into_values()
        .filter(|s| s.count >= MIN_TOPIC_MENTIONS)
        .filter(|s| !is_excluded(s, &exclusions))
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let (Some(mean_avg_views), Some(mean_count)) = (
        mean(candidates.iter().map(TopicStats::avg_views)),
        mean(candidates.iter().map(|s| s.count as f64)),
    ) else {
        return vec![];
    };

    let significant: Vec<TopicStats> = candidates
        .iter()
        .filter(|s| is_significant(s, mean_avg_views, mean_count))
        .cloned()
        .collect();
    debug!(
        category,
        candidates = candidates.len(),
        significant = significant.len(),
        "Topic selection"
    );

    let mut selected = if significant.len() >= MIN_SIGNIFICANT_TOPICS {
        let mut ranked = significant;
        ranked.sort_by(|a, b| b.score().total_cmp(&a.score()));
        ranked.truncate(MAX_SIGNIFICANT_TOPICS);
        ranked
    } else {
        let mut ranked = candidates;
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(FALLBACK_TOPICS);
        ranked
    };
    selected.sort_by(|a, b| b.count.cmp(&a.count));

    selected
        .into_iter()
        .map(|s| TrendingTopic {
            topic: display_label(&s.forms),
            count: s.count,
            growth: growth_tier(s.avg_views()).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn video(title: &str, views: i64) -> Video {
        Video {
            video_id: title.to_string(),
            title: title.to_string(),
            description: None,
            category: None,
            published_at: Utc::now(),
            channel_id: "c".to_string(),
            channel_title: "C".to_string(),
            view_count: views,
            like_count: 0,
            comment_count: 0,
            thumbnail_default: None,
            thumbnail_medium: None,
            thumbnail_high: None,
            collected_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn clean_token_strips_hash_and_punctuation() {
        assert_eq!(clean_token("#데일리룩!!").as_deref(), Some("데일리룩"));
        assert_eq!(clean_token("GRWM,").as_deref(), Some("GRWM"));
        assert_eq!(clean_token("a"), None);
        assert_eq!(clean_token("#!"), None);
        assert_eq!(clean_token("##꿀팁"), Some("꿀팁".to_string()));
    }

    #[test]
    fn synonyms_share_a_key() {
        assert_eq!(topic_key("VLOG"), "브이로그/VLOG");
        assert_eq!(topic_key("브이로그"), "브이로그/VLOG");
        assert_eq!(topic_key("MakeUp"), "메이크업 / makeup");
        assert_eq!(topic_key("Tokyo"), "Tokyo");
    }

    #[test]
    fn growth_tiers() {
        assert_eq!(growth_tier(10_001.0), "+45%");
        assert_eq!(growth_tier(10_000.0), "+30%");
        assert_eq!(growth_tier(5_000.0), "+15%");
    }

    #[test]
    fn display_label_puts_hangul_first() {
        let forms: BTreeSet<String> = ["vlog", "브이로그", "VLOG"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        assert_eq!(display_label(&forms), "브이로그 / VLOG / vlog");
    }

    #[test]
    fn category_name_never_trends() {
        let mut videos = Vec::new();
        for i in 0..4 {
            videos.push(video(&format!("뷰티 beauty 립스틱 리뷰 {i}"), 1000));
            videos.push(video("뷰티메이크업 추천", 2000));
        }
        let topics = extract_topics(&videos, "뷰티");
        assert!(!topics.is_empty());
        for topic in &topics {
            let lower = topic.topic.to_lowercase();
            assert!(!lower.contains("뷰티"), "{lower}");
            assert!(!lower.contains("beauty"), "{lower}");
        }
    }

    #[test]
    fn rare_topics_are_dropped_and_variants_merge() {
        let videos = vec![
            video("제주 vlog", 20_000),
            video("제주 VLOG", 20_000),
            video("부산 브이로그", 20_000),
            video("한번만 등장", 1),
        ];
        let topics = extract_topics(&videos, "여행");
        let vlog = topics.iter().find(|t| t.topic.contains("브이로그")).unwrap();
        assert_eq!(vlog.count, 3);
        assert_eq!(vlog.growth, "+45%");
        assert_eq!(vlog.topic, "브이로그 / VLOG / vlog");
        assert!(topics.iter().all(|t| t.count >= MIN_TOPIC_MENTIONS));
    }

    #[test]
    fn fallback_keeps_top_five_by_count() {
        // Uniform topics: none stands out, so the fallback path applies.
        let mut videos = Vec::new();
        for word in ["사과", "바나나", "체리", "포도", "자두", "망고"] {
            for _ in 0..3 {
                videos.push(video(word, 100));
            }
        }
        let topics = extract_topics(&videos, "음식");
        assert_eq!(topics.len(), FALLBACK_TOPICS);
        assert!(topics.iter().all(|t| t.count == 3));
    }

    #[test]
    fn sorted_by_count_descending() {
        let mut videos = Vec::new();
        for (word, times) in [("하나", 3), ("둘둘", 6), ("셋셋", 4)] {
            for _ in 0..times {
                videos.push(video(word, 100));
            }
        }
        let topics = extract_topics(&videos, "게임");
        let counts: Vec<usize> = topics.iter().map(|t| t.count).collect();
        let mut sorted = counts.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(counts, sorted);
    }

    #[test]
    fn empty_input_yields_no_topics() {
        assert!(extract_topics(&[], "뷰티").is_empty());
    }

    #[test]
    fn significant_topics_rank_by_score_then_count() {
        let mut videos = Vec::new();
        for _ in 0..3 {
            videos.push(video("핫템", 90_000));
        }
        for _ in 0..12 {
            videos.push(video("대박", 1_000));
        }
        for _ in 0..10 {
            videos.push(video("중간", 1_000));
        }
        for filler in ["가나", "다라", "마바", "사아", "자차", "카타"] {
            for _ in 0..3 {
                videos.push(video(filler, 100));
            }
        }

        // Mean of means is 92,600 / 9, so 핫템 clears 1.2x on views; the mean
        // count is 43 / 9, so 대박 and 중간 clear 1.5x on count. Three
        // significant topics skip the top-5 fallback.
        let topics = extract_topics(&videos, "게임");
        let got: Vec<(&str, usize, &str)> = topics
            .iter()
            .map(|t| (t.topic.as_str(), t.count, t.growth.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("대박", 12, "+15%"),
                ("중간", 10, "+15%"),
                ("핫템", 3, "+45%"),
            ]
        );
    }

    #[test]
    fn significant_topics_are_capped_at_ten() {
        let mut videos = Vec::new();
        // Twelve topics significant by count, alongside twenty quiet ones.
        for i in 0..12 {
            for _ in 0..(20 + i) {
                videos.push(video(&format!("인기{i:02}"), 500));
            }
        }
        for i in 0..20 {
            for _ in 0..3 {
                videos.push(video(&format!("조용{i:02}"), 500));
            }
        }

        let topics = extract_topics(&videos, "게임");
        assert_eq!(topics.len(), MAX_SIGNIFICANT_TOPICS);
        assert_eq!(topics[0].topic, "인기11");
        assert_eq!(topics[0].count, 31);
        assert!(topics.iter().all(|t| t.topic.starts_with("인기")));
        assert!(topics.windows(2).all(|w| w[0].count >= w[1].count));
    }
}
