//! Title pattern classification and effective keyword mining.

use super::{AnalysisOptions, mean};
use crate::Result;
use crate::corpus::Corpus;
use crate::model::{EffectiveKeyword, Sentiment, TitleAnalysis, TitlePattern, Video};
use crate::storage::Storage;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// A keyword must appear at least this often.
pub const MIN_KEYWORD_FREQUENCY: usize = 5;
pub const MAX_KEYWORDS: usize = 8;
/// Non-positive keywords averaging fewer views than this are negative.
pub const NEGATIVE_VIEW_THRESHOLD: f64 = 10_000.0;

pub const POSITIVE_KEYWORDS: &[&str] = &["꿀팁", "추천", "완벽", "최고", "솔직", "신상", "꿀템"];

pub const FALLBACK_RECOMMENDATION: &str = "\"긍정 키워드 + 질문형\" 조합 추천";

/// A named title classifier.
pub struct TitleClass {
    pub name: &'static str,
    pattern: &'static Lazy<Regex>,
}

impl TitleClass {
    #[must_use]
    pub fn matches(&self, title: &str) -> bool {
        self.pattern.is_match(title)
    }
}

static HAS_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid number class"));
static IS_QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?？]|알고|어떻게|왜|무엇").expect("valid question class"));
static HAS_URGENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"지금|바로|급하게|서둘러").expect("valid urgency class"));
static IS_COMPARISON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)vs|대비|비교|차이").expect("valid comparison class"));
static IS_REVIEW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"후기|리뷰|솔직|체험|사용기").expect("valid review class"));

/// Classifiers in reporting order. A title may match several.
pub static TITLE_CLASSES: [TitleClass; 5] = [
    TitleClass {
        name: "숫자 포함",
        pattern: &HAS_NUMBER,
    },
    TitleClass {
        name: "질문형",
        pattern: &IS_QUESTION,
    },
    TitleClass {
        name: "긴급성 표현",
        pattern: &HAS_URGENCY,
    },
    TitleClass {
        name: "비교형",
        pattern: &IS_COMPARISON,
    },
    TitleClass {
        name: "후기/리뷰",
        pattern: &IS_REVIEW,
    },
];

/// Title patterns, keywords and a recommendation for `category`.
///
/// # Errors
///
/// Returns an error if a storage query fails.
pub fn analyze_title_patterns(
    storage: &Storage,
    category: &str,
    days: u32,
) -> Result<TitleAnalysis> {
    analyze_title_patterns_with(storage, category, days, &AnalysisOptions::default())
}

/// [`analyze_title_patterns`] with explicit options.
///
/// # Errors
///
/// Returns an error if a storage query fails.
pub fn analyze_title_patterns_with(
    storage: &Storage,
    category: &str,
    days: u32,
    options: &AnalysisOptions,
) -> Result<TitleAnalysis> {
    let Some(corpus) = Corpus::resolve(storage, category, days, options.now)? else {
        return Ok(empty_analysis());
    };
    Ok(mine_titles(&corpus.videos()?))
}

fn empty_analysis() -> TitleAnalysis {
    TitleAnalysis {
        title_patterns: vec![],
        effective_keywords: vec![],
        recommendation: String::new(),
    }
}

/// Classify titles, mine keywords and phrase a recommendation.
#[must_use]
pub fn mine_titles(videos: &[Video]) -> TitleAnalysis {
    if videos.is_empty() {
        return empty_analysis();
    }

    let title_patterns = classify(videos);
    let effective_keywords = effective_keywords(videos);
    let recommendation = recommend(&title_patterns, &effective_keywords);
    TitleAnalysis {
        title_patterns,
        effective_keywords,
        recommendation,
    }
}

/// Per-class mean views and counts, best performing first.
#[must_use]
pub fn classify(videos: &[Video]) -> Vec<TitlePattern> {
    let mut patterns: Vec<TitlePattern> = TITLE_CLASSES
        .iter()
        .filter_map(|class| {
            let views: Vec<i64> = videos
                .iter()
                .filter(|v| class.matches(&v.title))
                .map(|v| v.view_count)
                .collect();
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let avg = mean(views.iter().map(|&v| v as f64))?.trunc() as i64;
            Some(TitlePattern {
                pattern: class.name.to_string(),
                avg_views: avg,
                count: views.len(),
            })
        })
        .collect();
    patterns.sort_by(|a, b| b.avg_views.cmp(&a.avg_views));
    patterns
}

/// Keep alphanumerics and anything from the Hangul syllable block upward.
fn keyword_token(word: &str) -> Option<String> {
    let token: String = word
        .chars()
        .filter(|c| c.is_alphanumeric() || u32::from(*c) >= 0xAC00)
        .collect();
    (token.chars().count() > 1).then_some(token)
}

fn sentiment(word: &str, avg_views: f64) -> Sentiment {
    if POSITIVE_KEYWORDS.contains(&word) {
        Sentiment::Positive
    } else if avg_views < NEGATIVE_VIEW_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Most frequent title keywords with a sentiment tag.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn effective_keywords(videos: &[Video]) -> Vec<EffectiveKeyword> {
    let mut per_word: BTreeMap<String, (usize, i64)> = BTreeMap::new();
    for video in videos {
        for word in video.title.split_whitespace() {
            if let Some(token) = keyword_token(word) {
                let entry = per_word.entry(token).or_default();
                entry.0 += 1;
                entry.1 += video.view_count;
            }
        }
    }

    let mut keywords: Vec<EffectiveKeyword> = per_word
        .into_iter()
        .filter(|(_, (freq, _))| *freq >= MIN_KEYWORD_FREQUENCY)
        .map(|(word, (frequency, views))| {
            let avg = views as f64 / frequency as f64;
            EffectiveKeyword {
                sentiment: sentiment(&word, avg),
                word,
                frequency,
            }
        })
        .collect();
    keywords.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    keywords.truncate(MAX_KEYWORDS);
    keywords
}

/// Pair the best pattern with the first positive keyword.
#[must_use]
pub fn recommend(patterns: &[TitlePattern], keywords: &[EffectiveKeyword]) -> String {
    let top_keyword = keywords
        .iter()
        .find(|k| k.sentiment == Sentiment::Positive);
    match (patterns.first(), top_keyword) {
        (Some(pattern), Some(keyword)) => {
            format!("\"{} + {}\" 조합 추천", keyword.word, pattern.pattern)
        }
        _ => FALLBACK_RECOMMENDATION.to_string(),
    }
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
    fn reference_titles_classify_independently() {
        let videos = vec![
            video("2024 꿀팁 대공개", 100_000),
            video("오늘 뭐 먹지?", 500),
            video("A vs B 비교 리뷰", 20_000),
        ];
        let patterns = classify(&videos);
        let find = |name: &str| patterns.iter().find(|p| p.pattern == name).cloned();

        let number = find("숫자 포함").unwrap();
        assert_eq!((number.avg_views, number.count), (100_000, 1));
        let question = find("질문형").unwrap();
        assert_eq!((question.avg_views, question.count), (500, 1));
        let comparison = find("비교형").unwrap();
        assert_eq!((comparison.avg_views, comparison.count), (20_000, 1));
        let review = find("후기/리뷰").unwrap();
        assert_eq!((review.avg_views, review.count), (20_000, 1));
        assert!(find("긴급성 표현").is_none());

        assert_eq!(patterns[0].pattern, "숫자 포함");
        assert_eq!(patterns.last().unwrap().pattern, "질문형");
    }

    #[test]
    fn comparison_is_case_insensitive() {
        assert!(TITLE_CLASSES[3].matches("iPhone VS Galaxy"));
        assert!(TITLE_CLASSES[3].matches("iphone Vs galaxy"));
        assert!(!TITLE_CLASSES[3].matches("아이폰 갤럭시"));
    }

    #[test]
    fn keyword_tokens_strip_punctuation() {
        assert_eq!(keyword_token("꿀팁!!").as_deref(), Some("꿀팁"));
        assert_eq!(keyword_token("(신상)").as_deref(), Some("신상"));
        assert_eq!(keyword_token("a!"), None);
    }

    #[test]
    fn keywords_need_five_mentions_and_get_sentiment() {
        let mut videos = Vec::new();
        for _ in 0..5 {
            videos.push(video("꿀팁 모음 하울", 50_000));
        }
        for _ in 0..4 {
            videos.push(video("드물다", 1));
        }
        for _ in 0..6 {
            videos.push(video("실패담", 100));
        }

        let keywords = effective_keywords(&videos);
        let words: Vec<&str> = keywords.iter().map(|k| k.word.as_str()).collect();
        assert_eq!(words[0], "실패담");
        assert!(!words.contains(&"드물다"));

        let get = |w: &str| keywords.iter().find(|k| k.word == w).unwrap().sentiment;
        assert_eq!(get("꿀팁"), Sentiment::Positive);
        assert_eq!(get("하울"), Sentiment::Neutral);
        assert_eq!(get("실패담"), Sentiment::Negative);
    }

    #[test]
    fn keywords_capped_at_eight() {
        let title = "하나 두울 세엣 네엣 다섯 여섯 일곱 여덟 아홉 열열";
        let videos: Vec<Video> = (0..5).map(|_| video(title, 1)).collect();
        assert_eq!(effective_keywords(&videos).len(), MAX_KEYWORDS);
    }

    #[test]
    fn recommendation_uses_positive_keyword() {
        let mut videos: Vec<Video> = (0..5).map(|_| video("추천 템 지금 구매", 30_000)).collect();
        videos.push(video("그냥 영상", 10));
        let analysis = mine_titles(&videos);
        assert_eq!(analysis.recommendation, "\"추천 + 긴급성 표현\" 조합 추천");
    }

    #[test]
    fn recommendation_falls_back_without_positive_keyword() {
        let videos = vec![video("왜 안될까", 10)];
        let analysis = mine_titles(&videos);
        assert_eq!(analysis.recommendation, FALLBACK_RECOMMENDATION);
        assert!(analysis.effective_keywords.is_empty());
    }

    #[test]
    fn empty_corpus_yields_empty_strings() {
        let analysis = mine_titles(&[]);
        assert!(analysis.title_patterns.is_empty());
        assert!(analysis.effective_keywords.is_empty());
        assert_eq!(analysis.recommendation, "");
    }
}
