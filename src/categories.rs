//! The fixed category table.
//!
//! Every per-category constant lives here: the upstream search query, the
//! names and translations that must never surface as a trending topic, and
//! the hashtag denylist. Adding a category means adding one [`CategoryProfile`].
//!
//! The hashtag denylists are artifacts of noisy live data rather than policy.
//! They can be extended per category from the `[denylist]` config section.

use crate::config::DenylistConfig;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Static description of one supported category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryProfile {
    /// Category name, the join key of every analytics entry point.
    pub name: &'static str,
    /// Query sent to the upstream video search.
    pub search_query: &'static str,
    /// Category name variants and translations excluded from trending topics.
    pub topic_exclusions: &'static [&'static str],
    /// Hashtags dropped by exact (case-insensitive) match.
    pub hashtag_denylist: &'static [&'static str],
    /// Hashtags dropped when they contain one of these (case-insensitive).
    pub hashtag_deny_patterns: &'static [&'static str],
}

pub const CATEGORY_PROFILES: &[CategoryProfile] = &[
    CategoryProfile {
        name: "뷰티",
        search_query: "뷰티 메이크업",
        topic_exclusions: &["뷰티", "beauty", "beauty tip", "beautytips"],
        hashtag_denylist: &[
            "may阿may之美",
            "may阿may美妆",
            "may阿may频道",
            "may阿may风格",
            "专业教程",
            "个性妆容",
            "创意妆容",
            "化妆技巧",
            "大胆手法",
            "实用教程",
            "时尚之美。",
            "时尚妆容",
        ],
        hashtag_deny_patterns: &[],
    },
    CategoryProfile {
        name: "패션",
        search_query: "패션 스타일",
        topic_exclusions: &["패션", "fashion", "패션스타일", "fashionstyle", "fashion style"],
        hashtag_denylist: &[],
        hashtag_deny_patterns: &[],
    },
    CategoryProfile {
        name: "음식",
        search_query: "요리 레시피",
        topic_exclusions: &["음식", "food", "맛집"],
        hashtag_denylist: &[],
        hashtag_deny_patterns: &[],
    },
    CategoryProfile {
        name: "여행",
        search_query: "여행 브이로그",
        topic_exclusions: &[
            "여행", "travel", "trip", "tour", "관광", "tourism", "traveling",
        ],
        hashtag_denylist: &[
            "A-NA",
            "CARMEN",
            "Hearts2Hearts",
            "IAN",
            "JIWOO",
            "JUUN",
            "STELLA",
            "YE-ON",
            "YUHA",
            "스텔라",
            "에이나",
            "예온",
            "유하",
            "이안",
            "주은",
            "지우",
            "카르멘",
            "하츠투하츠",
        ],
        hashtag_deny_patterns: &[],
    },
    CategoryProfile {
        name: "게임",
        search_query: "게임 플레이",
        topic_exclusions: &["게임", "game", "games", "gaming", "게이밍"],
        hashtag_denylist: &[],
        hashtag_deny_patterns: &[],
    },
    CategoryProfile {
        name: "음악",
        search_query: "음악 뮤직비디오",
        topic_exclusions: &["음악", "music", "song", "songs", "뮤직"],
        hashtag_denylist: &[],
        hashtag_deny_patterns: &[],
    },
    CategoryProfile {
        name: "스포츠",
        search_query: "스포츠 하이라이트",
        topic_exclusions: &["스포츠", "sports", "sport", "운동", "athletic", "athletics"],
        hashtag_denylist: &[],
        hashtag_deny_patterns: &[],
    },
    CategoryProfile {
        name: "교육",
        search_query: "교육 강의",
        topic_exclusions: &[
            "교육",
            "education",
            "learn",
            "learning",
            "study",
            "studying",
        ],
        hashtag_denylist: &[],
        hashtag_deny_patterns: &[],
    },
];

static PROFILES_BY_NAME: Lazy<HashMap<&'static str, &'static CategoryProfile>> =
    Lazy::new(|| CATEGORY_PROFILES.iter().map(|p| (p.name, p)).collect());

/// Names of all supported categories, in table order.
#[must_use]
pub fn category_names() -> Vec<&'static str> {
    CATEGORY_PROFILES.iter().map(|p| p.name).collect()
}

/// Look up a supported category by exact name.
#[must_use]
pub fn profile(name: &str) -> Option<&'static CategoryProfile> {
    PROFILES_BY_NAME.get(name).copied()
}

/// Whether `name` is one of the supported categories.
#[must_use]
pub fn is_known(name: &str) -> bool {
    PROFILES_BY_NAME.contains_key(name)
}

/// Search query for a category; unknown categories search by their own name.
#[must_use]
pub fn search_query(name: &str) -> String {
    profile(name).map_or_else(|| name.to_string(), |p| p.search_query.to_string())
}

/// Lowercased topic exclusion set for a category, always including the
/// category name itself.
#[must_use]
pub fn topic_exclusions(name: &str) -> Vec<String> {
    let mut exclusions: Vec<String> = profile(name)
        .map(|p| p.topic_exclusions)
        .unwrap_or_default()
        .iter()
        .map(|e| e.trim().to_lowercase())
        .collect();
    exclusions.push(name.to_lowercase());
    exclusions
}

/// Effective hashtag denylist for one category.
#[derive(Debug, Clone, Default)]
pub struct HashtagDenylist {
    exact: Vec<String>,
    patterns: Vec<String>,
}

impl HashtagDenylist {
    /// Built-in entries for `category` merged with configured extras.
    #[must_use]
    pub fn for_category(category: &str, extra: &DenylistConfig) -> Self {
        let mut exact: Vec<String> = Vec::new();
        let mut patterns: Vec<String> = Vec::new();

        if let Some(p) = profile(category) {
            exact.extend(p.hashtag_denylist.iter().map(|t| t.to_lowercase()));
            patterns.extend(p.hashtag_deny_patterns.iter().map(|t| t.to_lowercase()));
        }
        if let Some(tags) = extra.exact.get(category) {
            exact.extend(tags.iter().map(|t| t.to_lowercase()));
        }
        if let Some(pats) = extra.patterns.get(category) {
            patterns.extend(pats.iter().map(|t| t.to_lowercase()));
        }

        Self { exact, patterns }
    }

    /// Substring rule, checked against the tag without its leading `#`.
    #[must_use]
    pub fn matches_pattern(&self, tag: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let clean = tag.trim_start_matches('#').to_lowercase();
        self.patterns.iter().any(|p| clean.contains(p.as_str()))
    }

    /// Exact rule, case-insensitive.
    #[must_use]
    pub fn matches_exact(&self, tag: &str) -> bool {
        let lower = tag.to_lowercase();
        self.exact.iter().any(|e| *e == lower)
    }
}
