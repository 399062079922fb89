//! tubetrend - Video trend analytics for content creators
//!
//! This library collects per-category video metadata into a local `SQLite`
//! corpus and derives creator-facing analytics from it: summary metrics,
//! view trends, trending topics, hashtag effectiveness, title patterns and
//! a hashtag wordcloud.
//!
//! # Modules
//!
//! - [`analytics`] - Analytics entry points over a category window
//! - [`categories`] - Fixed category table and denylists
//! - [`cli`] - Command-line interface definitions
//! - [`config`] - Layered configuration
//! - [`corpus`] - Window selection with sparse-window widening
//! - [`error`] - Custom error types with rich context
//! - [`ingest`] - Video sources and the collector
//! - [`logging`] - Tracing subscriber setup
//! - [`lookup`] - Keyword video lookup and trend snapshots
//! - [`model`] - Persisted entities and analytics results
//! - [`storage`] - `SQLite` storage layer

pub mod analytics;
pub mod categories;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod lookup;
pub mod model;
pub mod storage;

pub use analytics::AnalysisOptions;
pub use cli::*;
pub use error::{
    Result, TubeError, VALID_CONFIG_KEYS, find_closest_match, format_did_you_mean,
    format_unknown_value_error,
};
pub use model::*;
pub use storage::Storage;

use chrono::{DateTime, Datelike, Utc};
use itertools::Itertools;
use std::path::PathBuf;

/// Database file name inside the data directory.
pub const DEFAULT_DB_NAME: &str = "tubetrend.db";

/// Width of the rule printed under CLI headings.
pub const CONTENT_DIVIDER_WIDTH: usize = 60;

/// Per-user data directory, `./tubetrend` when the platform has none.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tubetrend")
}

#[must_use]
pub fn default_db_path() -> PathBuf {
    default_data_dir().join(DEFAULT_DB_NAME)
}

/// Thousands-separated integer, e.g. `-12,345`.
#[must_use]
pub fn format_number(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let head = match digits.len() % 3 {
        0 => 3,
        n => n,
    };
    let groups = std::iter::once(&digits[..head])
        .chain((head..digits.len()).step_by(3).map(|i| &digits[i..i + 3]))
        .join(",");
    if value < 0 { format!("-{groups}") } else { groups }
}

#[must_use]
pub fn format_number_usize(value: usize) -> String {
    format_number(i64::try_from(value).unwrap_or(i64::MAX))
}

/// Short relative age: "just now", "5m ago", "3h ago", "6d ago", then a date.
#[must_use]
pub fn format_relative_date(dt: DateTime<Utc>) -> String {
    format_relative_date_with_base(dt, Utc::now())
}

/// [`format_relative_date`] against a fixed `now`.
#[must_use]
pub fn format_relative_date_with_base(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now - dt;
    match (age.num_seconds(), age.num_minutes(), age.num_hours(), age.num_days()) {
        (secs, ..) if secs < 0 => dt.format("%Y-%m-%d").to_string(),
        (0..60, ..) => "just now".to_string(),
        (_, m @ 0..60, ..) => format!("{m}m ago"),
        (_, _, h @ 0..24, _) => format!("{h}h ago"),
        (.., d @ 0..7) => format!("{d}d ago"),
        _ if dt.year() == now.year() => dt.format("%b %d").to_string(),
        _ => dt.format("%Y-%m-%d").to_string(),
    }
}

/// Relative age, or "never".
#[must_use]
pub fn format_optional_date(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(|| "never".to_string(), format_relative_date)
}
