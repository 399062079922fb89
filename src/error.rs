//! Error types for tubetrend.
//!
//! Analytics entry points never fail for "no data" conditions; the variants
//! here cover storage, ingestion and lookup failures.

use colored::Colorize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TubeError {
    /// Nothing has been ingested at this path yet.
    #[error(
        "No video database found. Run 'tubetrend ingest <category> --file <export>' first.\nExpected database at: {path}"
    )]
    DatabaseNotFound { path: PathBuf },

    /// The database was written by a newer tubetrend.
    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaMismatch { supported: i32, found: i32 },

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// A raw video export could not be parsed.
    #[error("Failed to parse '{file}': {reason}")]
    ParseError { file: String, reason: String },

    /// A raw video record is missing required data.
    #[error("Invalid video record '{video_id}': {reason}")]
    InvalidRecord { video_id: String, reason: String },

    #[error("Video source '{source_name}' failed: {reason}")]
    SourceFailure { source_name: String, reason: String },

    #[error("Failed to {operation} '{path}': {source}")]
    PathError {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A lookup named a category (or other item) with no stored data.
    #[error("{item_type} '{id}' not found")]
    NotFound { item_type: &'static str, id: String },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Storage-layer failure carried through analytics.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for tubetrend operations.
pub type Result<T> = std::result::Result<T, TubeError>;

impl TubeError {
    pub fn database_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DatabaseNotFound { path: path.into() }
    }

    pub fn parse_error(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_record(video_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            video_id: video_id.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(item_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            item_type,
            id: id.into(),
        }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn path_error(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::PathError {
            operation,
            path: path.into(),
            source,
        }
    }

    /// A next step for the user, when one is obvious.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::DatabaseNotFound { .. } => {
                Some("Run 'tubetrend ingest <category> --file <export.json>' to create the database.")
            }
            Self::SchemaMismatch { .. } => {
                Some("Upgrade tubetrend, or point --db at a fresh database file.")
            }
            Self::ParseError { .. } => {
                Some("Exports must be a JSON array or JSON lines of video records.")
            }
            Self::NotFound { .. } => Some("Run 'tubetrend categories' to list stored categories."),
            _ => None,
        }
    }
}

/// Edit distance over chars, so Hangul names compare per syllable.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    // row[j] holds the distance between the consumed prefix of `a` and b[..j].
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[b.len()]
}

/// Closest candidate within `max_distance` edits (default 2), ignoring case.
///
/// Exact matches return `None`; there is nothing to suggest.
#[must_use]
pub fn find_closest_match<'a>(
    input: &str,
    candidates: &[&'a str],
    max_distance: Option<usize>,
) -> Option<&'a str> {
    let limit = max_distance.unwrap_or(2);
    let needle = input.to_lowercase();

    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = levenshtein_distance(&needle, &candidate.to_lowercase());
            (1..=limit).contains(&distance).then_some((distance, candidate))
        })
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

#[must_use]
pub fn format_did_you_mean(suggestion: &str) -> String {
    format!("Did you mean '{}'?", suggestion.green())
}

/// Message for an unrecognised value, with a suggestion and the short list of
/// valid options.
#[must_use]
pub fn format_unknown_value_error(kind: &str, input: &str, valid_options: &[&str]) -> String {
    let mut message = format!("Unknown {kind} '{input}'.");
    if let Some(closest) = find_closest_match(input, valid_options, None) {
        message.push(' ');
        message.push_str(&format_did_you_mean(closest));
    }
    if valid_options.len() <= 10 {
        message.push_str(&format!("\n  Valid {kind}s: {}", valid_options.join(", ")));
    }
    message
}

/// Keys accepted by `tubetrend config --set`.
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "db",
    "paths.db",
    "analytics.default_days",
    "analytics.wordcloud_limit",
    "analytics.keyword_video_limit",
    "ingest.max_results",
    "ingest.incremental",
    "output.format",
    "output.colors",
];
