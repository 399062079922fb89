//! Video ingestion: sources and the collector that upserts into storage.
//!
//! A [`VideoSource`] turns a category query into raw records. The live
//! platform client is an external collaborator; [`JsonFileSource`] reads the
//! JSON array or JSON Lines exports produced by collection scripts.

use crate::config::IngestConfig;
use crate::logging::OperationGuard;
use crate::model::RawVideo;
use crate::storage::Storage;
use crate::{Result, TubeError, categories, corpus};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What a collector asks of a source.
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    pub category: &'a str,
    /// Upstream search query for the category
    pub query: String,
    pub max_results: usize,
    /// Only videos published at or after this instant
    pub published_after: Option<DateTime<Utc>>,
}

/// A provider of raw video records.
pub trait VideoSource {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Fetch raw records for one request.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<Vec<RawVideo>>;
}

/// Raw records from a JSON array or JSON Lines file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    name: String,
}

impl JsonFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse every record in the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a record does not parse.
    pub fn read_records(&self) -> Result<Vec<RawVideo>> {
        let content = fs::read_to_string(&self.path)
            .map_err(|source| TubeError::path_error("read", &self.path, source))?;
        parse_records(&content, &self.name)
    }
}

impl VideoSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, request: &FetchRequest<'_>) -> Result<Vec<RawVideo>> {
        let records = self.read_records()?;
        let total = records.len();
        let selected: Vec<RawVideo> = records
            .into_iter()
            .filter(|r| request.published_after.is_none_or(|after| r.published_at >= after))
            .take(request.max_results)
            .collect();
        debug!(
            source = %self.name,
            total,
            selected = selected.len(),
            "Read video export"
        );
        Ok(selected)
    }
}

/// Parse a JSON array, or one JSON object per line.
///
/// # Errors
///
/// Returns [`TubeError::ParseError`] naming the offending line for JSONL input.
pub fn parse_records(content: &str, origin: &str) -> Result<Vec<RawVideo>> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(vec![]);
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|e| TubeError::parse_error(origin, e.to_string()));
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<RawVideo>(line)
                .map_err(|e| TubeError::parse_error(origin, format!("line {}: {e}", idx + 1)))
        })
        .collect()
}

/// Reject records the store cannot accept.
///
/// # Errors
///
/// Returns [`TubeError::InvalidRecord`] describing the first problem found.
pub fn validate_record(record: &RawVideo) -> Result<()> {
    if record.video_id.trim().is_empty() {
        return Err(TubeError::invalid_record("<missing>", "empty video_id"));
    }
    if record.title.trim().is_empty() {
        return Err(TubeError::invalid_record(&record.video_id, "empty title"));
    }
    for (field, value) in [
        ("view_count", record.view_count),
        ("like_count", record.like_count),
        ("comment_count", record.comment_count),
    ] {
        if value < 0 {
            return Err(TubeError::invalid_record(
                &record.video_id,
                format!("negative {field}: {value}"),
            ));
        }
    }
    Ok(())
}

/// Collection knobs.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Upper bound on records requested from the source.
    pub max_results: usize,
    /// Use the category's last collection time as the publication cutoff.
    pub incremental: bool,
    /// Cutoff in days when there is no incremental cursor; `None` takes all.
    pub time_range_days: Option<u32>,
    /// Collection timestamp written to new and updated videos.
    pub now: DateTime<Utc>,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}

impl CollectOptions {
    #[must_use]
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            max_results: config.max_results,
            incremental: config.incremental,
            time_range_days: None,
            now: Utc::now(),
        }
    }
}

/// Outcome of one collection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CollectReport {
    pub fetched: usize,
    pub skipped: usize,
    pub inserted: usize,
    pub updated: usize,
}

/// Pulls from a source and upserts into storage.
pub struct Collector<'a> {
    storage: &'a mut Storage,
}

impl<'a> Collector<'a> {
    pub const fn new(storage: &'a mut Storage) -> Self {
        Self { storage }
    }

    /// Publication cutoff for the next fetch of `category`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor lookup fails.
    pub fn published_after(
        &self,
        category: &str,
        options: &CollectOptions,
    ) -> Result<Option<DateTime<Utc>>> {
        if options.incremental {
            if let Some(cursor) = self.storage.last_collected_at(category)? {
                info!(category, %cursor, "Incremental collection");
                return Ok(Some(cursor));
            }
        }
        Ok(options
            .time_range_days
            .map(|days| corpus::window_start(options.now, days)))
    }

    /// Fetch from `source` and store the batch in one transaction.
    ///
    /// `CollectReport::inserted` is the number of videos new to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails or the batch cannot be stored; a
    /// failed batch leaves storage unchanged.
    pub fn collect(
        &mut self,
        category: &str,
        source: &dyn VideoSource,
        options: &CollectOptions,
    ) -> Result<CollectReport> {
        let guard = OperationGuard::new(format!("collect {category} from {}", source.name()));
        match self.collect_inner(category, source, options) {
            Ok(report) => {
                guard.complete();
                Ok(report)
            }
            Err(e) => {
                guard.fail(&e);
                Err(e)
            }
        }
    }

    fn collect_inner(
        &mut self,
        category: &str,
        source: &dyn VideoSource,
        options: &CollectOptions,
    ) -> Result<CollectReport> {
        if !categories::is_known(category) {
            warn!(category, "Collecting into a category outside the built-in table");
        }

        let request = FetchRequest {
            category,
            query: categories::search_query(category),
            max_results: options.max_results,
            published_after: self.published_after(category, options)?,
        };
        let fetched = source.fetch(&request)?;

        let mut report = CollectReport {
            fetched: fetched.len(),
            ..CollectReport::default()
        };
        if fetched.is_empty() {
            info!(category, "Source returned no videos");
            return Ok(report);
        }

        let valid: Vec<RawVideo> = fetched
            .into_iter()
            .filter(|record| match validate_record(record) {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "Skipping video record");
                    false
                }
            })
            .collect();
        report.skipped = report.fetched - valid.len();

        let stats = self.storage.store_videos(category, &valid, options.now)?;
        report.inserted = stats.inserted;
        report.updated = stats.updated;
        info!(
            category,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            "Collection stored"
        );
        Ok(report)
    }
}
