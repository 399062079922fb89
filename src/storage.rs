//! `SQLite` storage for collected video metadata.
//!
//! Timestamps are stored as fixed-width RFC 3339 text (UTC, microseconds) so
//! window filters can compare them lexicographically.

use crate::model::{HashtagRow, RawVideo, TagFrequency, TrendSnapshot, Video};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

const SCHEMA_VERSION: i32 = 1;

const VIDEO_COLUMNS: &str = "v.video_id, v.title, v.description, c.name, v.published_at, \
     v.channel_id, v.channel_title, v.view_count, v.like_count, v.comment_count, \
     v.thumbnail_default, v.thumbnail_medium, v.thumbnail_high, v.collected_at, v.updated_at";

/// Format a timestamp the way every table stores it.
#[must_use]
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp_or_epoch(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map_or(DateTime::<Utc>::UNIX_EPOCH, |dt| dt.with_timezone(&Utc))
}

fn parse_timestamp_opt(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn row_to_video(row: &Row<'_>) -> rusqlite::Result<Video> {
    let published_at: String = row.get(4)?;
    let collected_at: String = row.get(13)?;
    Ok(Video {
        video_id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        published_at: parse_timestamp_or_epoch(&published_at),
        channel_id: row.get(5)?,
        channel_title: row.get(6)?,
        view_count: row.get(7)?,
        like_count: row.get(8)?,
        comment_count: row.get(9)?,
        thumbnail_default: row.get(10)?,
        thumbnail_medium: row.get(11)?,
        thumbnail_high: row.get(12)?,
        collected_at: parse_timestamp_or_epoch(&collected_at),
        updated_at: parse_timestamp_opt(row.get(14)?),
    })
}

/// `SQLite` storage manager
#[derive(Debug)]
pub struct Storage {
    conn: Connection,
}

/// Outcome of one ingestion batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub inserted: usize,
    pub updated: usize,
    pub associations: usize,
}

/// Whole-corpus totals for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryTotals {
    pub videos: i64,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
}

impl Storage {
    /// Open or create the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref()).with_context(|| {
            format!("Failed to open database at {}", db_path.as_ref().display())
        })?;

        // WAL lets collection runs and analytics reads interleave.
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be initialized.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            ",
        )?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> Result<()> {
        let current_version = self.get_schema_version();

        if current_version > SCHEMA_VERSION {
            return Err(crate::TubeError::SchemaMismatch {
                supported: SCHEMA_VERSION,
                found: current_version,
            }
            .into());
        }

        if current_version < SCHEMA_VERSION {
            info!(
                "Migrating database from version {} to {}",
                current_version, SCHEMA_VERSION
            );
            self.create_schema()?;
            self.set_schema_version(SCHEMA_VERSION)?;
        }

        Ok(())
    }

    fn get_schema_version(&self) -> i32 {
        let result: rusqlite::Result<i32> = self.conn.query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| {
                let value: String = row.get(0)?;
                Ok(value.parse().unwrap_or(0))
            },
        );

        // Missing meta table means a fresh database.
        result.unwrap_or_default()
    }

    fn set_schema_version(&self, version: i32) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?)",
            params![version.to_string()],
        )?;
        Ok(())
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS videos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                video_id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT,
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                published_at TEXT NOT NULL,
                channel_id TEXT NOT NULL,
                channel_title TEXT NOT NULL,
                view_count INTEGER NOT NULL DEFAULT 0 CHECK (view_count >= 0),
                like_count INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
                comment_count INTEGER NOT NULL DEFAULT 0 CHECK (comment_count >= 0),
                thumbnail_default TEXT,
                thumbnail_medium TEXT,
                thumbnail_high TEXT,
                collected_at TEXT NOT NULL,
                updated_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_videos_category ON videos(category_id);
            CREATE INDEX IF NOT EXISTS idx_videos_published_at ON videos(published_at);
            CREATE INDEX IF NOT EXISTS idx_videos_collected_at ON videos(collected_at);
            CREATE INDEX IF NOT EXISTS idx_videos_channel ON videos(channel_id);

            -- NOCASE gives hashtags a case-insensitive identity while keeping
            -- the first-seen spelling.
            CREATE TABLE IF NOT EXISTS hashtags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tag TEXT NOT NULL UNIQUE COLLATE NOCASE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS video_hashtags (
                video_id INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                hashtag_id INTEGER NOT NULL REFERENCES hashtags(id) ON DELETE CASCADE,
                PRIMARY KEY (video_id, hashtag_id)
            );
            CREATE INDEX IF NOT EXISTS idx_video_hashtags_tag ON video_hashtags(hashtag_id);

            CREATE TABLE IF NOT EXISTS trend_snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                snapshot_date TEXT NOT NULL,
                total_videos INTEGER NOT NULL DEFAULT 0,
                total_views INTEGER NOT NULL DEFAULT 0,
                total_likes INTEGER NOT NULL DEFAULT 0,
                total_comments INTEGER NOT NULL DEFAULT 0,
                avg_views REAL NOT NULL DEFAULT 0,
                avg_engagement_rate REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_snapshots_date ON trend_snapshots(snapshot_date);
            ",
        )?;

        Ok(())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Look up a category id by exact name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn category_id(&self, name: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM categories WHERE name = ?",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn get_or_create_category(tx: &Transaction<'_>, name: &str, now: &str) -> Result<i64> {
        tx.execute(
            "INSERT OR IGNORE INTO categories (name, created_at) VALUES (?, ?)",
            params![name, now],
        )?;
        let id = tx.query_row(
            "SELECT id FROM categories WHERE name = ?",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Stored categories with their video counts, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn category_video_counts(&self) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.name, COUNT(v.id)
             FROM categories c LEFT JOIN videos v ON v.category_id = c.id
             GROUP BY c.id
             ORDER BY c.name",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Upsert a batch of raw videos into `category` in one transaction.
    ///
    /// New videos are inserted with the category; existing ones get their
    /// title, description, statistics and thumbnails refreshed. When a record
    /// carries tags, the video's associations are deleted and re-inserted
    /// from the deduplicated tag set.
    ///
    /// # Errors
    ///
    /// Returns an error (and rolls back the whole batch) if any statement fails.
    pub fn store_videos(
        &mut self,
        category: &str,
        videos: &[RawVideo],
        now: DateTime<Utc>,
    ) -> Result<StoreStats> {
        let now_str = format_timestamp(now);
        let tx = self.conn.transaction()?;
        let category_id = Self::get_or_create_category(&tx, category, &now_str)?;
        let mut stats = StoreStats::default();

        for video in videos {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM videos WHERE video_id = ?",
                    params![video.video_id],
                    |row| row.get(0),
                )
                .optional()?;

            let row_id = if let Some(id) = existing {
                tx.execute(
                    r"
                    UPDATE videos SET
                        title = ?, description = ?, view_count = ?, like_count = ?,
                        comment_count = ?, thumbnail_default = ?, thumbnail_medium = ?,
                        thumbnail_high = ?, updated_at = ?
                    WHERE id = ?
                    ",
                    params![
                        video.title,
                        video.description,
                        video.view_count,
                        video.like_count,
                        video.comment_count,
                        video.thumbnail_default,
                        video.thumbnail_medium,
                        video.thumbnail_high,
                        now_str,
                        id,
                    ],
                )?;
                stats.updated += 1;
                id
            } else {
                tx.execute(
                    r"
                    INSERT INTO videos
                    (video_id, title, description, category_id, published_at, channel_id,
                     channel_title, view_count, like_count, comment_count, thumbnail_default,
                     thumbnail_medium, thumbnail_high, collected_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    ",
                    params![
                        video.video_id,
                        video.title,
                        video.description,
                        category_id,
                        format_timestamp(video.published_at),
                        video.channel_id,
                        video.channel_title,
                        video.view_count,
                        video.like_count,
                        video.comment_count,
                        video.thumbnail_default,
                        video.thumbnail_medium,
                        video.thumbnail_high,
                        now_str,
                    ],
                )?;
                stats.inserted += 1;
                tx.last_insert_rowid()
            };

            if !video.tags.is_empty() {
                stats.associations += Self::replace_hashtags(&tx, row_id, &video.tags, &now_str)?;
            }
        }

        tx.commit()?;
        debug!(
            category,
            inserted = stats.inserted,
            updated = stats.updated,
            "Stored video batch"
        );
        Ok(stats)
    }

    /// Delete-then-insert the tag set of one video. Returns associations written.
    fn replace_hashtags(
        tx: &Transaction<'_>,
        video_row_id: i64,
        tags: &[String],
        now: &str,
    ) -> Result<usize> {
        tx.execute(
            "DELETE FROM video_hashtags WHERE video_id = ?",
            params![video_row_id],
        )?;

        let mut insert_tag =
            tx.prepare_cached("INSERT OR IGNORE INTO hashtags (tag, created_at) VALUES (?, ?)")?;
        let mut select_tag = tx.prepare_cached("SELECT id FROM hashtags WHERE tag = ?")?;
        let mut link = tx.prepare_cached(
            "INSERT OR IGNORE INTO video_hashtags (video_id, hashtag_id) VALUES (?, ?)",
        )?;

        let mut seen: HashSet<i64> = HashSet::new();
        for tag in tags {
            let tag = tag.trim();
            if tag.is_empty() {
                continue;
            }
            insert_tag.execute(params![tag, now])?;
            let hashtag_id: i64 = select_tag.query_row(params![tag], |row| row.get(0))?;
            if seen.insert(hashtag_id) {
                link.execute(params![video_row_id, hashtag_id])?;
            }
        }

        Ok(seen.len())
    }

    // =========================================================================
    // Corpus queries
    // =========================================================================

    /// Videos of a category, optionally limited to `published_at >= since`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn category_videos(
        &self,
        category_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Video>> {
        let sql = format!(
            "SELECT {VIDEO_COLUMNS}
             FROM videos v LEFT JOIN categories c ON c.id = v.category_id
             WHERE v.category_id = ?1 AND (?2 IS NULL OR v.published_at >= ?2)
             ORDER BY v.published_at, v.video_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![category_id, since.map(format_timestamp)],
            row_to_video,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// `(tag, views, likes)` join rows for a category's videos.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn hashtag_rows(
        &self,
        category_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<HashtagRow>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT h.tag, v.view_count, v.like_count
            FROM hashtags h
            JOIN video_hashtags vh ON vh.hashtag_id = h.id
            JOIN videos v ON v.id = vh.video_id
            WHERE v.category_id = ?1 AND (?2 IS NULL OR v.published_at >= ?2)
            ORDER BY h.tag, v.video_id
            ",
        )?;
        let rows = stmt.query_map(params![category_id, since.map(format_timestamp)], |row| {
            Ok(HashtagRow {
                tag: row.get(0)?,
                view_count: row.get(1)?,
                like_count: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Number of distinct hashtags attached to a category's videos.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn distinct_hashtag_count(
        &self,
        category_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        let count = self.conn.query_row(
            r"
            SELECT COUNT(DISTINCT vh.hashtag_id)
            FROM video_hashtags vh
            JOIN videos v ON v.id = vh.video_id
            WHERE v.category_id = ?1 AND (?2 IS NULL OR v.published_at >= ?2)
            ",
            params![category_id, since.map(format_timestamp)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Hashtag usage counts, most frequent first (ties by tag), capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn tag_frequencies(
        &self,
        category_id: i64,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<TagFrequency>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT h.tag, COUNT(vh.video_id) AS frequency
            FROM hashtags h
            JOIN video_hashtags vh ON vh.hashtag_id = h.id
            JOIN videos v ON v.id = vh.video_id
            WHERE v.category_id = ?1 AND (?2 IS NULL OR v.published_at >= ?2)
            GROUP BY h.id
            ORDER BY frequency DESC, h.tag
            LIMIT ?3
            ",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(
            params![category_id, since.map(format_timestamp), limit],
            |row| {
                Ok(TagFrequency {
                    tag: row.get(0)?,
                    frequency: row.get(1)?,
                })
            },
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Videos of a category whose title contains `keyword` (case-sensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn videos_with_title_keyword(&self, category_id: i64, keyword: &str) -> Result<Vec<Video>> {
        let sql = format!(
            "SELECT {VIDEO_COLUMNS}
             FROM videos v LEFT JOIN categories c ON c.id = v.category_id
             WHERE v.category_id = ?1 AND instr(v.title, ?2) > 0
             ORDER BY v.published_at DESC, v.video_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![category_id, keyword], row_to_video)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Fetch one video by its platform id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_video(&self, video_id: &str) -> Result<Option<Video>> {
        let sql = format!(
            "SELECT {VIDEO_COLUMNS}
             FROM videos v LEFT JOIN categories c ON c.id = v.category_id
             WHERE v.video_id = ?"
        );
        let video = self
            .conn
            .query_row(&sql, params![video_id], row_to_video)
            .optional()?;
        Ok(video)
    }

    /// Tags attached to a video, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn video_tags(&self, video_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT h.tag
            FROM hashtags h
            JOIN video_hashtags vh ON vh.hashtag_id = h.id
            JOIN videos v ON v.id = vh.video_id
            WHERE v.video_id = ?
            ORDER BY h.tag
            ",
        )?;
        let rows = stmt.query_map(params![video_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Total number of stored videos.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn video_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Most recent `collected_at` across all videos.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn last_collection_time(&self) -> Result<Option<DateTime<Utc>>> {
        let value: Option<String> =
            self.conn
                .query_row("SELECT MAX(collected_at) FROM videos", [], |row| row.get(0))?;
        Ok(parse_timestamp_opt(value))
    }

    /// Most recent `collected_at` for one category; the incremental cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn last_collected_at(&self, category: &str) -> Result<Option<DateTime<Utc>>> {
        let value: Option<String> = self.conn.query_row(
            r"
            SELECT MAX(v.collected_at)
            FROM videos v JOIN categories c ON c.id = v.category_id
            WHERE c.name = ?
            ",
            params![category],
            |row| row.get(0),
        )?;
        Ok(parse_timestamp_opt(value))
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Whole-corpus totals for a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn category_totals(&self, category_id: i64) -> Result<CategoryTotals> {
        let totals = self.conn.query_row(
            r"
            SELECT COUNT(*), COALESCE(SUM(view_count), 0), COALESCE(SUM(like_count), 0),
                   COALESCE(SUM(comment_count), 0)
            FROM videos WHERE category_id = ?
            ",
            params![category_id],
            |row| {
                Ok(CategoryTotals {
                    videos: row.get(0)?,
                    views: row.get(1)?,
                    likes: row.get(2)?,
                    comments: row.get(3)?,
                })
            },
        )?;
        Ok(totals)
    }

    /// Persist one snapshot row.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is unknown or the insert fails.
    pub fn store_snapshot(&self, snapshot: &TrendSnapshot) -> Result<()> {
        let category_id = self
            .category_id(&snapshot.category)?
            .with_context(|| format!("Unknown category '{}'", snapshot.category))?;
        self.conn.execute(
            r"
            INSERT INTO trend_snapshots
            (category_id, snapshot_date, total_videos, total_views, total_likes,
             total_comments, avg_views, avg_engagement_rate, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                category_id,
                format_timestamp(snapshot.snapshot_date),
                snapshot.total_videos,
                snapshot.total_views,
                snapshot.total_likes,
                snapshot.total_comments,
                snapshot.avg_views,
                snapshot.avg_engagement_rate,
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Snapshots for a category, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn snapshots(&self, category: &str) -> Result<Vec<TrendSnapshot>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT c.name, s.snapshot_date, s.total_videos, s.total_views, s.total_likes,
                   s.total_comments, s.avg_views, s.avg_engagement_rate
            FROM trend_snapshots s JOIN categories c ON c.id = s.category_id
            WHERE c.name = ?
            ORDER BY s.snapshot_date, s.id
            ",
        )?;
        let rows = stmt.query_map(params![category], |row| {
            let date: String = row.get(1)?;
            Ok(TrendSnapshot {
                category: row.get(0)?,
                snapshot_date: parse_timestamp_or_epoch(&date),
                total_videos: row.get(2)?,
                total_views: row.get(3)?,
                total_likes: row.get(4)?,
                total_comments: row.get(5)?,
                avg_views: row.get(6)?,
                avg_engagement_rate: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
