//! Settings for tubetrend, resolved in increasing precedence: built-in
//! defaults, `~/.config/tubetrend/config.toml`, `TUBETREND_*` environment
//! variables, then CLI flags (applied in `main`).
//!
//! ```toml
//! [paths]
//! db = "~/.local/share/tubetrend/tubetrend.db"
//!
//! [analytics]
//! default_days = 7
//! wordcloud_limit = 20
//! keyword_video_limit = 10
//!
//! [ingest]
//! max_results = 50
//! incremental = true
//!
//! [denylist.exact]
//! "뷰티" = ["광고"]
//!
//! [denylist.patterns]
//! "뷰티" = ["may"]
//!
//! [output]
//! format = "text"
//! colors = true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    /// Analytics defaults.
    pub analytics: AnalyticsConfig,
    /// Ingestion behavior.
    pub ingest: IngestConfig,
    /// Extra per-category hashtag denylist entries.
    pub denylist: DenylistConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// `TUBETREND_DB`
    pub db: Option<PathBuf>,
}

/// Analytics defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Window used when the CLI gets neither `--range` nor `--days`.
    /// Environment variable: `TUBETREND_DAYS`
    pub default_days: u32,

    /// Maximum number of wordcloud entries.
    pub wordcloud_limit: usize,

    /// Maximum number of videos returned by a keyword lookup.
    pub keyword_video_limit: usize,
}

/// Ingestion behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum records requested from a source per category.
    pub max_results: usize,

    /// Only accept videos published after the category's last collection.
    pub incremental: bool,
}

/// Additional hashtag denylist entries keyed by category name.
///
/// Merged over the built-in table in [`crate::categories`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DenylistConfig {
    /// Tags dropped by exact, case-insensitive match.
    pub exact: BTreeMap<String, Vec<String>>,
    /// Tags dropped when they contain one of these substrings.
    pub patterns: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format: text, json, json-pretty.
    pub format: String,

    /// `NO_COLOR` or `TUBETREND_NO_COLOR` turn this off.
    pub colors: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_days: 7,
            wordcloud_limit: 20,
            keyword_video_limit: 10,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_results: 50,
            incremental: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            colors: true,
        }
    }
}

impl Config {
    /// Defaults, then the user file, then `TUBETREND_*` variables.
    /// CLI flags are applied by the caller on top.
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(file) = Self::user_config_path().and_then(|path| Self::load_from_file(&path)) {
            config.merge(file);
        }
        config.apply_env_overrides();
        debug!(?config, "configuration loaded");
        config
    }

    /// Parse a TOML config file. Missing or malformed files yield `None`;
    /// malformed ones are logged.
    #[must_use]
    pub fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file");
            return None;
        }
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| toml::from_str::<Self>(&content).map_err(|e| e.to_string()));
        match parsed {
            Ok(config) => {
                info!(path = %path.display(), "loaded config");
                Some(config)
            }
            Err(reason) => {
                warn!(path = %path.display(), %reason, "ignoring unreadable config file");
                None
            }
        }
    }

    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tubetrend").join("config.toml"))
    }

    fn apply_env_overrides(&mut self) {
        if let Some(db) = std::env::var_os("TUBETREND_DB") {
            self.paths.db = Some(PathBuf::from(db));
        }
        if let Some(days) = env_number("TUBETREND_DAYS") {
            self.analytics.default_days = days;
        }
        if let Some(limit) = env_number("TUBETREND_WORDCLOUD_LIMIT") {
            self.analytics.wordcloud_limit = limit;
        }
        if let Some(max) = env_number("TUBETREND_MAX_RESULTS") {
            self.ingest.max_results = max;
        }
        if let Ok(format) = std::env::var("TUBETREND_FORMAT") {
            self.output.format = format;
        }
        if ["TUBETREND_NO_COLOR", "NO_COLOR"]
            .iter()
            .any(|key| std::env::var_os(key).is_some())
        {
            self.output.colors = false;
        }
    }

    /// Layer `other` on top. Denylist entries accumulate; other sections
    /// are replaced.
    fn merge(&mut self, other: Self) {
        if other.paths.db.is_some() {
            self.paths.db = other.paths.db;
        }

        self.analytics = other.analytics;
        self.ingest = other.ingest;

        for (category, tags) in other.denylist.exact {
            self.denylist.exact.entry(category).or_default().extend(tags);
        }
        for (category, patterns) in other.denylist.patterns {
            self.denylist
                .patterns
                .entry(category)
                .or_default()
                .extend(patterns);
        }

        self.output = other.output;
    }

    /// Configured database path, or the platform data directory.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.paths
            .db
            .clone()
            .unwrap_or_else(crate::default_db_path)
    }

    /// Apply a `key=value` assignment from `tubetrend config --set`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown keys or values that fail to parse.
    pub fn set_value(&mut self, assignment: &str) -> crate::Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            crate::TubeError::invalid_argument(format!("expected key=value, got '{assignment}'"))
        })?;
        let key = key.trim();
        let value = value.trim();

        let bad_value = |v: &str| {
            crate::TubeError::invalid_argument(format!("invalid value '{v}' for '{key}'"))
        };

        match key {
            "db" | "paths.db" => self.paths.db = Some(PathBuf::from(value)),
            "analytics.default_days" => {
                self.analytics.default_days = value.parse().map_err(|_| bad_value(value))?;
            }
            "analytics.wordcloud_limit" => {
                self.analytics.wordcloud_limit = value.parse().map_err(|_| bad_value(value))?;
            }
            "analytics.keyword_video_limit" => {
                self.analytics.keyword_video_limit =
                    value.parse().map_err(|_| bad_value(value))?;
            }
            "ingest.max_results" => {
                self.ingest.max_results = value.parse().map_err(|_| bad_value(value))?;
            }
            "ingest.incremental" => {
                self.ingest.incremental = value.parse().map_err(|_| bad_value(value))?;
            }
            "output.format" => self.output.format = value.to_string(),
            "output.colors" => {
                self.output.colors = value.parse().map_err(|_| bad_value(value))?;
            }
            _ => {
                return Err(crate::TubeError::invalid_argument(
                    crate::error::format_unknown_value_error(
                        "config key",
                        key,
                        crate::error::VALID_CONFIG_KEYS,
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Write this configuration to [`Config::user_config_path`].
    ///
    /// # Errors
    ///
    /// Fails when there is no config directory for this platform or the
    /// file cannot be written.
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::user_config_path().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no config directory on this platform")
        })?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let rendered = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(&path, rendered)?;
        info!(path = %path.display(), "saved config");
        Ok(())
    }

    /// The defaults rendered as TOML, for `tubetrend config --default`.
    #[must_use]
    pub fn default_config_content() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analytics.default_days, 7);
        assert_eq!(config.analytics.wordcloud_limit, 20);
        assert_eq!(config.ingest.max_results, 50);
        assert!(config.ingest.incremental);
        assert!(config.output.colors);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(
            config.analytics.wordcloud_limit,
            parsed.analytics.wordcloud_limit
        );
    }

    #[test]
    fn test_denylist_from_toml() {
        let parsed: Config = toml::from_str(
            r#"
            [denylist.exact]
            "뷰티" = ["광고", "협찬"]

            [denylist.patterns]
            "여행" = ["may"]
            "#,
        )
        .unwrap();
        assert_eq!(parsed.denylist.exact["뷰티"].len(), 2);
        assert_eq!(parsed.denylist.patterns["여행"], vec!["may".to_string()]);
        assert_eq!(parsed.analytics.default_days, 7);
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.denylist
            .exact
            .insert("뷰티".to_string(), vec!["a".to_string()]);

        let mut other = Config::default();
        other.analytics.wordcloud_limit = 50;
        other.paths.db = Some(PathBuf::from("/custom/path"));
        other
            .denylist
            .exact
            .insert("뷰티".to_string(), vec!["b".to_string()]);

        base.merge(other);

        assert_eq!(base.analytics.wordcloud_limit, 50);
        assert_eq!(base.paths.db, Some(PathBuf::from("/custom/path")));
        assert_eq!(base.denylist.exact["뷰티"], vec!["a", "b"]);
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::default();
        config.set_value("analytics.wordcloud_limit=30").unwrap();
        assert_eq!(config.analytics.wordcloud_limit, 30);

        config.set_value("ingest.incremental = false").unwrap();
        assert!(!config.ingest.incremental);

        assert!(config.set_value("analytics.wordcloud_limit=many").is_err());
        assert!(config.set_value("search.fuzzy=true").is_err());
        assert!(config.set_value("no-equals").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.toml");
        std::fs::write(&good, "[analytics]\ndefault_days = 30\n").unwrap();
        let loaded = Config::load_from_file(&good).unwrap();
        assert_eq!(loaded.analytics.default_days, 30);
        assert_eq!(loaded.analytics.wordcloud_limit, 20);

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[analytics\n").unwrap();
        assert!(Config::load_from_file(&bad).is_none());
        assert!(Config::load_from_file(&dir.path().join("missing.toml")).is_none());
    }

    #[test]
    fn test_default_config_content() {
        let content = Config::default_config_content();
        assert!(content.contains("[analytics]"));
        assert!(content.contains("[ingest]"));
        assert!(content.contains("[output]"));
    }
}
