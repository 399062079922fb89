//! CLI definitions for tubetrend.
//!
//! Uses clap for argument parsing with derive macros.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// tubetrend - Video trend analytics for content creators
#[derive(Parser, Debug)]
#[command(name = "tubetrend")]
#[command(version)]
#[command(about = "Collect category video metadata and analyze what trends")]
#[command(long_about = r"
tubetrend - Collects per-category video metadata into a local SQLite
corpus and derives creator-facing analytics from it.

Analytics:
  - Summary metrics (videos, average views, recommended hashtags)
  - View trends by day or week, plus trending title topics
  - Hashtag effectiveness with a recommended combination
  - Title patterns and effective keywords
  - Hashtag wordcloud

Quick start:
  1. Import videos: tubetrend ingest 뷰티 --file videos.json
  2. Analyze:       tubetrend report 뷰티 --range 7days
")]
pub struct Cli {
    /// Path to the database file
    #[arg(long, env = "TUBETREND_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Output format [default: text, or `output.format` from config]
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Show debug logs; repeat for trace logs with source locations
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Be quiet (suppress non-error output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import videos for a category from a JSON or JSONL export
    Ingest(IngestArgs),

    /// Summary metrics for a category
    Metrics(WindowArgs),

    /// View trend buckets and trending topics
    Trends(WindowArgs),

    /// Hashtag effectiveness and recommended combination
    Hashtags(WindowArgs),

    /// Title patterns and effective keywords
    Titles(WindowArgs),

    /// Hashtag wordcloud
    Wordcloud(WordcloudArgs),

    /// Full analysis report
    Report(WindowArgs),

    /// Sample videos whose title contains a keyword
    Videos(VideosArgs),

    /// Show when videos were last collected
    LastCollection,

    /// Record or list per-category trend snapshots
    Snapshot(SnapshotArgs),

    /// List known categories and stored video counts
    Categories,

    /// Show or manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Category to collect into
    pub category: String,

    /// JSON array or JSON Lines file of video records
    #[arg(long, short = 'i')]
    pub file: PathBuf,

    /// Maximum number of records to take from the source
    #[arg(long, short = 'n')]
    pub max_results: Option<usize>,

    /// Ignore the last collection time and take everything in range
    #[arg(long)]
    pub full: bool,

    /// Only take videos published in the last N days
    #[arg(long)]
    pub days: Option<u32>,
}

/// Category plus analysis window.
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Category to analyze
    pub category: String,

    /// Window label: 7days, or anything else for 30 days
    #[arg(long, short = 'r', conflicts_with = "days")]
    pub range: Option<String>,

    /// Window length in days
    #[arg(long, short = 'd')]
    pub days: Option<u32>,
}

#[derive(Args, Debug)]
pub struct WordcloudArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Maximum number of words
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VideosArgs {
    /// Category to search
    pub category: String,

    /// Keyword that must appear in the title
    pub keyword: String,

    /// Maximum number of videos
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Seed for reproducible sampling
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Category to snapshot
    pub category: String,

    /// List stored snapshots instead of recording one
    #[arg(long, short = 'l')]
    pub list: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Show current configuration
    #[arg(long)]
    pub show: bool,

    /// Set a configuration value (key=value)
    #[arg(long)]
    pub set: Option<String>,

    /// Print the default configuration file
    #[arg(long)]
    pub default: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

impl OutputFormat {
    /// Parse the `output.format` config value; unknown names fall back to text.
    #[must_use]
    pub fn from_config(value: &str) -> Self {
        <Self as ValueEnum>::from_str(value, true).unwrap_or_default()
    }
}
