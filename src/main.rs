//! tubetrend - Video trend analytics CLI
//!
//! Main entry point for the tubetrend command-line tool.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tracing::debug;

use tubetrend::analytics::{self, days_for_range};
use tubetrend::config::Config;
use tubetrend::ingest::{CollectOptions, Collector, JsonFileSource};
use tubetrend::logging::init_cli_logging;
use tubetrend::{categories, lookup, *};

struct App {
    cli: Cli,
    config: Config,
    format: OutputFormat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load();

    if !config.output.colors {
        colored::control::set_override(false);
    }
    init_cli_logging(cli.quiet, cli.verbose, config.output.colors);

    let format = cli
        .format
        .unwrap_or_else(|| OutputFormat::from_config(&config.output.format));
    let app = App {
        cli,
        config,
        format,
    };

    let result = dispatch(&app);
    if let Err(e) = &result {
        if let Some(hint) = e.downcast_ref::<TubeError>().and_then(TubeError::suggestion) {
            eprintln!("{} {hint}", "hint:".cyan().bold());
        }
    }
    result
}

fn dispatch(app: &App) -> Result<()> {
    match &app.cli.command {
        Commands::Ingest(args) => cmd_ingest(app, args),
        Commands::Metrics(args) => cmd_metrics(app, args),
        Commands::Trends(args) => cmd_trends(app, args),
        Commands::Hashtags(args) => cmd_hashtags(app, args),
        Commands::Titles(args) => cmd_titles(app, args),
        Commands::Wordcloud(args) => cmd_wordcloud(app, args),
        Commands::Report(args) => cmd_report(app, args),
        Commands::Videos(args) => cmd_videos(app, args),
        Commands::LastCollection => cmd_last_collection(app),
        Commands::Snapshot(args) => cmd_snapshot(app, args),
        Commands::Categories => cmd_categories(app),
        Commands::Config(args) => cmd_config(app, args),
        Commands::Completions(args) => cmd_completions(args.clone()),
    }
}

impl App {
    fn db_path(&self) -> PathBuf {
        self.cli.db.clone().unwrap_or_else(|| self.config.db_path())
    }

    /// Open an existing database; analytics never create one.
    fn open_existing(&self) -> Result<Storage> {
        let db_path = self.db_path();
        if !db_path.exists() {
            return Err(TubeError::database_not_found(db_path).into());
        }
        Storage::open(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))
    }

    fn window_days(&self, args: &WindowArgs) -> u32 {
        args.days
            .or_else(|| args.range.as_deref().map(days_for_range))
            .unwrap_or(self.config.analytics.default_days)
    }

    fn analysis_options(&self) -> analytics::AnalysisOptions {
        analytics::AnalysisOptions::from_config(&self.config)
    }

    /// Print `value` as JSON, or run `text` for human output.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
            OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(value),
        }
        Ok(())
    }

    /// Analytics quietly return empty results for unknown categories; say so.
    fn warn_unknown_category(&self, storage: &Storage, category: &str) -> Result<()> {
        if self.cli.quiet || storage.category_id(category)?.is_some() {
            return Ok(());
        }
        let mut known: Vec<String> = categories::category_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        known.extend(storage.category_video_counts()?.into_iter().map(|(name, _)| name));
        known.sort();
        known.dedup();
        let candidates: Vec<&str> = known.iter().map(String::as_str).collect();

        let mut message = format!("No videos stored for category '{category}'.");
        if let Some(closest) = find_closest_match(category, &candidates, None) {
            message.push(' ');
            message.push_str(&format_did_you_mean(closest));
        }
        eprintln!("{} {message}", "warning:".yellow().bold());
        Ok(())
    }
}

fn heading(title: &str) {
    println!("{}", title.bold().cyan());
    println!("{}", "─".repeat(CONTENT_DIVIDER_WIDTH));
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn cmd_ingest(app: &App, args: &cli::IngestArgs) -> Result<()> {
    if !args.file.exists() {
        anyhow::bail!("Input file does not exist: {}", args.file.display());
    }

    let db_path = app.db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut storage = Storage::open(&db_path)?;

    let mut options = CollectOptions::from_config(&app.config.ingest);
    if let Some(max) = args.max_results {
        options.max_results = max;
    }
    options.incremental = options.incremental && !args.full;
    options.time_range_days = args.days;
    debug!(?options, "Collect options");

    let source = JsonFileSource::new(&args.file);
    let report = Collector::new(&mut storage).collect(&args.category, &source, &options)?;

    app.emit(&report, |report| {
        println!(
            "  {} {} new, {} updated, {} skipped ({} read) into {}",
            "✓".green(),
            format_number_usize(report.inserted).cyan(),
            format_number_usize(report.updated),
            format_number_usize(report.skipped),
            format_number_usize(report.fetched),
            args.category.bold()
        );
        println!("  Database: {}", db_path.display());
    })
}

fn cmd_metrics(app: &App, args: &WindowArgs) -> Result<()> {
    let storage = app.open_existing()?;
    app.warn_unknown_category(&storage, &args.category)?;
    let days = app.window_days(args);
    let metrics =
        analytics::calculate_metrics_with(&storage, &args.category, days, &app.analysis_options())?;

    app.emit(&metrics, |m| {
        heading(&format!("{} · last {days} days", args.category));
        println!("  {:<24} {:>10}", "Videos:", format_number_usize(m.total_videos));
        println!("  {:<24} {:>10}", "Average views:", m.avg_views);
        println!("  {:<24} {:>10}", "Trending topics:", m.trending_topics);
        println!("  {:<24} {:>10}", "Recommended hashtags:", m.recommended_hashtags);
    })
}

fn print_trend_points(points: &[TrendPoint]) {
    let max = points.iter().map(|p| p.views).fold(0.0_f64, f64::max);
    for point in points {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let width = if max > 0.0 {
            (point.views / max * 30.0).round() as usize
        } else {
            0
        };
        println!(
            "  {:<8} {:>9.1}K {:>4} videos  {}",
            point.date,
            point.views,
            point.videos,
            "█".repeat(width).blue()
        );
    }
}

fn print_topics(topics: &[TrendingTopic]) {
    for topic in topics {
        println!(
            "  {:<28} {:>4} mentions  {}",
            topic.topic,
            topic.count,
            topic.growth.green()
        );
    }
}

fn cmd_trends(app: &App, args: &WindowArgs) -> Result<()> {
    let storage = app.open_existing()?;
    app.warn_unknown_category(&storage, &args.category)?;
    let days = app.window_days(args);
    let trends =
        analytics::analyze_trends_with(&storage, &args.category, days, &app.analysis_options())?;

    app.emit(&trends, |t| {
        heading(&format!("{} · views over {days} days", args.category));
        print_trend_points(&t.trend_data);
        if !t.trending_topics.is_empty() {
            println!();
            heading("Trending topics");
            print_topics(&t.trending_topics);
        }
    })
}

fn print_hashtags(stats: &[HashtagStat], combination: &HashtagCombination) {
    for stat in stats {
        println!(
            "  {:<20} {:>10} views  {:>5.2}%  r={:.2}  {}",
            stat.tag.blue(),
            format_number(stat.avg_views),
            stat.engagement_rate,
            stat.correlation,
            stat.growth.green()
        );
    }
    if !combination.tags.is_empty() {
        println!();
        println!(
            "  Recommended: {}  (expected {}, correlation {})",
            combination.tags.join(" ").bold(),
            combination.expected_views,
            combination.correlation
        );
    }
}

fn cmd_hashtags(app: &App, args: &WindowArgs) -> Result<()> {
    let storage = app.open_existing()?;
    app.warn_unknown_category(&storage, &args.category)?;
    let days = app.window_days(args);
    let analysis =
        analytics::analyze_hashtags_with(&storage, &args.category, days, &app.analysis_options())?;

    app.emit(&analysis, |a| {
        heading(&format!("{} · hashtags over {days} days", args.category));
        if a.hashtag_stats.is_empty() {
            println!("{}", "  No hashtag is used by enough videos yet.".yellow());
            return;
        }
        print_hashtags(&a.hashtag_stats, &a.recommended_hashtags);
        println!("  Category engagement: {:.2}%", a.baseline_engagement);
    })
}

fn print_titles(patterns: &[TitlePattern], keywords: &[EffectiveKeyword], recommendation: &str) {
    for pattern in patterns {
        println!(
            "  {:<16} {:>10} avg views  {:>4} titles",
            pattern.pattern,
            format_number(pattern.avg_views),
            pattern.count
        );
    }
    if !keywords.is_empty() {
        println!();
        let words: Vec<String> = keywords
            .iter()
            .map(|k| match k.sentiment {
                Sentiment::Positive => format!("{}({})", k.word.green(), k.frequency),
                Sentiment::Negative => format!("{}({})", k.word.red(), k.frequency),
                Sentiment::Neutral => format!("{}({})", k.word, k.frequency),
            })
            .collect();
        println!("  Keywords: {}", words.join(", "));
    }
    if !recommendation.is_empty() {
        println!();
        println!("  {}", recommendation.italic());
    }
}

fn cmd_titles(app: &App, args: &WindowArgs) -> Result<()> {
    let storage = app.open_existing()?;
    app.warn_unknown_category(&storage, &args.category)?;
    let days = app.window_days(args);
    let analysis = analytics::analyze_title_patterns_with(
        &storage,
        &args.category,
        days,
        &app.analysis_options(),
    )?;

    app.emit(&analysis, |a| {
        heading(&format!("{} · titles over {days} days", args.category));
        print_titles(&a.title_patterns, &a.effective_keywords, &a.recommendation);
    })
}

fn cmd_wordcloud(app: &App, args: &cli::WordcloudArgs) -> Result<()> {
    let storage = app.open_existing()?;
    app.warn_unknown_category(&storage, &args.window.category)?;
    let days = app.window_days(&args.window);
    let mut options = app.analysis_options();
    if let Some(limit) = args.limit {
        options.wordcloud_limit = limit;
    }
    let entries = analytics::wordcloud_with(&storage, &args.window.category, days, &options)?;

    app.emit(&entries, |entries| {
        heading(&format!("{} · hashtag cloud", args.window.category));
        for entry in entries {
            println!(
                "  {:<24} {:>3}  {}",
                entry.word,
                entry.size,
                format!("({} uses)", entry.frequency).dimmed()
            );
        }
    })
}

fn cmd_report(app: &App, args: &WindowArgs) -> Result<()> {
    let storage = app.open_existing()?;
    app.warn_unknown_category(&storage, &args.category)?;
    let days = app.window_days(args);
    let report =
        analytics::analysis_report_with(&storage, &args.category, days, &app.analysis_options())?;

    app.emit(&report, |r| {
        heading(&format!("{} · {}", r.category, r.time_range));
        println!(
            "  {} videos, {} average views",
            format_number_usize(r.total_videos).cyan(),
            r.avg_views.cyan()
        );
        println!();
        heading("Trend");
        print_trend_points(&r.trend_data);
        println!();
        heading("Topics");
        print_topics(&r.trending_topics);
        println!();
        heading("Hashtags");
        print_hashtags(&r.hashtag_stats, &r.recommended_hashtags);
        println!();
        heading("Titles");
        print_titles(&r.title_patterns, &r.effective_keywords, &r.recommendation);
    })
}

fn cmd_videos(app: &App, args: &cli::VideosArgs) -> Result<()> {
    let storage = app.open_existing()?;
    let limit = args
        .limit
        .unwrap_or(app.config.analytics.keyword_video_limit);
    let videos = match args.seed {
        Some(seed) => lookup::keyword_videos_with_rng(
            &storage,
            &args.category,
            &args.keyword,
            limit,
            &mut StdRng::seed_from_u64(seed),
        )?,
        None => lookup::keyword_videos(&storage, &args.category, &args.keyword, limit)?,
    };

    app.emit(&videos, |videos| {
        if videos.is_empty() {
            println!(
                "{}",
                format!("No titles in {} mention \"{}\".", args.category, args.keyword).yellow()
            );
            return;
        }
        for video in videos {
            println!("{}", truncate(&video.title, 70).bold());
            println!(
                "   {} · {} views · {} likes · {}",
                video.channel_title,
                format_number(video.view_count).cyan(),
                format_number(video.like_count),
                format_relative_date(video.published_at).dimmed()
            );
        }
    })
}

#[derive(Serialize)]
struct LastCollection {
    last_collection_time: Option<String>,
}

fn cmd_last_collection(app: &App) -> Result<()> {
    let storage = app.open_existing()?;
    let last = lookup::last_collection_time(&storage)?;
    let payload = LastCollection {
        last_collection_time: last.map(storage::format_timestamp),
    };

    app.emit(&payload, |_| {
        println!("Last collection: {}", format_optional_date(last).cyan());
    })
}

fn cmd_snapshot(app: &App, args: &cli::SnapshotArgs) -> Result<()> {
    let storage = app.open_existing()?;

    if args.list {
        let snapshots = lookup::snapshots(&storage, &args.category)?;
        return app.emit(&snapshots, |snapshots| {
            heading(&format!("{} · snapshots", args.category));
            for s in snapshots {
                println!(
                    "  {}  {:>7} videos  {:>12} views  {:>6.2}% engagement",
                    s.snapshot_date.format("%Y-%m-%d %H:%M"),
                    format_number(s.total_videos),
                    format_number(s.total_views),
                    s.avg_engagement_rate
                );
            }
        });
    }

    let snapshot = lookup::record_snapshot(&storage, &args.category, Utc::now())?;
    app.emit(&snapshot, |s| {
        println!(
            "  {} Snapshot of {}: {} videos, {:.0} average views, {:.2}% engagement",
            "✓".green(),
            s.category.bold(),
            format_number(s.total_videos),
            s.avg_views,
            s.avg_engagement_rate
        );
    })
}

#[derive(Serialize)]
struct CategoryRow {
    name: String,
    search_query: String,
    builtin: bool,
    videos: i64,
}

fn cmd_categories(app: &App) -> Result<()> {
    let db_path = app.db_path();
    let stored = if db_path.exists() {
        Storage::open(&db_path)?.category_video_counts()?
    } else {
        Vec::new()
    };

    let mut rows: Vec<CategoryRow> = categories::category_names()
        .into_iter()
        .map(|name| CategoryRow {
            name: name.to_string(),
            search_query: categories::search_query(name),
            builtin: true,
            videos: 0,
        })
        .collect();
    for (name, count) in stored {
        match rows.iter_mut().find(|row| row.name == name) {
            Some(row) => row.videos = count,
            None => rows.push(CategoryRow {
                search_query: categories::search_query(&name),
                name,
                builtin: false,
                videos: count,
            }),
        }
    }

    app.emit(&rows, |rows| {
        heading("Categories");
        for row in rows {
            let name = if row.builtin {
                row.name.bold()
            } else {
                row.name.normal()
            };
            println!(
                "  {:<10} {:>8} videos  {}",
                name,
                format_number(row.videos),
                row.search_query.dimmed()
            );
        }
    })
}

fn cmd_config(app: &App, args: &cli::ConfigArgs) -> Result<()> {
    if args.default {
        print!("{}", Config::default_config_content());
        return Ok(());
    }

    if let Some(assignment) = &args.set {
        let mut config = app.config.clone();
        config.set_value(assignment)?;
        config.save().context("Failed to save configuration")?;
        println!("{} {assignment}", "Set".green());
        return Ok(());
    }

    app.emit(&app.config, |config| {
        heading("Current Configuration");
        println!("  Database: {}", app.db_path().display());
        if let Some(path) = Config::user_config_path() {
            println!("  Config file: {}", path.display());
        }
        println!("  Default window: {} days", config.analytics.default_days);
        println!("  Wordcloud limit: {}", config.analytics.wordcloud_limit);
        println!("  Keyword video limit: {}", config.analytics.keyword_video_limit);
        println!(
            "  Ingest: max {} results, incremental {}",
            config.ingest.max_results, config.ingest.incremental
        );
    })
}

fn cmd_completions(args: cli::CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "tubetrend", &mut io::stdout());
    Ok(())
}
