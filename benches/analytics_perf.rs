//! Performance benchmarks for tubetrend analytics over a synthetic corpus.
//!
//! Run with: `cargo bench --bench analytics_perf`

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use tubetrend::analytics::hashtags::{HeuristicScoring, score_hashtags};
use tubetrend::analytics::topics::extract_topics;
use tubetrend::analytics::trends::bucketize;
use tubetrend::analytics::{
    AnalysisOptions, analysis_report_with, analyze_hashtags_with, calculate_metrics_with,
};
use tubetrend::categories::HashtagDenylist;
use tubetrend::config::DenylistConfig;
use tubetrend::model::{HashtagRow, RawVideo};
use tubetrend::storage::Storage;

const WORDS: &[&str] = &[
    "립스틱", "추천", "리뷰", "데일리", "메이크업", "vlog", "브이로그", "꿀팁", "하울", "여름",
    "GRWM", "쿠션", "파운데이션", "TOP10", "방법",
];
const TAGS: &[&str] = &["립스틱", "makeup", "GRWM", "데일리룩", "여름", "쿠션", "광고", "may"];

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).single().unwrap()
}

fn corpus(size: usize) -> Vec<RawVideo> {
    (0..size)
        .map(|i| {
            let title = (0..5)
                .map(|k| WORDS[(i * 7 + k * 3) % WORDS.len()])
                .collect::<Vec<_>>()
                .join(" ");
            let views = i64::try_from(1_000 + (i * 7_919) % 90_000).unwrap();
            RawVideo {
                video_id: format!("v{i}"),
                title,
                description: None,
                published_at: now() - Duration::hours(i64::try_from(i % 700).unwrap()),
                channel_id: format!("c{}", i % 40),
                channel_title: "channel".to_string(),
                view_count: views,
                like_count: views / 25,
                comment_count: views / 200,
                thumbnail_default: None,
                thumbnail_medium: None,
                thumbnail_high: None,
                tags: (0..3).map(|k| TAGS[(i + k * 5) % TAGS.len()].to_string()).collect(),
            }
        })
        .collect()
}

fn seeded(size: usize) -> Storage {
    let mut storage = Storage::open_memory().unwrap();
    storage.store_videos("뷰티", &corpus(size), now()).unwrap();
    storage
}

fn bench_store_videos(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_videos");
    for size in [100_usize, 1_000] {
        let videos = corpus(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &videos, |b, videos| {
            b.iter(|| {
                let mut storage = Storage::open_memory().unwrap();
                black_box(storage.store_videos("뷰티", videos, now()).unwrap())
            });
        });
    }
    group.finish();
}

fn bench_entry_points(c: &mut Criterion) {
    let storage = seeded(2_000);
    let options = AnalysisOptions::at(now());

    c.bench_function("calculate_metrics_7d", |b| {
        b.iter(|| black_box(calculate_metrics_with(&storage, "뷰티", 7, &options).unwrap()));
    });
    c.bench_function("analyze_hashtags_30d", |b| {
        b.iter(|| black_box(analyze_hashtags_with(&storage, "뷰티", 30, &options).unwrap()));
    });
    c.bench_function("analysis_report_7d", |b| {
        b.iter(|| black_box(analysis_report_with(&storage, "뷰티", 7, &options).unwrap()));
    });
}

fn bench_pure_components(c: &mut Criterion) {
    let storage = seeded(5_000);
    let category_id = storage.category_id("뷰티").unwrap().unwrap();
    let videos = storage.category_videos(category_id, None).unwrap();
    let rows: Vec<HashtagRow> = storage.hashtag_rows(category_id, None).unwrap();
    let denylist = HashtagDenylist::for_category("뷰티", &DenylistConfig::default());

    let mut group = c.benchmark_group("components");
    group.throughput(Throughput::Elements(videos.len() as u64));
    group.bench_function("extract_topics", |b| {
        b.iter(|| black_box(extract_topics(&videos, "뷰티")));
    });
    group.bench_function("bucketize_weekly", |b| {
        b.iter(|| black_box(bucketize(&videos, 30, now())));
    });
    group.bench_function("score_hashtags", |b| {
        b.iter(|| black_box(score_hashtags(&rows, &denylist, &HeuristicScoring)));
    });
    group.finish();
}

criterion_group!(
    name = storage_benches;
    config = Criterion::default().significance_level(0.05);
    targets = bench_store_videos
);

criterion_group!(
    name = analytics_benches;
    config = Criterion::default().significance_level(0.05).noise_threshold(0.02);
    targets =
        bench_entry_points,
        bench_pure_components
);

criterion_main!(storage_benches, analytics_benches);
