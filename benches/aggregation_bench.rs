//! Benchmarks for the series and merge engines
//!
//! Run with: cargo bench

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use goalpost::backup::*;
use goalpost::series::*;

fn create_test_responses(days: i64, per_day: i64) -> Vec<RawResponse> {
    let start = Utc.with_ymd_and_hms(2023, 1, 1, 6, 0, 0).unwrap();
    (0..days * per_day)
        .map(|i| {
            let at = start + Duration::days(i / per_day) + Duration::minutes((i % per_day) * 37);
            RawResponse::new(at, (i % 10) as f64)
        })
        .collect()
}

fn create_test_snapshot(goals: usize, points_per_goal: usize) -> BackupSnapshot {
    let start = Utc.with_ymd_and_hms(2023, 1, 1, 6, 0, 0).unwrap();
    let goals = (0..goals)
        .map(|g| {
            let question = QuestionSnapshot::new("How many?", ResponseType::Numeric);
            let mut goal = GoalSnapshot::new(format!("Goal {}", g), GoalCategory::Health);
            for i in 0..points_per_goal {
                goal.data_points.push(DataPointSnapshot::numeric(
                    question.id,
                    start + Duration::hours(i as i64 * 7),
                    i as f64,
                ));
            }
            goal.question(question)
        })
        .collect();
    BackupSnapshot::new(goals)
}

fn bench_daily(c: &mut Criterion) {
    let mut group = c.benchmark_group("daily");
    let rules = CalendarRules::utc();

    for days in [30, 365, 3650] {
        let responses = create_test_responses(days, 4);

        group.throughput(Throughput::Elements(responses.len() as u64));
        group.bench_function(format!("aggregate_daily_{}d", days), |b| {
            b.iter(|| aggregate_daily(black_box(&responses), &rules))
        });
    }

    group.finish();
}

fn bench_buckets(c: &mut Criterion) {
    let mut group = c.benchmark_group("buckets");
    let daily = aggregate_daily(&create_test_responses(3650, 1), &CalendarRules::utc());

    group.throughput(Throughput::Elements(daily.len() as u64));
    for granularity in Granularity::ALL {
        group.bench_function(format!("aggregate_{}", granularity), |b| {
            b.iter(|| aggregate_by_granularity(black_box(&daily), granularity))
        });
    }

    group.finish();
}

fn bench_refresh(c: &mut Criterion) {
    let responses = create_test_responses(365, 4);

    c.bench_function("chart_refresh_memoised", |b| {
        let mut refresher =
            ChartRefresher::new(CalendarRules::utc(), std::time::Duration::from_secs(60));
        b.iter(|| refresher.refresh(black_box(&responses)))
    });
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    let primary = create_test_snapshot(20, 500);
    let mut secondary = primary.clone();
    secondary.goals[3].title = "Renamed".to_string();
    secondary.goals.extend(create_test_snapshot(5, 500).goals);

    group.bench_function("detect_conflicts", |b| {
        b.iter(|| detect_conflicts(black_box(&primary), black_box(&secondary)))
    });

    group.bench_function("merge_skip_conflicting", |b| {
        b.iter(|| merge(black_box(&primary), black_box(&secondary), MergeStrategy::SkipConflicting).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_daily, bench_buckets, bench_refresh, bench_merge);
criterion_main!(benches);
