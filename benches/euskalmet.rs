use chrono::{TimeDelta, TimeZone, Utc};
use chrono_tz::Europe::Madrid;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use euskalmet::{plan_batches, MeasureSeries, ObservationTable};

fn month_table(offset_hours: i64, value: f64) -> ObservationTable {
    let start = Madrid.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + TimeDelta::hours(offset_hours);
    let mut table = ObservationTable::new("C017");
    for name in ["precipitation", "mean_speed", "temperature"] {
        table.push_series(MeasureSeries {
            name: name.to_string(),
            points: (0..24 * 30)
                .map(|h| (start + TimeDelta::hours(h), value))
                .collect(),
        });
    }
    table
}

fn bench_sync(c: &mut Criterion) {
    let end = Utc.with_ymd_and_hms(2024, 3, 10, 11, 0, 0).unwrap();
    let start = end - TimeDelta::days(365);
    c.bench_function("plan_batches_one_year", |b| {
        b.iter(|| plan_batches(black_box(&start), black_box(&end)))
    });

    let persisted = month_table(0, 1.0);
    let batch = month_table(24 * 15, 2.0);
    c.bench_function("merge_overlapping_month", |b| {
        b.iter(|| {
            let mut table = persisted.clone();
            table.merge(black_box(batch.clone()));
            table
        })
    });

    c.bench_function("to_dataframe_month", |b| {
        b.iter(|| black_box(&persisted).to_dataframe())
    });
}

criterion_group!(benches, bench_sync);
criterion_main!(benches);
