use criterion::{criterion_group, criterion_main, Criterion};
use dailymile_sync::services::dailymile::DailymileEntry;
use dailymile_sync::services::{convert_entry, convert_raw_entry, GpxRenderer, TrackRenderer};
use std::hint::black_box;

const TYPES: [&str; 5] = ["Running", "Cycling", "Swimming", "Walking", "Fitness"];

/// A realistic page of feed entries, including a media post and an
/// unsupported unit.
fn feed_page() -> Vec<DailymileEntry> {
    let mut entries: Vec<DailymileEntry> = (0..20)
        .map(|i| {
            let json = serde_json::json!({
                "id": 1000 + i,
                "at": format!("2013-06-{:02}T07:{:02}:00Z", 1 + i % 28, i % 60),
                "message": "Felt good",
                "workout": {
                    "title": format!("Workout {}", i),
                    "activity_type": TYPES[i % TYPES.len()],
                    "duration": 1800 + i * 60,
                    "distance": {"value": 5.0 + i as f64, "units": "miles"}
                }
            });
            serde_json::from_value(json).expect("valid entry")
        })
        .collect();

    entries.push(
        serde_json::from_value(serde_json::json!({
            "id": 1, "at": "2013-06-01T06:00:00Z", "message": "new shoes!"
        }))
        .expect("valid entry"),
    );
    entries.push(
        serde_json::from_value(serde_json::json!({
            "id": 2, "at": "2013-06-01T05:00:00Z",
            "workout": {"activity_type": "Running", "distance": {"value": 3, "units": "furlongs"}}
        }))
        .expect("valid entry"),
    );
    entries
}

fn benchmark_entry_conversion(c: &mut Criterion) {
    let page = feed_page();

    let mut group = c.benchmark_group("entry_conversion");

    group.bench_function("convert_page", |b| {
        b.iter(|| {
            black_box(&page)
                .iter()
                .map(convert_entry)
                .collect::<Vec<_>>()
        })
    });

    let raw_page: Vec<serde_json::Value> = page
        .iter()
        .map(|entry| serde_json::to_value(entry).expect("entry serializes"))
        .collect();
    group.bench_function("decode_and_convert_raw_page", |b| {
        b.iter(|| {
            black_box(&raw_page)
                .iter()
                .filter_map(convert_raw_entry)
                .collect::<Vec<_>>()
        })
    });

    group.bench_function("convert_and_render_gpx", |b| {
        let renderer = GpxRenderer;
        b.iter(|| {
            for conversion in black_box(&page).iter().map(convert_entry) {
                if let dailymile_sync::services::EntryConversion::Converted(activity) = conversion {
                    let _ = renderer.render(&activity);
                }
            }
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_entry_conversion);
criterion_main!(benches);
