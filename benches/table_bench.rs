use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::hint::black_box;
use yindian::rows::PronunciationEntry;
use yindian::render::CellRenderer;
use yindian::{CharacterResult, DisplayMode, FieldSelections, LanguageInfo, build_table, normalize};

/// `n` languages spread over a handful of regions, sort keys mixing numbers
/// and text the way the live catalog does.
fn catalog(n: u32) -> Vec<LanguageInfo> {
    let rows: Vec<Value> = (1..=n)
        .map(|id| {
            let region = format!("區{}", id % 12);
            let chen_sort = if id % 5 == 0 { Value::Null } else { json!(id) };
            json!([
                id,
                format!("地點{id}"),
                format!("點{id}"),
                (n - id) % 97,
                "#3366CC",
                region,
                format!("{:04}", id % 211),
                "#FFEE99",
                region,
                chen_sort,
                "#99CC00",
                region,
                "",
                format!("{}.5,{}.5", 100 + id % 20, 20 + id % 15)
            ])
        })
        .collect();
    serde_json::from_value(Value::Array(rows)).unwrap_or_default()
}

fn results(chars: &str, languages: u32) -> Vec<CharacterResult> {
    chars
        .chars()
        .map(|c| CharacterResult {
            character: c.to_string(),
            entries: (1..=languages)
                .flat_map(|id| {
                    let first = PronunciationEntry {
                        language_id: id,
                        reading: format!("tʰin{id}˥"),
                        note: None,
                    };
                    let second = (id % 7 == 0).then(|| PronunciationEntry {
                        language_id: id,
                        reading: format!("tin{id}˨"),
                        note: Some("白讀".to_owned()),
                    });
                    std::iter::once(first).chain(second)
                })
                .collect(),
        })
        .collect()
}

fn bench_build_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("BuildTable");

    for &size in &[50u32, 500, 1200] {
        let raw = catalog(size);
        let selected: BTreeSet<_> = raw.iter().map(|l| l.id).collect();
        let query = results("天地玄黃宇宙洪荒", size);

        for mode in DisplayMode::ALL {
            let processed = normalize(&raw, mode);
            group.bench_function(BenchmarkId::new(mode.to_string(), size), |b| {
                b.iter(|| black_box(build_table(black_box(&query), &processed, &selected)).rows.len());
            });
        }
    }

    group.finish();
}

fn bench_render_rows(c: &mut Criterion) {
    let raw = catalog(1200);
    let selected: BTreeSet<_> = raw.iter().map(|l| l.id).collect();
    let processed = normalize(&raw, DisplayMode::Atlas2);
    let table = build_table(&results("天地玄黃", 1200), &processed, &selected);
    let fields = FieldSelections::default();

    c.bench_function("RenderRows/1200", |b| {
        b.iter(|| {
            let mut bytes = 0;
            for row in &table.rows {
                let renderer = CellRenderer::for_row(row, &fields);
                bytes += renderer.row_html(row).iter().map(String::len).sum::<usize>();
            }
            black_box(bytes)
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(std::time::Duration::from_secs(3))
        .warm_up_time(std::time::Duration::from_secs(1))
        .sample_size(100);
    targets = bench_build_table, bench_render_rows
}

criterion_main!(benches);
