use criterion::{black_box, criterion_group, criterion_main, Criterion};
use telegram_downloader::error::Result;
use telegram_downloader::ident::{expand_ranges, normalize_channel, parse_ranges};
use telegram_downloader::targets::{expand_targets, Prompter, TargetSpec};

fn normalize_benchmark(c: &mut Criterion) {
    let inputs = [
        "1006503122",
        "-1001006503122",
        "@some_channel",
        "some_channel",
        "123abc",
    ];

    c.bench_function("normalize_channel_mixed_inputs", |b| {
        b.iter(|| {
            for input in inputs {
                black_box(normalize_channel(black_box(input)));
            }
        });
    });
}

fn ranges_benchmark(c: &mut Criterion) {
    let expression = sample_expression();

    c.bench_function("parse_ranges_long_expression", |b| {
        b.iter(|| {
            let ranges = parse_ranges(black_box(&expression)).unwrap();
            black_box(ranges.len());
        });
    });

    let ranges = parse_ranges(&expression).unwrap();

    c.bench_function("expand_ranges_wide_spans", |b| {
        b.iter(|| {
            let ids = expand_ranges(black_box(&ranges));
            black_box(ids.len());
        });
    });
}

fn expand_targets_benchmark(c: &mut Criterion) {
    let links: Vec<String> = (0..64)
        .map(|i| format!("https://t.me/c/1006503122/{}..{}", i * 100 + 1, i * 100 + 50))
        .collect();
    let spec = TargetSpec {
        link: Some(links.join(";")),
        ..TargetSpec::default()
    };

    c.bench_function("expand_targets_link_list", |b| {
        b.iter(|| {
            let targets = expand_targets(black_box(&spec), &mut NoPrompter).unwrap();
            black_box(targets.len());
        });
    });
}

struct NoPrompter;

impl Prompter for NoPrompter {
    fn prompt(&mut self, _message: &str) -> Result<String> {
        unreachable!("benchmark inputs are fully specified")
    }
}

fn sample_expression() -> String {
    (0..256)
        .map(|i| {
            if i % 4 == 0 {
                format!("{}..{}", i * 10, i * 10 + 100)
            } else {
                (i * 10).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

criterion_group!(
    parsing,
    normalize_benchmark,
    ranges_benchmark,
    expand_targets_benchmark
);
criterion_main!(parsing);
