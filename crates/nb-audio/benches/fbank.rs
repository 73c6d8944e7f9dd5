use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nb_audio::fbank::FbankExtractor;
use nb_audio::filterbank::{mel_filterbank, triangular_filterbank};
use nb_core::config::{FeatureConfig, FilterbankKind};

fn signal(seconds: usize) -> Vec<f64> {
    (0..seconds * 16000)
        .map(|i| (i as f64 * 0.05).sin() + 0.3 * (i as f64 * 0.37).sin())
        .collect()
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("fbank_extract");
    for kind in [FilterbankKind::Triangular, FilterbankKind::Normalized] {
        let config = FeatureConfig {
            filterbank: kind,
            ..FeatureConfig::default()
        };
        let Ok(extractor) = FbankExtractor::new(&config) else {
            continue;
        };
        let input = signal(10);
        group.bench_with_input(BenchmarkId::new(format!("{kind:?}"), "10s"), &input, |b, input| {
            b.iter(|| extractor.extract(black_box(input)));
        });
    }
    group.finish();
}

fn bench_filterbanks(c: &mut Criterion) {
    c.bench_function("triangular_filterbank_512", |b| {
        b.iter(|| triangular_filterbank(black_box(23), 512, 16000, 0.0, 8000.0));
    });
    c.bench_function("mel_filterbank_2048", |b| {
        b.iter(|| mel_filterbank(black_box(128), 2048, 44100, 50.0, 22050.0));
    });
}

criterion_group!(benches, bench_extract, bench_filterbanks);
criterion_main!(benches);
