use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput};
use lexseg::{BranchingConfig, BranchingEntropyModel, CohesionModel, Trainer, TrainingConfig};

const STEMS: [&str; 8] = [
    "아이스크림", "커피", "도서관", "학교", "자동차", "비행기", "선생님", "컴퓨터",
];
const ENDINGS: [&str; 6] = ["을", "이", "에서", "으로", "는", "가"];

fn build_sentences() -> Vec<String> {
    let mut sentences = Vec::with_capacity(4096);
    for idx in 0..4096usize {
        let first = STEMS[idx % STEMS.len()];
        let second = STEMS[(idx / 3) % STEMS.len()];
        let first_ending = ENDINGS[idx % ENDINGS.len()];
        let second_ending = ENDINGS[(idx / 5) % ENDINGS.len()];
        sentences.push(format!("{first}{first_ending} {second}{second_ending} 좋았다"));
    }
    sentences
}

fn bench_training(c: &mut Criterion) {
    let sentences = build_sentences();
    let total_bytes: usize = sentences.iter().map(String::len).sum();
    let cfg = TrainingConfig::builder().pruning(1024, 1).build();

    let mut group = c.benchmark_group("train_text_corpus");
    group.throughput(Throughput::Bytes(total_bytes as u64));
    group.sampling_mode(SamplingMode::Flat);
    group.bench_function(BenchmarkId::new("cohesion", "sequential"), |b| {
        b.iter(|| {
            let mut model = CohesionModel::default();
            let metrics = model.train(&sentences, &cfg);
            let _ = black_box((model, metrics));
        });
    });
    group.bench_function(BenchmarkId::new("cohesion", "parallel"), |b| {
        b.iter(|| {
            let mut model = CohesionModel::default();
            let metrics = Trainer::new(cfg.clone()).train_cohesion_parallel(&mut model, &sentences);
            let _ = black_box((model, metrics));
        });
    });
    group.bench_function(BenchmarkId::new("branching", "sequential"), |b| {
        b.iter(|| {
            let mut model =
                BranchingEntropyModel::new(BranchingConfig::default()).expect("configuration");
            let metrics = model.train(&sentences, &cfg);
            let _ = black_box((model, metrics));
        });
    });
    group.finish();
}

fn bench_segmentation(c: &mut Criterion) {
    let sentences = build_sentences();
    let mut model = CohesionModel::default();
    model.train(&sentences, &TrainingConfig::default());

    let mut group = c.benchmark_group("segment");
    group.bench_function(BenchmarkId::from_parameter("tokens"), |b| {
        b.iter(|| {
            for sentence in sentences.iter().take(256) {
                let _ = black_box(model.segment_sentence(sentence));
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_training, bench_segmentation);
criterion_main!(benches);
