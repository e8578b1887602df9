use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use parcel_pipeline::config::{LlmTrainingSettings, StatisticsSettings};
use parcel_pipeline::generate::{ArtifactGenerator, TextChunker};
use parcel_pipeline::analysis::StatisticsEngine;
use parcel_pipeline::models::{Coordinates, PropertyRecord};
use parcel_pipeline::split::ChunkSplitter;

fn records(n: usize) -> Vec<PropertyRecord> {
    (0..n)
        .map(|i| {
            let mut record = PropertyRecord::new(i);
            record.address = Some(format!("{} CORAL WAY", 2000 + i));
            record.owner = Some(if i % 4 == 0 { "GABLES HOLDINGS INC" } else { "ANA RUIZ" }.to_string());
            record.zoning = Some(["T3-R", "T4-L", "T5-O"][i % 3].to_string());
            record.year_built = Some(1920 + (i % 100) as i32);
            record.building_value = Some(150_000.0 + i as f64);
            record.land_value = Some(90_000.0);
            record.total_value = Some(240_000.0 + i as f64);
            record.neighborhood = Some("Shenandoah".to_string());
            record.municipality = Some("Miami".to_string());
            record.coordinates = Some(Coordinates::new(25.75, -80.23));
            record
        })
        .collect()
}

fn bench_generate(c: &mut Criterion) {
    let generator = ArtifactGenerator::new(&LlmTrainingSettings::default()).unwrap();
    let mut group = c.benchmark_group("generate.chunk");
    for size in [50usize, 500] {
        let data = records(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| generator.generate_chunk(black_box(data)));
        });
    }
    group.finish();
}

fn bench_statistics(c: &mut Criterion) {
    let engine = StatisticsEngine::new(StatisticsSettings::default()).with_current_year(2026);
    let data = records(5_000);
    c.bench_function("analysis.statistics.5000", |b| {
        b.iter(|| engine.compute(black_box(&data)));
    });
}

fn bench_split_and_window(c: &mut Criterion) {
    let data = records(10_000);
    let splitter = ChunkSplitter::new(50);
    c.bench_function("split.chunks.10000", |b| {
        b.iter(|| splitter.split(black_box(&data)).len());
    });

    let chunker = TextChunker::new(1000, 100).unwrap();
    let text = "Property at 2000 CORAL WAY, Miami. ".repeat(300);
    c.bench_function("rag.windows.10k_chars", |b| {
        b.iter(|| chunker.windows(black_box(&text)).len());
    });
}

criterion_group!(benches, bench_generate, bench_statistics, bench_split_and_window);
criterion_main!(benches);
