#[path = "../util/util.rs"]
mod util;

use util::bench_images;

use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use huegrade::{
    kmeans::Kmeans, Classifier, ClusterCount, ColorSlice, KmeansOptions, ReferencePalette,
};
use image::RgbImage;

const ITERATIONS: u32 = KmeansOptions::DEFAULT_ITERATIONS;

fn bench(
    c: &mut Criterion,
    group: &str,
    images: &[(String, RgbImage)],
    mut f: impl FnMut(&mut Bencher<WallTime>, &(ClusterCount, &RgbImage)),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    for (k, secs) in [(ClusterCount::DEFAULT, 2), (ClusterCount::new(16).unwrap(), 3)] {
        group.measurement_time(Duration::from_secs(secs));
        for (path, image) in images {
            group.bench_with_input(BenchmarkId::new(k.to_string(), path), &(k, image), &mut f);
        }
    }
}

fn kmeans_train_single(c: &mut Criterion) {
    bench(c, "kmeans_train_single", bench_images(), |b, &(k, image)| {
        let slice = ColorSlice::try_from(image).unwrap();
        let options = KmeansOptions::new().k(k).seed(0);
        b.iter(|| {
            let mut kmeans = Kmeans::new(slice, options).unwrap();
            kmeans.train(ITERATIONS);
            kmeans.into_output()
        })
    })
}

fn kmeans_train_par(c: &mut Criterion) {
    bench(c, "kmeans_train_par", bench_images(), |b, &(k, image)| {
        let slice = ColorSlice::try_from(image).unwrap();
        let options = KmeansOptions::new().k(k).seed(0);
        b.iter(|| {
            let mut kmeans = Kmeans::new(slice, options).unwrap();
            kmeans.train_par(ITERATIONS);
            kmeans.into_output()
        })
    })
}

fn classify_single(c: &mut Criterion) {
    let palette = ReferencePalette::default();
    bench(c, "classify_single", bench_images(), |b, &(k, image)| {
        let classifier = Classifier::new(&palette).kmeans(KmeansOptions::new().k(k));
        b.iter(|| classifier.classify_rgbimage(image).unwrap())
    })
}

fn classify_par(c: &mut Criterion) {
    let palette = ReferencePalette::default();
    bench(c, "classify_par", bench_images(), |b, &(k, image)| {
        let classifier = Classifier::new(&palette).kmeans(KmeansOptions::new().k(k));
        b.iter(|| classifier.classify_rgbimage_par(image).unwrap())
    })
}

criterion_group!(
    benches,
    kmeans_train_single,
    kmeans_train_par,
    classify_single,
    classify_par,
);
criterion_main!(benches);
