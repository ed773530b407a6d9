// Build and query benchmarks for the exact similarity index
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::thread;
use tastematch::{SimilarityIndex, TfIdfVectorizer, Vector};

const TEXT_DIM: usize = 124;
const DIM: usize = TEXT_DIM + 4;

fn generate_random_vector(rng: &mut StdRng, dim: usize) -> Vector {
    let data: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0f32..1.0f32)).collect();
    Vector::new(data)
}

fn generate_index(rng: &mut StdRng, n: usize) -> SimilarityIndex {
    let ids = (0..n).map(|i| format!("item-{i}")).collect();
    let vectors = (0..n).map(|_| generate_random_vector(rng, DIM)).collect();
    SimilarityIndex::build(ids, vectors, TEXT_DIM).unwrap()
}

const WORDS: &[&str] = &[
    "pizza", "thai", "noodles", "sushi", "brunch", "cocktails", "vegan", "burger", "ramen",
    "tacos", "midtown", "chelsea", "soho", "brooklyn", "spicy", "cozy", "rooftop", "wine",
];

fn generate_document(rng: &mut StdRng) -> String {
    (0..20)
        .map(|_| WORDS[rng.random_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    group.sample_size(10);

    for size in [100, 1000, 3000].iter() {
        let mut rng = StdRng::seed_from_u64(7);
        let ids: Vec<String> = (0..*size).map(|i| format!("item-{i}")).collect();
        let vectors: Vec<Vector> = (0..*size)
            .map(|_| generate_random_vector(&mut rng, DIM))
            .collect();
        group.bench_with_input(BenchmarkId::new("pairwise", size), size, |b, _| {
            b.iter(|| {
                let index =
                    SimilarityIndex::build(ids.clone(), vectors.clone(), TEXT_DIM).unwrap();
                black_box(index);
            });
        });
    }

    group.finish();
}

fn benchmark_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let mut rng = StdRng::seed_from_u64(11);
    let index = generate_index(&mut rng, 3000);
    let query = generate_random_vector(&mut rng, DIM);
    let text_query = generate_random_vector(&mut rng, TEXT_DIM);

    group.bench_function("by_index", |b| {
        b.iter(|| black_box(index.query_by_index(black_box(42), 10).unwrap()));
    });
    group.bench_function("by_vector", |b| {
        b.iter(|| black_box(index.query_by_vector(black_box(query.as_slice()), 10).unwrap()));
    });
    group.bench_function("by_text_vector", |b| {
        b.iter(|| {
            black_box(
                index
                    .query_by_vector(black_box(text_query.as_slice()), 10)
                    .unwrap(),
            )
        });
    });

    group.finish();
}

fn benchmark_tfidf(c: &mut Criterion) {
    let mut group = c.benchmark_group("tfidf");
    group.sample_size(10);
    let mut rng = StdRng::seed_from_u64(3);
    let corpus: Vec<String> = (0..3000).map(|_| generate_document(&mut rng)).collect();

    group.bench_function("fit_transform", |b| {
        b.iter(|| {
            let mut vectorizer = TfIdfVectorizer::new(Some(5000));
            black_box(vectorizer.fit_transform(black_box(corpus.as_slice())).unwrap());
        });
    });

    group.finish();
}

fn benchmark_concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_reads");
    let mut rng = StdRng::seed_from_u64(5);
    let index = Arc::new(generate_index(&mut rng, 1000));

    group.bench_function("ten_readers", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..10)
                .map(|t| {
                    let index = index.clone();
                    thread::spawn(move || index.query_by_index(t * 7, 10))
                })
                .collect();

            for handle in handles {
                black_box(handle.join().unwrap().unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_build,
    benchmark_queries,
    benchmark_tfidf,
    benchmark_concurrent_reads
);
criterion_main!(benches);
