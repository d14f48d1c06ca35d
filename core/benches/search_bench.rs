use criterion::{criterion_group, criterion_main, Criterion};
use shopsearch_core::{Document, DocumentStore, FieldTokens, IndexOptions, InvertedIndex, NumericAttributes, ScoringConfig, ScoringModel, SearchEngine};

const VOCAB: &[&str] = &[
    "cotton", "slim", "fit", "shirt", "men", "women", "red", "blue", "black", "shoe", "run", "sport", "casual",
    "print", "round", "neck", "solid", "pack", "jean", "track", "pant", "kurta", "polo", "hood",
];

fn corpus(n: usize) -> DocumentStore {
    let docs = (0..n).map(|i| {
        let title: Vec<String> = (0..6).map(|j| VOCAB[(i * 31 + j * 7) % VOCAB.len()].to_string()).collect();
        let description: Vec<String> = (0..40).map(|j| VOCAB[(i * 13 + j * 5) % VOCAB.len()].to_string()).collect();
        Document {
            pid: format!("P{i:06}"),
            title: title.join(" "),
            url: None,
            tokens: FieldTokens { title, description, ..Default::default() },
            numeric: NumericAttributes {
                average_rating: Some((i % 50) as f32 / 10.0),
                discount: Some((i % 70) as f32),
                selling_price: Some(200.0 + (i % 900) as f32),
                actual_price: None,
                out_of_stock: Some(i % 11 == 0),
            },
        }
    });
    DocumentStore::from_documents(docs).expect("unique pids")
}

fn bench_build(c: &mut Criterion) {
    let store = corpus(5_000);
    let opts = IndexOptions::default();
    c.bench_function("index_build_5k", |b| b.iter(|| InvertedIndex::build(&store, &opts)));
    c.bench_function("index_build_parallel_5k", |b| b.iter(|| InvertedIndex::build_parallel(&store, &opts, 4)));
}

fn bench_search(c: &mut Criterion) {
    let engine = SearchEngine::new(corpus(5_000), ScoringConfig::default());
    let query: Vec<String> = ["cotton", "shirt"].iter().map(|s| s.to_string()).collect();
    for model in [ScoringModel::TfIdf, ScoringModel::Bm25, ScoringModel::Hybrid] {
        c.bench_function(&format!("search_{model}"), |b| b.iter(|| engine.search(&query, model, 20)));
    }
}

criterion_group!(benches, bench_build, bench_search);
criterion_main!(benches);
