use criterion::{criterion_group, criterion_main, Criterion};
use searchcore::graph::Adjacency;
use searchcore::{BatchRank, InvertedIndex, QueryProcessor, RankEngine, VertexCentricRank};

const WORDS: &[&str] = &["data", "mining", "graph", "rank", "query", "index", "page", "link", "term", "score"];

fn corpus(docs: u32) -> InvertedIndex {
    let mut idx = InvertedIndex::new();
    for i in 0..docs {
        let text: Vec<&str> = (0..40).map(|j| WORDS[((i * 7 + j * 3) % WORDS.len() as u32) as usize]).collect();
        idx.index_document(&format!("http://doc/{i}"), None, &text.join(" ")).expect("index");
        for k in 1..4 {
            idx.add_link(i, (i * 13 + k * 17) % docs);
        }
    }
    idx
}

fn bench_queries(c: &mut Criterion) {
    let idx = corpus(2_000);
    let qp = QueryProcessor::new(&idx);
    c.bench_function("taat_two_terms", |b| b.iter(|| qp.score_by_relevance("data mining").expect("taat")));
    c.bench_function("daat_two_terms", |b| b.iter(|| qp.score_by_cooccurrence("data mining").expect("daat")));
}

fn bench_ranks(c: &mut Criterion) {
    let idx = corpus(2_000);
    let graph = Adjacency::build(&idx).expect("adjacency");
    let vertex = VertexCentricRank::new();
    c.bench_function("vertex_centric_20_supersteps", |b| b.iter(|| vertex.run(&graph, 20)));

    let dir = tempfile::tempdir().expect("tempdir");
    let batch = BatchRank::new(dir.path().join("mr_graph.jsonl"));
    c.bench_function("map_reduce_5_rounds", |b| b.iter(|| batch.compute_ranks(&idx, 5).expect("batch")));
}

criterion_group!(benches, bench_queries, bench_ranks);
criterion_main!(benches);
