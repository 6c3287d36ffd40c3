use searcher::{rank, render_rank, render_search, search, EngineChoice, SearchMode};
use searchcore::persist::{save_index, IndexPaths};
use searchcore::{DiskIndex, EngineConfig, InvertedIndex};
use serde_json::Value;
use tempfile::tempdir;

fn build_tiny_index(dir: &std::path::Path) {
    let mut idx = InvertedIndex::new();
    let a = idx.index_document("http://wiki/Big_data", Some("Big data"), "big data and data mining").unwrap();
    let b = idx.index_document("http://wiki/Data_mining", Some("Data mining"), "data mining").unwrap();
    let c = idx.index_document("http://wiki/AI", Some("AI"), "artificial intelligence uses data").unwrap();
    idx.add_link(a, b);
    idx.add_link(b, c);
    idx.add_link(c, a);
    idx.add_link(c, b);
    save_index(&IndexPaths::new(dir), &idx, "2024-01-01T00:00:00Z").unwrap();
}

#[test]
fn search_both_modes_against_store() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let index = DiskIndex::open(dir.path()).unwrap();

    let report = search(&index, "Data Mining", SearchMode::Both).unwrap();
    let taat = report.taat.as_ref().unwrap();
    let daat = report.daat.as_ref().unwrap();
    assert_eq!(taat.len(), 3);
    assert_eq!(daat.iter().map(|h| (h.doc_id, h.score)).collect::<Vec<_>>(), vec![(0, 3), (1, 2)]);

    let json: Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["daat"][0]["doc_id"].as_u64(), Some(0));

    let text = render_search(&index, &report, 1).unwrap();
    assert!(text.contains("[TAAT]"));
    assert!(text.contains("Score: 3 | DocID: 0 | http://wiki/Big_data"));
}

#[test]
fn search_daat_only_skips_taat() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let index = DiskIndex::open(dir.path()).unwrap();
    let report = search(&index, "quantum", SearchMode::Daat).unwrap();
    assert!(report.taat.is_none());
    assert!(render_search(&index, &report, 5).unwrap().contains("No results found."));
}

#[test]
fn report_runs_both_engines_side_by_side() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path().join("index").as_path());
    let index = DiskIndex::open(dir.path().join("index")).unwrap();
    let mut cfg = EngineConfig::default();
    cfg.batch.export_file = dir.path().join("mr_graph.jsonl");

    let report = rank(&index, &cfg, EngineChoice::Both, None).unwrap();
    let batch = report.batch.as_ref().unwrap();
    let vertex = report.vertex.as_ref().unwrap();
    assert_eq!(batch.len(), 3);
    assert!((vertex.total() - 1.0).abs() < 1e-9);
    // No dangling nodes, so the batch total stays at one per node.
    assert!((batch.total() - 3.0).abs() < 1e-9);
    assert!(cfg.batch.export_file.exists());

    let text = render_rank(&index, &report, 3).unwrap();
    assert!(text.contains("[map-reduce] 3 nodes"));
    assert!(text.contains("[vertex-centric] 3 nodes"));
    assert!(text.contains("[side by side]"));
}
