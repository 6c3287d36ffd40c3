use searchcore::{DiskIndex, IndexReader, QueryProcessor};
use std::fs;
use tempfile::tempdir;

const CRAWL: &str = r#"{"url": "http://wiki/Big_data", "title": "Big data", "body": "Big data needs data mining", "links": ["http://wiki/Data_mining", "http://wiki/Unfetched"]}
{"url": "http://wiki/Data_mining", "title": "Data mining", "body": "Data mining of big graphs", "links": ["http://wiki/Big_data", "http://wiki/Big_data"]}

{"url": "http://wiki/Empty", "body": "   ", "links": ["http://wiki/Big_data"]}
{"url": "http://wiki/Big_data", "body": "a duplicate that is ignored"}
"#;

#[test]
fn build_writes_a_readable_store() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("crawl.jsonl");
    fs::write(&input, CRAWL).unwrap();
    let out = dir.path().join("index");

    let meta = indexer::build_index(input.to_str().unwrap(), out.to_str().unwrap()).unwrap();
    assert_eq!(meta.num_docs, 4);
    assert_eq!(meta.num_indexable, 2);

    let disk = DiskIndex::open(&out).unwrap();
    assert_eq!(disk.count_indexable_documents().unwrap(), 2);
    assert_eq!(
        disk.all_indexable_documents().unwrap(),
        vec![(0, "http://wiki/Big_data".to_string()), (1, "http://wiki/Data_mining".to_string())]
    );
    // Empty body became doc 2, the unfetched link target doc 3.
    assert_eq!(disk.url_of(3).unwrap().as_deref(), Some("http://wiki/Unfetched"));
    assert_eq!(disk.out_links_of(0).unwrap(), vec![1, 3]);
    assert_eq!(disk.out_links_of(1).unwrap(), vec![0, 0]);
    assert_eq!(disk.out_links_of(2).unwrap(), vec![0]);

    let qp = QueryProcessor::new(&disk);
    let hits = qp.score_by_cooccurrence("data mining").unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].doc_id, 0);
    assert_eq!(hits[0].score, 3);
}

#[test]
fn build_reads_json_arrays_from_a_directory() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("a.json"), r#"[{"url": "http://a", "body": "alpha"}, {"url": "http://b", "body": "beta", "links": ["http://a"]}]"#).unwrap();
    fs::write(input.join("notes.txt"), "not an input").unwrap();
    let out = dir.path().join("index");

    let meta = indexer::build_index(input.to_str().unwrap(), out.to_str().unwrap()).unwrap();
    assert_eq!(meta.num_docs, 2);
    let disk = DiskIndex::open(&out).unwrap();
    assert_eq!(disk.all_links().unwrap(), vec![(1, 0)]);
}
