//! Graph snapshots for the rank engines: a line-delimited node record store for the
//! batch engine and an in-memory adjacency structure for the vertex-centric engine.

use crate::error::{Error, Result};
use crate::index::{DocId, IndexReader};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const RECORD_SEPARATOR: char = '\t';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub rank: f64,
    pub out: Vec<DocId>,
    pub url: String,
}

/// `<docId>\t{"rank":..,"out":[..],"url":..}`
pub fn encode_line(doc_id: DocId, record: &NodeRecord) -> Result<String> {
    Ok(format!("{doc_id}{RECORD_SEPARATOR}{}", serde_json::to_string(record)?))
}

pub fn decode_line(line_no: usize, line: &str) -> Result<(DocId, NodeRecord)> {
    let malformed = |reason: String| Error::MalformedRecord { line: line_no, reason };
    let (id, payload) = line
        .split_once(RECORD_SEPARATOR)
        .ok_or_else(|| malformed("missing separator".into()))?;
    let doc_id: DocId = id
        .trim()
        .parse()
        .map_err(|e| malformed(format!("bad doc id {id:?}: {e}")))?;
    let record: NodeRecord = serde_json::from_str(payload).map_err(|e| malformed(e.to_string()))?;
    if !record.rank.is_finite() || record.rank < 0.0 {
        return Err(malformed(format!("rank {} is not a non-negative number", record.rank)));
    }
    Ok((doc_id, record))
}

/// Snapshot every indexable document with rank 1.0 and its distinct out-link targets.
/// Targets that are stubs stay in the list. Returns the number of records written.
pub fn export_nodes(index: &dyn IndexReader, path: &Path) -> Result<usize> {
    let mut out_links: HashMap<DocId, Vec<DocId>> = HashMap::new();
    let mut seen: HashSet<(DocId, DocId)> = HashSet::new();
    for (from, to) in index.all_links()? {
        if seen.insert((from, to)) {
            out_links.entry(from).or_default().push(to);
        }
    }
    let mut nodes = BTreeMap::new();
    for (doc_id, url) in index.all_indexable_documents()? {
        let out = out_links.remove(&doc_id).unwrap_or_default();
        nodes.insert(doc_id, NodeRecord { rank: 1.0, out, url });
    }
    write_nodes(path, &nodes)?;
    Ok(nodes.len())
}

/// Load the whole store. A missing file reads as empty.
pub fn read_nodes(path: &Path) -> Result<BTreeMap<DocId, NodeRecord>> {
    let f = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };
    let mut nodes = BTreeMap::new();
    for (i, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let (doc_id, record) = decode_line(i + 1, &line)?;
        nodes.insert(doc_id, record);
    }
    Ok(nodes)
}

/// Replace the store wholesale: write `<path>.tmp`, then rename it over the target.
pub fn write_nodes(path: &Path, nodes: &BTreeMap<DocId, NodeRecord>) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    {
        let mut out = BufWriter::new(File::create(&tmp)?);
        for (doc_id, record) in nodes {
            out.write_all(encode_line(*doc_id, record)?.as_bytes())?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Directed graph over indexable documents. Node `i` is `ids[i]`; ids ascend.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    pub ids: Vec<DocId>,
    /// Successor node indices, deduplicated.
    pub out: Vec<Vec<usize>>,
}

impl Adjacency {
    /// Keep only links whose both endpoints are indexable, at most one edge per ordered pair.
    pub fn build(index: &dyn IndexReader) -> Result<Self> {
        let docs = index.all_indexable_documents()?;
        let position: HashMap<DocId, usize> =
            docs.iter().enumerate().map(|(i, (id, _))| (*id, i)).collect();
        let mut edges: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); docs.len()];
        for (from, to) in index.all_links()? {
            if let (Some(&s), Some(&t)) = (position.get(&from), position.get(&to)) {
                edges[s].insert(t);
            }
        }
        let ids = docs.into_iter().map(|(id, _)| id).collect();
        Ok(Self { ids, out: edges.into_iter().map(|s| s.into_iter().collect()).collect() })
    }

    pub fn len(&self) -> usize { self.ids.len() }

    pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    pub fn edge_count(&self) -> usize { self.out.iter().map(Vec::len).sum() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{DocMeta, InvertedIndex, Posting, TermId};
    use tempfile::tempdir;

    fn graph() -> InvertedIndex {
        let mut idx = InvertedIndex::new();
        let a = idx.index_document("http://a", None, "a").unwrap();
        let b = idx.index_document("http://b", None, "b").unwrap();
        idx.add_document(2, DocMeta::stub("http://stub"));
        idx.add_link(a, b);
        idx.add_link(a, b);
        idx.add_link(a, 2);
        idx.add_link(b, a);
        idx
    }

    #[test]
    fn line_format_is_id_tab_json() {
        let rec = NodeRecord { rank: 1.0, out: vec![3, 4], url: "http://x".into() };
        let line = encode_line(7, &rec).unwrap();
        assert_eq!(line, "7\t{\"rank\":1.0,\"out\":[3,4],\"url\":\"http://x\"}");
        assert_eq!(decode_line(1, &line).unwrap(), (7, rec));
    }

    #[test]
    fn malformed_lines_are_reported_with_line_number() {
        for bad in ["no separator", "x\t{}", "1\t{\"rank\":-1.0,\"out\":[],\"url\":\"u\"}", "1\tnot json"] {
            match decode_line(9, bad) {
                Err(Error::MalformedRecord { line, .. }) => assert_eq!(line, 9),
                other => panic!("expected malformed record for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn export_dedups_links_and_keeps_stub_targets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.jsonl");
        assert_eq!(export_nodes(&graph(), &path).unwrap(), 2);
        let nodes = read_nodes(&path).unwrap();
        assert_eq!(nodes[&0].out, vec![1, 2]);
        assert_eq!(nodes[&1], NodeRecord { rank: 1.0, out: vec![0], url: "http://b".into() });
        assert!(!dir.path().join("graph.jsonl.tmp").exists());
    }

    /// Counts `all_links` calls and refuses per-document link lookups.
    struct LinkScanCounter {
        inner: InvertedIndex,
        scans: std::cell::Cell<usize>,
    }

    impl IndexReader for LinkScanCounter {
        fn count_indexable_documents(&self) -> Result<usize> { self.inner.count_indexable_documents() }
        fn lookup_term_id(&self, term: &str) -> Result<Option<TermId>> { self.inner.lookup_term_id(term) }
        fn document_frequency(&self, term_id: TermId) -> Result<u32> { self.inner.document_frequency(term_id) }
        fn postings_for_term(&self, term_id: TermId) -> Result<Vec<Posting>> {
            self.inner.postings_for_term(term_id)
        }
        fn out_links_of(&self, doc_id: DocId) -> Result<Vec<DocId>> {
            Err(Error::invariant(format!("per-document link lookup for {doc_id}")))
        }
        fn all_indexable_documents(&self) -> Result<Vec<(DocId, String)>> {
            self.inner.all_indexable_documents()
        }
        fn all_links(&self) -> Result<Vec<(DocId, DocId)>> {
            self.scans.set(self.scans.get() + 1);
            self.inner.all_links()
        }
        fn url_of(&self, doc_id: DocId) -> Result<Option<String>> { self.inner.url_of(doc_id) }
    }

    #[test]
    fn export_reads_the_link_table_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.jsonl");
        let reader = LinkScanCounter { inner: graph(), scans: std::cell::Cell::new(0) };
        assert_eq!(export_nodes(&reader, &path).unwrap(), 2);
        assert_eq!(reader.scans.get(), 1);
        assert_eq!(read_nodes(&path).unwrap()[&0].out, vec![1, 2]);
    }

    #[test]
    fn missing_store_reads_empty() {
        let dir = tempdir().unwrap();
        assert!(read_nodes(&dir.path().join("absent.jsonl")).unwrap().is_empty());
    }

    #[test]
    fn adjacency_drops_stub_edges_and_duplicates() {
        let adj = Adjacency::build(&graph()).unwrap();
        assert_eq!(adj.ids, vec![0, 1]);
        assert_eq!(adj.out, vec![vec![1], vec![0]]);
        assert_eq!(adj.edge_count(), 2);
    }
}
