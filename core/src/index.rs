use crate::error::{Error, Result};
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    pub url: String,
    pub title: Option<String>,
    /// Relative path to the stored full text, e.g. texts/{doc_id}.txt. `None` marks a stub:
    /// a document known only as a link target, never fetched, never indexed or ranked.
    pub text_path: Option<String>,
}

impl DocMeta {
    pub fn stub(url: impl Into<String>) -> Self {
        Self { url: url.into(), title: None, text_path: None }
    }

    pub fn is_indexable(&self) -> bool { self.text_path.is_some() }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub freq: u32,
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn new(doc_id: DocId, positions: Vec<u32>) -> Self {
        Self { doc_id, freq: positions.len() as u32, positions }
    }

    /// A posting must occur at least once and carry one position per occurrence.
    pub fn validate(&self) -> Result<()> {
        if self.freq == 0 {
            return Err(Error::invariant(format!("posting for doc {} has zero frequency", self.doc_id)));
        }
        if self.freq as usize != self.positions.len() {
            return Err(Error::invariant(format!(
                "posting for doc {} has freq {} but {} positions",
                self.doc_id,
                self.freq,
                self.positions.len()
            )));
        }
        Ok(())
    }
}

/// Read-only view of an indexed collection, consumed by the query and ranking engines.
pub trait IndexReader {
    /// Number of documents that have content.
    fn count_indexable_documents(&self) -> Result<usize>;
    fn lookup_term_id(&self, term: &str) -> Result<Option<TermId>>;
    /// Number of distinct documents containing the term.
    fn document_frequency(&self, term_id: TermId) -> Result<u32>;
    /// Postings ascending by document id; empty when the term has none.
    fn postings_for_term(&self, term_id: TermId) -> Result<Vec<Posting>>;
    fn out_links_of(&self, doc_id: DocId) -> Result<Vec<DocId>>;
    /// (doc id, url) of every indexable document, ascending by id.
    fn all_indexable_documents(&self) -> Result<Vec<(DocId, String)>>;
    fn all_links(&self) -> Result<Vec<(DocId, DocId)>>;
    fn url_of(&self, doc_id: DocId) -> Result<Option<String>>;
}

#[derive(Debug, Default)]
pub struct InvertedIndex {
    pub dictionary: HashMap<String, TermId>,
    pub df: Vec<u32>,
    pub postings: HashMap<TermId, Vec<Posting>>, // postings sorted by doc_id
    pub docs: BTreeMap<DocId, DocMeta>,
    pub links: Vec<(DocId, DocId)>,
    /// Full text of indexed documents, keyed like `docs`. Written out by the store.
    pub texts: HashMap<DocId, String>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn next_doc_id(&self) -> DocId {
        self.docs.keys().next_back().map_or(0, |id| id + 1)
    }

    pub fn add_document(&mut self, doc_id: DocId, meta: DocMeta) {
        self.docs.insert(doc_id, meta);
    }

    pub fn add_link(&mut self, from: DocId, to: DocId) {
        self.links.push((from, to));
    }

    fn intern(&mut self, term: &str) -> TermId {
        if let Some(&tid) = self.dictionary.get(term) {
            return tid;
        }
        let tid = self.df.len() as TermId;
        self.dictionary.insert(term.to_string(), tid);
        self.df.push(0);
        tid
    }

    /// Record a posting for `term`. At most one posting may exist per (term, document).
    pub fn add_posting(&mut self, term: &str, posting: Posting) -> Result<()> {
        posting.validate()?;
        let tid = self.intern(term);
        let plist = self.postings.entry(tid).or_default();
        match plist.binary_search_by_key(&posting.doc_id, |p| p.doc_id) {
            Ok(_) => Err(Error::invariant(format!(
                "duplicate posting for term {term:?} in doc {}",
                posting.doc_id
            ))),
            Err(at) => {
                plist.insert(at, posting);
                self.df[tid as usize] += 1;
                Ok(())
            }
        }
    }

    /// Assign the next document id, tokenize `text` and record its postings with positions.
    pub fn index_document(&mut self, url: &str, title: Option<&str>, text: &str) -> Result<DocId> {
        let doc_id = self.next_doc_id();
        self.docs.insert(
            doc_id,
            DocMeta {
                url: url.to_string(),
                title: title.map(str::to_string),
                text_path: Some(format!("texts/{doc_id}.txt")),
            },
        );
        self.texts.insert(doc_id, text.to_string());

        // Keep first-occurrence order so term ids are assigned deterministically.
        let mut order: Vec<(String, Vec<u32>)> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (term, pos) in tokenize(text) {
            match seen.get(&term) {
                Some(&i) => order[i].1.push(pos as u32),
                None => {
                    seen.insert(term.clone(), order.len());
                    order.push((term, vec![pos as u32]));
                }
            }
        }
        for (term, positions) in order {
            self.add_posting(&term, Posting::new(doc_id, positions))?;
        }
        Ok(doc_id)
    }
}

impl IndexReader for InvertedIndex {
    fn count_indexable_documents(&self) -> Result<usize> {
        Ok(self.docs.values().filter(|d| d.is_indexable()).count())
    }

    fn lookup_term_id(&self, term: &str) -> Result<Option<TermId>> {
        Ok(self.dictionary.get(term).copied())
    }

    fn document_frequency(&self, term_id: TermId) -> Result<u32> {
        Ok(self.df.get(term_id as usize).copied().unwrap_or(0))
    }

    fn postings_for_term(&self, term_id: TermId) -> Result<Vec<Posting>> {
        Ok(self.postings.get(&term_id).cloned().unwrap_or_default())
    }

    fn out_links_of(&self, doc_id: DocId) -> Result<Vec<DocId>> {
        Ok(self.links.iter().filter(|(from, _)| *from == doc_id).map(|(_, to)| *to).collect())
    }

    fn all_indexable_documents(&self) -> Result<Vec<(DocId, String)>> {
        Ok(self
            .docs
            .iter()
            .filter(|(_, d)| d.is_indexable())
            .map(|(id, d)| (*id, d.url.clone()))
            .collect())
    }

    fn all_links(&self) -> Result<Vec<(DocId, DocId)>> { Ok(self.links.clone()) }

    fn url_of(&self, doc_id: DocId) -> Result<Option<String>> {
        Ok(self.docs.get(&doc_id).map(|d| d.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_document_records_positions_and_df() {
        let mut idx = InvertedIndex::new();
        let a = idx.index_document("http://a", Some("A"), "data mining data").unwrap();
        let b = idx.index_document("http://b", None, "data").unwrap();
        assert_eq!((a, b), (0, 1));

        let data = idx.lookup_term_id("data").unwrap().unwrap();
        assert_eq!(data, 0);
        assert_eq!(idx.document_frequency(data).unwrap(), 2);
        let plist = idx.postings_for_term(data).unwrap();
        assert_eq!(plist[0], Posting { doc_id: 0, freq: 2, positions: vec![0, 2] });
        assert_eq!(plist[1].doc_id, 1);
    }

    #[test]
    fn rejects_duplicate_and_inconsistent_postings() {
        let mut idx = InvertedIndex::new();
        idx.add_posting("x", Posting::new(3, vec![1])).unwrap();
        assert!(matches!(idx.add_posting("x", Posting::new(3, vec![2])), Err(Error::Invariant(_))));
        let bad = Posting { doc_id: 4, freq: 2, positions: vec![0] };
        assert!(matches!(idx.add_posting("x", bad), Err(Error::Invariant(_))));
        assert_eq!(idx.document_frequency(0).unwrap(), 1);
    }

    #[test]
    fn stubs_are_link_endpoints_but_not_indexable() {
        let mut idx = InvertedIndex::new();
        let a = idx.index_document("http://a", None, "text").unwrap();
        idx.add_document(1, DocMeta::stub("http://stub"));
        idx.add_link(a, 1);
        assert_eq!(idx.count_indexable_documents().unwrap(), 1);
        assert_eq!(idx.all_indexable_documents().unwrap(), vec![(0, "http://a".to_string())]);
        assert_eq!(idx.out_links_of(a).unwrap(), vec![1]);
        assert_eq!(idx.url_of(1).unwrap().as_deref(), Some("http://stub"));
        assert_eq!(idx.next_doc_id(), 2);
    }
}
