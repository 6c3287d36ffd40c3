//! Query evaluation over postings lists.
//!
//! Two traversal strategies with deliberately different scoring:
//! term-at-a-time TF-IDF accumulation ([`QueryProcessor::score_by_relevance`]) and
//! document-at-a-time conjunctive merge scoring summed frequencies
//! ([`QueryProcessor::score_by_cooccurrence`]).

use crate::error::{Error, Result};
use crate::index::{DocId, IndexReader, Posting};
use crate::tokenizer::query_terms;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelevanceHit {
    pub doc_id: DocId,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CooccurrenceHit {
    pub doc_id: DocId,
    /// Sum of the query terms' frequencies in the document.
    pub score: u64,
}

/// `ln(1 + N / (df + 1))`. A collection of zero documents counts as one.
pub fn idf(num_docs: usize, df: u32) -> f64 {
    let n = num_docs.max(1) as f64;
    (1.0 + n / (df as f64 + 1.0)).ln()
}

/// `1 + ln(freq)`, or zero for a zero frequency.
pub fn tf_weight(freq: u32) -> f64 {
    if freq > 0 { 1.0 + (freq as f64).ln() } else { 0.0 }
}

pub struct QueryProcessor<'a, R: IndexReader + ?Sized> {
    index: &'a R,
}

impl<'a, R: IndexReader + ?Sized> QueryProcessor<'a, R> {
    pub fn new(index: &'a R) -> Self { Self { index } }

    /// Term-at-a-time TF-IDF ranking. Each term's postings are consumed in full before the
    /// next term; unknown terms contribute nothing.
    pub fn score_by_relevance(&self, query: &str) -> Result<Vec<RelevanceHit>> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let n = self.index.count_indexable_documents()?;
        let mut scores: HashMap<DocId, f64> = HashMap::new();

        for term in &terms {
            let Some(tid) = self.index.lookup_term_id(term)? else { continue };
            let df = self.index.document_frequency(tid)?;
            let idf = idf(n, df);
            for p in self.index.postings_for_term(tid)? {
                p.validate()?;
                *scores.entry(p.doc_id).or_insert(0.0) += tf_weight(p.freq) * idf;
            }
        }

        let mut hits: Vec<RelevanceHit> =
            scores.into_iter().map(|(doc_id, score)| RelevanceHit { doc_id, score }).collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.doc_id.cmp(&b.doc_id))
        });
        tracing::debug!(query, terms = terms.len(), hits = hits.len(), "taat evaluated");
        Ok(hits)
    }

    /// Document-at-a-time sorted intersection. Every term must exist and every match must
    /// contain all terms; the score is the sum of the terms' frequencies.
    pub fn score_by_cooccurrence(&self, query: &str) -> Result<Vec<CooccurrenceHit>> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let mut lists: Vec<Vec<Posting>> = Vec::with_capacity(terms.len());
        for term in &terms {
            let Some(tid) = self.index.lookup_term_id(term)? else { return Ok(Vec::new()) };
            let plist = self.index.postings_for_term(tid)?;
            check_sorted(term, &plist)?;
            lists.push(plist);
        }

        let mut hits = intersect(&lists);
        hits.sort_by(|a, b| b.score.cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));
        tracing::debug!(query, terms = terms.len(), hits = hits.len(), "daat evaluated");
        Ok(hits)
    }
}

fn check_sorted(term: &str, plist: &[Posting]) -> Result<()> {
    for p in plist {
        p.validate()?;
    }
    if plist.windows(2).any(|w| w[0].doc_id >= w[1].doc_id) {
        let msg = format!("postings for {term:?} are not strictly ascending by doc id");
        return Err(Error::invariant(msg));
    }
    Ok(())
}

/// Lockstep merge of ascending postings lists, one cursor per list.
fn intersect(lists: &[Vec<Posting>]) -> Vec<CooccurrenceHit> {
    let mut cursors = vec![0usize; lists.len()];
    let mut out = Vec::new();
    if lists.is_empty() {
        return out;
    }
    while cursors.iter().zip(lists).all(|(&c, l)| c < l.len()) {
        let current: Vec<DocId> = cursors.iter().zip(lists).map(|(&c, l)| l[c].doc_id).collect();
        let min = current.iter().copied().min().unwrap_or_default();
        if current.iter().all(|&d| d == min) {
            let score = cursors.iter().zip(lists).map(|(&c, l)| l[c].freq as u64).sum();
            out.push(CooccurrenceHit { doc_id: min, score });
            cursors.iter_mut().for_each(|c| *c += 1);
        } else {
            for (c, d) in cursors.iter_mut().zip(&current) {
                if *d == min {
                    *c += 1;
                }
            }
        }
    }
    out
}
