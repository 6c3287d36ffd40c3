//! PageRank over the link graph, computed by two independent engines.
//!
//! The engines are intentionally not numerically interchangeable:
//!
//! | | [`BatchRank`] | [`VertexCentricRank`] |
//! |---|---|---|
//! | initial rank | 1.0 per node | 1/N per node |
//! | update | `(1-d) + d*sum` | `(1-d)/N + d*sum + d*dangling/N` |
//! | dangling mass | dropped | spread uniformly |
//! | rank total | drifts | stays 1 |
//!
//! The batch engine's convention is a known asymmetry kept for reproducible output.

mod batch;
mod vertex;

pub use batch::BatchRank;
pub use vertex::VertexCentricRank;

use crate::error::Result;
use crate::index::{DocId, IndexReader};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

pub trait RankEngine {
    fn name(&self) -> &'static str;
    /// Snapshot the graph from `index` and run `iterations` rounds.
    fn compute_ranks(&self, index: &dyn IndexReader, iterations: usize) -> Result<Ranking>;
}

/// Final rank per document, produced by one engine run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ranking {
    ranks: BTreeMap<DocId, f64>,
}

impl Ranking {
    pub fn get(&self, doc_id: DocId) -> Option<f64> { self.ranks.get(&doc_id).copied() }
    pub fn len(&self) -> usize { self.ranks.len() }
    pub fn is_empty(&self) -> bool { self.ranks.is_empty() }
    pub fn total(&self) -> f64 { self.ranks.values().sum() }
    pub fn iter(&self) -> impl Iterator<Item = (DocId, f64)> + '_ {
        self.ranks.iter().map(|(d, r)| (*d, *r))
    }

    /// Highest ranks first; equal ranks by ascending doc id.
    pub fn top(&self, k: usize) -> Vec<(DocId, f64)> {
        let mut all: Vec<(DocId, f64)> = self.iter().collect();
        all.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        all.truncate(k);
        all
    }
}

impl FromIterator<(DocId, f64)> for Ranking {
    fn from_iter<I: IntoIterator<Item = (DocId, f64)>>(iter: I) -> Self {
        Self { ranks: iter.into_iter().collect() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankRow {
    pub doc_id: DocId,
    pub batch: Option<f64>,
    pub vertex: Option<f64>,
}

/// Join two runs by document, ordered by vertex-centric rank then batch rank.
pub fn compare(batch: &Ranking, vertex: &Ranking) -> Vec<RankRow> {
    let ids: BTreeSet<DocId> = batch.ranks.keys().chain(vertex.ranks.keys()).copied().collect();
    let mut rows: Vec<RankRow> = ids
        .into_iter()
        .map(|doc_id| RankRow { doc_id, batch: batch.get(doc_id), vertex: vertex.get(doc_id) })
        .collect();
    let key = |r: &RankRow| (r.vertex.unwrap_or(f64::NEG_INFINITY), r.batch.unwrap_or(f64::NEG_INFINITY));
    rows.sort_by(|a, b| {
        let (ka, kb) = (key(a), key(b));
        kb.0.partial_cmp(&ka.0)
            .unwrap_or(Ordering::Equal)
            .then(kb.1.partial_cmp(&ka.1).unwrap_or(Ordering::Equal))
            .then(a.doc_id.cmp(&b.doc_id))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_orders_by_rank_then_id() {
        let r: Ranking = vec![(3, 0.2), (1, 0.5), (2, 0.2)].into_iter().collect();
        assert_eq!(r.top(2), vec![(1, 0.5), (2, 0.2)]);
        assert_eq!(r.top(10).len(), 3);
        assert!((r.total() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn compare_joins_both_runs() {
        let batch: Ranking = vec![(1, 1.2), (2, 0.4)].into_iter().collect();
        let vertex: Ranking = vec![(1, 0.3), (3, 0.7)].into_iter().collect();
        let rows = compare(&batch, &vertex);
        let ids: Vec<DocId> = rows.iter().map(|r| r.doc_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(rows[2], RankRow { doc_id: 2, batch: Some(0.4), vertex: None });
    }
}
