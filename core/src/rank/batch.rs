use super::{RankEngine, Ranking};
use crate::config::{EngineConfig, DEFAULT_DAMPING};
use crate::error::{Error, Result};
use crate::graph::{export_nodes, read_nodes, write_nodes, NodeRecord};
use crate::index::{DocId, IndexReader};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Map/reduce emulation. All state between rounds goes through the node record store,
/// which stands in for the shuffle of a distributed batch job.
#[derive(Debug, Clone)]
pub struct BatchRank {
    damping: f64,
    export_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
enum Message {
    /// A node re-emits its own record so its links and url survive the round.
    Node(NodeRecord),
    Rank(f64),
}

impl BatchRank {
    pub const DEFAULT_ITERATIONS: usize = 10;

    pub fn new<P: AsRef<Path>>(export_file: P) -> Self {
        Self { damping: DEFAULT_DAMPING, export_file: export_file.as_ref().to_path_buf() }
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::new(&cfg.batch.export_file).with_damping(cfg.damping)
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Write the initial snapshot of every indexable document to the store.
    pub fn export(&self, index: &dyn IndexReader) -> Result<usize> {
        let n = export_nodes(index, &self.export_file)?;
        tracing::info!(nodes = n, path = %self.export_file.display(), "exported node records");
        Ok(n)
    }

    /// Run `iterations` map/reduce rounds over the existing store, rewriting it each round.
    /// An empty or missing store gives an empty ranking.
    pub fn run(&self, iterations: usize) -> Result<Ranking> {
        let mut nodes = read_nodes(&self.export_file)?;
        if nodes.is_empty() {
            let path = self.export_file.display();
            tracing::warn!(%path, "node record store is empty or missing");
            return Ok(Ranking::default());
        }
        tracing::info!(iterations, nodes = nodes.len(), "running map/reduce pagerank");
        for iteration in 0..iterations {
            if iteration > 0 {
                nodes = read_nodes(&self.export_file)?;
            }
            let emitted = map_phase(nodes)?;
            nodes = reduce_phase(emitted, self.damping);
            write_nodes(&self.export_file, &nodes)?;
            let total: f64 = nodes.values().map(|n| n.rank).sum();
            tracing::debug!(iteration, nodes = nodes.len(), total, "map/reduce round done");
        }
        tracing::info!("map/reduce pagerank finished");
        Ok(nodes.into_iter().map(|(id, n)| (id, n.rank)).collect())
    }
}

impl RankEngine for BatchRank {
    fn name(&self) -> &'static str { "map-reduce" }

    fn compute_ranks(&self, index: &dyn IndexReader, iterations: usize) -> Result<Ranking> {
        self.export(index)?;
        self.run(iterations)
    }
}

/// Nodes without out-links emit no rank messages, so their mass leaves the system.
fn map_phase(nodes: BTreeMap<DocId, NodeRecord>) -> Result<BTreeMap<DocId, Vec<Message>>> {
    let mut emitted: BTreeMap<DocId, Vec<Message>> = BTreeMap::new();
    for (doc_id, record) in nodes {
        if !record.out.is_empty() {
            let share = record.rank / record.out.len() as f64;
            if !share.is_finite() {
                let msg = format!("doc {doc_id} produced a non-finite rank share");
                return Err(Error::invariant(msg));
            }
            for target in &record.out {
                emitted.entry(*target).or_default().push(Message::Rank(share));
            }
        }
        emitted.entry(doc_id).or_default().push(Message::Node(record));
    }
    Ok(emitted)
}

/// Keys that never received their own node record (stubs) are dropped.
fn reduce_phase(
    emitted: BTreeMap<DocId, Vec<Message>>,
    damping: f64,
) -> BTreeMap<DocId, NodeRecord> {
    let mut out = BTreeMap::new();
    for (doc_id, messages) in emitted {
        let mut node = None;
        let mut rank_sum = 0.0;
        for msg in messages {
            match msg {
                Message::Node(record) => node = Some(record),
                Message::Rank(share) => rank_sum += share,
            }
        }
        if let Some(mut record) = node {
            record.rank = (1.0 - damping) + damping * rank_sum;
            out.insert(doc_id, record);
        }
    }
    out
}
