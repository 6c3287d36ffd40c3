use super::{RankEngine, Ranking};
use crate::config::{EngineConfig, DEFAULT_DAMPING};
use crate::error::Result;
use crate::graph::Adjacency;
use crate::index::IndexReader;

/// Pregel-style superstep emulation over an in-memory adjacency structure.
///
/// Every superstep, each vertex sends `rank / out_degree` to its successors; vertices
/// with no successors contribute to a dangling sum that is spread over all vertices.
/// Updates apply only after every vertex has sent, so no vertex sees a rank from the
/// current superstep. Ranks sum to 1 at every superstep boundary.
#[derive(Debug, Clone)]
pub struct VertexCentricRank {
    damping: f64,
    tolerance: Option<f64>,
}

impl Default for VertexCentricRank {
    fn default() -> Self { Self { damping: DEFAULT_DAMPING, tolerance: None } }
}

impl VertexCentricRank {
    pub const DEFAULT_ITERATIONS: usize = 100;

    pub fn new() -> Self { Self::default() }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self { damping: cfg.damping, tolerance: cfg.vertex.tolerance }
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Stop before the iteration limit once the L1 change of a superstep falls below `tol`.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = Some(tol);
        self
    }

    pub fn run(&self, graph: &Adjacency, iterations: usize) -> Ranking {
        if graph.is_empty() {
            return Ranking::default();
        }
        let n = graph.len();
        let edges = graph.edge_count();
        tracing::info!(iterations, nodes = n, edges, "running vertex-centric pagerank");

        let mut ranks = vec![1.0 / n as f64; n];
        for step in 0..iterations {
            let next = self.superstep(graph, &ranks);
            let delta: f64 = ranks.iter().zip(&next).map(|(a, b)| (a - b).abs()).sum();
            ranks = next;
            tracing::debug!(step, delta, total = ranks.iter().sum::<f64>(), "superstep done");
            if self.tolerance.is_some_and(|tol| delta < tol) {
                tracing::info!(step, delta, "converged before iteration limit");
                break;
            }
        }
        tracing::info!("vertex-centric pagerank finished");
        graph.ids.iter().copied().zip(ranks).collect()
    }

    /// One synchronous superstep: compute all messages from `ranks`, then produce the
    /// next rank vector. `ranks` is indexed like `graph.ids`.
    pub fn superstep(&self, graph: &Adjacency, ranks: &[f64]) -> Vec<f64> {
        let n = graph.len() as f64;
        let d = self.damping;
        let mut incoming = vec![0.0; graph.len()];
        let mut dangling_sum = 0.0;

        for (v, successors) in graph.out.iter().enumerate() {
            if successors.is_empty() {
                dangling_sum += ranks[v];
            } else {
                let share = ranks[v] / successors.len() as f64;
                for &s in successors {
                    incoming[s] += share;
                }
            }
        }

        let teleport = (1.0 - d) / n;
        let dangling_share = d * dangling_sum / n;
        incoming.into_iter().map(|msg| teleport + d * msg + dangling_share).collect()
    }
}

impl RankEngine for VertexCentricRank {
    fn name(&self) -> &'static str { "vertex-centric" }

    fn compute_ranks(&self, index: &dyn IndexReader, iterations: usize) -> Result<Ranking> {
        let graph = Adjacency::build(index)?;
        Ok(self.run(&graph, iterations))
    }
}
