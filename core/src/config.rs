use crate::error::{Error, Result};
use crate::rank::{BatchRank, VertexCentricRank};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DAMPING: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub damping: f64,
    pub batch: BatchConfig,
    pub vertex: VertexConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub iterations: usize,
    /// Node record store shuffled through on every map/reduce round.
    pub export_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexConfig {
    pub iterations: usize,
    /// Stop early once the L1 change between supersteps drops below this. Off by default.
    pub tolerance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
            batch: BatchConfig::default(),
            vertex: VertexConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { iterations: BatchRank::DEFAULT_ITERATIONS, export_file: PathBuf::from("mr_graph.jsonl") }
    }
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self { iterations: VertexCentricRank::DEFAULT_ITERATIONS, tolerance: None }
    }
}

impl Default for SearchConfig {
    fn default() -> Self { Self { top_k: 5 } }
}

impl EngineConfig {
    /// Read a JSON config file; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: EngineConfig = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(Error::Config(format!("damping must lie in (0, 1), got {}", self.damping)));
        }
        if let Some(tol) = self.vertex.tolerance {
            if !(tol > 0.0) {
                return Err(Error::Config(format!("tolerance must be positive, got {tol}")));
            }
        }
        if self.search.top_k == 0 {
            return Err(Error::Config("top_k must be at least 1".into()));
        }
        Ok(())
    }
}
