pub mod config;
pub mod error;
pub mod graph;
pub mod index;
pub mod persist;
pub mod query;
pub mod rank;
pub mod tokenizer;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use index::{DocId, DocMeta, IndexReader, InvertedIndex, Posting, TermId};
pub use persist::DiskIndex;
pub use query::{CooccurrenceHit, QueryProcessor, RelevanceHit};
pub use rank::{BatchRank, RankEngine, Ranking, VertexCentricRank};
