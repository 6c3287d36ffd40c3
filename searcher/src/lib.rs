use anyhow::Result;
use clap::ValueEnum;
use searchcore::rank::{compare, RankRow};
use searchcore::{
    BatchRank, CooccurrenceHit, EngineConfig, IndexReader, QueryProcessor, RankEngine, Ranking,
    RelevanceHit, VertexCentricRank,
};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchMode {
    /// Term-at-a-time TF-IDF ranking
    Taat,
    /// Document-at-a-time conjunctive match, scored by summed frequency
    Daat,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineChoice {
    Batch,
    Vertex,
    Both,
}

#[derive(Debug, Default, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub taat: Option<Vec<RelevanceHit>>,
    pub daat: Option<Vec<CooccurrenceHit>>,
}

#[derive(Debug, Default, Serialize)]
pub struct RankReport {
    pub batch: Option<Ranking>,
    pub vertex: Option<Ranking>,
}

pub fn search(index: &dyn IndexReader, query: &str, mode: SearchMode) -> Result<SearchReport> {
    let qp = QueryProcessor::new(index);
    let mut report = SearchReport { query: query.to_string(), ..SearchReport::default() };
    if matches!(mode, SearchMode::Taat | SearchMode::Both) {
        report.taat = Some(qp.score_by_relevance(query)?);
    }
    if matches!(mode, SearchMode::Daat | SearchMode::Both) {
        report.daat = Some(qp.score_by_cooccurrence(query)?);
    }
    Ok(report)
}

/// Run the chosen engines. `iterations` overrides each engine's configured count.
pub fn rank(
    index: &dyn IndexReader,
    cfg: &EngineConfig,
    choice: EngineChoice,
    iterations: Option<usize>,
) -> Result<RankReport> {
    let mut report = RankReport::default();
    if matches!(choice, EngineChoice::Batch | EngineChoice::Both) {
        let engine = BatchRank::from_config(cfg);
        report.batch = Some(run_engine(&engine, index, iterations.unwrap_or(cfg.batch.iterations))?);
    }
    if matches!(choice, EngineChoice::Vertex | EngineChoice::Both) {
        let engine = VertexCentricRank::from_config(cfg);
        report.vertex = Some(run_engine(&engine, index, iterations.unwrap_or(cfg.vertex.iterations))?);
    }
    Ok(report)
}

fn run_engine(engine: &dyn RankEngine, index: &dyn IndexReader, iterations: usize) -> Result<Ranking> {
    let start = std::time::Instant::now();
    let ranks = engine.compute_ranks(index, iterations)?;
    tracing::info!(
        engine = engine.name(),
        iterations,
        nodes = ranks.len(),
        took_s = start.elapsed().as_secs_f64(),
        "ranking done"
    );
    Ok(ranks)
}

fn url_or_unknown(index: &dyn IndexReader, doc_id: u32) -> Result<String> {
    Ok(index.url_of(doc_id)?.unwrap_or_else(|| "Unknown".into()))
}

pub fn render_search(index: &dyn IndexReader, report: &SearchReport, k: usize) -> Result<String> {
    let mut out = String::new();
    if let Some(hits) = &report.taat {
        writeln!(out, "[TAAT] '{}' (tf-idf), {} hits", report.query, hits.len())?;
        for h in hits.iter().take(k) {
            writeln!(out, "  Score: {:.4} | DocID: {} | {}", h.score, h.doc_id, url_or_unknown(index, h.doc_id)?)?;
        }
        if hits.is_empty() { writeln!(out, "  No results found.")?; }
    }
    if let Some(hits) = &report.daat {
        writeln!(out, "[DAAT] '{}' (frequency sum), {} hits", report.query, hits.len())?;
        for h in hits.iter().take(k) {
            writeln!(out, "  Score: {} | DocID: {} | {}", h.score, h.doc_id, url_or_unknown(index, h.doc_id)?)?;
        }
        if hits.is_empty() { writeln!(out, "  No results found.")?; }
    }
    Ok(out)
}

pub fn render_rank(index: &dyn IndexReader, report: &RankReport, k: usize) -> Result<String> {
    let mut out = String::new();
    for (name, ranking) in [("map-reduce", &report.batch), ("vertex-centric", &report.vertex)] {
        let Some(ranking) = ranking else { continue };
        writeln!(out, "[{name}] {} nodes, rank total {:.6}", ranking.len(), ranking.total())?;
        for (doc_id, r) in ranking.top(k) {
            writeln!(out, "  Rank: {r:.6} | DocID: {doc_id} | {}", url_or_unknown(index, doc_id)?)?;
        }
    }
    if let (Some(batch), Some(vertex)) = (&report.batch, &report.vertex) {
        writeln!(out, "[side by side] doc | map-reduce | vertex-centric")?;
        for RankRow { doc_id, batch: b, vertex: v } in compare(batch, vertex).into_iter().take(k) {
            writeln!(out, "  {doc_id} | {} | {}", fmt_rank(b), fmt_rank(v))?;
        }
    }
    Ok(out)
}

fn fmt_rank(r: Option<f64>) -> String {
    r.map_or_else(|| "-".to_string(), |r| format!("{r:.6}"))
}
