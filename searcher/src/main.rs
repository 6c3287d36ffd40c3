use anyhow::Result;
use clap::{Parser, Subcommand};
use searcher::{rank, render_rank, render_search, search, EngineChoice, SearchMode};
use searchcore::{DiskIndex, EngineConfig};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "searcher")]
#[command(about = "Query an index store and rank its link graph", long_about = None)]
struct Cli {
    /// Index directory path
    #[arg(long, global = true, default_value = "./index")]
    index: String,
    /// Engine config file (JSON); flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a keyword query
    Search {
        #[arg(long)]
        query: String,
        #[arg(long, value_enum, default_value_t = SearchMode::Both)]
        mode: SearchMode,
        /// Results to print per mode
        #[arg(short)]
        k: Option<usize>,
    },
    /// Compute PageRank with one or both engines
    Rank {
        #[arg(long, value_enum, default_value_t = EngineChoice::Both)]
        engine: EngineChoice,
        #[arg(long)]
        iterations: Option<usize>,
        /// Node record store used by the map/reduce engine
        #[arg(long)]
        export: Option<PathBuf>,
        #[arg(long)]
        damping: Option<f64>,
        #[arg(short)]
        k: Option<usize>,
    },
    /// Run both engines with their configured iteration counts and compare them
    Report {
        #[arg(short)]
        k: Option<usize>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let index = DiskIndex::open(&cli.index)?;

    let output = match cli.command {
        Commands::Search { query, mode, k } => {
            let k = k.unwrap_or(cfg.search.top_k);
            let report = search(&index, &query, mode)?;
            render_search(&index, &report, k)?
        }
        Commands::Rank { engine, iterations, export, damping, k } => {
            if let Some(export) = export { cfg.batch.export_file = export; }
            if let Some(damping) = damping { cfg.damping = damping; }
            cfg.validate()?;
            let report = rank(&index, &cfg, engine, iterations)?;
            render_rank(&index, &report, k.unwrap_or(cfg.search.top_k))?
        }
        Commands::Report { k } => {
            let report = rank(&index, &cfg, EngineChoice::Both, None)?;
            render_rank(&index, &report, k.unwrap_or(cfg.search.top_k))?
        }
    };
    print!("{output}");
    Ok(())
}
