//! Query a pre-clustered IVF index from the command line.
//!
//! ```bash
//! ivf-query --data-dir ./embeddings_data --query ./queries_data/query1.bin -k 5
//! RUST_LOG=debug ivf-query --data-dir ./data --query q.bin --accelerated --parallel
//! ```
//!
//! Prints one `score, id` line per result, best first.

use anyhow::{Context, Result};
use clap::Parser;
use ivfscan::config::{ExecutionStrategy, IvfConfig};
use ivfscan::persistence::{load_index, read_query};
use ivfscan::{BackendKind, IvfSearchEngine, SearchParams};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ivf-query")]
#[command(about = "Approximate nearest neighbor search over a pre-clustered IVF index", long_about = None)]
struct Cli {
    #[arg(long, help = "Directory holding cluster mappings, embeddings and centroids")]
    data_dir: PathBuf,

    #[arg(long, help = "Raw little-endian f32 query vector")]
    query: PathBuf,

    #[arg(short, default_value_t = 5, help = "Number of results")]
    k: usize,

    #[arg(long, help = "JSON config file; flags below override its values")]
    config: Option<PathBuf>,

    #[arg(long, help = "Clusters probed per query")]
    n_probe: Option<usize>,

    #[arg(long, help = "Rows per accelerated backend call (0 = whole pool)")]
    batch_size: Option<usize>,

    #[arg(long, help = "Embedding dimension")]
    dim: Option<usize>,

    #[arg(long, help = "Dataset tag used in file names")]
    tag: Option<String>,

    #[arg(long, help = "Score with the batched accelerated backend")]
    accelerated: bool,

    #[arg(long, help = "Scan probed clusters in parallel")]
    parallel: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<IvfConfig> {
        let mut config = match &self.config {
            Some(path) => IvfConfig::from_path(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => IvfConfig::default(),
        };
        if let Some(n_probe) = self.n_probe {
            config = config.with_n_probe(n_probe);
        }
        if let Some(batch_size) = self.batch_size {
            config = config.with_batch_size(batch_size);
        }
        if let Some(dim) = self.dim {
            config = config.with_embedding_dim(dim);
        }
        if let Some(tag) = &self.tag {
            config = config.with_dataset_tag(tag.clone());
        }
        if self.accelerated {
            config = config.with_default_backend(BackendKind::Accelerated);
        }
        if self.parallel {
            config = config.with_execution(ExecutionStrategy::Parallel);
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let index = load_index(&cli.data_dir, &config)
        .with_context(|| format!("loading index from {}", cli.data_dir.display()))?;
    let query = read_query(&cli.query, config.embedding_dim)
        .with_context(|| format!("reading query {}", cli.query.display()))?;

    let params = SearchParams::new(cli.k).with_backend(config.default_backend);
    let engine = IvfSearchEngine::new(index, config)?;
    let results = engine.search_with(&query, &params)?;

    for hit in &results {
        println!("{}, {}", hit.score, hit.id);
    }
    Ok(())
}
