use crate::render::DedupPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lunrsearch")]
#[command(about = "Build and query client-side search bundles for generated documentation", long_about = None)]
pub struct Cli {
    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Turn a generator search index into a search bundle
    Build {
        /// The generator's search index JSON
        index: PathBuf,
        /// Build output directory; the bundle is written beneath it
        #[arg(short, long)]
        out_dir: PathBuf,
        /// Path to `lunrsearch.toml`
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Index free-text terms too
        #[arg(long)]
        include_terms: bool,
    },
    /// Query a search bundle
    Query {
        bundle: PathBuf,
        text: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Maximum number of results shown
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(long)]
        dedup: Option<DedupPolicy>,
        #[arg(long)]
        no_highlight: bool,
        /// Print results as HTML list items
        #[arg(long)]
        html: bool,
    },
}
