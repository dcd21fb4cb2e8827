pub mod io;
pub mod sets;
pub mod window;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use cooccur_core::{DocIdDedup, GraphConfig, DEFAULT_MIN_GROUP_SIZE, DEFAULT_TOP_WORDS};

#[derive(Parser)]
#[command(
    name = "cooccur",
    about = "Build co-occurrence network artifacts from tagged or tokenized documents",
    version
)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Entity network from explicit per-category tags
    Sets(SetsArgs),
    /// Term-family network from token windows
    Window(WindowArgs),
}

/// Flags shared by both modes.
#[derive(Args)]
pub struct GraphArgs {
    /// JSON array of documents
    #[arg(short, long)]
    pub documents: PathBuf,
    /// JSON array of {category, key, label, count?, coordinates?}
    #[arg(long)]
    pub catalog: Option<PathBuf>,
    /// JSON graph configuration; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Minimum edge weight kept in the graph
    #[arg(long = "weight-min")]
    pub weight_min: Option<u64>,
    /// Number of top-ranked node ids listed in meta
    #[arg(long = "top-labels")]
    pub top_labels: Option<usize>,
    /// Cap on document ids kept per edge
    #[arg(long = "max-doc-ids")]
    pub max_doc_ids: Option<usize>,
    /// Never repeat a document id within an edge
    #[arg(long = "full-dedup")]
    pub full_dedup: bool,
    /// Accumulate documents in parallel
    #[arg(long)]
    pub parallel: bool,
    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl GraphArgs {
    /// The config file (or defaults) with flag overrides and the run timestamp.
    pub fn graph_config(&self) -> Result<GraphConfig> {
        let mut config = match &self.config {
            Some(path) => io::load_config(path)?,
            None => GraphConfig::default(),
        };

        if let Some(weight) = self.weight_min {
            config.min_edge_weight = weight;
        }
        if let Some(count) = self.top_labels {
            config.top_label_count = count;
        }
        if let Some(cap) = self.max_doc_ids {
            config.max_document_ids = cap;
        }
        if self.full_dedup {
            config.doc_id_dedup = DocIdDedup::Full;
        }
        if self.parallel {
            config.parallel = true;
        }
        if config.generated_at.is_none() {
            config.generated_at = Some(io::generated_at()?);
        }

        Ok(config)
    }
}

#[derive(Args)]
pub struct SetsArgs {
    #[command(flatten)]
    pub graph: GraphArgs,
    /// Category pairs, e.g. person-organization,event-location
    #[arg(long)]
    pub pairs: Option<String>,
    /// Also pair entities within the same category
    #[arg(long = "same-type")]
    pub same_type: bool,
    /// Only read these categories (comma-separated)
    #[arg(long)]
    pub categories: Option<String>,
    /// Split raw values on this character
    #[arg(long)]
    pub separator: Option<char>,
}

#[derive(Args)]
pub struct WindowArgs {
    #[command(flatten)]
    pub graph: GraphArgs,
    /// JSON object mapping family name to its variants
    #[arg(long)]
    pub families: PathBuf,
    /// Token distance within which two terms co-occur
    #[arg(long, allow_negative_numbers = true)]
    pub window: Option<i64>,
    /// JSON array of words ignored in associations
    #[arg(long)]
    pub stopwords: Option<PathBuf>,
    /// Words kept per term in associations
    #[arg(long = "top-words", default_value_t = DEFAULT_TOP_WORDS)]
    pub top_words: usize,
    /// Write the term x term matrix here
    #[arg(long)]
    pub matrix: Option<PathBuf>,
    /// Write per-term word associations here
    #[arg(long)]
    pub associations: Option<PathBuf>,
    /// Also write each term's associations to DIR/term-<name>.json
    #[arg(long = "term-dir")]
    pub term_dir: Option<PathBuf>,
    /// Document field holding the group key (default: "group")
    #[arg(long = "group-by")]
    pub group_by: Option<String>,
    /// Groups with fewer documents are left out of per-group artifacts
    #[arg(long = "min-group-size", default_value_t = DEFAULT_MIN_GROUP_SIZE)]
    pub min_group_size: usize,
    /// Write one matrix per group here
    #[arg(long = "group-matrix")]
    pub group_matrix: Option<PathBuf>,
    /// Write word associations per group here
    #[arg(long = "group-associations")]
    pub group_associations: Option<PathBuf>,
}

impl WindowArgs {
    const fn wants_groups(&self) -> bool {
        self.group_matrix.is_some() || self.group_associations.is_some()
    }

    const fn wants_associations(&self) -> bool {
        self.associations.is_some() || self.term_dir.is_some() || self.group_associations.is_some()
    }
}
