use anyhow::Result;

use cooccur_core::{CategoryPair, GraphPipeline, NodeCatalog, SetExtractor};

use super::io;
use super::SetsArgs;

pub fn run(args: &SetsArgs) -> Result<()> {
    let mut config = args.graph.graph_config()?;
    if let Some(pairs) = &args.pairs {
        config.type_pairs = CategoryPair::parse_list(pairs)?;
    }
    if args.same_type {
        config.same_type_pairs = true;
    }

    let mut extractor = SetExtractor::new();
    if let Some(categories) = &args.categories {
        extractor = extractor.with_categories(
            categories
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty()),
        );
    }
    if let Some(sep) = args.separator {
        extractor = extractor.with_separator(sep);
    }

    let catalog = match &args.graph.catalog {
        Some(path) => io::load_catalog(path)?,
        None => NodeCatalog::new(),
    };
    let loaded = io::load_documents(&args.graph.documents, None)?;

    let pipeline = GraphPipeline::new(&extractor)
        .with_catalog(&catalog)
        .with_config(config);
    let mut accumulation = pipeline.accumulate(&loaded.documents)?;
    accumulation.skipped += loaded.skipped;
    let graph = pipeline.finish(&accumulation);

    io::write_artifact(&graph, args.graph.output.as_deref(), args.graph.pretty)
}
