use std::collections::BTreeSet;

use anyhow::Result;

use cooccur_core::{CooccurrenceMatrix, DocumentGroups, GraphPipeline, WindowExtractor, WordAssociations};

use super::io;
use super::WindowArgs;

pub fn run(args: &WindowArgs) -> Result<()> {
    let mut config = args.graph.graph_config()?;
    if let Some(window) = args.window {
        config.window_size = window;
    }

    let families = io::load_families(&args.families)?;
    let extractor = WindowExtractor::from_config(&families, &config)?;
    tracing::debug!(
        "{} term families, window {}",
        extractor.families().len(),
        extractor.window()
    );

    let catalog = match &args.graph.catalog {
        Some(path) => io::load_catalog(path)?,
        None => extractor.catalog(),
    };
    let loaded = io::load_documents(&args.graph.documents, args.group_by.as_deref())?;
    let documents = &loaded.documents;

    let pipeline = GraphPipeline::new(&extractor)
        .with_catalog(&catalog)
        .with_config(config);
    let mut accumulation = pipeline.accumulate(documents)?;
    accumulation.skipped += loaded.skipped;
    let graph = pipeline.finish(&accumulation);

    if let Some(path) = &args.matrix {
        let matrix = CooccurrenceMatrix::from_accumulator(&accumulation.accumulator, &catalog);
        io::write_artifact(&matrix, Some(path), args.graph.pretty)?;
    }

    let stopwords = match &args.stopwords {
        Some(path) if args.wants_associations() => io::load_stopwords(path)?,
        _ => BTreeSet::new(),
    };

    if args.associations.is_some() || args.term_dir.is_some() {
        let associations = WordAssociations::collect(documents, &extractor, &stopwords, args.top_words);
        if let Some(path) = &args.associations {
            io::write_artifact(&associations, Some(path), args.graph.pretty)?;
        }
        if let Some(dir) = &args.term_dir {
            for (name, term) in &associations.terms {
                let path = dir.join(format!("term-{}.json", io::file_stem(name)));
                io::write_artifact(term, Some(&path), args.graph.pretty)?;
            }
        }
    }

    if args.wants_groups() {
        let groups = DocumentGroups::partition(documents, args.min_group_size);
        tracing::info!(
            "{} groups with at least {} documents ({} left out)",
            groups.len(),
            args.min_group_size,
            groups.dropped()
        );

        if let Some(path) = &args.group_matrix {
            let matrices = groups.matrices(&pipeline, &catalog)?;
            io::write_artifact(&matrices, Some(path), args.graph.pretty)?;
        }
        if let Some(path) = &args.group_associations {
            let associations = groups.associations(&extractor, &stopwords, args.top_words);
            io::write_artifact(&associations, Some(path), args.graph.pretty)?;
        }
    }

    io::write_artifact(&graph, args.graph.output.as_deref(), args.graph.pretty)
}
