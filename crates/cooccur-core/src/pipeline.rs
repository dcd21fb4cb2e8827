use rayon::prelude::*;

use crate::accumulate::{PairAccumulator, PairPlan};
use crate::config::{ConfigError, GraphConfig};
use crate::entity::NodeCatalog;
use crate::error::Result;
use crate::extract::{Document, Extractor};
use crate::graph::{Graph, GraphBuilder};

/// Accumulated pairs of one run, before pruning.
#[derive(Debug, Clone)]
pub struct Accumulation {
    pub accumulator: PairAccumulator,
    pub plan: PairPlan,
    pub skipped: usize,
}

struct Partial {
    accumulator: PairAccumulator,
    skipped: usize,
}

impl Partial {
    const fn new(config: &GraphConfig) -> Self {
        Self {
            accumulator: PairAccumulator::from_config(config),
            skipped: 0,
        }
    }

    fn add(&mut self, extractor: &dyn Extractor, plan: &PairPlan, index: usize, document: &Document) {
        match extractor.extract(document) {
            Ok(extracted) => self.accumulator.add_document(&extracted, plan),
            Err(e) => {
                tracing::warn!("Skipping document #{} ({:?}): {}", index, document.id, e);
                self.skipped += 1;
            }
        }
    }

    fn merge(&mut self, other: Self) {
        self.accumulator.merge(other.accumulator);
        self.skipped += other.skipped;
    }
}

/// Extract, accumulate and build in one pass over a document slice.
pub struct GraphPipeline<'a> {
    extractor: &'a dyn Extractor,
    catalog: Option<&'a NodeCatalog>,
    config: GraphConfig,
}

impl<'a> GraphPipeline<'a> {
    #[must_use]
    pub fn new(extractor: &'a dyn Extractor) -> Self {
        Self {
            extractor,
            catalog: None,
            config: GraphConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_catalog(mut self, catalog: &'a NodeCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the configuration, then folds every readable document into
    /// a fresh accumulator. Unreadable documents are counted and skipped.
    pub fn accumulate(&self, documents: &[Document]) -> Result<Accumulation> {
        let mode = self.extractor.mode();
        self.config.validate(mode)?;
        self.check_window()?;

        let plan = PairPlan::from_config(&self.config, mode);
        let extractor = self.extractor;

        let partial = if self.config.parallel {
            documents
                .par_iter()
                .enumerate()
                .fold(
                    || Partial::new(&self.config),
                    |mut p, (index, document)| {
                        p.add(extractor, &plan, index, document);
                        p
                    },
                )
                .reduce(
                    || Partial::new(&self.config),
                    |mut a, b| {
                        a.merge(b);
                        a
                    },
                )
        } else {
            let mut p = Partial::new(&self.config);
            for (index, document) in documents.iter().enumerate() {
                p.add(extractor, &plan, index, document);
            }
            p
        };

        tracing::debug!(
            "Extracted {} of {} documents in {} mode, {} pairs accumulated",
            partial.accumulator.document_count(),
            documents.len(),
            mode,
            partial.accumulator.len()
        );

        Ok(Accumulation {
            accumulator: partial.accumulator,
            plan,
            skipped: partial.skipped,
        })
    }

    /// Window extractors carry their own window; it has to agree with the
    /// configured one.
    fn check_window(&self) -> std::result::Result<(), ConfigError> {
        let config = self.config.window()?;
        match self.extractor.window() {
            Some(extractor) if extractor != config => Err(ConfigError::WindowMismatch { extractor, config }),
            _ => Ok(()),
        }
    }

    /// Prunes, ranks and assembles the graph from an accumulation.
    #[must_use]
    pub fn finish(&self, accumulation: &Accumulation) -> Graph {
        let empty = NodeCatalog::new();
        let catalog = self.catalog.unwrap_or(&empty);

        let mut graph = GraphBuilder::new(catalog, &self.config, accumulation.plan.clone())
            .build(&accumulation.accumulator);
        graph.stats.documents_skipped = accumulation.skipped;

        tracing::info!(
            "Built graph: {} nodes, {} edges ({} documents, {} skipped, {} contributing)",
            graph.meta.total_nodes,
            graph.meta.total_edges,
            graph.stats.documents_processed,
            graph.stats.documents_skipped,
            graph.stats.documents_contributing
        );

        graph
    }

    pub fn build(&self, documents: &[Document]) -> Result<Graph> {
        let accumulation = self.accumulate(documents)?;
        Ok(self.finish(&accumulation))
    }
}

/// Runs the whole pipeline once. Pure: the same inputs give the same graph.
pub fn build_graph(
    documents: &[Document],
    extractor: &dyn Extractor,
    catalog: &NodeCatalog,
    config: &GraphConfig,
) -> Result<Graph> {
    GraphPipeline::new(extractor)
        .with_catalog(catalog)
        .with_config(config.clone())
        .build(documents)
}
