pub mod accumulate;
pub mod associations;
pub mod config;
pub mod entity;
pub mod error;
pub mod extract;
pub mod graph;
pub mod grouped;
pub mod matrix;
pub mod pipeline;
pub mod serialize;

pub use accumulate::{EntityObservation, PairAccumulator, PairEntry, PairKey, PairPlan};
pub use associations::{TermAssociations, WordAssociations, WordCount, DEFAULT_TOP_WORDS};
pub use config::{CategoryPair, ConfigError, DocIdDedup, GraphConfig};
pub use entity::{CatalogEntry, CatalogRecord, Coordinates, EntityId, NodeCatalog};
pub use error::{Error, Result};
pub use extract::{
    Document, DocumentContent, ExtractedDocument, ExtractedEntities, ExtractionMode, Extractor,
    InputError, SetExtractor, TermFamilies, WindowExtractor,
};
pub use graph::{BuildStats, Distribution, Edge, GeoBounds, Graph, GraphBuilder, GraphMeta, Node};
pub use grouped::{DocumentGroups, GroupMatrix, DEFAULT_MIN_GROUP_SIZE, UNKNOWN_GROUP};
pub use matrix::CooccurrenceMatrix;
pub use pipeline::{build_graph, Accumulation, GraphPipeline};
