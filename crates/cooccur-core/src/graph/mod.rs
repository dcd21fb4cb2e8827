mod bounds;
mod builder;
mod rank;
mod types;

pub use bounds::padded_bounds;
pub use builder::GraphBuilder;
pub use rank::{priority_score, rank_nodes};
pub use types::{BuildStats, Distribution, Edge, GeoBounds, Graph, GraphMeta, Node};
