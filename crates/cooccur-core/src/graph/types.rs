use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CategoryPair;
use crate::entity::{Coordinates, EntityId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    pub count: u64,
    pub degree: u64,
    pub strength: u64,
    /// 1-based rank; 1 is the most prominent node.
    pub label_priority: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: EntityId,
    pub target: EntityId,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub weight: u64,
    pub weight_norm: f64,
    pub document_ids: Vec<String>,
}

/// Min, max and mean of a per-node metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Distribution {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
}

impl Distribution {
    /// Zeroed for an empty input. The mean is rounded to 3 decimals.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = u64>) -> Self {
        let mut min = u64::MAX;
        let mut max = 0;
        let mut sum: u128 = 0;
        let mut n: u64 = 0;

        for v in values {
            min = min.min(v);
            max = max.max(v);
            sum += u128::from(v);
            n += 1;
        }

        if n == 0 {
            return Self::default();
        }

        #[allow(clippy::cast_precision_loss)]
        let mean = sum as f64 / n as f64;
        Self {
            min,
            max,
            mean: round_to(mean, 3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMeta {
    pub generated_at: Option<DateTime<Utc>>,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub supported_types: Vec<String>,
    pub weight_min_configured: u64,
    pub weight_min_actual: u64,
    pub weight_max: u64,
    pub degree: Distribution,
    pub strength: Distribution,
    pub top_label_count: usize,
    pub type_pairs: Vec<CategoryPair>,
    pub label_priority_top: Vec<EntityId>,
}

/// Padded bounding box of the nodes that carry coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// Per-run bookkeeping. Kept in memory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildStats {
    pub documents_processed: usize,
    pub documents_skipped: usize,
    pub documents_contributing: usize,
    pub pairs_accumulated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub meta: GraphMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<GeoBounds>,
    #[serde(skip)]
    pub stats: BuildStats,
}

impl Graph {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[must_use]
    pub fn node(&self, id: &EntityId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
