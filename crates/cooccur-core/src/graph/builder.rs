use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use petgraph::graph::{NodeIndex, UnGraph};

use super::bounds::padded_bounds;
use super::rank::rank_nodes;
use super::types::{round_to, BuildStats, Distribution, Edge, Graph, GraphMeta, Node};
use crate::accumulate::{PairAccumulator, PairEntry, PairKey, PairPlan};
use crate::config::GraphConfig;
use crate::entity::{EntityId, NodeCatalog};

/// Turns accumulated pairs into the pruned, ranked output graph.
#[derive(Debug, Clone)]
pub struct GraphBuilder<'a> {
    catalog: &'a NodeCatalog,
    plan: PairPlan,
    min_edge_weight: u64,
    top_label_count: usize,
    generated_at: Option<DateTime<Utc>>,
}

impl<'a> GraphBuilder<'a> {
    #[must_use]
    pub fn new(catalog: &'a NodeCatalog, config: &GraphConfig, plan: PairPlan) -> Self {
        Self {
            catalog,
            plan,
            min_edge_weight: config.min_edge_weight,
            top_label_count: config.top_label_count,
            generated_at: config.generated_at,
        }
    }

    #[must_use]
    pub fn build(&self, acc: &PairAccumulator) -> Graph {
        let retained: Vec<(&PairKey, &PairEntry)> = acc
            .pairs()
            .iter()
            .filter(|(_, entry)| entry.weight >= self.min_edge_weight)
            .collect();

        tracing::debug!(
            "Retained {} of {} pairs at minimum weight {}",
            retained.len(),
            acc.len(),
            self.min_edge_weight
        );

        let (degree, strength) = node_metrics(&retained);
        let mut nodes: Vec<Node> = degree
            .iter()
            .map(|(id, &deg)| self.node(acc, id, deg, strength.get(id).copied().unwrap_or(0)))
            .collect();
        rank_nodes(&mut nodes);

        let edges = normalized_edges(&retained);
        let meta = self.meta(acc, &nodes, &edges);
        let bounds = padded_bounds(nodes.iter().filter_map(|n| n.coordinates.as_ref()));

        Graph {
            nodes,
            edges,
            meta,
            bounds,
            stats: BuildStats {
                documents_processed: acc.document_count(),
                documents_skipped: 0,
                documents_contributing: acc.contributing_count(),
                pairs_accumulated: acc.len(),
            },
        }
    }

    fn node(&self, acc: &PairAccumulator, id: &EntityId, degree: u64, strength: u64) -> Node {
        let entry = self.catalog.get(id);
        let observed = acc.entities().get(id);

        let label = entry
            .map(|e| e.label.clone())
            .or_else(|| observed.map(|o| o.label.clone()))
            .unwrap_or_else(|| id.key().to_string());
        let count = entry
            .and_then(|e| e.count)
            .or_else(|| observed.map(|o| o.count))
            .unwrap_or(0);

        Node {
            id: id.clone(),
            node_type: id.category().to_string(),
            label,
            count,
            degree,
            strength,
            label_priority: 0,
            coordinates: entry.and_then(|e| e.coordinates),
        }
    }

    fn meta(&self, acc: &PairAccumulator, nodes: &[Node], edges: &[Edge]) -> GraphMeta {
        let observed = acc.observed_categories();
        let top_label_count = self.top_label_count.min(nodes.len());

        GraphMeta {
            generated_at: self.generated_at,
            total_nodes: nodes.len(),
            total_edges: edges.len(),
            supported_types: self.plan.supported_types(observed.iter().copied()),
            weight_min_configured: self.min_edge_weight,
            weight_min_actual: edges.iter().map(|e| e.weight).min().unwrap_or(0),
            weight_max: edges.iter().map(|e| e.weight).max().unwrap_or(0),
            degree: Distribution::from_values(nodes.iter().map(|n| n.degree)),
            strength: Distribution::from_values(nodes.iter().map(|n| n.strength)),
            top_label_count,
            type_pairs: self.plan.type_pairs(observed.iter().copied()),
            label_priority_top: nodes[..top_label_count].iter().map(|n| n.id.clone()).collect(),
        }
    }
}

/// Degree and strength of every endpoint, read off an undirected graph of the
/// retained pairs.
fn node_metrics(retained: &[(&PairKey, &PairEntry)]) -> (BTreeMap<EntityId, u64>, BTreeMap<EntityId, u64>) {
    let mut graph: UnGraph<EntityId, u64> = UnGraph::with_capacity(retained.len(), retained.len());
    let mut index: BTreeMap<&EntityId, NodeIndex> = BTreeMap::new();

    for (key, entry) in retained {
        let a = *index
            .entry(key.source())
            .or_insert_with(|| graph.add_node(key.source().clone()));
        let b = *index
            .entry(key.target())
            .or_insert_with(|| graph.add_node(key.target().clone()));
        graph.add_edge(a, b, entry.weight);
    }

    let mut degree = BTreeMap::new();
    let mut strength = BTreeMap::new();
    for (id, &idx) in &index {
        degree.insert((*id).clone(), graph.edges(idx).count() as u64);
        strength.insert((*id).clone(), graph.edges(idx).map(|e| *e.weight()).sum::<u64>());
    }

    (degree, strength)
}

/// Min-max normalized edges, sorted by weight descending then endpoints.
fn normalized_edges(retained: &[(&PairKey, &PairEntry)]) -> Vec<Edge> {
    let min = retained.iter().map(|(_, e)| e.weight).min().unwrap_or(0);
    let max = retained.iter().map(|(_, e)| e.weight).max().unwrap_or(0);

    let mut edges: Vec<Edge> = retained
        .iter()
        .map(|(key, entry)| {
            #[allow(clippy::cast_precision_loss)]
            let weight_norm = if max == min {
                1.0
            } else {
                round_to((entry.weight - min) as f64 / (max - min) as f64, 6)
            };
            Edge {
                source: key.source().clone(),
                target: key.target().clone(),
                edge_type: entry.type_tag.clone(),
                weight: entry.weight,
                weight_norm,
                document_ids: entry.document_ids.clone(),
            }
        })
        .collect();

    edges.sort_by(|a, b| {
        b.weight
            .cmp(&a.weight)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.target.cmp(&b.target))
    });
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryPair, DocIdDedup};
    use crate::entity::{CatalogEntry, Coordinates};
    use crate::extract::ExtractionMode;

    fn id(key: &str) -> EntityId {
        EntityId::new("person", key)
    }

    fn config(min: u64) -> GraphConfig {
        GraphConfig::new()
            .with_min_edge_weight(min)
            .with_type_pairs(vec![CategoryPair::new("person", "person")])
            .with_same_type_pairs(true)
    }

    fn accumulator(pairs: &[(&str, &str, u64)]) -> PairAccumulator {
        let mut acc = PairAccumulator::new(100, DocIdDedup::Adjacent);
        for (i, (a, b, w)) in pairs.iter().enumerate() {
            let key = PairKey::new(id(a), id(b)).unwrap();
            acc.add(key, "person-person", &format!("d{i}"), *w);
            acc.observe(&id(a), 1, a);
            acc.observe(&id(b), 1, b);
        }
        acc
    }

    fn build(acc: &PairAccumulator, catalog: &NodeCatalog, cfg: &GraphConfig) -> Graph {
        GraphBuilder::new(catalog, cfg, PairPlan::from_config(cfg, ExtractionMode::Set)).build(acc)
    }

    #[test]
    fn test_prune_and_degree() {
        let acc = accumulator(&[("a", "b", 5), ("a", "c", 2), ("b", "c", 1)]);
        let cfg = config(2);
        let graph = build(&acc, &NodeCatalog::new(), &cfg);

        assert_eq!(graph.edges.len(), 2);
        assert!(graph.edges.iter().all(|e| e.weight >= 2));

        let a = graph.node(&id("a")).unwrap();
        assert_eq!(a.degree, 2);
        assert_eq!(a.strength, 7);
        assert_eq!(graph.node(&id("c")).unwrap().degree, 1);
        assert_eq!(graph.stats.pairs_accumulated, 3);
    }

    #[test]
    fn test_weight_norm_bounds() {
        let acc = accumulator(&[("a", "b", 10), ("a", "c", 4), ("b", "c", 7)]);
        let graph = build(&acc, &NodeCatalog::new(), &config(1));

        let norms: Vec<f64> = graph.edges.iter().map(|e| e.weight_norm).collect();
        assert!((norms[0] - 1.0).abs() < f64::EPSILON);
        assert!((norms[1] - 0.5).abs() < f64::EPSILON);
        assert!(norms[2].abs() < f64::EPSILON);
    }

    #[test]
    fn test_degenerate_range_normalizes_to_one() {
        let acc = accumulator(&[("a", "b", 3), ("c", "d", 3)]);
        let graph = build(&acc, &NodeCatalog::new(), &config(1));

        assert!(graph.edges.iter().all(|e| (e.weight_norm - 1.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_edges_sorted_by_weight_then_endpoints() {
        let acc = accumulator(&[("c", "d", 2), ("a", "b", 2), ("a", "c", 9)]);
        let graph = build(&acc, &NodeCatalog::new(), &config(1));

        let order: Vec<(&str, &str)> = graph
            .edges
            .iter()
            .map(|e| (e.source.key(), e.target.key()))
            .collect();
        assert_eq!(order, vec![("a", "c"), ("a", "b"), ("c", "d")]);
    }

    #[test]
    fn test_catalog_overrides_observed() {
        let acc = accumulator(&[("a", "b", 2)]);
        let catalog = NodeCatalog::new().with_entry(
            id("a"),
            CatalogEntry::new("Alice")
                .with_count(40)
                .with_coordinates(Coordinates::new(12.0, 1.0)),
        );
        let graph = build(&acc, &catalog, &config(1));

        let a = graph.node(&id("a")).unwrap();
        assert_eq!(a.label, "Alice");
        assert_eq!(a.count, 40);
        assert_eq!(a.label_priority, 1);

        let b = graph.node(&id("b")).unwrap();
        assert_eq!(b.label, "b");
        assert_eq!(b.count, 1);
        assert!(b.coordinates.is_none());

        let bounds = graph.bounds.unwrap();
        assert!((bounds.north - 12.1).abs() < 1e-9);
    }

    #[test]
    fn test_empty_graph_meta() {
        let acc = accumulator(&[("a", "b", 1)]);
        let graph = build(&acc, &NodeCatalog::new(), &config(5));

        assert!(graph.is_empty());
        assert!(graph.nodes.is_empty());
        assert_eq!(graph.meta.total_nodes, 0);
        assert_eq!(graph.meta.weight_max, 0);
        assert_eq!(graph.meta.weight_min_configured, 5);
        assert_eq!(graph.meta.top_label_count, 0);
        assert_eq!(graph.meta.degree, Distribution::default());
        assert!(graph.bounds.is_none());
    }

    #[test]
    fn test_top_label_count_clamped() {
        let acc = accumulator(&[("a", "b", 2), ("b", "c", 1)]);
        let cfg = config(1).with_top_label_count(2);
        let graph = build(&acc, &NodeCatalog::new(), &cfg);

        assert_eq!(graph.meta.top_label_count, 2);
        assert_eq!(graph.meta.label_priority_top, vec![id("b"), id("a")]);
    }
}
