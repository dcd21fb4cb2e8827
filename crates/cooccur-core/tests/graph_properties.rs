use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use cooccur_core::serialize::to_json;
use cooccur_core::{
    build_graph, CategoryPair, Document, EntityId, GraphConfig, NodeCatalog, SetExtractor,
    TermFamilies, WindowExtractor,
};

fn corpus() -> Vec<Document> {
    (0..60)
        .map(|i| {
            Document::tagged(format!("doc-{}", i % 23))
                .with_values("person", [format!("Person {}", i % 6), format!("person {}", i % 4)])
                .with_values("organization", [format!("Org {}", i % 5)])
                .with_values("event", [format!("Event {}", i % 3)])
                .with_values("subject", [format!("Subject {}", i % 4), format!("Subject {}", i % 2)])
        })
        .collect()
}

fn config() -> GraphConfig {
    GraphConfig::new()
        .with_min_edge_weight(3)
        .with_generated_at(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
}

fn two_tag_docs() -> Vec<Document> {
    vec![
        Document::tagged("d1").with_values("person", ["A"]).with_values("event", ["B"]),
        Document::tagged("d2").with_values("person", ["a "]).with_values("event", ["b"]),
    ]
}

#[test]
fn test_repeated_runs_serialize_identically() {
    let docs = corpus();
    let extractor = SetExtractor::new();
    let catalog = NodeCatalog::new();

    let first = to_json(&build_graph(&docs, &extractor, &catalog, &config()).unwrap()).unwrap();
    let second = to_json(&build_graph(&docs, &extractor, &catalog, &config()).unwrap()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_parallel_serializes_like_sequential() {
    let docs = corpus();
    let extractor = SetExtractor::new();
    let catalog = NodeCatalog::new();

    let sequential = to_json(&build_graph(&docs, &extractor, &catalog, &config()).unwrap()).unwrap();
    let parallel = to_json(
        &build_graph(&docs, &extractor, &catalog, &config().with_parallel(true)).unwrap(),
    )
    .unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn test_one_canonical_edge_per_pair() {
    let graph = build_graph(&corpus(), &SetExtractor::new(), &NodeCatalog::new(), &config()).unwrap();

    let mut seen = BTreeSet::new();
    for edge in &graph.edges {
        assert!(edge.source < edge.target);
        assert!(seen.insert((edge.source.clone(), edge.target.clone())));
    }
}

#[test]
fn test_threshold_and_normalization_bounds() {
    let graph = build_graph(&corpus(), &SetExtractor::new(), &NodeCatalog::new(), &config()).unwrap();
    let max = graph.meta.weight_max;

    assert!(!graph.edges.is_empty());
    for edge in &graph.edges {
        assert!(edge.weight >= 3);
        assert!((0.0..=1.0).contains(&edge.weight_norm));
        if edge.weight == max {
            assert!((edge.weight_norm - 1.0).abs() < f64::EPSILON);
        }
        assert!(edge.document_ids.len() <= 100);
    }
    assert!(graph.edges.windows(2).all(|w| w[0].weight >= w[1].weight));
}

#[test]
fn test_degree_and_strength_match_edges() {
    let graph = build_graph(&corpus(), &SetExtractor::new(), &NodeCatalog::new(), &config()).unwrap();

    for node in &graph.nodes {
        let incident: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.source == node.id || e.target == node.id)
            .collect();
        assert!(!incident.is_empty());
        assert_eq!(node.degree, incident.len() as u64);
        assert_eq!(node.strength, incident.iter().map(|e| e.weight).sum::<u64>());
    }

    let endpoints: BTreeSet<&EntityId> = graph
        .edges
        .iter()
        .flat_map(|e| [&e.source, &e.target])
        .collect();
    assert_eq!(endpoints.len(), graph.nodes.len());

    let priorities: Vec<usize> = graph.nodes.iter().map(|n| n.label_priority).collect();
    assert_eq!(priorities, (1..=graph.nodes.len()).collect::<Vec<_>>());
}

#[test]
fn test_two_documents_weight_two() {
    let extractor = SetExtractor::new();
    let pairs = vec![CategoryPair::new("person", "event")];

    let kept = build_graph(
        &two_tag_docs(),
        &extractor,
        &NodeCatalog::new(),
        &GraphConfig::new().with_type_pairs(pairs.clone()),
    )
    .unwrap();
    assert_eq!(kept.edges.len(), 1);
    assert_eq!(kept.edges[0].weight, 2);
    assert_eq!(kept.edges[0].document_ids, vec!["d1", "d2"]);

    let pruned = build_graph(
        &two_tag_docs(),
        &extractor,
        &NodeCatalog::new(),
        &GraphConfig::new().with_type_pairs(pairs).with_min_edge_weight(3),
    )
    .unwrap();
    assert!(pruned.edges.is_empty());
    assert!(pruned.nodes.is_empty());
}

#[test]
fn test_window_weight_counts_position_pairs() {
    let families: TermFamilies = [
        ("alpha".to_string(), vec!["alpha".to_string()]),
        ("radical".to_string(), vec!["radical".to_string()]),
    ]
    .into_iter()
    .collect();
    let config = GraphConfig::new().with_window_size(2).with_min_edge_weight(1);
    let extractor = WindowExtractor::from_config(&families, &config).unwrap();
    let docs = vec![Document::text("a1", "alpha foo bar radical baz alpha")];

    let graph = build_graph(&docs, &extractor, &extractor.catalog(), &config).unwrap();

    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].weight, 1);
    assert_eq!(graph.edges[0].edge_type, "term-term");
    assert_eq!(graph.meta.type_pairs, vec![CategoryPair::new("term", "term")]);
    assert_eq!(graph.node(&EntityId::new("term", "alpha")).unwrap().count, 2);
}

#[test]
fn test_same_type_three_pairs() {
    let config = GraphConfig::new()
        .with_type_pairs(Vec::new())
        .with_same_type_pairs(true)
        .with_min_edge_weight(1);
    let docs = vec![Document::tagged("d1").with_values("x", ["x1", "x2", "x3"])];

    let graph = build_graph(&docs, &SetExtractor::new(), &NodeCatalog::new(), &config).unwrap();

    assert_eq!(graph.edges.len(), 3);
    assert!(graph.edges.iter().all(|e| e.weight == 1));
    assert_eq!(graph.meta.supported_types, vec!["x"]);
}

#[test]
fn test_empty_corpus_gives_zeroed_meta() {
    let graph = build_graph(&[], &SetExtractor::new(), &NodeCatalog::new(), &GraphConfig::new()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&to_json(&graph).unwrap()).unwrap();

    assert_eq!(json["nodes"], serde_json::json!([]));
    assert_eq!(json["edges"], serde_json::json!([]));
    assert_eq!(json["meta"]["totalNodes"], 0);
    assert_eq!(json["meta"]["totalEdges"], 0);
    assert_eq!(json["meta"]["weightMax"], 0);
    assert_eq!(json["meta"]["degree"]["mean"], 0.0);
    assert_eq!(json["meta"]["labelPriorityTop"], serde_json::json!([]));
}

#[test]
fn test_degenerate_weights_normalize_to_one() {
    let docs = vec![
        Document::tagged("d1")
            .with_values("person", ["A", "B"])
            .with_values("event", ["E"]),
        Document::tagged("d2")
            .with_values("person", ["A", "B"])
            .with_values("event", ["E"]),
    ];
    let config = GraphConfig::new().with_type_pairs(vec![CategoryPair::new("person", "event")]);

    let graph = build_graph(&docs, &SetExtractor::new(), &NodeCatalog::new(), &config).unwrap();

    assert_eq!(graph.edges.len(), 2);
    assert!(graph.edges.iter().all(|e| (e.weight_norm - 1.0).abs() < f64::EPSILON));
}

#[test]
fn test_score_ties_ordered_by_id() {
    let docs: Vec<Document> = ["d1", "d2"]
        .iter()
        .map(|id| {
            Document::tagged(*id)
                .with_values("person", ["Zed", "Amy"])
                .with_values("event", ["Meeting"])
        })
        .collect();
    let config = GraphConfig::new().with_type_pairs(vec![CategoryPair::new("person", "event")]);

    let labels = |docs: &[Document]| -> Vec<String> {
        build_graph(docs, &SetExtractor::new(), &NodeCatalog::new(), &config)
            .unwrap()
            .nodes
            .iter()
            .map(|n| n.id.to_string())
            .collect()
    };

    let first = labels(&docs);
    assert_eq!(first, vec!["event:meeting", "person:amy", "person:zed"]);

    let reversed: Vec<Document> = docs.into_iter().rev().collect();
    assert_eq!(labels(&reversed), first);
}
