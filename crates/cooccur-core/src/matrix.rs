use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::accumulate::PairAccumulator;
use crate::entity::{EntityId, NodeCatalog};

/// Square term x term matrix for matrix-style views. The diagonal holds each
/// term's own occurrence count, off-diagonal cells the raw pair weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooccurrenceMatrix {
    pub terms: Vec<String>,
    pub matrix: Vec<Vec<u64>>,
    pub term_counts: BTreeMap<String, u64>,
    pub max_cooccurrence: u64,
}

impl CooccurrenceMatrix {
    /// Builds the matrix over every entity with a non-zero observed count,
    /// ordered by id and labelled from the catalog where it has an entry.
    /// Pairs are read unpruned.
    #[must_use]
    pub fn from_accumulator(acc: &PairAccumulator, catalog: &NodeCatalog) -> Self {
        let active: Vec<(&EntityId, u64, String)> = acc
            .entities()
            .iter()
            .filter(|(_, obs)| obs.count > 0)
            .map(|(id, obs)| {
                let label = catalog
                    .get(id)
                    .map_or_else(|| obs.label.clone(), |e| e.label.clone());
                (id, obs.count, label)
            })
            .collect();

        let mut matrix = vec![vec![0; active.len()]; active.len()];
        let mut max_cooccurrence = 0;

        for (i, (a, count, _)) in active.iter().enumerate() {
            matrix[i][i] = *count;
            for (j, (b, _, _)) in active.iter().enumerate().skip(i + 1) {
                let weight = acc.get(a, b).map_or(0, |e| e.weight);
                matrix[i][j] = weight;
                matrix[j][i] = weight;
                max_cooccurrence = max_cooccurrence.max(weight);
            }
        }

        Self {
            terms: active.iter().map(|(_, _, label)| label.clone()).collect(),
            term_counts: active
                .iter()
                .map(|(_, count, label)| (label.clone(), *count))
                .collect(),
            matrix,
            max_cooccurrence,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::PairPlan;
    use crate::config::GraphConfig;
    use crate::extract::{Document, ExtractionMode, Extractor, TermFamilies, WindowExtractor};

    fn families() -> TermFamilies {
        [
            ("Alpha".to_string(), vec!["alpha".to_string()]),
            ("Radical".to_string(), vec!["radical".to_string()]),
            ("Unused".to_string(), vec!["unused".to_string()]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_matrix_from_window_run() {
        let config = GraphConfig::new().with_window_size(2);
        let extractor = WindowExtractor::from_config(&families(), &config).unwrap();
        let plan = PairPlan::from_config(&config, ExtractionMode::Window);

        let mut acc = PairAccumulator::from_config(&config);
        let doc = Document::text("a1", "alpha foo bar radical baz alpha");
        acc.add_document(&extractor.extract(&doc).unwrap(), &plan);

        let m = CooccurrenceMatrix::from_accumulator(&acc, &extractor.catalog());

        assert_eq!(m.terms, vec!["Alpha", "Radical"]);
        assert_eq!(m.matrix, vec![vec![2, 1], vec![1, 1]]);
        assert_eq!(m.term_counts["Alpha"], 2);
        assert_eq!(m.max_cooccurrence, 1);

        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["term_counts"]["Radical"], 1);
        assert_eq!(json["max_cooccurrence"], 1);
    }

    #[test]
    fn test_empty_matrix() {
        let acc = PairAccumulator::from_config(&GraphConfig::new());
        let m = CooccurrenceMatrix::from_accumulator(&acc, &NodeCatalog::new());

        assert!(m.is_empty());
        assert!(m.matrix.is_empty());
        assert_eq!(m.max_cooccurrence, 0);
    }
}
