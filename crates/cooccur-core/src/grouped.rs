use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::associations::WordAssociations;
use crate::entity::NodeCatalog;
use crate::error::Result;
use crate::extract::{Document, WindowExtractor};
use crate::matrix::CooccurrenceMatrix;
use crate::pipeline::GraphPipeline;

pub const DEFAULT_MIN_GROUP_SIZE: usize = 5;

/// Group of documents that carry no group key.
pub const UNKNOWN_GROUP: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMatrix {
    #[serde(flatten)]
    pub matrix: CooccurrenceMatrix,
    pub total_articles: usize,
}

/// Documents partitioned by group key, keeping only groups with at least
/// the minimum number of documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentGroups {
    groups: BTreeMap<String, Vec<Document>>,
    dropped: usize,
}

impl DocumentGroups {
    /// Missing or blank keys fall into [`UNKNOWN_GROUP`]. Keys are trimmed.
    #[must_use]
    pub fn partition(documents: &[Document], min_size: usize) -> Self {
        let mut groups: BTreeMap<String, Vec<Document>> = BTreeMap::new();
        for document in documents {
            let name = document
                .group
                .as_deref()
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .unwrap_or(UNKNOWN_GROUP);
            groups.entry(name.to_string()).or_default().push(document.clone());
        }

        let total = groups.len();
        groups.retain(|name, docs| {
            let keep = docs.len() >= min_size;
            if !keep {
                tracing::debug!("Dropping group {:?}: {} of {} documents", name, docs.len(), min_size);
            }
            keep
        });
        let dropped = total - groups.len();

        tracing::debug!("Partitioned {} documents into {} groups ({} too small)", documents.len(), groups.len(), dropped);

        Self { groups, dropped }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups left out for having too few documents.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[Document]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// One matrix per kept group, accumulated with the pipeline's extractor
    /// and configuration. Groups whose matrix is empty are still listed.
    pub fn matrices(
        &self,
        pipeline: &GraphPipeline<'_>,
        catalog: &NodeCatalog,
    ) -> Result<BTreeMap<String, GroupMatrix>> {
        self.groups
            .iter()
            .map(|(name, docs)| {
                let accumulation = pipeline.accumulate(docs)?;
                let matrix = GroupMatrix {
                    matrix: CooccurrenceMatrix::from_accumulator(&accumulation.accumulator, catalog),
                    total_articles: docs.len(),
                };
                Ok((name.clone(), matrix))
            })
            .collect()
    }

    /// Word associations per kept group. Groups where no family found a
    /// word are left out.
    #[must_use]
    pub fn associations(
        &self,
        extractor: &WindowExtractor,
        stopwords: &BTreeSet<String>,
        top_n: usize,
    ) -> BTreeMap<String, WordAssociations> {
        self.groups
            .iter()
            .filter_map(|(name, docs)| {
                let associations = WordAssociations::collect(docs, extractor, stopwords, top_n);
                (!associations.is_empty()).then(|| (name.clone(), associations))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use crate::extract::TermFamilies;

    fn extractor() -> WindowExtractor {
        let families: TermFamilies = [
            ("Alpha".to_string(), vec!["alpha".to_string()]),
            ("Radical".to_string(), vec!["radical".to_string()]),
        ]
        .into_iter()
        .collect();
        WindowExtractor::new(&families, 3).unwrap()
    }

    fn docs(group: Option<&str>, count: usize, text: &str) -> Vec<Document> {
        (0..count)
            .map(|i| {
                let doc = Document::text(format!("{}-{i}", group.unwrap_or("none")), text);
                match group {
                    Some(g) => doc.with_group(g),
                    None => doc,
                }
            })
            .collect()
    }

    #[test]
    fn test_partition_drops_small_groups() {
        let mut all = docs(Some("Mali"), 5, "alpha radical");
        all.extend(docs(Some("Niger"), 4, "alpha radical"));
        all.extend(docs(None, 3, "alpha"));
        all.extend(docs(Some("  "), 2, "radical"));

        let groups = DocumentGroups::partition(&all, DEFAULT_MIN_GROUP_SIZE);

        assert_eq!(groups.names().collect::<Vec<_>>(), vec!["Mali", UNKNOWN_GROUP]);
        assert_eq!(groups.get(UNKNOWN_GROUP).unwrap().len(), 5);
        assert!(groups.get("Niger").is_none());
        assert_eq!(groups.dropped(), 1);
    }

    #[test]
    fn test_group_matrices_carry_article_totals() {
        let mut all = docs(Some("Mali"), 2, "alpha foo radical");
        all.extend(docs(Some("Chad"), 2, "nothing here"));

        let extractor = extractor();
        let pipeline = GraphPipeline::new(&extractor).with_config(GraphConfig::new().with_window_size(3));
        let matrices = DocumentGroups::partition(&all, 2)
            .matrices(&pipeline, &extractor.catalog())
            .unwrap();

        let mali = &matrices["Mali"];
        assert_eq!(mali.total_articles, 2);
        assert_eq!(mali.matrix.terms, vec!["Alpha", "Radical"]);
        assert_eq!(mali.matrix.matrix, vec![vec![2, 2], vec![2, 2]]);

        let chad = &matrices["Chad"];
        assert!(chad.matrix.is_empty());
        assert_eq!(chad.total_articles, 2);

        let json = serde_json::to_value(mali).unwrap();
        assert_eq!(json["total_articles"], 2);
        assert_eq!(json["max_cooccurrence"], 2);
        assert_eq!(json["terms"], serde_json::json!(["Alpha", "Radical"]));
    }

    #[test]
    fn test_group_associations_skip_empty_groups() {
        let mut all = docs(Some("Mali"), 2, "groupe armé alpha attaque");
        all.extend(docs(Some("Chad"), 2, "nothing here"));

        let associations = DocumentGroups::partition(&all, 2).associations(&extractor(), &BTreeSet::new(), 10);

        assert_eq!(associations.keys().collect::<Vec<_>>(), vec!["Mali"]);
        let alpha = associations["Mali"].get("Alpha").unwrap();
        assert_eq!(alpha.articles_with_term, 2);
        assert_eq!(alpha.total_occurrences, 6);
    }
}
