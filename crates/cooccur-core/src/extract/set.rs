use std::collections::{BTreeMap, BTreeSet};

use super::extractor::{
    Document, DocumentContent, ExtractedDocument, ExtractedEntities, ExtractionMode,
    ExtractionResult, Extractor, InputError,
};
use crate::entity::EntityId;

/// Reads explicit entity tags. Every raw value is normalized into a key and
/// deduplicated per (document, category). Rare entities are kept; pruning is
/// the graph builder's job.
#[derive(Debug, Clone, Default)]
pub struct SetExtractor {
    categories: Option<BTreeSet<String>>,
    separator: Option<char>,
}

impl SetExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only read the named categories.
    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Split each raw value on `separator` (e.g. `|` for pipe-joined fields).
    #[must_use]
    pub const fn with_separator(mut self, separator: char) -> Self {
        self.separator = Some(separator);
        self
    }

    fn reads(&self, category: &str) -> bool {
        !category.trim().is_empty()
            && self
                .categories
                .as_ref()
                .is_none_or(|allowed| allowed.contains(category))
    }

    fn split<'a>(&self, raw: &'a str) -> Vec<&'a str> {
        match self.separator {
            Some(sep) => raw.split(sep).collect(),
            None => vec![raw],
        }
    }
}

impl Extractor for SetExtractor {
    fn mode(&self) -> ExtractionMode {
        ExtractionMode::Set
    }

    fn extract(&self, document: &Document) -> ExtractionResult<ExtractedDocument> {
        let doc_id = document.checked_id()?;

        let DocumentContent::Tagged { categories } = &document.content else {
            return Err(InputError::UnsupportedContent {
                id: doc_id.to_string(),
                mode: ExtractionMode::Set,
            });
        };

        let mut sets: BTreeMap<String, BTreeSet<EntityId>> = BTreeMap::new();
        let mut labels = BTreeMap::new();

        for (category, values) in categories {
            if !self.reads(category) {
                continue;
            }

            for raw in values.iter().flat_map(|v| self.split(v)) {
                let Some(id) = EntityId::from_raw(category, raw) else {
                    continue;
                };
                ExtractedDocument::record_label(&mut labels, &id, raw);
                sets.entry(category.clone()).or_default().insert(id);
            }
        }

        Ok(ExtractedDocument {
            doc_id: doc_id.to_string(),
            entities: ExtractedEntities::Sets(sets),
            labels,
        })
    }
}
