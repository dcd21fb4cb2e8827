use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::extractor::{
    Document, DocumentContent, ExtractedDocument, ExtractedEntities, ExtractionMode,
    ExtractionResult, Extractor, InputError,
};
use super::normalizer::TokenCleaner;
use crate::config::{ConfigError, GraphConfig, DEFAULT_TERM_CATEGORY};
use crate::entity::{CatalogEntry, EntityId, NodeCatalog};

/// Family name to its surface variants, as supplied by the harness.
pub type TermFamilies = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone)]
pub struct TermFamily {
    pub id: EntityId,
    pub name: String,
    pub variants: BTreeSet<String>,
}

/// Finds term-family occurrences by exact match of cleaned tokens against
/// cleaned variants. A token belonging to several families is recorded for
/// each of them.
#[derive(Debug, Clone)]
pub struct WindowExtractor {
    families: Vec<TermFamily>,
    variant_index: HashMap<String, Vec<usize>>,
    window: usize,
    cleaner: TokenCleaner,
}

impl WindowExtractor {
    pub fn new(families: &TermFamilies, window: usize) -> crate::Result<Self> {
        Self::with_category(families, window, DEFAULT_TERM_CATEGORY)
    }

    /// Takes the window size and term category from a run configuration.
    pub fn from_config(families: &TermFamilies, config: &GraphConfig) -> crate::Result<Self> {
        Self::with_category(families, config.window()?, &config.term_category)
    }

    pub fn with_category(
        families: &TermFamilies,
        window: usize,
        category: &str,
    ) -> crate::Result<Self> {
        let cleaner = TokenCleaner::new()?;
        let mut by_id: BTreeMap<EntityId, TermFamily> = BTreeMap::new();

        for (name, variants) in families {
            let Some(id) = EntityId::from_raw(category, name) else {
                continue;
            };

            let cleaned: BTreeSet<String> = variants
                .iter()
                .map(|v| cleaner.clean(v.trim()))
                .filter(|v| !v.is_empty())
                .collect();
            if cleaned.is_empty() {
                tracing::warn!("Term family {:?} has no usable variants", name);
                continue;
            }

            by_id
                .entry(id.clone())
                .or_insert_with(|| TermFamily {
                    id,
                    name: name.trim().to_string(),
                    variants: BTreeSet::new(),
                })
                .variants
                .extend(cleaned);
        }

        if by_id.is_empty() {
            return Err(ConfigError::EmptyFamilies.into());
        }

        let families: Vec<TermFamily> = by_id.into_values().collect();
        let mut variant_index: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, family) in families.iter().enumerate() {
            for variant in &family.variants {
                variant_index.entry(variant.clone()).or_default().push(idx);
            }
        }

        Ok(Self {
            families,
            variant_index,
            window,
            cleaner,
        })
    }

    #[must_use]
    pub fn families(&self) -> &[TermFamily] {
        &self.families
    }

    #[must_use]
    pub const fn window(&self) -> usize {
        self.window
    }

    #[must_use]
    pub const fn cleaner(&self) -> &TokenCleaner {
        &self.cleaner
    }

    /// Whether a cleaned token is a variant of any family.
    #[must_use]
    pub fn is_variant(&self, cleaned: &str) -> bool {
        self.variant_index.contains_key(cleaned)
    }

    /// Catalog labelling every family with its name as written.
    #[must_use]
    pub fn catalog(&self) -> NodeCatalog {
        self.families.iter().fold(NodeCatalog::new(), |catalog, family| {
            catalog.with_entry(family.id.clone(), CatalogEntry::new(family.name.clone()))
        })
    }

    /// Ascending positions of every family occurring in `tokens`, scanning the
    /// sequence once.
    #[must_use]
    pub fn positions<S: AsRef<str>>(&self, tokens: &[S]) -> BTreeMap<EntityId, Vec<usize>> {
        let mut positions: BTreeMap<EntityId, Vec<usize>> = BTreeMap::new();

        for (pos, token) in tokens.iter().enumerate() {
            let cleaned = self.cleaner.clean(token.as_ref());
            let Some(hits) = self.variant_index.get(&cleaned) else {
                continue;
            };
            for &idx in hits {
                positions
                    .entry(self.families[idx].id.clone())
                    .or_default()
                    .push(pos);
            }
        }

        positions
    }
}

/// Number of `(a, b)` position pairs with `|a - b| <= window`.
///
/// Both slices must be sorted ascending. The sweep keeps a `[lo, hi)` range of
/// `b` inside the current window; both bounds only move forward.
#[must_use]
pub fn count_within_window(a: &[usize], b: &[usize], window: usize) -> u64 {
    let mut lo = 0;
    let mut hi = 0;
    let mut total: u64 = 0;

    for &x in a {
        let start = x.saturating_sub(window);
        let end = x.saturating_add(window);

        while lo < b.len() && b[lo] < start {
            lo += 1;
        }
        hi = hi.max(lo);
        while hi < b.len() && b[hi] <= end {
            hi += 1;
        }

        total += (hi - lo) as u64;
    }

    total
}

pub(crate) fn tokens_of(document: &Document) -> Option<Vec<&str>> {
    match &document.content {
        DocumentContent::Tokens { tokens } => Some(tokens.iter().map(String::as_str).collect()),
        DocumentContent::Text { text } => Some(text.split_whitespace().collect()),
        DocumentContent::Tagged { .. } => None,
    }
}

impl Extractor for WindowExtractor {
    fn mode(&self) -> ExtractionMode {
        ExtractionMode::Window
    }

    fn extract(&self, document: &Document) -> ExtractionResult<ExtractedDocument> {
        let doc_id = document.checked_id()?;

        let Some(tokens) = tokens_of(document) else {
            return Err(InputError::UnsupportedContent {
                id: doc_id.to_string(),
                mode: ExtractionMode::Window,
            });
        };

        let positions = self.positions(&tokens);

        let labels = positions
            .keys()
            .filter_map(|id| {
                self.families
                    .iter()
                    .find(|f| &f.id == id)
                    .map(|f| (id.clone(), f.name.clone()))
            })
            .collect();

        Ok(ExtractedDocument {
            doc_id: doc_id.to_string(),
            entities: ExtractedEntities::Positions {
                positions,
                window: self.window,
            },
            labels,
        })
    }

    fn window(&self) -> Option<usize> {
        Some(self.window)
    }
}
