use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::entity::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("document has no id")]
    MissingId,
    #[error("document {id} has content unsupported in {mode} mode")]
    UnsupportedContent { id: String, mode: ExtractionMode },
}

pub type ExtractionResult<T> = Result<T, InputError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Explicit entity tags per category
    Set,
    /// Term families detected by scanning token positions
    Window,
}

impl ExtractionMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Window => "window",
        }
    }
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentContent {
    Tagged {
        categories: BTreeMap<String, Vec<String>>,
    },
    Tokens {
        tokens: Vec<String>,
    },
    /// Split on whitespace into tokens before scanning.
    Text {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Partition key for per-group artifacts (a country, a source...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(flatten)]
    pub content: DocumentContent,
}

impl Document {
    #[must_use]
    pub fn tagged(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group: None,
            content: DocumentContent::Tagged {
                categories: BTreeMap::new(),
            },
        }
    }

    #[must_use]
    pub fn tokens(id: impl Into<String>, tokens: Vec<String>) -> Self {
        Self {
            id: id.into(),
            group: None,
            content: DocumentContent::Tokens { tokens },
        }
    }

    #[must_use]
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group: None,
            content: DocumentContent::Text { text: text.into() },
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Adds raw values under a category. No-op for token or text documents.
    #[must_use]
    pub fn with_values<I, S>(mut self, category: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let DocumentContent::Tagged { categories } = &mut self.content {
            categories
                .entry(category.to_string())
                .or_default()
                .extend(values.into_iter().map(Into::into));
        }
        self
    }

    pub(crate) fn checked_id(&self) -> ExtractionResult<&str> {
        let id = self.id.trim();
        if id.is_empty() {
            Err(InputError::MissingId)
        } else {
            Ok(id)
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Uint(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedEntities {
    /// Category name to the deduplicated entities of that category.
    Sets(BTreeMap<String, BTreeSet<EntityId>>),
    /// Family entity to its ascending token positions, with the window used
    /// to pair them.
    Positions {
        positions: BTreeMap<EntityId, Vec<usize>>,
        window: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub doc_id: String,
    pub entities: ExtractedEntities,
    /// Surface form seen for each entity, used when the catalog has no label.
    pub labels: BTreeMap<EntityId, String>,
}

impl ExtractedDocument {
    #[must_use]
    pub fn entity_count(&self) -> usize {
        match &self.entities {
            ExtractedEntities::Sets(sets) => sets.values().map(BTreeSet::len).sum(),
            ExtractedEntities::Positions { positions, .. } => positions.len(),
        }
    }

    pub(crate) fn record_label(labels: &mut BTreeMap<EntityId, String>, id: &EntityId, surface: &str) {
        let surface = surface.trim();
        match labels.get_mut(id) {
            Some(existing) if surface < existing.as_str() => *existing = surface.to_string(),
            Some(_) => {}
            None => {
                labels.insert(id.clone(), surface.to_string());
            }
        }
    }
}

/// Turns one document into typed entities. Implementations hold no
/// per-run state, so one extractor may serve several threads.
pub trait Extractor: Send + Sync {
    fn mode(&self) -> ExtractionMode;

    fn extract(&self, document: &Document) -> ExtractionResult<ExtractedDocument>;

    /// Token window the extractor pairs positions with, if it works on windows.
    fn window(&self) -> Option<usize> {
        None
    }
}
