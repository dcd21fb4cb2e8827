use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::ExtractionMode;

pub const DEFAULT_MIN_EDGE_WEIGHT: u64 = 2;
pub const DEFAULT_MAX_DOCUMENT_IDS: usize = 100;
pub const DEFAULT_WINDOW_SIZE: i64 = 50;
pub const DEFAULT_TOP_LABEL_COUNT: usize = 60;
pub const DEFAULT_TERM_CATEGORY: &str = "term";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("window size must not be negative (got {0})")]
    NegativeWindow(i64),
    #[error("no category pairs configured and same-type pairing is disabled")]
    NoCategoryPairs,
    #[error("invalid category pair: {0:?} (expected \"a-b\")")]
    InvalidPair(String),
    #[error("same-type pair {0}-{0} listed but same-type pairing is disabled")]
    SameTypePairDisabled(String),
    #[error("window mode needs at least one term family with variants")]
    EmptyFamilies,
    #[error("extractor window {extractor} does not match configured window size {config}")]
    WindowMismatch { extractor: usize, config: usize },
}

/// An allowed pairing of two entity categories. `"person-organization"`
/// parses to `("person", "organization")`; serialized as a two-element array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[String; 2]", into = "[String; 2]")]
pub struct CategoryPair {
    pub first: String,
    pub second: String,
}

impl CategoryPair {
    #[must_use]
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    #[must_use]
    pub fn is_same_type(&self) -> bool {
        self.first == self.second
    }

    /// Order-insensitive identity, used to drop `b-a` when `a-b` is present.
    #[must_use]
    pub fn unordered(&self) -> (&str, &str) {
        if self.first <= self.second {
            (&self.first, &self.second)
        } else {
            (&self.second, &self.first)
        }
    }

    /// Edge type tag, in configured order.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}-{}", self.first, self.second)
    }

    /// Parses a comma-separated list such as `"person-event,subject-event"`.
    /// Empty segments are ignored.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, ConfigError> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse::<Self>)
            .collect()
    }
}

impl std::fmt::Display for CategoryPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

impl std::str::FromStr for CategoryPair {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((first, second)) if !first.trim().is_empty() && !second.trim().is_empty() => {
                Ok(Self::new(first.trim(), second.trim()))
            }
            _ => Err(ConfigError::InvalidPair(s.to_string())),
        }
    }
}

impl From<[String; 2]> for CategoryPair {
    fn from([first, second]: [String; 2]) -> Self {
        Self { first, second }
    }
}

impl From<CategoryPair> for [String; 2] {
    fn from(pair: CategoryPair) -> Self {
        [pair.first, pair.second]
    }
}

/// How contributing document ids are deduplicated on an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocIdDedup {
    /// Skip an id only when it equals the last appended one.
    #[default]
    Adjacent,
    /// Skip an id already anywhere in the list.
    Full,
}

pub fn default_type_pairs() -> Vec<CategoryPair> {
    vec![
        CategoryPair::new("person", "organization"),
        CategoryPair::new("event", "location"),
        CategoryPair::new("person", "event"),
        CategoryPair::new("organization", "event"),
        CategoryPair::new("subject", "event"),
    ]
}

/// Run configuration for one graph build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Pairs with a weight below this are pruned
    pub min_edge_weight: u64,
    /// Soft cap on contributing document ids kept per edge
    pub max_document_ids: usize,
    /// Token distance for window mode; signed so a negative value can be rejected
    pub window_size: i64,
    /// Allowed category pairs for set mode
    pub type_pairs: Vec<CategoryPair>,
    /// Also pair entities of the same category
    pub same_type_pairs: bool,
    /// How many top-ranked node ids to list in the meta block
    pub top_label_count: usize,
    pub doc_id_dedup: DocIdDedup,
    /// Fold documents on the rayon pool instead of sequentially
    pub parallel: bool,
    /// Timestamp written to `meta.generatedAt`; the engine never reads the clock
    pub generated_at: Option<DateTime<Utc>>,
    /// Category given to term families in window mode
    pub term_category: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_edge_weight: DEFAULT_MIN_EDGE_WEIGHT,
            max_document_ids: DEFAULT_MAX_DOCUMENT_IDS,
            window_size: DEFAULT_WINDOW_SIZE,
            type_pairs: default_type_pairs(),
            same_type_pairs: false,
            top_label_count: DEFAULT_TOP_LABEL_COUNT,
            doc_id_dedup: DocIdDedup::Adjacent,
            parallel: false,
            generated_at: None,
            term_category: DEFAULT_TERM_CATEGORY.to_string(),
        }
    }
}

impl GraphConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_min_edge_weight(mut self, weight: u64) -> Self {
        self.min_edge_weight = weight;
        self
    }

    #[must_use]
    pub const fn with_max_document_ids(mut self, cap: usize) -> Self {
        self.max_document_ids = cap;
        self
    }

    #[must_use]
    pub const fn with_window_size(mut self, window: i64) -> Self {
        self.window_size = window;
        self
    }

    #[must_use]
    pub fn with_type_pairs(mut self, pairs: Vec<CategoryPair>) -> Self {
        self.type_pairs = pairs;
        self
    }

    #[must_use]
    pub const fn with_same_type_pairs(mut self, enabled: bool) -> Self {
        self.same_type_pairs = enabled;
        self
    }

    #[must_use]
    pub const fn with_top_label_count(mut self, count: usize) -> Self {
        self.top_label_count = count;
        self
    }

    #[must_use]
    pub const fn with_doc_id_dedup(mut self, dedup: DocIdDedup) -> Self {
        self.doc_id_dedup = dedup;
        self
    }

    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub const fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    #[must_use]
    pub fn with_term_category(mut self, category: impl Into<String>) -> Self {
        self.term_category = category.into();
        self
    }

    /// The window size as an index distance.
    pub fn window(&self) -> Result<usize, ConfigError> {
        usize::try_from(self.window_size).map_err(|_| ConfigError::NegativeWindow(self.window_size))
    }

    /// Checks the configuration for the given extraction mode. Runs before any
    /// document is touched.
    pub fn validate(&self, mode: ExtractionMode) -> Result<(), ConfigError> {
        self.window()?;

        if mode == ExtractionMode::Set {
            if self.type_pairs.is_empty() && !self.same_type_pairs {
                return Err(ConfigError::NoCategoryPairs);
            }

            for pair in &self.type_pairs {
                if pair.first.is_empty() || pair.second.is_empty() {
                    return Err(ConfigError::InvalidPair(pair.to_string()));
                }
                if pair.is_same_type() && !self.same_type_pairs {
                    return Err(ConfigError::SameTypePairDisabled(pair.first.clone()));
                }
            }
        }

        Ok(())
    }
}
