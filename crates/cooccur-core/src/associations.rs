use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::extract::{tokens_of, Document, TermFamily, WindowExtractor};

pub const DEFAULT_TOP_WORDS: usize = 100;

/// Words this short (in characters) are never associated.
const MAX_IGNORED_WORD_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermAssociations {
    pub term: String,
    /// Sum of all associated word counts, before truncation.
    pub total_occurrences: u64,
    /// Documents that contributed at least one associated word.
    pub articles_with_term: usize,
    pub unique_words: usize,
    pub max_word_count: u64,
    pub words: Vec<WordCount>,
}

/// Per term family, the words found around its occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordAssociations {
    pub terms: BTreeMap<String, TermAssociations>,
}

struct Collector<'a> {
    extractor: &'a WindowExtractor,
    stopwords: BTreeSet<String>,
}

impl Collector<'_> {
    fn keeps(&self, word: &str) -> bool {
        word.chars().count() > MAX_IGNORED_WORD_LEN
            && !word.chars().all(char::is_numeric)
            && !self.extractor.is_variant(word)
            && !self.stopwords.contains(word)
    }

    fn document(&self, document: &Document) -> BTreeMap<EntityId, BTreeMap<String, u64>> {
        let Some(tokens) = tokens_of(document) else {
            return BTreeMap::new();
        };

        let cleaned: Vec<String> = tokens.iter().map(|t| self.extractor.cleaner().clean(t)).collect();
        let window = self.extractor.window();
        let mut found: BTreeMap<EntityId, BTreeMap<String, u64>> = BTreeMap::new();

        for (id, positions) in self.extractor.positions(&cleaned) {
            let mut words: BTreeMap<String, u64> = BTreeMap::new();
            for &pos in &positions {
                let start = pos.saturating_sub(window);
                let end = pos.saturating_add(window).min(cleaned.len().saturating_sub(1));
                for (i, word) in cleaned.iter().enumerate().take(end + 1).skip(start) {
                    if i != pos && self.keeps(word) {
                        *words.entry(word.clone()).or_default() += 1;
                    }
                }
            }
            if !words.is_empty() {
                found.insert(id, words);
            }
        }

        found
    }
}

impl WordAssociations {
    /// Scans token and text documents with the extractor's families and
    /// window. Words are cleaned like tokens; stopwords are compared after
    /// the same cleaning. Each family keeps its `top_n` words by count
    /// (ties by word), and families without any word are left out.
    #[must_use]
    pub fn collect(
        documents: &[Document],
        extractor: &WindowExtractor,
        stopwords: &BTreeSet<String>,
        top_n: usize,
    ) -> Self {
        let collector = Collector {
            extractor,
            stopwords: stopwords
                .iter()
                .map(|s| extractor.cleaner().clean(s.trim()))
                .filter(|s| !s.is_empty())
                .collect(),
        };

        let mut words: BTreeMap<EntityId, BTreeMap<String, u64>> = BTreeMap::new();
        let mut articles: BTreeMap<EntityId, usize> = BTreeMap::new();

        for document in documents {
            for (id, found) in collector.document(document) {
                *articles.entry(id.clone()).or_default() += 1;
                let total = words.entry(id).or_default();
                for (word, count) in found {
                    *total.entry(word).or_default() += count;
                }
            }
        }

        let names: BTreeMap<&EntityId, &TermFamily> =
            extractor.families().iter().map(|f| (&f.id, f)).collect();

        let terms = words
            .into_iter()
            .filter_map(|(id, counts)| {
                let family = names.get(&id)?;
                let mut ranked: Vec<WordCount> = counts
                    .iter()
                    .map(|(word, &count)| WordCount {
                        word: word.clone(),
                        count,
                    })
                    .collect();
                ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
                ranked.truncate(top_n);

                let entry = TermAssociations {
                    term: family.name.clone(),
                    total_occurrences: counts.values().sum(),
                    articles_with_term: articles.get(&id).copied().unwrap_or(0),
                    unique_words: counts.len(),
                    max_word_count: ranked.first().map_or(0, |w| w.count),
                    words: ranked,
                };
                Some((family.name.clone(), entry))
            })
            .collect();

        Self { terms }
    }

    #[must_use]
    pub fn get(&self, term: &str) -> Option<&TermAssociations> {
        self.terms.get(term)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
