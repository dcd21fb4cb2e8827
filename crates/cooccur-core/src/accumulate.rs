use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::{CategoryPair, DocIdDedup, GraphConfig};
use crate::entity::EntityId;
use crate::extract::{count_within_window, ExtractedDocument, ExtractedEntities, ExtractionMode};

/// An unordered entity pair in canonical order (`source < target`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    source: EntityId,
    target: EntityId,
}

impl PairKey {
    /// `None` for a self-pair.
    #[must_use]
    pub fn new(a: EntityId, b: EntityId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { source: a, target: b }),
            std::cmp::Ordering::Greater => Some(Self { source: b, target: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[must_use]
    pub const fn source(&self) -> &EntityId {
        &self.source
    }

    #[must_use]
    pub const fn target(&self) -> &EntityId {
        &self.target
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairEntry {
    pub weight: u64,
    /// Tag of the category pair that first produced this entry.
    pub type_tag: String,
    pub document_ids: Vec<String>,
}

/// Corpus-level facts about one entity, used when the catalog is silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityObservation {
    /// Documents containing the entity (set mode) or occurrences (window mode).
    pub count: u64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SameType {
    Off,
    Listed(BTreeSet<String>),
    All,
}

/// Which category pairs are enumerated per document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairPlan {
    mode: ExtractionMode,
    cross: Vec<CategoryPair>,
    same_type: SameType,
}

impl PairPlan {
    /// Cross pairs keep their configured order; a reversed duplicate (`b-a`
    /// after `a-b`) is dropped so a document is never counted twice for the
    /// same pair. Same-type pairing covers the listed `c-c` pairs, or every
    /// category when none is listed.
    #[must_use]
    pub fn from_config(config: &GraphConfig, mode: ExtractionMode) -> Self {
        if mode == ExtractionMode::Window {
            return Self {
                mode,
                cross: Vec::new(),
                same_type: SameType::Listed(BTreeSet::from([config.term_category.clone()])),
            };
        }

        let mut seen = BTreeSet::new();
        let mut cross = Vec::new();
        let mut listed = BTreeSet::new();

        for pair in &config.type_pairs {
            if pair.is_same_type() {
                listed.insert(pair.first.clone());
            } else if seen.insert(pair.unordered()) {
                cross.push(pair.clone());
            }
        }

        let same_type = match (config.same_type_pairs, listed.is_empty()) {
            (false, _) => SameType::Off,
            (true, true) => SameType::All,
            (true, false) => SameType::Listed(listed),
        };

        Self {
            mode,
            cross,
            same_type,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> ExtractionMode {
        self.mode
    }

    fn pairs_same_type(&self, category: &str) -> bool {
        match &self.same_type {
            SameType::Off => false,
            SameType::Listed(categories) => categories.contains(category),
            SameType::All => true,
        }
    }

    /// Categories that can end up in the graph. `observed` supplies the
    /// corpus categories when every category pairs with itself.
    #[must_use]
    pub fn supported_types<'a>(&self, observed: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut types: BTreeSet<String> = BTreeSet::new();
        for pair in &self.cross {
            types.insert(pair.first.clone());
            types.insert(pair.second.clone());
        }
        match &self.same_type {
            SameType::Off => {}
            SameType::Listed(categories) => types.extend(categories.iter().cloned()),
            SameType::All => types.extend(observed.into_iter().map(str::to_string)),
        }
        types.into_iter().collect()
    }

    /// Effective category pairs, cross pairs first.
    #[must_use]
    pub fn type_pairs<'a>(&self, observed: impl IntoIterator<Item = &'a str>) -> Vec<CategoryPair> {
        let mut pairs = self.cross.clone();
        let same: Vec<String> = match &self.same_type {
            SameType::Off => Vec::new(),
            SameType::Listed(categories) => categories.iter().cloned().collect(),
            SameType::All => observed
                .into_iter()
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        };
        pairs.extend(same.into_iter().map(|c| CategoryPair::new(c.clone(), c)));
        pairs
    }
}

/// Weighted co-occurrence counts with document provenance for one run.
#[derive(Debug, Clone)]
pub struct PairAccumulator {
    pairs: BTreeMap<PairKey, PairEntry>,
    entities: BTreeMap<EntityId, EntityObservation>,
    max_document_ids: usize,
    dedup: DocIdDedup,
    documents: usize,
    contributing: usize,
    total_weight: u64,
}

impl PairAccumulator {
    #[must_use]
    pub const fn new(max_document_ids: usize, dedup: DocIdDedup) -> Self {
        Self {
            pairs: BTreeMap::new(),
            entities: BTreeMap::new(),
            max_document_ids,
            dedup,
            documents: 0,
            contributing: 0,
            total_weight: 0,
        }
    }

    #[must_use]
    pub const fn from_config(config: &GraphConfig) -> Self {
        Self::new(config.max_document_ids, config.doc_id_dedup)
    }

    /// Adds `amount` to the pair's weight and records `doc_id` as a contributor.
    pub fn add(&mut self, key: PairKey, type_tag: &str, doc_id: &str, amount: u64) {
        if amount == 0 {
            return;
        }

        let (cap, dedup) = (self.max_document_ids, self.dedup);
        let entry = self.pairs.entry(key).or_insert_with(|| PairEntry {
            weight: 0,
            type_tag: type_tag.to_string(),
            document_ids: Vec::new(),
        });
        entry.weight += amount;
        push_document_id(cap, dedup, &mut entry.document_ids, doc_id);
        self.total_weight += amount;
    }

    pub fn observe(&mut self, id: &EntityId, amount: u64, label: &str) {
        match self.entities.get_mut(id) {
            Some(obs) => {
                obs.count += amount;
                if label < obs.label.as_str() {
                    obs.label = label.to_string();
                }
            }
            None => {
                self.entities.insert(
                    id.clone(),
                    EntityObservation {
                        count: amount,
                        label: label.to_string(),
                    },
                );
            }
        }
    }

    /// Folds one extracted document into the counts.
    pub fn add_document(&mut self, doc: &ExtractedDocument, plan: &PairPlan) {
        self.documents += 1;
        let before = self.total_weight;

        match &doc.entities {
            ExtractedEntities::Sets(sets) => self.add_sets(doc, sets, plan),
            ExtractedEntities::Positions { positions, window } => {
                self.add_positions(doc, positions, *window);
            }
        }

        if self.total_weight > before {
            self.contributing += 1;
        }
    }

    fn label_for<'a>(doc: &'a ExtractedDocument, id: &'a EntityId) -> &'a str {
        doc.labels.get(id).map_or_else(|| id.key(), String::as_str)
    }

    fn add_sets(
        &mut self,
        doc: &ExtractedDocument,
        sets: &BTreeMap<String, BTreeSet<EntityId>>,
        plan: &PairPlan,
    ) {
        for id in sets.values().flatten() {
            self.observe(id, 1, Self::label_for(doc, id));
        }

        for pair in &plan.cross {
            let (Some(a), Some(b)) = (sets.get(&pair.first), sets.get(&pair.second)) else {
                continue;
            };
            let tag = pair.tag();
            for x in a {
                for y in b {
                    if let Some(key) = PairKey::new(x.clone(), y.clone()) {
                        self.add(key, &tag, &doc.doc_id, 1);
                    }
                }
            }
        }

        for (category, entities) in sets {
            if entities.len() < 2 || !plan.pairs_same_type(category) {
                continue;
            }
            let tag = format!("{category}-{category}");
            let sorted: Vec<&EntityId> = entities.iter().collect();
            for (i, x) in sorted.iter().enumerate() {
                for y in &sorted[i + 1..] {
                    if let Some(key) = PairKey::new((*x).clone(), (*y).clone()) {
                        self.add(key, &tag, &doc.doc_id, 1);
                    }
                }
            }
        }
    }

    fn add_positions(
        &mut self,
        doc: &ExtractedDocument,
        positions: &BTreeMap<EntityId, Vec<usize>>,
        window: usize,
    ) {
        for (id, at) in positions {
            self.observe(id, at.len() as u64, Self::label_for(doc, id));
        }

        let families: Vec<(&EntityId, &Vec<usize>)> = positions.iter().collect();
        for (i, (a, pos_a)) in families.iter().enumerate() {
            for (b, pos_b) in &families[i + 1..] {
                let count = count_within_window(pos_a, pos_b, window);
                if count == 0 {
                    continue;
                }
                let tag = format!("{}-{}", a.category(), b.category());
                if let Some(key) = PairKey::new((*a).clone(), (*b).clone()) {
                    self.add(key, &tag, &doc.doc_id, count);
                }
            }
        }
    }

    /// Merges an accumulator built over the documents that follow this one's.
    /// Merging adjacent slices in order gives the same state as one sequential
    /// pass over their concatenation.
    pub fn merge(&mut self, other: Self) {
        let (cap, dedup) = (self.max_document_ids, self.dedup);

        for (key, entry) in other.pairs {
            match self.pairs.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
                Entry::Occupied(slot) => {
                    let existing = slot.into_mut();
                    existing.weight += entry.weight;
                    for id in &entry.document_ids {
                        push_document_id(cap, dedup, &mut existing.document_ids, id);
                    }
                }
            }
        }

        for (id, obs) in other.entities {
            self.observe(&id, obs.count, &obs.label);
        }

        self.documents += other.documents;
        self.contributing += other.contributing;
        self.total_weight += other.total_weight;
    }

    #[must_use]
    pub const fn pairs(&self) -> &BTreeMap<PairKey, PairEntry> {
        &self.pairs
    }

    #[must_use]
    pub const fn entities(&self) -> &BTreeMap<EntityId, EntityObservation> {
        &self.entities
    }

    #[must_use]
    pub fn get(&self, a: &EntityId, b: &EntityId) -> Option<&PairEntry> {
        PairKey::new(a.clone(), b.clone()).and_then(|key| self.pairs.get(&key))
    }

    /// Distinct categories among observed entities, sorted.
    #[must_use]
    pub fn observed_categories(&self) -> Vec<&str> {
        let categories: BTreeSet<&str> = self.entities.keys().map(EntityId::category).collect();
        categories.into_iter().collect()
    }

    /// Documents folded in.
    #[must_use]
    pub const fn document_count(&self) -> usize {
        self.documents
    }

    /// Documents that added weight to at least one pair.
    #[must_use]
    pub const fn contributing_count(&self) -> usize {
        self.contributing
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn push_document_id(cap: usize, dedup: DocIdDedup, ids: &mut Vec<String>, doc_id: &str) {
    if ids.len() >= cap {
        return;
    }
    let duplicate = match dedup {
        DocIdDedup::Adjacent => ids.last().is_some_and(|last| last == doc_id),
        DocIdDedup::Full => ids.iter().any(|id| id == doc_id),
    };
    if !duplicate {
        ids.push(doc_id.to_string());
    }
}
