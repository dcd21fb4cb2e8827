use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::extract::normalize_key;

/// A typed entity identifier: `(category, normalized key)`.
///
/// Ordering compares the category first, then the key, byte-wise. This is the
/// canonical order used for every pair in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    category: String,
    key: String,
}

impl EntityId {
    #[must_use]
    pub fn new(category: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            key: key.into(),
        }
    }

    /// Builds an id from a raw surface value, normalizing it first.
    /// Returns `None` when nothing is left after normalization.
    #[must_use]
    pub fn from_raw(category: &str, raw: &str) -> Option<Self> {
        let key = normalize_key(raw);
        if key.is_empty() {
            None
        } else {
            Some(Self::new(category, key))
        }
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.category, self.key)
    }
}

impl std::str::FromStr for EntityId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((category, key)) if !category.is_empty() && !key.is_empty() => {
                Ok(Self::new(category, key))
            }
            _ => Err(crate::Error::InvalidEntityId(s.to_string())),
        }
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Geographic position, serialized as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && self.lat.abs() <= 90.0 && self.lng.abs() <= 180.0
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.lat, c.lng]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl CatalogEntry {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            count: None,
            coordinates: None,
        }
    }

    #[must_use]
    pub const fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub const fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }
}

/// One catalog row as the harness supplies it. The key is a raw value and is
/// normalized the same way extracted values are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub category: String,
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// Label, own count and optional coordinates per entity, resolved upstream.
#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    entries: BTreeMap<EntityId, CatalogEntry>,
}

impl NodeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from harness rows. Rows whose key normalizes to
    /// nothing are dropped, as are out-of-range coordinates. Later rows win.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = CatalogRecord>) -> Self {
        let mut catalog = Self::new();

        for record in records {
            let Some(id) = EntityId::from_raw(&record.category, &record.key) else {
                tracing::warn!("Dropping catalog row with empty key: {:?}", record.label);
                continue;
            };

            let coordinates = record.coordinates.filter(|c| {
                let valid = c.is_valid();
                if !valid {
                    tracing::warn!("Dropping invalid coordinates for {}", id);
                }
                valid
            });

            catalog.insert(
                id,
                CatalogEntry {
                    label: record.label,
                    count: record.count,
                    coordinates,
                },
            );
        }

        catalog
    }

    pub fn insert(&mut self, id: EntityId, entry: CatalogEntry) {
        self.entries.insert(id, entry);
    }

    #[must_use]
    pub fn with_entry(mut self, id: EntityId, entry: CatalogEntry) -> Self {
        self.insert(id, entry);
        self
    }

    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_display_and_parse() {
        let id = EntityId::new("person", "amadou hampâté bâ");
        assert_eq!(id.to_string(), "person:amadou hampâté bâ");

        let parsed: EntityId = "person:amadou hampâté bâ".parse().unwrap();
        assert_eq!(parsed, id);

        assert!("nocolon".parse::<EntityId>().is_err());
        assert!(":key".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_entity_id_ordering() {
        let a = EntityId::new("organization", "z");
        let b = EntityId::new("person", "a");
        let c = EntityId::new("person", "b");

        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_entity_id_from_raw_normalizes() {
        let a = EntityId::from_raw("person", "  Cheikh   Anta Diop ").unwrap();
        let b = EntityId::from_raw("person", "cheikh anta DIOP").unwrap();
        assert_eq!(a, b);
        assert!(EntityId::from_raw("person", "   ").is_none());
    }

    #[test]
    fn test_entity_id_serde() {
        let id = EntityId::new("subject", "islam");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"subject:islam\"");

        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_catalog_from_records() {
        let records = vec![
            CatalogRecord {
                category: "location".into(),
                key: "Ouagadougou".into(),
                label: "Ouagadougou".into(),
                count: Some(12),
                coordinates: Some(Coordinates::new(12.37, -1.52)),
            },
            CatalogRecord {
                category: "location".into(),
                key: "Nowhere".into(),
                label: "Nowhere".into(),
                count: None,
                coordinates: Some(Coordinates::new(120.0, 0.0)),
            },
            CatalogRecord {
                category: "location".into(),
                key: "  ".into(),
                label: "blank".into(),
                count: None,
                coordinates: None,
            },
        ];

        let catalog = NodeCatalog::from_records(records);

        assert_eq!(catalog.len(), 2);
        let ouaga = catalog.get(&EntityId::new("location", "ouagadougou")).unwrap();
        assert_eq!(ouaga.count, Some(12));
        assert!(ouaga.coordinates.is_some());

        let nowhere = catalog.get(&EntityId::new("location", "nowhere")).unwrap();
        assert!(nowhere.coordinates.is_none());
    }

    #[test]
    fn test_coordinates_serde() {
        let entry = CatalogEntry::new("Bamako").with_coordinates(Coordinates::new(12.65, -8.0));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["coordinates"], serde_json::json!([12.65, -8.0]));
    }
}
