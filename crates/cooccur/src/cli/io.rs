use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use cooccur_core::serialize::write_json;
use cooccur_core::{CatalogRecord, Document, GraphConfig, NodeCatalog, TermFamilies};

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {what} file {}", path.display()))
}

/// Documents read from disk, with the count of elements left out.
pub struct LoadedDocuments {
    pub documents: Vec<Document>,
    pub skipped: usize,
}

/// Reads a JSON array of documents. Elements that are not documents are
/// logged and left out. With `group_by`, the named field (string or number)
/// replaces each document's group key.
pub fn load_documents(path: &Path, group_by: Option<&str>) -> Result<LoadedDocuments> {
    let values: Vec<serde_json::Value> = read_json(path, "documents")?;
    let total = values.len();

    let documents: Vec<Document> = values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| {
            let group = group_by.and_then(|field| group_key(&value, field));
            match serde_json::from_value::<Document>(value) {
                Ok(mut doc) => {
                    if group_by.is_some() {
                        doc.group = group;
                    }
                    Some(doc)
                }
                Err(e) => {
                    tracing::warn!("Skipping malformed document #{}: {}", i, e);
                    None
                }
            }
        })
        .collect();

    let skipped = total - documents.len();
    if skipped > 0 {
        tracing::info!("Skipped {} malformed documents", skipped);
    }
    tracing::debug!("Loaded {} documents from {}", documents.len(), path.display());

    Ok(LoadedDocuments { documents, skipped })
}

fn group_key(value: &serde_json::Value, field: &str) -> Option<String> {
    match value.get(field)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn load_catalog(path: &Path) -> Result<NodeCatalog> {
    let records: Vec<CatalogRecord> = read_json(path, "catalog")?;
    Ok(NodeCatalog::from_records(records))
}

pub fn load_families(path: &Path) -> Result<TermFamilies> {
    read_json(path, "families")
}

pub fn load_stopwords(path: &Path) -> Result<BTreeSet<String>> {
    read_json(path, "stopwords")
}

pub fn load_config(path: &Path) -> Result<GraphConfig> {
    read_json(path, "config")
}

/// `SOURCE_DATE_EPOCH` when set, so builds can be reproduced; now otherwise.
pub fn generated_at() -> Result<DateTime<Utc>> {
    match std::env::var("SOURCE_DATE_EPOCH") {
        Ok(raw) => {
            let secs: i64 = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid SOURCE_DATE_EPOCH {raw:?}"))?;
            Utc.timestamp_opt(secs, 0)
                .single()
                .with_context(|| format!("SOURCE_DATE_EPOCH out of range: {secs}"))
        }
        Err(_) => Ok(Utc::now()),
    }
}

/// Turns a term name into a file name component.
pub fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect()
}

/// Writes `value` to `path`, creating parent directories, or to stdout.
pub fn write_artifact<T: Serialize>(value: &T, path: Option<&Path>, pretty: bool) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_json(value, std::io::BufWriter::new(file), pretty)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_json(value, &mut lock, pretty).context("failed to write to stdout")?;
            lock.flush()?;
        }
    }
    Ok(())
}
