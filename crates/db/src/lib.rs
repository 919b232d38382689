//! In-memory document store for Quill modules.
//!
//! Documents are stored as JSON objects grouped into named collections and
//! accessed through typed [`Collection`] handles that mirror the familiar
//! document-database verbs (`find`, `save`, `find_by_id_and_update`,
//! `find_by_id_and_remove`). Every document carries a string `id` assigned on
//! save. Nothing is persisted across restarts.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;

mod collection;
mod error;
mod filter;

pub use collection::Collection;
pub use error::DbError;
pub use filter::Filter;

pub type Result<T> = std::result::Result<T, DbError>;

/// Name of the identifier field every stored document carries.
pub const ID_FIELD: &str = "id";

pub(crate) type Document = Map<String, Value>;

/// Handle to an in-memory database. Cloning is cheap and shares storage.
#[derive(Clone)]
pub struct Database {
    name: Arc<str>,
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
pub(crate) struct Inner {
    pub(crate) tables: HashMap<String, Table>,
    applied: HashSet<String>,
}

impl Inner {
    pub(crate) fn table_mut(&mut self, name: &str) -> &mut Table {
        self.tables.entry(name.to_string()).or_default()
    }
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        tracing::debug!(target: "quill-db", database = %name, "in-memory database created");
        Self {
            name: Arc::from(name),
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Typed handle on the named collection. Collections are created lazily.
    pub fn collection<T>(&self, name: &str) -> Collection<T> {
        Collection::new(self.clone(), name)
    }

    /// Declare `field` unique within `collection`.
    ///
    /// Fails with [`DbError::Duplicate`] if documents already stored violate it.
    pub async fn ensure_unique(&self, collection: &str, field: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let table = inner.table_mut(collection);
        if table.unique.iter().any(|existing| existing == field) {
            return Ok(());
        }

        let mut seen = HashSet::new();
        for doc in table.rows.values() {
            if let Some(value) = doc.get(field).filter(|v| !v.is_null()) {
                if !seen.insert(value.to_string()) {
                    return Err(DbError::Duplicate {
                        collection: collection.to_string(),
                        field: field.to_string(),
                    });
                }
            }
        }

        table.unique.push(field.to_string());
        tracing::debug!(target: "quill-db", collection, field, "unique index created");
        Ok(())
    }

    pub async fn is_applied(&self, key: &str) -> bool {
        self.inner.read().await.applied.contains(key)
    }

    /// Record `key` as applied. Returns `false` if it was already recorded.
    pub async fn mark_applied(&self, key: &str) -> bool {
        self.inner.write().await.applied.insert(key.to_string())
    }

    pub(crate) fn inner(&self) -> &RwLock<Inner> {
        &self.inner
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("name", &self.name).finish()
    }
}

/// Rows of one collection, kept in insertion order.
#[derive(Default)]
pub(crate) struct Table {
    next_seq: u64,
    rows: BTreeMap<u64, Document>,
    ids: HashMap<String, u64>,
    unique: Vec<String>,
}

impl Table {
    pub(crate) fn rows(&self) -> impl Iterator<Item = &Document> {
        self.rows.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Document> {
        self.ids.get(id).and_then(|seq| self.rows.get(seq))
    }

    pub(crate) fn insert(&mut self, collection: &str, id: String, mut doc: Document) -> Result<&Document> {
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        self.check_unique(collection, &doc, None)?;

        let seq = self.next_seq;
        self.next_seq += 1;
        self.ids.insert(id, seq);
        Ok(self.rows.entry(seq).or_insert(doc))
    }

    /// Replace the stored document with `id`, re-checking unique fields.
    pub(crate) fn replace(&mut self, collection: &str, id: &str, doc: Document) -> Result<Option<&Document>> {
        let Some(&seq) = self.ids.get(id) else {
            return Ok(None);
        };
        self.check_unique(collection, &doc, Some(id))?;
        self.rows.insert(seq, doc);
        Ok(self.rows.get(&seq))
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Document> {
        let seq = self.ids.remove(id)?;
        self.rows.remove(&seq)
    }

    fn check_unique(&self, collection: &str, doc: &Document, except: Option<&str>) -> Result<()> {
        for field in &self.unique {
            let Some(value) = doc.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = self.rows.values().any(|other| {
                other.get(field) == Some(value)
                    && other.get(ID_FIELD).and_then(Value::as_str) != except
            });
            if clash {
                return Err(DbError::Duplicate {
                    collection: collection.to_string(),
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }
}
