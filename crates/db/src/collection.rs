use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{Database, DbError, Document, Filter, Result, ID_FIELD};

/// Typed view over one collection of a [`Database`].
pub struct Collection<T> {
    db: Database,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Collection<T> {
    pub(crate) fn new(db: Database, name: &str) -> Self {
        Self {
            db,
            name: name.to_string(),
            _marker: PhantomData,
        }
    }

    pub async fn count(&self) -> usize {
        let inner = self.db.inner().read().await;
        inner.tables.get(&self.name).map_or(0, |table| table.len())
    }
}

impl<T: DeserializeOwned> Collection<T> {
    /// All documents matching `filter`, in insertion order.
    pub async fn find(&self, filter: &Filter) -> Result<Vec<T>> {
        let inner = self.db.inner().read().await;
        let Some(table) = inner.tables.get(&self.name) else {
            return Ok(Vec::new());
        };

        table
            .rows()
            .filter(|doc| filter.matches(doc))
            .map(|doc| decode(doc.clone()))
            .collect()
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<Option<T>> {
        let inner = self.db.inner().read().await;
        let Some(table) = inner.tables.get(&self.name) else {
            return Ok(None);
        };

        let found = table
            .rows()
            .find(|doc| filter.matches(doc))
            .map(|doc| decode(doc.clone()))
            .transpose();
        found
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        let inner = self.db.inner().read().await;
        inner
            .tables
            .get(&self.name)
            .and_then(|table| table.get(id))
            .map(|doc| decode(doc.clone()))
            .transpose()
    }

    /// Insert `doc` under a freshly generated id and return the stored form.
    pub async fn save<D: Serialize + ?Sized>(&self, doc: &D) -> Result<T> {
        let mut doc = self.encode(doc)?;
        doc.remove(ID_FIELD);
        let id = Uuid::now_v7().to_string();

        let mut inner = self.db.inner().write().await;
        let stored = inner.table_mut(&self.name).insert(&self.name, id.clone(), doc)?;
        let saved = decode(stored.clone())?;

        tracing::debug!(target: "quill-db", collection = %self.name, id = %id, "document saved");
        Ok(saved)
    }

    /// Merge the fields of `patch` into the document with `id`.
    ///
    /// Returns the updated document, or `None` if no document has that id.
    /// The `id` field itself is never overwritten.
    pub async fn find_by_id_and_update<P: Serialize + ?Sized>(
        &self,
        id: &str,
        patch: &P,
    ) -> Result<Option<T>> {
        let patch = self.encode(patch)?;
        self.modify(id, |doc| {
            for (field, value) in patch {
                if field != ID_FIELD {
                    doc.insert(field, value);
                }
            }
            Ok(())
        })
        .await
    }

    pub async fn find_by_id_and_remove(&self, id: &str) -> Result<Option<T>> {
        let mut inner = self.db.inner().write().await;
        let removed = inner.table_mut(&self.name).remove(id);
        if removed.is_some() {
            tracing::debug!(target: "quill-db", collection = %self.name, id, "document removed");
        }
        removed.map(decode).transpose()
    }

    /// Append `value` to the array stored in `field`, creating it if absent.
    pub async fn push<V: Serialize>(&self, id: &str, field: &str, value: V) -> Result<Option<T>> {
        let value = serde_json::to_value(value)?;
        self.modify(id, |doc| {
            let slot = doc.entry(field.to_string()).or_insert(Value::Null);
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            }
            match slot.as_array_mut() {
                Some(items) => {
                    items.push(value);
                    Ok(())
                }
                None => Err(self.not_an_array(field)),
            }
        })
        .await
    }

    /// Remove every element equal to `value` from the array stored in `field`.
    pub async fn pull<V: Serialize>(&self, id: &str, field: &str, value: V) -> Result<Option<T>> {
        let value = serde_json::to_value(value)?;
        self.modify(id, |doc| match doc.get_mut(field) {
            Some(Value::Array(items)) => {
                items.retain(|item| item != &value);
                Ok(())
            }
            None | Some(Value::Null) => Ok(()),
            Some(_) => Err(self.not_an_array(field)),
        })
        .await
    }

    /// Apply `change` to a copy of the stored document and write it back
    /// under the same lock, so concurrent modifications never interleave.
    async fn modify<F>(&self, id: &str, change: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut Document) -> Result<()>,
    {
        let mut inner = self.db.inner().write().await;
        let table = inner.table_mut(&self.name);
        let Some(mut doc) = table.get(id).cloned() else {
            return Ok(None);
        };

        change(&mut doc)?;
        table
            .replace(&self.name, id, doc)?
            .map(|doc| decode(doc.clone()))
            .transpose()
    }

    fn encode<D: Serialize + ?Sized>(&self, doc: &D) -> Result<Document> {
        match serde_json::to_value(doc)? {
            Value::Object(map) => Ok(map),
            _ => Err(DbError::NotAnObject {
                collection: self.name.clone(),
            }),
        }
    }

    fn not_an_array(&self, field: &str) -> DbError {
        DbError::NotAnArray {
            collection: self.name.clone(),
            field: field.to_string(),
        }
    }
}

fn decode<T: DeserializeOwned>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Note {
        id: String,
        title: String,
        #[serde(default)]
        likes: u64,
        #[serde(default)]
        tags: Vec<String>,
    }

    fn notes() -> Collection<Note> {
        Database::new("test").collection("notes")
    }

    #[tokio::test]
    async fn save_assigns_id_and_ignores_client_id() {
        let notes = notes();
        let saved = notes
            .save(&json!({"id": "forged", "title": "first"}))
            .await
            .unwrap();

        assert_ne!(saved.id, "forged");
        assert_eq!(saved.title, "first");
        assert_eq!(notes.find_by_id(&saved.id).await.unwrap(), Some(saved));
        assert_eq!(notes.find_by_id("forged").await.unwrap(), None);
    }

    #[tokio::test]
    async fn find_preserves_insertion_order() {
        let notes = notes();
        for title in ["a", "b", "c"] {
            notes.save(&json!({"title": title})).await.unwrap();
        }

        let titles: Vec<_> = notes
            .find(&Filter::all())
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, ["a", "b", "c"]);
        assert_eq!(notes.count().await, 3);
    }

    #[tokio::test]
    async fn find_on_unknown_collection_is_empty() {
        let notes = notes();
        assert!(notes.find(&Filter::all()).await.unwrap().is_empty());
        assert!(notes.find_one(&Filter::all()).await.unwrap().is_none());
        assert_eq!(notes.count().await, 0);
    }

    #[tokio::test]
    async fn update_merges_fields_and_keeps_id() {
        let notes = notes();
        let saved = notes.save(&json!({"title": "x", "likes": 1})).await.unwrap();

        let updated = notes
            .find_by_id_and_update(&saved.id, &json!({"likes": 9, "id": "other"}))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.title, "x");
        assert_eq!(updated.likes, 9);
    }

    #[tokio::test]
    async fn update_missing_document_returns_none() {
        let notes = notes();
        let updated = notes
            .find_by_id_and_update("missing", &json!({"likes": 1}))
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn remove_returns_removed_document() {
        let notes = notes();
        let saved = notes.save(&json!({"title": "gone"})).await.unwrap();

        let removed = notes.find_by_id_and_remove(&saved.id).await.unwrap();
        assert_eq!(removed.map(|n| n.title), Some("gone".to_string()));
        assert!(notes.find_by_id_and_remove(&saved.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unique_field_rejects_duplicate_save_and_update() {
        let db = Database::new("test");
        db.ensure_unique("notes", "title").await.unwrap();
        let notes = db.collection::<Note>("notes");

        notes.save(&json!({"title": "one"})).await.unwrap();
        let two = notes.save(&json!({"title": "two"})).await.unwrap();

        let err = notes.save(&json!({"title": "one"})).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate { ref field, .. } if field == "title"));

        let err = notes
            .find_by_id_and_update(&two.id, &json!({"title": "one"}))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Duplicate { .. }));

        // Re-writing a document's own value is not a clash.
        notes
            .find_by_id_and_update(&two.id, &json!({"title": "two"}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn push_and_pull_maintain_arrays() {
        let notes = notes();
        let saved = notes.save(&json!({"title": "t"})).await.unwrap();

        notes.push(&saved.id, "tags", "rust").await.unwrap();
        notes.push(&saved.id, "tags", "axum").await.unwrap();
        let note = notes.pull(&saved.id, "tags", "rust").await.unwrap().unwrap();

        assert_eq!(note.tags, ["axum"]);
    }

    #[tokio::test]
    async fn push_onto_scalar_field_fails() {
        let notes = notes();
        let saved = notes.save(&json!({"title": "t"})).await.unwrap();

        let err = notes.push(&saved.id, "title", "x").await.unwrap_err();
        assert!(matches!(err, DbError::NotAnArray { .. }));
    }

    #[tokio::test]
    async fn save_rejects_non_object_documents() {
        let notes = notes();
        let err = notes.save(&json!([1, 2, 3])).await.unwrap_err();
        assert!(matches!(err, DbError::NotAnObject { .. }));
    }
}
