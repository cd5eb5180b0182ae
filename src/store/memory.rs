//! # In-Memory Backend
//!
//! A [`DocumentBackend`] holding collections in process memory. Used by tests
//! and for running the API without a database (`stocklab serve --memory`).
//!
//! Reads return a snapshot taken under the read lock, so a stream stays valid
//! for its whole iteration regardless of concurrent writes.

use std::collections::HashMap;

use futures_util::stream::{self, StreamExt};
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use super::backend::{BackendFuture, DocumentBackend};
use super::document::{Document, DocumentStream, Namespace, UpdateOutcome};
use super::errors::{StoreError, StoreResult};
use super::filter;
use super::pipeline::run_pipeline;
use super::update::{apply_update, seed_from_filter};

/// Documents of one collection, in insertion order
#[derive(Debug, Default, Clone)]
struct CollectionData {
    documents: Vec<Document>,
}

impl CollectionData {
    fn contains_id(&self, id: &Value) -> bool {
        self.documents.iter().any(|d| d.get("_id") == Some(id))
    }

    fn matching(&self, filter: &Document) -> StoreResult<Vec<Document>> {
        let mut out = Vec::new();
        for doc in &self.documents {
            if filter::matches(doc, filter)? {
                out.push(doc.clone());
            }
        }
        Ok(out)
    }
}

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<Namespace, CollectionData>>,
}

impl MemoryBackend {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub fn len(&self, ns: &Namespace) -> usize {
        self.collections
            .read()
            .get(ns)
            .map(|c| c.documents.len())
            .unwrap_or(0)
    }

    /// True when the collection holds no documents
    pub fn is_empty(&self, ns: &Namespace) -> bool {
        self.len(ns) == 0
    }

    fn snapshot(&self, ns: &Namespace) -> Vec<Document> {
        self.collections
            .read()
            .get(ns)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    /// Assign an `_id` if missing and reject duplicates
    fn prepare(coll: &CollectionData, pending: &[Document], mut doc: Document) -> StoreResult<Document> {
        let id = doc
            .entry("_id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()))
            .clone();

        if coll.contains_id(&id) || pending.iter().any(|d| d.get("_id") == Some(&id)) {
            return Err(StoreError::rejected(format!("duplicate key: _id {}", id)));
        }
        Ok(doc)
    }

    fn insert_all(&self, ns: &Namespace, docs: Vec<Document>) -> StoreResult<Vec<Value>> {
        let mut collections = self.collections.write();
        let coll = collections.entry(ns.clone()).or_default();

        let mut prepared = Vec::with_capacity(docs.len());
        for doc in docs {
            let doc = Self::prepare(coll, &prepared, doc)?;
            prepared.push(doc);
        }

        let ids = prepared
            .iter()
            .map(|d| d.get("_id").cloned().unwrap_or(Value::Null))
            .collect();
        coll.documents.extend(prepared);
        Ok(ids)
    }

    fn update(
        &self,
        ns: &Namespace,
        filter: &Document,
        update: &Document,
        multi: bool,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome> {
        let mut collections = self.collections.write();
        let coll = collections.entry(ns.clone()).or_default();

        let mut outcome = UpdateOutcome::default();
        // apply to copies first so a failing update leaves the collection untouched
        let mut staged = Vec::new();
        for (idx, doc) in coll.documents.iter().enumerate() {
            if !filter::matches(doc, filter)? {
                continue;
            }
            outcome.matched += 1;
            let mut updated = doc.clone();
            if apply_update(&mut updated, update, false)? {
                outcome.modified += 1;
                staged.push((idx, updated));
            }
            if !multi {
                break;
            }
        }

        if outcome.matched == 0 && upsert {
            let mut fresh = seed_from_filter(filter)?;
            apply_update(&mut fresh, update, true)?;
            let fresh = Self::prepare(coll, &[], fresh)?;
            outcome.upserted_id = fresh.get("_id").cloned();
            coll.documents.push(fresh);
            return Ok(outcome);
        }

        for (idx, updated) in staged {
            coll.documents[idx] = updated;
        }
        Ok(outcome)
    }
}

fn into_stream(docs: Vec<Document>) -> DocumentStream {
    stream::iter(docs.into_iter().map(Ok)).boxed()
}

impl DocumentBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn ping(&self) -> BackendFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn insert_one<'a>(&'a self, ns: &'a Namespace, doc: Document) -> BackendFuture<'a, Value> {
        Box::pin(async move {
            let mut ids = self.insert_all(ns, vec![doc])?;
            Ok(ids.pop().unwrap_or(Value::Null))
        })
    }

    fn insert_many<'a>(
        &'a self,
        ns: &'a Namespace,
        docs: Vec<Document>,
    ) -> BackendFuture<'a, Vec<Value>> {
        Box::pin(async move { self.insert_all(ns, docs) })
    }

    fn find_one<'a>(
        &'a self,
        ns: &'a Namespace,
        filter: Document,
    ) -> BackendFuture<'a, Option<Document>> {
        Box::pin(async move {
            let collections = self.collections.read();
            let Some(coll) = collections.get(ns) else {
                return Ok(None);
            };
            for doc in &coll.documents {
                if filter::matches(doc, &filter)? {
                    return Ok(Some(doc.clone()));
                }
            }
            Ok(None)
        })
    }

    fn find_many<'a>(
        &'a self,
        ns: &'a Namespace,
        filter: Document,
    ) -> BackendFuture<'a, DocumentStream> {
        Box::pin(async move {
            let docs = match self.collections.read().get(ns) {
                Some(coll) => coll.matching(&filter)?,
                None => Vec::new(),
            };
            Ok(into_stream(docs))
        })
    }

    fn delete_many<'a>(&'a self, ns: &'a Namespace, filter: Document) -> BackendFuture<'a, u64> {
        Box::pin(async move {
            let mut collections = self.collections.write();
            let Some(coll) = collections.get_mut(ns) else {
                return Ok(0);
            };

            let mut keep = Vec::with_capacity(coll.documents.len());
            let mut deleted = 0u64;
            for doc in &coll.documents {
                if filter::matches(doc, &filter)? {
                    deleted += 1;
                } else {
                    keep.push(doc.clone());
                }
            }
            coll.documents = keep;
            Ok(deleted)
        })
    }

    fn update_one<'a>(
        &'a self,
        ns: &'a Namespace,
        filter: Document,
        update: Document,
    ) -> BackendFuture<'a, UpdateOutcome> {
        Box::pin(async move { self.update(ns, &filter, &update, false, true) })
    }

    fn update_many<'a>(
        &'a self,
        ns: &'a Namespace,
        filter: Document,
        update: Document,
    ) -> BackendFuture<'a, UpdateOutcome> {
        Box::pin(async move { self.update(ns, &filter, &update, true, false) })
    }

    fn aggregate<'a>(
        &'a self,
        ns: &'a Namespace,
        pipeline: Vec<Document>,
    ) -> BackendFuture<'a, DocumentStream> {
        Box::pin(async move {
            let docs = run_pipeline(self.snapshot(ns), &pipeline)?;
            Ok(into_stream(docs))
        })
    }

    fn text_search<'a>(
        &'a self,
        ns: &'a Namespace,
        text: String,
    ) -> BackendFuture<'a, DocumentStream> {
        Box::pin(async move {
            let filter = filter::text_filter(&text);
            let docs = match self.collections.read().get(ns) {
                Some(coll) => coll.matching(&filter)?,
                None => Vec::new(),
            };
            Ok(into_stream(docs))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::document::collect_documents;
    use serde_json::json;

    fn ns() -> Namespace {
        Namespace::new("stocklab", "code_info").unwrap()
    }

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = MemoryBackend::new();
        let id = store.insert_one(&ns(), doc(json!({"a": 1}))).await.unwrap();
        assert!(id.is_string());
        assert_eq!(store.len(&ns()), 1);
    }

    #[tokio::test]
    async fn test_insert_keeps_given_id() {
        let store = MemoryBackend::new();
        let id = store
            .insert_one(&ns(), doc(json!({"_id": "005930"})))
            .await
            .unwrap();
        assert_eq!(id, json!("005930"));
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = MemoryBackend::new();
        store.insert_one(&ns(), doc(json!({"_id": 1}))).await.unwrap();
        let err = store.insert_one(&ns(), doc(json!({"_id": 1}))).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert_eq!(store.len(&ns()), 1);
    }

    #[tokio::test]
    async fn test_insert_many_is_all_or_nothing() {
        let store = MemoryBackend::new();
        let result = store
            .insert_many(&ns(), vec![doc(json!({"_id": 1})), doc(json!({"_id": 1}))])
            .await;
        assert!(result.is_err());
        assert!(store.is_empty(&ns()));
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryBackend::new();
        let other = Namespace::new("stocklab", "price_info").unwrap();
        store.insert_one(&ns(), doc(json!({"a": 1}))).await.unwrap();
        assert!(store.find_one(&other, Document::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_stream_is_a_snapshot() {
        let store = MemoryBackend::new();
        store.insert_one(&ns(), doc(json!({"a": 1}))).await.unwrap();
        let stream = store.find_many(&ns(), Document::new()).await.unwrap();
        store.insert_one(&ns(), doc(json!({"a": 2}))).await.unwrap();
        assert_eq!(collect_documents(stream).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_many_does_not_upsert() {
        let store = MemoryBackend::new();
        let outcome = store
            .update_many(&ns(), doc(json!({"a": 1})), doc(json!({"$set": {"b": 2}})))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::default());
        assert!(store.is_empty(&ns()));
    }

    #[tokio::test]
    async fn test_failed_update_leaves_documents_untouched() {
        let store = MemoryBackend::new();
        store
            .insert_many(&ns(), vec![doc(json!({"n": 1})), doc(json!({"n": "x"}))])
            .await
            .unwrap();
        let result = store
            .update_many(&ns(), Document::new(), doc(json!({"$inc": {"n": 1}})))
            .await;
        assert!(result.is_err());

        let docs = collect_documents(store.find_many(&ns(), Document::new()).await.unwrap())
            .await
            .unwrap();
        assert_eq!(docs[0]["n"], json!(1));
    }

    #[tokio::test]
    async fn test_text_search() {
        let store = MemoryBackend::new();
        store
            .insert_many(
                &ns(),
                vec![doc(json!({"name": "삼성전자"})), doc(json!({"name": "SK하이닉스"}))],
            )
            .await
            .unwrap();
        let hits = collect_documents(store.text_search(&ns(), "삼성".to_string()).await.unwrap())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }
}
