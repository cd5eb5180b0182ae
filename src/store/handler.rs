//! # Store Handler
//!
//! Validating front door of the store access layer. Callers hand in loosely
//! shaped JSON arguments; the handler checks them, then performs exactly one
//! backend call. Nothing is retried.
//!
//! Argument rules:
//! - `db` and `collection` are required for every operation
//! - reads default a missing or non-object filter to "match all"
//! - deletes and updates require an explicit object filter (`{}` is allowed)
//! - updates require a non-empty operator document
//! - pipelines must be a non-empty array of stage objects
//! - text searches require a string

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::backend::DocumentBackend;
use super::document::{is_operator_document, Document, DocumentStream, Namespace, UpdateOutcome};
use super::errors::{StoreError, StoreResult};
use super::memory::MemoryBackend;

/// Collection-scoped CRUD, aggregate and text search over a backend
#[derive(Clone)]
pub struct StoreHandler {
    backend: Arc<dyn DocumentBackend>,
}

impl std::fmt::Debug for StoreHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandler")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl StoreHandler {
    /// Wrap a backend
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    /// Handler over a fresh in-memory backend
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Name of the backend, for logs
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Check that the store answers
    pub async fn ping(&self) -> StoreResult<()> {
        self.backend.ping().await
    }

    /// Insert one document and return its id
    pub async fn insert_one(
        &self,
        db: &str,
        collection: &str,
        document: &Value,
    ) -> StoreResult<Value> {
        let ns = namespace("insert_one", db, collection)?;
        let doc = document
            .as_object()
            .cloned()
            .ok_or_else(|| invalid("insert_one", &ns, "data type should be an object"))?;

        debug!(op = "insert_one", ns = %ns, backend = self.backend.name());
        self.backend.insert_one(&ns, doc).await
    }

    /// Insert several documents and return their ids, in order
    pub async fn insert_many(
        &self,
        db: &str,
        collection: &str,
        documents: &Value,
    ) -> StoreResult<Vec<Value>> {
        let ns = namespace("insert_many", db, collection)?;
        let items = documents
            .as_array()
            .filter(|items| !items.is_empty())
            .ok_or_else(|| invalid("insert_many", &ns, "datas should be a nonempty array"))?;

        let docs = items
            .iter()
            .map(|item| item.as_object().cloned())
            .collect::<Option<Vec<Document>>>()
            .ok_or_else(|| invalid("insert_many", &ns, "every item should be an object"))?;

        debug!(op = "insert_many", ns = %ns, count = docs.len(), backend = self.backend.name());
        self.backend.insert_many(&ns, docs).await
    }

    /// First document matching `filter`, or `None`
    pub async fn find_one(
        &self,
        db: &str,
        collection: &str,
        filter: Option<&Value>,
    ) -> StoreResult<Option<Document>> {
        let ns = namespace("find_one", db, collection)?;
        let filter = read_filter(filter);

        debug!(op = "find_one", ns = %ns, backend = self.backend.name());
        self.backend.find_one(&ns, filter).await
    }

    /// Every document matching `filter`, as a stream
    pub async fn find_many(
        &self,
        db: &str,
        collection: &str,
        filter: Option<&Value>,
    ) -> StoreResult<DocumentStream> {
        let ns = namespace("find_many", db, collection)?;
        let filter = read_filter(filter);

        debug!(op = "find_many", ns = %ns, backend = self.backend.name());
        self.backend.find_many(&ns, filter).await
    }

    /// Delete every document matching `filter`; returns the count removed
    pub async fn delete_many(
        &self,
        db: &str,
        collection: &str,
        filter: Option<&Value>,
    ) -> StoreResult<u64> {
        let ns = namespace("delete_many", db, collection)?;
        let filter = required_filter("delete_many", &ns, filter)?;

        debug!(op = "delete_many", ns = %ns, backend = self.backend.name());
        self.backend.delete_many(&ns, filter).await
    }

    /// Update the first match, or insert one when nothing matches
    pub async fn update_one(
        &self,
        db: &str,
        collection: &str,
        filter: Option<&Value>,
        update: Option<&Value>,
    ) -> StoreResult<UpdateOutcome> {
        let ns = namespace("update_one", db, collection)?;
        let filter = required_filter("update_one", &ns, filter)?;
        let update = required_update("update_one", &ns, update)?;

        debug!(op = "update_one", ns = %ns, backend = self.backend.name());
        self.backend.update_one(&ns, filter, update).await
    }

    /// Update every match; never inserts
    pub async fn update_many(
        &self,
        db: &str,
        collection: &str,
        filter: Option<&Value>,
        update: Option<&Value>,
    ) -> StoreResult<UpdateOutcome> {
        let ns = namespace("update_many", db, collection)?;
        let filter = required_filter("update_many", &ns, filter)?;
        let update = required_update("update_many", &ns, update)?;

        debug!(op = "update_many", ns = %ns, backend = self.backend.name());
        self.backend.update_many(&ns, filter, update).await
    }

    /// Run an aggregation pipeline
    pub async fn aggregate(
        &self,
        db: &str,
        collection: &str,
        pipeline: Option<&Value>,
    ) -> StoreResult<DocumentStream> {
        let ns = namespace("aggregate", db, collection)?;
        let stages = pipeline
            .and_then(Value::as_array)
            .filter(|stages| !stages.is_empty())
            .and_then(|stages| {
                stages
                    .iter()
                    .map(|stage| stage.as_object().cloned())
                    .collect::<Option<Vec<Document>>>()
            })
            .ok_or_else(|| invalid("aggregate", &ns, "Need to pipeline"))?;

        debug!(op = "aggregate", ns = %ns, stages = stages.len(), backend = self.backend.name());
        self.backend.aggregate(&ns, stages).await
    }

    /// Full-text search
    pub async fn text_search(
        &self,
        db: &str,
        collection: &str,
        text: Option<&Value>,
    ) -> StoreResult<DocumentStream> {
        let ns = namespace("text_search", db, collection)?;
        let text = text
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("text_search", &ns, "Need to text"))?;

        debug!(op = "text_search", ns = %ns, backend = self.backend.name());
        self.backend.text_search(&ns, text.to_string()).await
    }
}

fn namespace(op: &str, db: &str, collection: &str) -> StoreResult<Namespace> {
    Namespace::new(db, collection).inspect_err(|e| {
        warn!(op, db, collection, error = %e, "rejected store call");
    })
}

fn invalid(op: &str, ns: &Namespace, msg: &str) -> StoreError {
    warn!(op, ns = %ns, error = msg, "rejected store call");
    StoreError::invalid(msg)
}

fn read_filter(filter: Option<&Value>) -> Document {
    filter.and_then(Value::as_object).cloned().unwrap_or_default()
}

fn required_filter(op: &str, ns: &Namespace, filter: Option<&Value>) -> StoreResult<Document> {
    filter
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| invalid(op, ns, "Need to condition"))
}

fn required_update(op: &str, ns: &Namespace, update: Option<&Value>) -> StoreResult<Document> {
    update
        .and_then(Value::as_object)
        .filter(|u| is_operator_document(u))
        .cloned()
        .ok_or_else(|| invalid(op, ns, "Need to update value"))
}
