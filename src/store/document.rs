//! # Documents and Namespaces
//!
//! Shared value types for the store access layer.

use futures_util::stream::{BoxStream, TryStreamExt};
use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};

/// An untyped document: field name to value
pub type Document = Map<String, Value>;

/// Lazily produced documents from a find, aggregate or text search
pub type DocumentStream = BoxStream<'static, StoreResult<Document>>;

/// Address of a collection inside a database
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    /// Build a namespace, rejecting empty names
    pub fn new(database: &str, collection: &str) -> StoreResult<Self> {
        if database.trim().is_empty() || collection.trim().is_empty() {
            return Err(StoreError::invalid("Need to param db_name, collection_name"));
        }
        Ok(Self {
            database: database.to_string(),
            collection: collection.to_string(),
        })
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Result of an update
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
    /// Id of the document created by an upsert, if any
    pub upserted_id: Option<Value>,
}

/// Drain a stream into a vector, stopping at the first error
pub async fn collect_documents(stream: DocumentStream) -> StoreResult<Vec<Document>> {
    stream.try_collect().await
}

/// True when every key of an update document is an update operator
pub(crate) fn is_operator_document(doc: &Document) -> bool {
    !doc.is_empty() && doc.keys().all(|k| k.starts_with('$'))
}
